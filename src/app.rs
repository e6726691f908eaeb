//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves the data directory
//! - discovers the wave files for the requested scope
//! - runs the rate/income pipelines
//! - prints reports and renders charts
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;

use crate::cli::menu::MenuAction;
use crate::cli::{Command, CommonArgs, YearArgs};
use crate::domain::{AnalysisConfig, IncomeVariable, Indicator, RateEstimate, SkippedWave, TimeSeries, WeightedStatistics};
use crate::error::AppError;
use crate::plot::ChartSpec;

pub mod pipeline;

use pipeline::{IncomeRun, RatesRun};

/// Decimal digits used by the single-year rate reports.
const YEARLY_RATE_DECIMALS: u32 = 2;
/// Decimal digits used by the 2016-2024 evolution scan.
const EVOLUTION_RATE_DECIMALS: u32 = 1;

/// Entry point for the `eph` binary.
pub fn run() -> Result<(), AppError> {
    // We want plain `eph` (and `eph -d <dir>`) to open the interactive menu.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Rates(args) => handle_rates(&yearly_config(args)?),
        Command::Income(args) => handle_income(&yearly_config(args)?),
        Command::Evolution(args) => {
            handle_evolution(&resolve_config(args, None, EVOLUTION_RATE_DECIMALS)?)
        }
        Command::Menu(args) => handle_menu(args),
    }
}

fn yearly_config(args: YearArgs) -> Result<AnalysisConfig, AppError> {
    resolve_config(args.common, Some(args.year), YEARLY_RATE_DECIMALS)
}

/// Resolve CLI flags (plus `.env`/environment defaults) into a run config.
fn resolve_config(
    common: CommonArgs,
    year: Option<u16>,
    rate_decimals: u32,
) -> Result<AnalysisConfig, AppError> {
    // A `.env` file in the working directory may provide EPH_DATA_DIR.
    dotenvy::dotenv().ok();

    let data_dir = common
        .data_dir
        .or_else(|| std::env::var_os("EPH_DATA_DIR").map(PathBuf::from))
        .or_else(|| {
            // Conventional layout when running next to the downloaded data.
            let default = PathBuf::from("periodos trimestrales");
            default.is_dir().then_some(default)
        })
        .ok_or_else(|| {
            AppError::new(
                2,
                "No data directory. Pass --data-dir or set EPH_DATA_DIR (a .env file works).",
            )
        })?;

    Ok(AnalysisConfig {
        data_dir,
        year,
        private_dwellings: common.private_dwellings,
        rate_decimals,
        charts_dir: common.charts,
        export_csv: common.export,
        export_json: common.export_json,
    })
}

fn handle_rates(config: &AnalysisConfig) -> Result<(), AppError> {
    let files = pipeline::discover(config)?;
    let run = pipeline::run_rates(config, &files)?;
    if run.is_empty() {
        return Err(AppError::new(
            3,
            "Every wave was skipped; no rate series could be computed.",
        ));
    }

    print!("{}", crate::report::format_run_header("Labor-market rates", config));
    print!("{}", crate::report::format_rates_table(&run.series));
    print!("{}", crate::report::format_diagnostics(&run.skipped, &run.warnings));

    if let Some(dir) = &config.charts_dir {
        let path = dir.join(format!("rates-{}.svg", scope_token(config)));
        let spec = ChartSpec::rates(&rates_title(config), &run.series);
        crate::plot::render_line_chart(&path, &spec)?;
        println!("Chart written to {}", path.display());
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_rates_csv(path, &run.series)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &rates_export(config, &run))?;
    }

    Ok(())
}

fn handle_income(config: &AnalysisConfig) -> Result<(), AppError> {
    let files = pipeline::discover(config)?;
    let run = pipeline::run_income(config, &files)?;
    if run.is_empty() {
        return Err(AppError::new(
            3,
            "Every wave was skipped; no income series could be computed.",
        ));
    }

    print!("{}", crate::report::format_run_header("Income distribution", config));
    for (variable, series) in &run.series {
        print!("{}", crate::report::format_income_table(*variable, series));
        println!();
        print!("{}", crate::report::format_latest_deciles(*variable, series));
        println!();
    }
    print!("{}", crate::report::format_diagnostics(&run.skipped, &run.warnings));

    if let Some(dir) = &config.charts_dir {
        for (variable, series) in &run.series {
            if series.is_empty() {
                continue;
            }
            let path = dir.join(format!(
                "income-{}-{}.svg",
                variable.column(),
                scope_token(config)
            ));
            let spec = ChartSpec::income(&income_title(config), *variable, series);
            crate::plot::render_line_chart(&path, &spec)?;
            println!("Chart written to {}", path.display());
        }
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_income_csv(path, &run.series)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &income_export(config, &run))?;
    }

    Ok(())
}

/// The 2016-2024 scan runs both pipelines over the same wave files.
fn handle_evolution(config: &AnalysisConfig) -> Result<(), AppError> {
    let files = pipeline::discover(config)?;
    let rates = pipeline::run_rates(config, &files)?;
    let income = pipeline::run_income(config, &files)?;
    if rates.is_empty() && income.is_empty() {
        return Err(AppError::new(
            3,
            "Every wave was skipped; no series could be computed.",
        ));
    }

    print!("{}", crate::report::format_run_header("2016-2024 evolution", config));
    print!("{}", crate::report::format_rates_table(&rates.series));
    println!();
    for (variable, series) in &income.series {
        print!("{}", crate::report::format_income_table(*variable, series));
        println!();
    }
    // Both pipelines read the same files; report each wave warning once.
    print!("{}", crate::report::format_diagnostics(&rates.skipped, &rates.warnings));
    print!("{}", crate::report::format_diagnostics(&income.skipped, &[]));

    if let Some(dir) = &config.charts_dir {
        let path = dir.join(format!("rates-{}.svg", scope_token(config)));
        crate::plot::render_line_chart(&path, &ChartSpec::rates(&rates_title(config), &rates.series))?;
        println!("Chart written to {}", path.display());
        for (variable, series) in &income.series {
            if series.is_empty() {
                continue;
            }
            let path = dir.join(format!(
                "income-{}-{}.svg",
                variable.column(),
                scope_token(config)
            ));
            crate::plot::render_line_chart(
                &path,
                &ChartSpec::income(&income_title(config), *variable, series),
            )?;
            println!("Chart written to {}", path.display());
        }
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_rates_csv(path, &rates.series)?;
        let income_path = sibling_with_tag(path, "income");
        crate::io::write_income_csv(&income_path, &income.series)?;
    }
    if let Some(path) = &config.export_json {
        let export = EvolutionExport {
            scope: scope_token(config),
            rates: rates_export(config, &rates),
            income: income_export(config, &income),
        };
        crate::io::write_json(path, &export)?;
    }

    Ok(())
}

fn handle_menu(common: CommonArgs) -> Result<(), AppError> {
    loop {
        match crate::cli::menu::prompt_for_action()? {
            MenuAction::YearlyRates(year) => {
                handle_rates(&resolve_config(common.clone(), Some(year), YEARLY_RATE_DECIMALS)?)?
            }
            MenuAction::YearlyIncome(year) => {
                handle_income(&resolve_config(common.clone(), Some(year), YEARLY_RATE_DECIMALS)?)?
            }
            MenuAction::Evolution => handle_evolution(&resolve_config(
                common.clone(),
                None,
                EVOLUTION_RATE_DECIMALS,
            )?)?,
            MenuAction::Quit => return Ok(()),
        }
    }
}

fn scope_token(config: &AnalysisConfig) -> String {
    match config.year {
        Some(year) => year.to_string(),
        None => "2016-2024".to_string(),
    }
}

fn rates_title(config: &AnalysisConfig) -> String {
    format!("NEA labor-market rates, {}", scope_token(config))
}

fn income_title(config: &AnalysisConfig) -> String {
    format!("NEA income, {}", scope_token(config))
}

/// `out.csv` + `income` -> `out-income.csv`.
fn sibling_with_tag(path: &Path, tag: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("export");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}-{tag}.{ext}"),
        None => format!("{stem}-{tag}"),
    };
    path.with_file_name(name)
}

#[derive(Serialize)]
struct RatesExport<'a> {
    scope: String,
    series: &'a [(Indicator, TimeSeries<RateEstimate>)],
    skipped: &'a [SkippedWave],
}

#[derive(Serialize)]
struct IncomeExport<'a> {
    scope: String,
    series: &'a [(IncomeVariable, TimeSeries<WeightedStatistics>)],
    skipped: &'a [SkippedWave],
}

#[derive(Serialize)]
struct EvolutionExport<'a> {
    scope: String,
    rates: RatesExport<'a>,
    income: IncomeExport<'a>,
}

fn rates_export<'a>(config: &AnalysisConfig, run: &'a RatesRun) -> RatesExport<'a> {
    RatesExport {
        scope: scope_token(config),
        series: &run.series,
        skipped: &run.skipped,
    }
}

fn income_export<'a>(config: &AnalysisConfig, run: &'a IncomeRun) -> IncomeExport<'a> {
    IncomeExport {
        scope: scope_token(config),
        series: &run.series,
        skipped: &run.skipped,
    }
}

/// Rewrite argv so `eph` defaults to `eph menu`.
///
/// Rules:
/// - `eph`                      -> `eph menu`
/// - `eph -d <dir> ...`         -> `eph menu -d <dir> ...`
/// - `eph --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("menu".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "rates" | "income" | "evolution" | "menu");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "menu flags".
    if arg1.starts_with('-') {
        argv.insert(1, "menu".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_menu() {
        assert_eq!(rewrite_args(args(&["eph"])), args(&["eph", "menu"]));
        assert_eq!(
            rewrite_args(args(&["eph", "-d", "data"])),
            args(&["eph", "menu", "-d", "data"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["eph", "rates", "-y", "2017"])),
            args(&["eph", "rates", "-y", "2017"])
        );
        assert_eq!(rewrite_args(args(&["eph", "--help"])), args(&["eph", "--help"]));
    }

    #[test]
    fn sibling_export_path_keeps_the_extension() {
        assert_eq!(
            sibling_with_tag(Path::new("out/series.csv"), "income"),
            Path::new("out/series-income.csv")
        );
        assert_eq!(
            sibling_with_tag(Path::new("series"), "income"),
            Path::new("series-income")
        );
    }
}
