//! Shared analysis pipeline used by both the subcommands and the menu.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! discover waves -> parse each wave once -> extract samples -> estimate ->
//! assemble series + skip diagnostics
//!
//! The front-ends then focus on presentation (tables, charts, exports).

use std::collections::HashSet;

use crate::domain::{
    AnalysisConfig, IncomeVariable, Indicator, MIN_INCOME_AGE, NEA_AGLOMERADOS, NEA_REGION,
    RateEstimate, SkippedWave, TimeSeries, Wave, WeightedStatistics,
};
use crate::error::{AppError, WaveError};
use crate::io::{HouseholdKey, RowFilter, WaveFiles, WaveTable, discover_waves, totals_dir, year_dir};
use crate::series::{assemble, collect_waves, unrecognized_wave_warnings};
use crate::stats::{summarize, weighted_rate};

/// All computed outputs of a rates analysis.
#[derive(Debug, Clone)]
pub struct RatesRun {
    pub series: Vec<(Indicator, TimeSeries<RateEstimate>)>,
    pub skipped: Vec<SkippedWave>,
    pub warnings: Vec<String>,
}

impl RatesRun {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|(_, s)| s.is_empty())
    }
}

/// All computed outputs of an income analysis.
#[derive(Debug, Clone)]
pub struct IncomeRun {
    pub series: Vec<(IncomeVariable, TimeSeries<WeightedStatistics>)>,
    pub skipped: Vec<SkippedWave>,
    pub warnings: Vec<String>,
}

impl IncomeRun {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|(_, s)| s.is_empty())
    }
}

/// Per-wave rate results, parallel to `Indicator::ALL`.
struct WaveRates {
    rates: Vec<Result<RateEstimate, WaveError>>,
    warnings: Vec<String>,
}

/// Per-wave income results, parallel to `IncomeVariable::ALL`.
struct WaveIncome {
    stats: Vec<Result<WeightedStatistics, WaveError>>,
    warnings: Vec<String>,
}

/// Enumerate the wave files for the configured scope.
pub fn discover(config: &AnalysisConfig) -> Result<Vec<WaveFiles>, AppError> {
    let dir = match config.year {
        Some(year) => year_dir(&config.data_dir, year),
        None => totals_dir(&config.data_dir),
    };
    let files = discover_waves(&dir)?;
    if files.is_empty() {
        return Err(AppError::new(
            3,
            format!("No wave files (*.txt) found in '{}'.", dir.display()),
        ));
    }
    Ok(files)
}

/// Compute the three labor-market rate series over the given waves.
pub fn run_rates(config: &AnalysisConfig, files: &[WaveFiles]) -> Result<RatesRun, AppError> {
    let mut warnings = unrecognized_wave_warnings(files);
    let results = collect_waves(files, |wf| load_wave_rates(wf, config));

    let mut per_indicator: Vec<Vec<(Wave, Result<RateEstimate, WaveError>)>> =
        Indicator::ALL.iter().map(|_| Vec::new()).collect();
    for (wave, result) in results {
        match result {
            Ok(mut loaded) => {
                warnings.append(&mut loaded.warnings);
                for (column, rate) in per_indicator.iter_mut().zip(loaded.rates) {
                    column.push((wave.clone(), rate));
                }
            }
            Err(e) => {
                for column in &mut per_indicator {
                    column.push((wave.clone(), Err(e.clone())));
                }
            }
        }
    }

    let mut series = Vec::with_capacity(Indicator::ALL.len());
    let mut skipped = Vec::new();
    for (indicator, results) in Indicator::ALL.into_iter().zip(per_indicator) {
        let mut outcome = assemble(results, indicator.display_name());
        skipped.append(&mut outcome.skipped);
        series.push((indicator, outcome.series));
    }

    Ok(RatesRun {
        series,
        skipped,
        warnings,
    })
}

/// Compute the income distribution series over the given waves.
pub fn run_income(config: &AnalysisConfig, files: &[WaveFiles]) -> Result<IncomeRun, AppError> {
    let mut warnings = unrecognized_wave_warnings(files);
    let results = collect_waves(files, |wf| load_wave_income(wf, config));

    let mut per_variable: Vec<Vec<(Wave, Result<WeightedStatistics, WaveError>)>> =
        IncomeVariable::ALL.iter().map(|_| Vec::new()).collect();
    for (wave, result) in results {
        match result {
            Ok(mut loaded) => {
                warnings.append(&mut loaded.warnings);
                for (column, stats) in per_variable.iter_mut().zip(loaded.stats) {
                    column.push((wave.clone(), stats));
                }
            }
            Err(e) => {
                for column in &mut per_variable {
                    column.push((wave.clone(), Err(e.clone())));
                }
            }
        }
    }

    let mut series = Vec::with_capacity(IncomeVariable::ALL.len());
    let mut skipped = Vec::new();
    for (variable, results) in IncomeVariable::ALL.into_iter().zip(per_variable) {
        let mut outcome = assemble(results, variable.column());
        skipped.append(&mut outcome.skipped);
        series.push((variable, outcome.series));
    }

    Ok(IncomeRun {
        series,
        skipped,
        warnings,
    })
}

/// Parse one wave's file and estimate every indicator from it.
///
/// An error here fails the whole wave (the file or its schema is unusable);
/// per-indicator errors stay inside `WaveRates` so one empty denominator
/// does not drop the other series.
fn load_wave_rates(wf: &WaveFiles, config: &AnalysisConfig) -> Result<WaveRates, WaveError> {
    let table = WaveTable::load(&wf.individual)?;
    let households = load_households(wf, config)?;
    let filter = RowFilter {
        aglomerados: Some(NEA_AGLOMERADOS.as_slice()),
        households: households.as_ref(),
        ..RowFilter::default()
    };

    let rates = Indicator::ALL
        .iter()
        .map(|&indicator| {
            table
                .indicator_sample(indicator, &filter)
                .and_then(|sample| weighted_rate(&sample, config.rate_decimals))
        })
        .collect();

    Ok(WaveRates {
        rates,
        warnings: row_warnings(&wf.wave, &table),
    })
}

fn load_wave_income(wf: &WaveFiles, config: &AnalysisConfig) -> Result<WaveIncome, WaveError> {
    let table = WaveTable::load(&wf.individual)?;
    let households = load_households(wf, config)?;
    let filter = RowFilter {
        region: Some(NEA_REGION),
        min_age: Some(MIN_INCOME_AGE),
        households: households.as_ref(),
        ..RowFilter::default()
    };

    let stats = IncomeVariable::ALL
        .iter()
        .map(|&variable| {
            table
                .income_sample(variable, &filter)
                .and_then(|sample| summarize(&sample))
        })
        .collect();

    Ok(WaveIncome {
        stats,
        warnings: row_warnings(&wf.wave, &table),
    })
}

fn load_households(
    wf: &WaveFiles,
    config: &AnalysisConfig,
) -> Result<Option<HashSet<HouseholdKey>>, WaveError> {
    if !config.private_dwellings {
        return Ok(None);
    }
    WaveTable::load(&wf.household)?
        .private_household_keys()
        .map(Some)
}

fn row_warnings(wave: &Wave, table: &WaveTable) -> Vec<String> {
    if table.row_errors.is_empty() {
        return Vec::new();
    }
    let first = &table.row_errors[0];
    vec![format!(
        "{}: {} unreadable row(s) out of {} (first at line {}: {})",
        wave.label,
        table.row_errors.len(),
        table.rows_read,
        first.line,
        first.message
    )]
}
