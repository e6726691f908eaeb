//! Export computed series to CSV/JSON.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON export is a faithful dump of a full run's output.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{Indicator, IncomeVariable, RateEstimate, TimeSeries, Wave, WeightedStatistics};
use crate::error::AppError;

/// Write the three rate series to a wide CSV (one row per wave).
///
/// A cell is left empty when that wave was skipped for that indicator.
pub fn write_rates_csv(
    path: &Path,
    series: &[(Indicator, TimeSeries<RateEstimate>)],
) -> Result<(), AppError> {
    let mut file = create_export(path)?;

    let mut header = String::from("wave");
    for (indicator, _) in series {
        header.push(',');
        header.push_str(indicator.display_name());
    }
    writeln!(file, "{header}").map_err(|e| write_error(path, e))?;

    for wave in union_of_waves(series.iter().map(|(_, s)| s)) {
        let mut row = wave.label.clone();
        for (_, s) in series {
            row.push(',');
            if let Some(rate) = s.get(&wave.label) {
                row.push_str(&rate.to_string());
            }
        }
        writeln!(file, "{row}").map_err(|e| write_error(path, e))?;
    }

    Ok(())
}

/// Write the income summaries to a long CSV (one row per variable and wave).
pub fn write_income_csv(
    path: &Path,
    series: &[(IncomeVariable, TimeSeries<WeightedStatistics>)],
) -> Result<(), AppError> {
    let mut file = create_export(path)?;

    let mut header = String::from("variable,wave,mean,median,mode,min,max,q25,q75");
    for d in 1..=9 {
        header.push_str(&format!(",d{}", d * 10));
    }
    writeln!(file, "{header}").map_err(|e| write_error(path, e))?;

    for (variable, s) in series {
        for (wave, stats) in s.iter() {
            let mut row = format!(
                "{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                variable.column(),
                wave.label,
                stats.mean,
                stats.median,
                stats.mode,
                stats.min,
                stats.max,
                stats.quartiles[0].1,
                stats.quartiles[2].1,
            );
            for &(_, value) in &stats.deciles {
                row.push_str(&format!(",{value:.2}"));
            }
            writeln!(file, "{row}").map_err(|e| write_error(path, e))?;
        }
    }

    Ok(())
}

/// Dump a full run's output as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, output: &T) -> Result<(), AppError> {
    let file = create_export(path)?;
    serde_json::to_writer_pretty(file, output).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to write JSON export '{}': {e}", path.display()),
        )
    })
}

fn create_export(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to create export directory '{}': {e}", parent.display()),
            )
        })?;
    }
    File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create export file '{}': {e}", path.display()),
        )
    })
}

fn write_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::new(
        2,
        format!("Failed to write export file '{}': {e}", path.display()),
    )
}

/// Waves present in any of the series, in chronological order.
fn union_of_waves<'a, T: 'a>(
    series: impl Iterator<Item = &'a TimeSeries<T>>,
) -> Vec<Wave> {
    let mut waves: Vec<Wave> = Vec::new();
    for s in series {
        for (wave, _) in s.iter() {
            if !waves.contains(wave) {
                waves.push(wave.clone());
            }
        }
    }
    waves.sort();
    waves
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(percent: f64) -> RateEstimate {
        RateEstimate {
            percent,
            decimals: 2,
        }
    }

    #[test]
    fn rates_csv_leaves_skipped_cells_empty() {
        let activity = TimeSeries::from_entries(vec![
            (Wave::parse("2016-2Trim"), rate(44.52)),
            (Wave::parse("2016-3Trim"), rate(45.1)),
        ]);
        let unemployment =
            TimeSeries::from_entries(vec![(Wave::parse("2016-3Trim"), rate(8.03))]);

        let dir = std::env::temp_dir().join(format!("eph-series-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rates.csv");

        write_rates_csv(
            &path,
            &[
                (Indicator::Activity, activity),
                (Indicator::Unemployment, unemployment),
            ],
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "wave,activity,unemployment");
        assert_eq!(lines[1], "2016-2Trim,44.52,");
        assert_eq!(lines[2], "2016-3Trim,45.10,8.03");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn income_csv_has_one_row_per_variable_and_wave() {
        let stats = WeightedStatistics {
            mean: 1000.0,
            median: 900.0,
            mode: 800.0,
            quartiles: vec![(0.25, 500.0), (0.5, 900.0), (0.75, 1500.0)],
            deciles: (1..=9).map(|d| (d as f64 / 10.0, d as f64 * 100.0)).collect(),
            min: 10.0,
            max: 9000.0,
        };
        let series = TimeSeries::from_entries(vec![(Wave::parse("2017-1Trim"), stats)]);

        let dir =
            std::env::temp_dir().join(format!("eph-series-export-inc-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("income.csv");

        write_income_csv(&path, &[(IncomeVariable::P21, series)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("variable,wave,mean,median,mode,min,max,q25,q75,d10"));
        assert!(lines[1].starts_with("P21,2017-1Trim,1000.00,900.00,800.00,10.00,9000.00,500.00,1500.00,100.00"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
