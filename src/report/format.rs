//! Formatted terminal output.
//!
//! Formatting lives in one place so the statistics and aggregation code stays
//! clean and output changes are localized.

use crate::domain::{
    AnalysisConfig, IncomeVariable, Indicator, RateEstimate, SkippedWave, TimeSeries,
    WeightedStatistics,
};

/// Header shared by every report: scope, data root and active filters.
pub fn format_run_header(title: &str, config: &AnalysisConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== eph - {title} ===\n"));
    out.push_str(&format!("Data dir: {}\n", config.data_dir.display()));
    match config.year {
        Some(year) => out.push_str(&format!("Scope: year {year} (quarterly releases)\n")),
        None => out.push_str("Scope: 2016-2024 totals scan\n"),
    }
    if config.private_dwellings {
        out.push_str("Filter: private dwellings only (household join)\n");
    }
    out.push('\n');

    out
}

/// Format the three rate series as one table (one row per wave).
pub fn format_rates_table(series: &[(Indicator, TimeSeries<RateEstimate>)]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<12}", "wave"));
    for (indicator, _) in series {
        out.push_str(&format!(" {:>14}", indicator.display_name()));
    }
    out.push('\n');
    out.push_str(&format!("{:-<12}", ""));
    for _ in series {
        out.push_str(&format!(" {:-<14}", ""));
    }
    out.push('\n');

    for label in union_of_labels(series.iter().map(|(_, s)| s)) {
        out.push_str(&format!("{label:<12}"));
        for (_, s) in series {
            match s.get(&label) {
                Some(rate) => out.push_str(&format!(" {:>13}%", rate.to_string())),
                None => out.push_str(&format!(" {:>14}", "-")),
            }
        }
        out.push('\n');
    }

    out
}

/// Format one income variable's summaries as a table (one row per wave).
pub fn format_income_table(
    variable: IncomeVariable,
    series: &TimeSeries<WeightedStatistics>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} ({}), weighted by {}:\n",
        variable.column(),
        variable.description(),
        variable.weight_column()
    ));
    out.push_str(&format!(
        "{:<12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
        "wave", "mean", "median", "mode", "q25", "q75", "d10", "d90"
    ));
    out.push_str(&format!(
        "{:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12}\n",
        "", "", "", "", "", "", "", ""
    ));

    for (wave, stats) in series.iter() {
        out.push_str(&format!(
            "{:<12} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}\n",
            wave.label,
            stats.mean,
            stats.median,
            stats.mode,
            stats.quartiles[0].1,
            stats.quartiles[2].1,
            stats.deciles[0].1,
            stats.deciles[8].1,
        ));
    }

    out
}

/// Full decile profile of the latest wave of one income series.
pub fn format_latest_deciles(
    variable: IncomeVariable,
    series: &TimeSeries<WeightedStatistics>,
) -> String {
    let mut out = String::new();
    let Some((wave, stats)) = series.iter().next_back() else {
        return out;
    };

    out.push_str(&format!(
        "Deciles of {} in {} (range [{:.2}, {:.2}]):\n",
        variable.column(),
        wave.label,
        stats.min,
        stats.max
    ));
    for &(fraction, value) in &stats.deciles {
        out.push_str(&format!("  d{:<3} {value:>12.2}\n", (fraction * 100.0) as u32));
    }

    out
}

/// Format skip diagnostics and warnings. Empty when there is nothing to say.
pub fn format_diagnostics(skipped: &[SkippedWave], warnings: &[String]) -> String {
    let mut out = String::new();

    if !skipped.is_empty() {
        out.push_str("Skipped waves:\n");
        for skip in skipped {
            out.push_str(&format!(
                "  {} [{}]: {}\n",
                skip.wave.label, skip.series, skip.reason
            ));
        }
    }
    if !warnings.is_empty() {
        out.push_str("Warnings:\n");
        for warning in warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }

    out
}

fn union_of_labels<'a, T: 'a>(series: impl Iterator<Item = &'a TimeSeries<T>>) -> Vec<String> {
    let mut waves = Vec::new();
    for s in series {
        for (wave, _) in s.iter() {
            if !waves.contains(wave) {
                waves.push(wave.clone());
            }
        }
    }
    waves.sort();
    waves.into_iter().map(|w| w.label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Wave;

    fn rate(percent: f64) -> RateEstimate {
        RateEstimate {
            percent,
            decimals: 2,
        }
    }

    #[test]
    fn rates_table_shows_dash_for_skipped_waves() {
        let activity = TimeSeries::from_entries(vec![
            (Wave::parse("2016-2Trim"), rate(44.52)),
            (Wave::parse("2016-3Trim"), rate(45.1)),
        ]);
        let unemployment =
            TimeSeries::from_entries(vec![(Wave::parse("2016-3Trim"), rate(8.03))]);

        let table = format_rates_table(&[
            (Indicator::Activity, activity),
            (Indicator::Unemployment, unemployment),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].contains("activity"));
        assert!(lines[0].contains("unemployment"));
        assert!(lines[2].starts_with("2016-2Trim"));
        assert!(lines[2].contains("44.52%"));
        assert!(lines[2].trim_end().ends_with('-'));
        assert!(lines[3].contains("8.03%"));
    }

    #[test]
    fn income_table_has_one_row_per_wave() {
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

        let table = format_income_table(IncomeVariable::P21, &series);
        assert!(table.contains("principal-occupation income"));
        assert!(table.contains("PONDIIO"));
        assert!(table.contains("2017-1Trim"));
        assert!(table.contains("1000.00"));

        let deciles = format_latest_deciles(IncomeVariable::P21, &series);
        assert!(deciles.contains("2017-1Trim"));
        assert!(deciles.contains("d10"));
        assert!(deciles.contains("d90"));
        assert!(deciles.contains("900.00"));
    }

    #[test]
    fn diagnostics_are_empty_when_clean() {
        assert!(format_diagnostics(&[], &[]).is_empty());

        let skipped = vec![SkippedWave {
            wave: Wave::parse("2016-3Trim"),
            series: "unemployment".to_string(),
            reason: "no usable observations after filtering".to_string(),
        }];
        let text = format_diagnostics(&skipped, &["stray file".to_string()]);
        assert!(text.contains("2016-3Trim [unemployment]"));
        assert!(text.contains("stray file"));
    }
}
