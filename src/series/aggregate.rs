//! Per-wave aggregation.
//!
//! The wave loop is the expensive part of a run (each wave parses a multi-MB
//! file), so waves are processed in parallel. Determinism is preserved by
//! sorting the collected results chronologically before assembly; insertion
//! order therefore never depends on scheduling.
//!
//! A wave that fails for one series is dropped from that series only, and the
//! failure is reported as a `SkippedWave`. One bad quarter must not take down
//! a nine-year scan.

use rayon::prelude::*;

use crate::domain::{SkippedWave, TimeSeries, Wave};
use crate::error::WaveError;
use crate::io::WaveFiles;

/// One series plus the waves dropped from it.
#[derive(Debug, Clone, Default)]
pub struct SeriesOutcome<T> {
    pub series: TimeSeries<T>,
    pub skipped: Vec<SkippedWave>,
}

impl<T> SeriesOutcome<T> {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Run `load` over every wave file in parallel and return the per-wave
/// results in chronological order.
///
/// `load` computes everything the run needs from one wave (all indicators or
/// all income variables) so each file is parsed exactly once.
pub fn collect_waves<T, F>(files: &[WaveFiles], load: F) -> Vec<(Wave, Result<T, WaveError>)>
where
    T: Send,
    F: Fn(&WaveFiles) -> Result<T, WaveError> + Sync,
{
    let mut results: Vec<(Wave, Result<T, WaveError>)> = files
        .par_iter()
        .map(|wf| (wf.wave.clone(), load(wf)))
        .collect();
    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

/// Split per-wave results into a time series and the skipped-wave list.
pub fn assemble<T>(
    results: Vec<(Wave, Result<T, WaveError>)>,
    series_name: &str,
) -> SeriesOutcome<T> {
    let mut entries = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (wave, result) in results {
        match result {
            Ok(value) => entries.push((wave, value)),
            Err(e) => skipped.push(SkippedWave {
                wave,
                series: series_name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
    SeriesOutcome {
        series: TimeSeries::from_entries(entries),
        skipped,
    }
}

/// Warnings for wave files whose names match no known naming scheme.
///
/// Such waves still participate in every series (sorted first, under their
/// raw label) but almost always indicate a stray file in the data directory.
pub fn unrecognized_wave_warnings(files: &[WaveFiles]) -> Vec<String> {
    files
        .iter()
        .filter(|wf| !wf.wave.is_recognized())
        .map(|wf| {
            format!(
                "Unrecognized wave identifier '{}' ({}); sorting it before dated waves",
                wf.wave.label,
                wf.individual.display()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn wave_files(stems: &[&str]) -> Vec<WaveFiles> {
        stems
            .iter()
            .map(|stem| {
                let individual = PathBuf::from(format!("data/individual/{stem}.txt"));
                WaveFiles {
                    wave: Wave::parse(stem),
                    household: crate::io::household_path(&individual),
                    individual,
                }
            })
            .collect()
    }

    #[test]
    fn collect_orders_results_chronologically() {
        let files = wave_files(&[
            "usu_individual_t117",
            "usu_individual_t416",
            "usu_individual_t216",
        ]);
        let results = collect_waves(&files, |wf| Ok::<_, WaveError>(wf.wave.label.clone()));
        let labels: Vec<&str> = results.iter().map(|(w, _)| w.label.as_str()).collect();
        assert_eq!(labels, ["2016-2Trim", "2016-4Trim", "2017-1Trim"]);
    }

    #[test]
    fn assemble_splits_failures_into_skips() {
        let results = vec![
            (Wave::parse("2016-2Trim"), Ok(1.0)),
            (Wave::parse("2016-3Trim"), Err(WaveError::EmptySample)),
            (Wave::parse("2016-4Trim"), Ok(2.0)),
        ];
        let outcome = assemble(results, "unemployment");
        assert_eq!(outcome.series.labels(), ["2016-2Trim", "2016-4Trim"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].series, "unemployment");
        assert_eq!(outcome.skipped[0].wave.label, "2016-3Trim");
        assert_eq!(
            outcome.skipped[0].reason,
            "no usable observations after filtering"
        );
    }

    #[test]
    fn failed_wave_drops_only_its_own_series() {
        let per_wave = vec![
            (Wave::parse("2016-2Trim"), (Ok(10.0), Ok(20.0))),
            (
                Wave::parse("2016-3Trim"),
                (Ok(11.0), Err(WaveError::EmptySample)),
            ),
        ];

        let employment = assemble(
            per_wave
                .iter()
                .map(|(w, (a, _))| (w.clone(), a.clone()))
                .collect(),
            "employment",
        );
        let unemployment = assemble(
            per_wave
                .iter()
                .map(|(w, (_, b))| (w.clone(), b.clone()))
                .collect(),
            "unemployment",
        );

        assert_eq!(employment.series.len(), 2);
        assert!(employment.skipped.is_empty());
        assert_eq!(unemployment.series.len(), 1);
        assert_eq!(unemployment.skipped.len(), 1);
    }

    #[test]
    fn unrecognized_waves_warn_but_stay() {
        let files = wave_files(&["usu_individual_t216", "notes"]);
        let warnings = unrecognized_wave_warnings(&files);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'notes'"));

        let results = collect_waves(&files, |_| Ok::<_, WaveError>(()));
        assert_eq!(results[0].0.label, "notes");
        assert_eq!(results[1].0.label, "2016-2Trim");
    }
}
