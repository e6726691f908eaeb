//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during per-wave computation
//! - exported to JSON/CSV
//! - consumed directly by the report/plot front-ends

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// INDEC agglomeration codes for the NEA region (the analyzed subregion).
pub const NEA_AGLOMERADOS: [i64; 4] = [7, 8, 12, 15];

/// INDEC region code for the NEA.
pub const NEA_REGION: i64 = 41;

/// Minimum age (`CH06`) for the income reference population.
pub const MIN_INCOME_AGE: i64 = 14;

/// Reserved sentinel marking "not applicable/missing" in income columns.
pub const MISSING_SENTINEL: f64 = -9.0;

/// `IV1` dwelling-type codes kept by the private-dwellings filter
/// (1 = house, 2 = apartment).
pub const PRIVATE_DWELLING_TYPES: [i64; 2] = [1, 2];

/// `ESTADO` labor-force status code: employed.
pub const ESTADO_EMPLOYED: i64 = 1;

/// `ESTADO` labor-force status code: unemployed.
pub const ESTADO_UNEMPLOYED: i64 = 2;

/// One quarterly release of survey microdata, identified by year and quarter.
///
/// A wave is parsed once from a filename token and used solely as the
/// ordering/grouping key for time-series assembly. Identifiers that match no
/// known pattern parse to year 0 so they sort first instead of failing; the
/// aggregator records a warning for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Canonical label (`2016-2Trim`), or the raw token when unrecognized.
    pub label: String,
    pub year: u16,
    pub quarter: u8,
}

impl Wave {
    /// Parse a wave from a filename stem or a canonical label.
    ///
    /// Accepted forms:
    /// - `2016-2Trim` (canonical label)
    /// - `usu_individual_t216` (quarterly release file stem)
    /// - `Individual-2016-2T` (totals directory file stem)
    pub fn parse(token: &str) -> Self {
        match parse_wave_token(token) {
            Some((year, quarter)) => Wave {
                label: format!("{year}-{quarter}Trim"),
                year,
                quarter,
            },
            None => Wave {
                label: token.to_string(),
                year: 0,
                quarter: 0,
            },
        }
    }

    /// Chronological sort key (`year*10 + quarter`; 0 for unrecognized labels).
    pub fn sort_key(&self) -> u32 {
        u32::from(self.year) * 10 + u32::from(self.quarter)
    }

    pub fn is_recognized(&self) -> bool {
        self.year > 0
    }
}

impl Ord for Wave {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for Wave {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Wave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

fn parse_wave_token(token: &str) -> Option<(u16, u8)> {
    parse_label_form(token)
        .or_else(|| parse_quarterly_stem(token))
        .or_else(|| parse_totals_stem(token))
}

/// `YYYY-QTrim`.
fn parse_label_form(s: &str) -> Option<(u16, u8)> {
    let (year, rest) = s.split_once('-')?;
    if year.len() != 4 {
        return None;
    }
    let year: u16 = year.parse().ok()?;
    let mut chars = rest.chars();
    let quarter = chars.next()?.to_digit(10)? as u8;
    if chars.as_str() != "Trim" || !(1..=4).contains(&quarter) {
        return None;
    }
    Some((year, quarter))
}

/// `usu_individual_tQYY` / `usu_hogar_tQYY`.
fn parse_quarterly_stem(s: &str) -> Option<(u16, u8)> {
    let pos = s.rfind("_t")?;
    let digits = &s[pos + 2..];
    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let quarter: u8 = digits[0..1].parse().ok()?;
    let yy: u16 = digits[1..3].parse().ok()?;
    if !(1..=4).contains(&quarter) {
        return None;
    }
    Some((2000 + yy, quarter))
}

/// `Individual-YYYY-QT` (totals directory naming).
fn parse_totals_stem(s: &str) -> Option<(u16, u8)> {
    let mut parts = s.split('-');
    let _prefix = parts.next()?;
    let year = parts.next()?;
    let qt = parts.next()?;
    if year.len() != 4 || parts.next().is_some() {
        return None;
    }
    let year: u16 = year.parse().ok()?;
    let mut chars = qt.chars();
    let quarter = chars.next()?.to_digit(10)? as u8;
    if chars.as_str() != "T" || !(1..=4).contains(&quarter) {
        return None;
    }
    Some((year, quarter))
}

/// A filtered collection of (value, weight) observations for one variable
/// within one wave.
///
/// Sentinel and missing values are excluded at ingest time, so every pushed
/// observation carries a real value. Input order is preserved: the unweighted
/// mode's tie-break depends on first occurrence.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    values: Vec<f64>,
    weights: Vec<f64>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let mut sample = Sample::new();
        for &(value, weight) in pairs {
            sample.push(value, weight);
        }
        sample
    }

    pub fn push(&mut self, value: f64, weight: f64) {
        self.values.push(value);
        self.weights.push(weight);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Weighted distribution summary for one (wave, variable) pair.
///
/// Mode, min and max are unweighted on purpose: mode answers "what value
/// appears most often", not "what value represents the most population".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedStatistics {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    /// `(fraction, value)` for fractions 0.25, 0.5, 0.75.
    pub quartiles: Vec<(f64, f64)>,
    /// `(fraction, value)` for fractions 0.1 through 0.9.
    pub deciles: Vec<(f64, f64)>,
    pub min: f64,
    pub max: f64,
}

/// A weighted percentage in `[0, 100]`, rounded to `decimals` digits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateEstimate {
    pub percent: f64,
    pub decimals: u32,
}

impl std::fmt::Display for RateEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.*}", self.decimals as usize, self.percent)
    }
}

/// A chronologically ordered `(Wave, T)` series.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries<T> {
    entries: Vec<(Wave, T)>,
}

impl<T> TimeSeries<T> {
    /// Build a series from unordered entries; entries are sorted by wave.
    pub fn from_entries(mut entries: Vec<(Wave, T)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Wave, T)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(w, _)| w.label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(w, _)| w.label == label)
            .map(|(_, v)| v)
    }
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// A wave dropped from one series, with the reason. Skips are reported to the
/// caller, never silently swallowed.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedWave {
    pub wave: Wave,
    /// Which series the wave was dropped from (e.g. `unemployment`, `P21`).
    pub series: String,
    pub reason: String,
}

/// A binary-encoded labor-force indicator whose weighted mean yields a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Activity,
    Employment,
    Unemployment,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [
        Indicator::Activity,
        Indicator::Employment,
        Indicator::Unemployment,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Indicator::Activity => "activity",
            Indicator::Employment => "employment",
            Indicator::Unemployment => "unemployment",
        }
    }

    /// 0/1 encoding of an `ESTADO` status code for this indicator.
    pub fn encode(self, estado: i64) -> f64 {
        let hit = match self {
            Indicator::Activity => estado == ESTADO_EMPLOYED || estado == ESTADO_UNEMPLOYED,
            Indicator::Employment => estado == ESTADO_EMPLOYED,
            Indicator::Unemployment => estado == ESTADO_UNEMPLOYED,
        };
        if hit { 1.0 } else { 0.0 }
    }

    /// Whether the reference population is restricted to labor-force
    /// participants. Only the unemployment rate changes its denominator.
    pub fn labor_force_only(self) -> bool {
        matches!(self, Indicator::Unemployment)
    }
}

/// An income variable of interest and its matching sampling-weight column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncomeVariable {
    /// Principal-occupation income.
    P21,
    /// Total individual income.
    P47T,
}

impl IncomeVariable {
    pub const ALL: [IncomeVariable; 2] = [IncomeVariable::P21, IncomeVariable::P47T];

    pub fn column(self) -> &'static str {
        match self {
            IncomeVariable::P21 => "P21",
            IncomeVariable::P47T => "P47T",
        }
    }

    pub fn weight_column(self) -> &'static str {
        match self {
            IncomeVariable::P21 => "PONDIIO",
            IncomeVariable::P47T => "PONDII",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IncomeVariable::P21 => "principal-occupation income",
            IncomeVariable::P47T => "total individual income",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Root of the survey data tree (`periodo <year>/individual/*.txt`).
    pub data_dir: PathBuf,
    /// Year to analyze; `None` scans the 2016-2024 totals directory.
    pub year: Option<u16>,
    /// Join individual rows to household rows and keep private dwellings only.
    pub private_dwellings: bool,
    /// Decimal digits for rate rounding.
    pub rate_decimals: u32,
    /// Directory for rendered SVG charts; `None` disables plotting.
    pub charts_dir: Option<PathBuf>,
    /// Optional CSV export of the computed series.
    pub export_csv: Option<PathBuf>,
    /// Optional JSON export of the full run output.
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_parses_canonical_label() {
        let w = Wave::parse("2016-2Trim");
        assert_eq!(w.year, 2016);
        assert_eq!(w.quarter, 2);
        assert_eq!(w.label, "2016-2Trim");
        assert!(w.is_recognized());
    }

    #[test]
    fn wave_parses_quarterly_file_stem() {
        let w = Wave::parse("usu_individual_t316");
        assert_eq!(w.year, 2016);
        assert_eq!(w.quarter, 3);
        assert_eq!(w.label, "2016-3Trim");
    }

    #[test]
    fn wave_parses_household_file_stem() {
        let w = Wave::parse("usu_hogar_t117");
        assert_eq!(w.year, 2017);
        assert_eq!(w.quarter, 1);
    }

    #[test]
    fn wave_parses_totals_stem() {
        let w = Wave::parse("Individual-2021-4T");
        assert_eq!(w.year, 2021);
        assert_eq!(w.quarter, 4);
        assert_eq!(w.label, "2021-4Trim");
    }

    #[test]
    fn malformed_wave_sorts_first_instead_of_failing() {
        let w = Wave::parse("notes");
        assert!(!w.is_recognized());
        assert_eq!(w.sort_key(), 0);
        assert_eq!(w.label, "notes");
        assert!(w < Wave::parse("2016-2Trim"));
    }

    #[test]
    fn waves_sort_chronologically() {
        let mut labels = ["2017-1Trim", "2016-4Trim", "2016-2Trim"]
            .map(Wave::parse)
            .to_vec();
        labels.sort();
        let sorted: Vec<&str> = labels.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(sorted, ["2016-2Trim", "2016-4Trim", "2017-1Trim"]);
    }

    #[test]
    fn quarter_out_of_range_is_unrecognized() {
        assert!(!Wave::parse("2016-5Trim").is_recognized());
        assert!(!Wave::parse("usu_individual_t916").is_recognized());
    }

    #[test]
    fn time_series_orders_entries_by_wave() {
        let series = TimeSeries::from_entries(vec![
            (Wave::parse("2017-1Trim"), 1),
            (Wave::parse("2016-2Trim"), 2),
        ]);
        assert_eq!(series.labels(), ["2016-2Trim", "2017-1Trim"]);
        assert_eq!(series.get("2017-1Trim"), Some(&1));
        assert_eq!(series.get("2018-1Trim"), None);
    }

    #[test]
    fn indicator_encoding_matches_estado_codes() {
        assert_eq!(Indicator::Activity.encode(1), 1.0);
        assert_eq!(Indicator::Activity.encode(2), 1.0);
        assert_eq!(Indicator::Activity.encode(3), 0.0);
        assert_eq!(Indicator::Employment.encode(2), 0.0);
        assert_eq!(Indicator::Unemployment.encode(2), 1.0);
        assert!(Indicator::Unemployment.labor_force_only());
        assert!(!Indicator::Activity.labor_force_only());
    }
}
