//! CSV ingest and sample extraction.
//!
//! EPH releases are `;`-delimited text files with upper-case column names.
//! This module turns one wave's file into filtered `(value, weight)` samples
//! that are safe to hand to the statistics engine.
//!
//! Design goals:
//! - **Typed schema errors** (`MissingColumn` / `MissingFile`) the aggregator
//!   can convert into skip diagnostics
//! - **Row-level tolerance**: unparseable rows are skipped but reported
//! - **Deterministic behavior**: input row order is preserved (the mode's
//!   tie-break depends on it)
//! - **Separation of concerns**: no statistics logic here

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{
    IncomeVariable, Indicator, MISSING_SENTINEL, PRIVATE_DWELLING_TYPES, Sample,
};
use crate::error::WaveError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Join key of the individual- and household-level files.
pub type HouseholdKey = (String, i64);

/// One wave's file, parsed into records with a normalized header map.
#[derive(Debug, Clone)]
pub struct WaveTable {
    header_map: HashMap<String, usize>,
    records: Vec<StringRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Row filters applied before sample extraction.
///
/// Each active filter requires its backing column; a missing column fails
/// with `MissingColumn` before any row is touched.
#[derive(Debug, Clone, Default)]
pub struct RowFilter<'a> {
    /// Keep rows whose `AGLOMERADO` code is in this set.
    pub aglomerados: Option<&'a [i64]>,
    /// Keep rows with this `REGION` code.
    pub region: Option<i64>,
    /// Keep rows with `CH06` (age) at or above this value.
    pub min_age: Option<i64>,
    /// Keep rows whose `(CODUSU, NRO_HOGAR)` key is in this set.
    pub households: Option<&'a HashSet<HouseholdKey>>,
}

/// Resolved column indices for the active filters.
struct FilterColumns {
    aglomerado: Option<usize>,
    region: Option<usize>,
    age: Option<usize>,
    household: Option<(usize, usize)>,
}

impl WaveTable {
    /// Load a wave file. An unopenable path is a `MissingFile`.
    pub fn load(path: &Path) -> Result<Self, WaveError> {
        let file = File::open(path).map_err(|_| WaveError::MissingFile(path.to_path_buf()))?;
        Ok(Self::from_reader(file))
    }

    /// Parse a `;`-delimited table from any reader (used by tests).
    pub fn from_reader<R: Read>(reader: R) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut row_errors = Vec::new();
        let header_map = match reader.headers() {
            Ok(headers) => build_header_map(headers),
            Err(e) => {
                // An unreadable header row leaves the table column-less; every
                // column lookup then fails with a MissingColumn skip, and the
                // underlying cause stays visible here.
                row_errors.push(RowError {
                    line: 1,
                    message: format!("Failed to read header row: {e}"),
                });
                HashMap::new()
            }
        };

        let mut records = Vec::new();
        let mut rows_read = 0usize;
        for (idx, result) in reader.records().enumerate() {
            // +2: records() starts after the header, and CSV lines are 1-based.
            let line = idx + 2;
            rows_read += 1;
            match result {
                Ok(record) => records.push(record),
                Err(e) => row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                }),
            }
        }

        Self {
            header_map,
            records,
            row_errors,
            rows_read,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header_map.contains_key(name)
    }

    fn column(&self, name: &str) -> Result<usize, WaveError> {
        self.header_map
            .get(name)
            .copied()
            .ok_or_else(|| WaveError::MissingColumn(name.to_string()))
    }

    /// Extract an income sample: the variable's value column weighted by its
    /// matching weight column, after row filters and sentinel exclusion.
    ///
    /// Rows with a missing/unparseable value or weight cell are excluded, as
    /// are rows whose value equals the `-9` "not applicable" sentinel.
    pub fn income_sample(
        &self,
        variable: IncomeVariable,
        filter: &RowFilter<'_>,
    ) -> Result<Sample, WaveError> {
        let value_idx = self.column(variable.column())?;
        let weight_idx = self.column(variable.weight_column())?;
        let columns = self.resolve_filter(filter)?;

        let mut sample = Sample::new();
        for record in &self.records {
            if !row_matches(record, filter, &columns) {
                continue;
            }
            let Some(value) = cell_f64(record, value_idx) else {
                continue;
            };
            if value == MISSING_SENTINEL {
                continue;
            }
            let Some(weight) = cell_f64(record, weight_idx) else {
                continue;
            };
            sample.push(value, weight);
        }
        Ok(sample)
    }

    /// Extract a 0/1 indicator sample from `ESTADO`, weighted by `PONDERA`.
    ///
    /// For denominator-restricted indicators (unemployment) rows outside the
    /// labor force are excluded before encoding, so the weighted mean is taken
    /// over the correct reference population.
    pub fn indicator_sample(
        &self,
        indicator: Indicator,
        filter: &RowFilter<'_>,
    ) -> Result<Sample, WaveError> {
        let estado_idx = self.column("ESTADO")?;
        let weight_idx = self.column("PONDERA")?;
        let columns = self.resolve_filter(filter)?;

        let mut sample = Sample::new();
        for record in &self.records {
            if !row_matches(record, filter, &columns) {
                continue;
            }
            let Some(estado) = cell_code(record, estado_idx) else {
                continue;
            };
            if indicator.labor_force_only() && Indicator::Activity.encode(estado) != 1.0 {
                continue;
            }
            let Some(weight) = cell_f64(record, weight_idx) else {
                continue;
            };
            sample.push(indicator.encode(estado), weight);
        }
        Ok(sample)
    }

    /// Join keys of the households living in private dwellings (`IV1` in
    /// {1, 2}), from a household-level table.
    pub fn private_household_keys(&self) -> Result<HashSet<HouseholdKey>, WaveError> {
        let codusu_idx = self.column("CODUSU")?;
        let nro_hogar_idx = self.column("NRO_HOGAR")?;
        let iv1_idx = self.column("IV1")?;

        let mut keys = HashSet::new();
        for record in &self.records {
            let Some(dwelling) = cell_code(record, iv1_idx) else {
                continue;
            };
            if !PRIVATE_DWELLING_TYPES.contains(&dwelling) {
                continue;
            }
            if let Some(key) = household_key(record, codusu_idx, nro_hogar_idx) {
                keys.insert(key);
            }
        }
        Ok(keys)
    }

    fn resolve_filter(&self, filter: &RowFilter<'_>) -> Result<FilterColumns, WaveError> {
        Ok(FilterColumns {
            aglomerado: filter
                .aglomerados
                .map(|_| self.column("AGLOMERADO"))
                .transpose()?,
            region: filter.region.map(|_| self.column("REGION")).transpose()?,
            age: filter.min_age.map(|_| self.column("CH06")).transpose()?,
            household: match filter.households {
                Some(_) => Some((self.column("CODUSU")?, self.column("NRO_HOGAR")?)),
                None => None,
            },
        })
    }
}

fn row_matches(record: &StringRecord, filter: &RowFilter<'_>, columns: &FilterColumns) -> bool {
    if let (Some(codes), Some(idx)) = (filter.aglomerados, columns.aglomerado) {
        match cell_code(record, idx) {
            Some(code) if codes.contains(&code) => {}
            _ => return false,
        }
    }
    if let (Some(region), Some(idx)) = (filter.region, columns.region) {
        if cell_code(record, idx) != Some(region) {
            return false;
        }
    }
    if let (Some(min_age), Some(idx)) = (filter.min_age, columns.age) {
        match cell_code(record, idx) {
            Some(age) if age >= min_age => {}
            _ => return false,
        }
    }
    if let (Some(keys), Some((codusu_idx, nro_hogar_idx))) = (filter.households, columns.household)
    {
        match household_key(record, codusu_idx, nro_hogar_idx) {
            Some(key) if keys.contains(&key) => {}
            _ => return false,
        }
    }
    true
}

fn household_key(
    record: &StringRecord,
    codusu_idx: usize,
    nro_hogar_idx: usize,
) -> Option<HouseholdKey> {
    let codusu = cell(record, codusu_idx)?.to_string();
    let nro_hogar = cell_code(record, nro_hogar_idx)?;
    Some((codusu, nro_hogar))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_uppercase()
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn cell_f64(record: &StringRecord, idx: usize) -> Option<f64> {
    let v = cell(record, idx)?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Small-integer categorical code (`ESTADO`, `REGION`, ...).
fn cell_code(record: &StringRecord, idx: usize) -> Option<i64> {
    let v = cell_f64(record, idx)?;
    if v.fract() == 0.0 && v.abs() < 1e15 {
        Some(v as i64)
    } else {
        None
    }
}
