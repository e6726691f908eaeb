//! Wave-file discovery.
//!
//! The survey data tree follows the INDEC download layout:
//!
//! ```text
//! <data-dir>/periodo 2016/individual/usu_individual_t216.txt
//! <data-dir>/periodo 2016/hogar/usu_hogar_t216.txt
//! <data-dir>/2016-2024/individual/Individual-2016-2T.txt
//! ```
//!
//! Discovery is deterministic (sorted by path) and never touches file
//! contents; wave identifiers are parsed from file stems only.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Wave;
use crate::error::AppError;

/// The files backing one survey wave.
///
/// `household` is the derived path of the paired household-level file; it is
/// only required (and only opened) when the private-dwellings filter is on.
#[derive(Debug, Clone)]
pub struct WaveFiles {
    pub wave: Wave,
    pub individual: PathBuf,
    pub household: PathBuf,
}

/// Individual-level directory for one survey year.
pub fn year_dir(data_dir: &Path, year: u16) -> PathBuf {
    data_dir.join(format!("periodo {year}")).join("individual")
}

/// Individual-level directory of the 2016-2024 totals scan.
pub fn totals_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("2016-2024").join("individual")
}

/// Enumerate the `*.txt` wave files under `dir`, in deterministic order.
pub fn discover_waves(dir: &Path) -> Result<Vec<WaveFiles>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to read data directory '{}': {e}", dir.display()),
        )
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_txt(path) && path.is_file())
        .collect();
    files.sort();

    Ok(files
        .into_iter()
        .map(|path| {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let wave = Wave::parse(stem);
            let household = household_path(&path);
            WaveFiles {
                wave,
                individual: path,
                household,
            }
        })
        .collect())
}

/// Derive the paired household-level path from an individual-level path.
///
/// Both the directory name and the file name substitute `individual` ->
/// `hogar` (and the capitalized variant used by the totals layout).
pub fn household_path(individual: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in individual.iter() {
        match component.to_str() {
            Some(s) => out.push(swap_individual(s)),
            None => out.push(component),
        }
    }
    out
}

fn swap_individual(s: &str) -> String {
    s.replace("individual", "hogar").replace("Individual", "Hogar")
}

fn is_txt(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        == Some(true)
}
