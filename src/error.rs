use std::path::PathBuf;

/// Top-level application error carrying a process exit code.
///
/// Exit codes:
/// - 2: usage / input problems (bad paths, unreadable data directory)
/// - 3: no usable data (no wave files, every wave skipped)
/// - 4: internal computation failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A typed per-wave, per-series failure.
///
/// These are the failures the wave aggregator catches and converts into skip
/// diagnostics: a wave that fails for one series never aborts the run, and a
/// statistics failure surfaces as a value of this type rather than as a NaN
/// silently propagated into a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveError {
    /// No usable observations after filtering (zero rows or zero total weight).
    EmptySample,
    /// A sampling weight was negative or non-finite.
    InvalidWeight(f64),
    /// A required variable or weight column is absent from the wave's data.
    MissingColumn(String),
    /// A required file (e.g. the paired household-level file) is absent.
    MissingFile(PathBuf),
}

impl std::fmt::Display for WaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaveError::EmptySample => {
                write!(f, "no usable observations after filtering")
            }
            WaveError::InvalidWeight(w) => {
                write!(f, "invalid sampling weight {w} (must be finite and >= 0)")
            }
            WaveError::MissingColumn(name) => {
                write!(f, "missing required column `{name}`")
            }
            WaveError::MissingFile(path) => {
                write!(f, "missing required file: {}", path.display())
            }
        }
    }
}

impl std::error::Error for WaveError {}
