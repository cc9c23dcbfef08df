//! Failure taxonomy shared by every stage of the run.

use chrono::NaiveDate;
use thiserror::Error;

/// Exit status of a run interrupted by the user (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Error)]
pub enum PalError {
    /// Invalid request or telescope description, raised before any network activity
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Retries exhausted, or a terminal non-success status
    #[error("catalog unavailable after {attempts} attempt(s): {last_failure}")]
    CatalogUnavailable { attempts: u32, last_failure: String },

    /// The Sun never drops below the astronomical twilight threshold
    #[error("no astronomical night for telescope '{telescope}' on {date}")]
    NoAstronomicalNight { telescope: String, date: NaiveDate },

    /// Payload present but missing its expected structure
    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),

    #[error("run cancelled by user")]
    Cancelled,
}

impl PalError {
    pub fn config(msg: impl Into<String>) -> Self {
        PalError::Configuration(msg.into())
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PalError::Configuration(_) => 2,
            PalError::CatalogUnavailable { .. } | PalError::MalformedResponse(_) => 3,
            PalError::NoAstronomicalNight { .. } => 4,
            PalError::Cancelled => EXIT_CANCELLED,
        }
    }
}

pub type PalResult<T> = std::result::Result<T, PalError>;

/// Exit status for a run error; anything not raised as a `PalError` is 1.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<PalError>()
        .map(PalError::exit_code)
        .unwrap_or(1)
}
