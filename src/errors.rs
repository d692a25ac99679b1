use crate::config::ConfigError;
use crate::ingestion::SourceError;
use crate::nocodb::StoreError;
use crate::tiingo::RateClientError;

/// Exit status for a Ctrl-C interruption.
pub const EXIT_INTERRUPTED: i32 = 130;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("spreadsheet error: {0}")]
    Source(#[from] SourceError),

    #[error("table store error: {0}")]
    Store(#[from] StoreError),

    #[error("rate provider error: {0}")]
    Rates(#[from] RateClientError),

    #[error(
        "tables already contain records ({}); rerun with --mode append to add to them or --mode replace to re-import",
        tables.join(", ")
    )]
    ExistingData { tables: Vec<String> },

    #[error("Aborted.")]
    Interrupted,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}
