use compwatch_core::DatasetError;
use thiserror::Error;

/// Stage-level failure. Only classifier setup and dataset I/O are fatal;
/// per-record classification failures degrade to the `unknown` label.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to initialize {classifier} classifier: {reason}")]
    ClassifierInit { classifier: String, reason: String },

    #[error("invalid text pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unrecognized input schema: {0}")]
    Schema(#[source] DatasetError),

    #[error(transparent)]
    Dataset(DatasetError),
}

impl From<DatasetError> for AnalysisError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::SchemaMismatch { .. } => AnalysisError::Schema(err),
            other => AnalysisError::Dataset(other),
        }
    }
}

/// Failure of one classifier call.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference server returned status {status}")]
    Status { status: u16 },

    #[error("invalid inference response: {0}")]
    InvalidResponse(String),

    #[error("classifier returned {got} predictions for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("classifier call timed out after {secs}s")]
    Timeout { secs: u64 },
}
