use compwatch_core::DatasetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleaningError {
    #[error("input dataset {path} has no rows")]
    EmptyDataset { path: String },

    #[error("unrecognized input schema: {0}")]
    Schema(#[source] DatasetError),

    #[error(transparent)]
    Dataset(DatasetError),
}

impl From<DatasetError> for CleaningError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::SchemaMismatch { .. } => CleaningError::Schema(err),
            other => CleaningError::Dataset(other),
        }
    }
}
