use compwatch_core::DatasetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("enriched dataset is empty, nothing to report")]
    EmptyDataset,

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{rows} rows exceed the worksheet row limit")]
    TooManyRows { rows: usize },

    #[error("unrecognized input schema: {0}")]
    Schema(#[source] DatasetError),

    #[error(transparent)]
    Dataset(DatasetError),
}

impl From<DatasetError> for RenderError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::SchemaMismatch { .. } => RenderError::Schema(err),
            other => RenderError::Dataset(other),
        }
    }
}
