use compwatch_core::DatasetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response shape from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("server error {status} from {url}")]
    ServerError { status: u16, url: String },

    #[error("request rejected with HTTP {status} by {url}")]
    Rejected { status: u16, url: String },

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<CollectionError>,
    },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },

    #[error("invalid API URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid auth header: {reason}")]
    InvalidAuthHeader { reason: String },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
