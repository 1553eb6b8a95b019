//! Collector stage: fetch every product from the configured API and persist
//! the raw dataset.

pub mod client;
pub mod error;
pub mod pagination;
pub mod parse;
pub mod retry;

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use compwatch_core::{write_dataset, ApiSettings, Schema};

pub use client::{ApiClient, Collected};
pub use error::CollectionError;
pub use retry::RetryPolicy;

/// Summary of a finished collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub rows: usize,
    pub pages: usize,
    pub retries: u32,
    pub path: PathBuf,
}

/// Collects every record with `client` and writes them to `output`.
///
/// Nothing is written if any page fails. An empty collection still writes a
/// header-only file.
///
/// # Errors
///
/// Returns [`CollectionError`] on any request failure or if the raw dataset
/// cannot be written.
pub async fn collect_with(
    client: &ApiClient,
    output: &Path,
) -> Result<CollectionOutcome, CollectionError> {
    let collected_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let collected = client.fetch_all(&collected_at).await?;

    write_dataset(output, Schema::Raw, &collected.records)?;

    if collected.records.is_empty() {
        tracing::warn!(path = %output.display(), "API returned no records");
    }
    tracing::info!(
        rows = collected.records.len(),
        pages = collected.pages,
        retries = collected.retries,
        path = %output.display(),
        "raw dataset written"
    );

    Ok(CollectionOutcome {
        rows: collected.records.len(),
        pages: collected.pages,
        retries: collected.retries,
        path: output.to_path_buf(),
    })
}

/// Builds a client from `settings` and runs [`collect_with`].
///
/// # Errors
///
/// See [`ApiClient::new`] and [`collect_with`].
pub async fn collect(
    settings: &ApiSettings,
    output: &Path,
) -> Result<CollectionOutcome, CollectionError> {
    let client = ApiClient::new(settings)?;
    collect_with(&client, output).await
}
