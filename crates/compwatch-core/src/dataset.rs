//! CSV persistence for stage datasets.
//!
//! Each stage writes one file with a fixed column order. Readers verify the
//! header before touching any row so a file from the wrong stage fails with a
//! [`DatasetError::SchemaMismatch`] instead of a confusing row-level error.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app_config::AppConfig;
use crate::DatasetError;

const RAW_COLUMNS: &[&str] = &["id", "name", "price", "description", "category", "collected_at"];
const ENRICHED_COLUMNS: &[&str] = &[
    "id",
    "name",
    "price",
    "description",
    "category",
    "collected_at",
    "sentiment_label",
    "sentiment_score",
];
const REJECT_COLUMNS: &[&str] = &["row", "id", "reason"];

/// Column layout of a stage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Raw,
    /// Same columns as [`Schema::Raw`], so cleaned files can be re-cleaned.
    Cleaned,
    Enriched,
    Rejects,
}

impl Schema {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Schema::Raw => "raw",
            Schema::Cleaned => "cleaned",
            Schema::Enriched => "enriched",
            Schema::Rejects => "rejects",
        }
    }

    #[must_use]
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Schema::Raw | Schema::Cleaned => RAW_COLUMNS,
            Schema::Enriched => ENRICHED_COLUMNS,
            Schema::Rejects => REJECT_COLUMNS,
        }
    }
}

/// Fixed file locations for every stage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub raw: PathBuf,
    pub cleaned: PathBuf,
    pub rejects: PathBuf,
    pub enriched: PathBuf,
    pub report: PathBuf,
}

impl DatasetPaths {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let paths = &config.paths;
        Self {
            raw: paths.raw_dir.join("products_raw.csv"),
            cleaned: paths.processed_dir.join("products_clean.csv"),
            rejects: paths.processed_dir.join("products_rejects.csv"),
            enriched: paths.processed_dir.join("products_analyzed.csv"),
            report: paths.output_dir.join(&config.report.file_name),
        }
    }
}

fn csv_err(path: &Path, source: csv::Error) -> DatasetError {
    DatasetError::Csv {
        path: path.display().to_string(),
        source,
    }
}

fn io_err(path: &Path, source: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Read every row of a stage file into `T`.
///
/// Extra columns are ignored; missing schema columns are an error.
///
/// # Errors
///
/// - [`DatasetError::NotFound`] if `path` does not exist.
/// - [`DatasetError::SchemaMismatch`] if any schema column is absent.
/// - [`DatasetError::Csv`] if a row cannot be parsed into `T`.
pub fn read_dataset<T: DeserializeOwned>(path: &Path, schema: Schema) -> Result<Vec<T>, DatasetError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DatasetError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            io_err(path, e)
        }
    })?;

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);
    let headers = reader.headers().map_err(|e| csv_err(path, e))?.clone();

    let missing: Vec<String> = schema
        .columns()
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::SchemaMismatch {
            path: path.display().to_string(),
            schema: schema.name(),
            missing,
        });
    }

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| csv_err(path, e))
}

/// Write `rows` to `path` under `schema`, replacing any previous file.
///
/// The header is always written, even for zero rows. Data goes to a sibling
/// temp file first and is renamed into place, so readers never observe a
/// half-written dataset.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] or [`DatasetError::Csv`] on write failure.
pub fn write_dataset<T: Serialize>(path: &Path, schema: Schema, rows: &[T]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&tmp)
        .map_err(|e| csv_err(&tmp, e))?;
    writer
        .write_record(schema.columns())
        .map_err(|e| csv_err(&tmp, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| csv_err(&tmp, e))?;
    }
    writer.flush().map_err(|e| io_err(&tmp, e))?;
    drop(writer);

    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))
}
