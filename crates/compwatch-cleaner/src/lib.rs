//! Cleaner stage: deduplicate, impute or drop missing values, coerce types,
//! and quarantine rows that cannot be repaired.

pub mod clean;
pub mod coerce;
pub mod dedup;
pub mod error;

use std::path::Path;

use compwatch_core::{read_dataset, write_dataset, CleaningSettings, RawRecord, Schema};

pub use clean::{clean_records, Cleaned, CleaningReport};
pub use error::CleaningError;

/// Input and output files of one cleaning run.
#[derive(Debug, Clone, Copy)]
pub struct CleanPaths<'a> {
    pub input: &'a Path,
    pub cleaned: &'a Path,
    pub rejects: &'a Path,
}

/// Reads a raw (or previously cleaned) dataset, cleans it, and writes the
/// cleaned dataset plus the rejects file.
///
/// # Errors
///
/// - [`CleaningError::Schema`] if the input lacks raw-schema columns.
/// - [`CleaningError::EmptyDataset`] if the input has no rows.
/// - [`CleaningError::Dataset`] on any other read or write failure.
pub fn run_clean(
    paths: CleanPaths<'_>,
    settings: &CleaningSettings,
) -> Result<CleaningReport, CleaningError> {
    let records: Vec<RawRecord> = read_dataset(paths.input, Schema::Raw)?;
    if records.is_empty() {
        return Err(CleaningError::EmptyDataset {
            path: paths.input.display().to_string(),
        });
    }

    let Cleaned { records, report } = clean_records(records, settings);

    write_dataset(paths.cleaned, Schema::Cleaned, &records)?;
    write_dataset(paths.rejects, Schema::Rejects, &report.rejects)?;

    if !report.rejects.is_empty() {
        tracing::warn!(
            quarantined = report.rejects.len(),
            path = %paths.rejects.display(),
            "rows quarantined during cleaning"
        );
    }
    tracing::info!(
        rows_in = report.input_rows,
        rows_out = report.output_rows,
        duplicates = report.duplicates_removed,
        filled = report.filled.values().sum::<usize>(),
        path = %paths.cleaned.display(),
        "cleaned dataset written"
    );

    Ok(report)
}
