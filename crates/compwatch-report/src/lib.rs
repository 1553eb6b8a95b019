//! Visualizer stage: KPI aggregation and the spreadsheet report.

pub mod error;
pub mod insights;
pub mod kpi;
pub mod workbook;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compwatch_core::{read_dataset, EnrichedRecord, ReportSettings, Schema};

pub use error::RenderError;
pub use insights::derive_insights;
pub use kpi::{CategoryStat, KpiSummary, PriceStats, ProductRef, RunStat};
pub use workbook::{CHARTS_SHEET, DATA_SHEET, SUMMARY_SHEET};

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub rows: usize,
    pub path: PathBuf,
    pub insights: Vec<String>,
}

/// Renders `records` to the spreadsheet at `output`, creating its parent
/// directory when needed.
///
/// # Errors
///
/// Returns [`RenderError::EmptyDataset`] without touching the filesystem if
/// `records` is empty, otherwise any directory or spreadsheet write failure.
pub fn render_report(
    records: &[EnrichedRecord],
    settings: &ReportSettings,
    output: &Path,
    generated_at: DateTime<Utc>,
) -> Result<ReportOutcome, RenderError> {
    let kpi = KpiSummary::compute(records, settings.top_n)?;
    let insights = derive_insights(&kpi);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RenderError::OutputDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    workbook::write_workbook(output, records, &kpi, &insights, generated_at)?;

    tracing::info!(
        rows = kpi.total_rows,
        categories = kpi.categories.len(),
        runs = kpi.runs.len(),
        path = %output.display(),
        "report written"
    );
    Ok(ReportOutcome {
        rows: kpi.total_rows,
        path: output.to_path_buf(),
        insights,
    })
}

/// Reads the enriched dataset at `input` and renders it to `output`.
///
/// # Errors
///
/// Returns [`RenderError::Schema`] if `input` is not an enriched dataset,
/// otherwise see [`render_report`].
pub fn run_report(
    input: &Path,
    output: &Path,
    settings: &ReportSettings,
) -> Result<ReportOutcome, RenderError> {
    let records: Vec<EnrichedRecord> = read_dataset(input, Schema::Enriched)?;
    render_report(&records, settings, output, Utc::now())
}
