//! Analyzer stage: attach a sentiment label and confidence to every cleaned
//! record.

pub mod analyzer;
pub mod classifier;
pub mod error;
pub mod labels;
pub mod text;

use std::path::Path;

use compwatch_core::{
    read_dataset, write_dataset, AnalysisSettings, CleanRecord, Schema, SentimentLabel,
};

pub use analyzer::{AnalysisReport, Analyzer};
pub use classifier::{Classifier, LexiconClassifier, RemoteClassifier, SentimentClassifier};
pub use error::{AnalysisError, ClassifierError};
pub use labels::{normalize_label, RawPrediction};

/// Reads the cleaned dataset at `input`, classifies it with `classifier`, and
/// writes the enriched dataset to `output`.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the input cannot be read or has the wrong
/// schema, or if the output cannot be written. Classification failures never
/// fail the stage.
pub async fn analyze_file<C: SentimentClassifier>(
    classifier: C,
    settings: &AnalysisSettings,
    input: &Path,
    output: &Path,
) -> Result<AnalysisReport, AnalysisError> {
    let records: Vec<CleanRecord> = read_dataset(input, Schema::Cleaned)?;
    let analyzer = Analyzer::new(classifier, settings)?;
    let (enriched, report) = analyzer.analyze(records).await;

    write_dataset(output, Schema::Enriched, &enriched)?;
    tracing::info!(
        rows = report.rows,
        classifier = %report.classifier,
        positive = report.count(SentimentLabel::Positive),
        negative = report.count(SentimentLabel::Negative),
        unknown = report.count(SentimentLabel::Unknown),
        path = %output.display(),
        "enriched dataset written"
    );
    Ok(report)
}

/// Builds the configured classifier and runs [`analyze_file`].
///
/// # Errors
///
/// Returns [`AnalysisError::ClassifierInit`] if the classifier cannot be
/// initialized, otherwise see [`analyze_file`].
pub async fn run_analyze(
    settings: &AnalysisSettings,
    input: &Path,
    output: &Path,
) -> Result<AnalysisReport, AnalysisError> {
    let classifier = Classifier::from_settings(settings).await?;
    analyze_file(classifier, settings, input, output).await
}
