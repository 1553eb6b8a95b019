use std::collections::BTreeMap;
use std::time::Duration;

use compwatch_core::{
    AnalysisSettings, CleanRecord, EnrichedRecord, SentimentLabel, SentimentResult, TextField,
};

use crate::classifier::SentimentClassifier;
use crate::error::{AnalysisError, ClassifierError};
use crate::labels::{to_result, RawPrediction};
use crate::text::TextNormalizer;

/// Outcome counters for one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub classifier: String,
    pub rows: usize,
    pub labels: BTreeMap<SentimentLabel, usize>,
    /// Records with no classifiable text.
    pub empty_text: usize,
    /// Records whose classification failed even when retried alone.
    pub degraded: usize,
}

impl AnalysisReport {
    #[must_use]
    pub fn count(&self, label: SentimentLabel) -> usize {
        self.labels.get(&label).copied().unwrap_or(0)
    }
}

/// Batches records through a classifier and attaches a [`SentimentResult`]
/// to each one.
pub struct Analyzer<C> {
    classifier: C,
    normalizer: TextNormalizer,
    batch_size: usize,
    batch_timeout: Option<Duration>,
    text_field: TextField,
}

impl<C: SentimentClassifier> Analyzer<C> {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Pattern`] if the text normalizer cannot be built.
    pub fn new(classifier: C, settings: &AnalysisSettings) -> Result<Self, AnalysisError> {
        Ok(Self {
            classifier,
            normalizer: TextNormalizer::new(settings.max_input_chars)?,
            batch_size: settings.batch_size.max(1),
            batch_timeout: settings.batch_timeout_secs.map(Duration::from_secs),
            text_field: settings.text_field,
        })
    }

    /// Enriches every record. The output always has one row per input row,
    /// in input order.
    pub async fn analyze(&self, records: Vec<CleanRecord>) -> (Vec<EnrichedRecord>, AnalysisReport) {
        let mut report = AnalysisReport {
            classifier: self.classifier.name().to_owned(),
            rows: records.len(),
            ..AnalysisReport::default()
        };

        let texts: Vec<Option<String>> = records
            .iter()
            .map(|r| {
                let source = match self.text_field {
                    TextField::Description => r.description.as_deref(),
                    TextField::Name => Some(r.name.as_str()),
                };
                source.and_then(|s| self.normalizer.normalize(s))
            })
            .collect();

        let mut results = vec![SentimentResult::unknown(); records.len()];
        let pending: Vec<usize> = (0..records.len()).filter(|&i| texts[i].is_some()).collect();
        report.empty_text = records.len() - pending.len();

        for (batch_no, chunk) in pending.chunks(self.batch_size).enumerate() {
            let batch: Vec<&str> = chunk
                .iter()
                .filter_map(|&i| texts[i].as_deref())
                .collect();

            match self.call(&batch).await {
                Ok(predictions) => {
                    for (&i, p) in chunk.iter().zip(&predictions) {
                        results[i] = to_result(p);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        batch = batch_no + 1,
                        size = batch.len(),
                        error = %err,
                        "batch classification failed, retrying records one at a time"
                    );
                    for (&i, text) in chunk.iter().zip(&batch) {
                        match self.call(&[*text]).await {
                            Ok(mut single) => results[i] = to_result(&single.remove(0)),
                            Err(err) => {
                                tracing::debug!(row = i + 1, error = %err, "record left unclassified");
                                report.degraded += 1;
                            }
                        }
                    }
                }
            }
        }

        let enriched: Vec<EnrichedRecord> = records
            .into_iter()
            .zip(results)
            .map(|(record, sentiment)| {
                *report.labels.entry(sentiment.label).or_default() += 1;
                EnrichedRecord::from_clean(record, sentiment)
            })
            .collect();

        if report.degraded > 0 {
            tracing::warn!(degraded = report.degraded, "records fell back to unknown sentiment");
        }
        (enriched, report)
    }

    /// One classifier call, bounded by the batch timeout. A result with the
    /// wrong number of predictions counts as a failure.
    async fn call(&self, texts: &[&str]) -> Result<Vec<RawPrediction>, ClassifierError> {
        let fut = self.classifier.classify_batch(texts);
        let predictions = match self.batch_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ClassifierError::Timeout {
                    secs: limit.as_secs(),
                })??,
            None => fut.await?,
        };
        if predictions.len() != texts.len() {
            return Err(ClassifierError::CountMismatch {
                expected: texts.len(),
                got: predictions.len(),
            });
        }
        Ok(predictions)
    }
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
