//! Sentiment classifiers.
//!
//! The analyzer treats a classifier as a pure function from a batch of texts
//! to one prediction per text. [`Classifier`] selects the configured backend.

mod lexicon;
mod remote;

use std::future::Future;
use std::time::Duration;

use compwatch_core::{AnalysisSettings, ClassifierKind};

use crate::error::{AnalysisError, ClassifierError};
use crate::labels::RawPrediction;

pub use lexicon::{lexicon_polarity, LexiconClassifier};
pub use remote::RemoteClassifier;

pub trait SentimentClassifier {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Classifies every text of `texts`, returning predictions in input order.
    fn classify_batch(
        &self,
        texts: &[&str],
    ) -> impl Future<Output = Result<Vec<RawPrediction>, ClassifierError>> + Send;
}

/// The classifier selected by `analysis.classifier`.
#[derive(Debug)]
pub enum Classifier {
    Lexicon(LexiconClassifier),
    Remote(RemoteClassifier),
}

impl Classifier {
    /// Builds the configured classifier. The remote backend is probed once so
    /// an unreachable server fails the stage before any record is read.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ClassifierInit`] if the remote backend is
    /// misconfigured or its health probe fails.
    pub async fn from_settings(settings: &AnalysisSettings) -> Result<Self, AnalysisError> {
        match settings.classifier {
            ClassifierKind::Lexicon => Ok(Classifier::Lexicon(LexiconClassifier::new(
                settings.neutral_threshold,
            ))),
            ClassifierKind::Remote => {
                let url = settings.remote_url.as_deref().ok_or_else(|| {
                    AnalysisError::ClassifierInit {
                        classifier: "remote".to_owned(),
                        reason: "analysis.remote_url is not set".to_owned(),
                    }
                })?;
                let timeout = Duration::from_secs(settings.batch_timeout_secs.unwrap_or(60));
                let remote = RemoteClassifier::connect(url, timeout).await?;
                Ok(Classifier::Remote(remote))
            }
        }
    }
}

impl SentimentClassifier for Classifier {
    fn name(&self) -> &str {
        match self {
            Classifier::Lexicon(c) => c.name(),
            Classifier::Remote(c) => c.name(),
        }
    }

    async fn classify_batch(&self, texts: &[&str]) -> Result<Vec<RawPrediction>, ClassifierError> {
        match self {
            Classifier::Lexicon(c) => c.classify_batch(texts).await,
            Classifier::Remote(c) => c.classify_batch(texts).await,
        }
    }
}
