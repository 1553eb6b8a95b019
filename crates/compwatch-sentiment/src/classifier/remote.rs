//! Client for an HTTP text-classification inference server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, ClassifierError};
use crate::labels::RawPrediction;

use super::SentimentClassifier;

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a [&'a str],
}

/// Per-input answer: either a single prediction or every label with its
/// score, in which case the highest score wins.
#[derive(Deserialize)]
#[serde(untagged)]
enum PredictionEntry {
    Single(RawPrediction),
    Ranked(Vec<RawPrediction>),
}

impl PredictionEntry {
    fn best(self) -> Option<RawPrediction> {
        match self {
            PredictionEntry::Single(p) => Some(p),
            PredictionEntry::Ranked(all) => all
                .into_iter()
                .filter(|p| p.score.is_finite())
                .max_by(|a, b| a.score.total_cmp(&b.score)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    predict_url: String,
}

impl RemoteClassifier {
    /// Connects to the server at `base_url` and checks `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ClassifierInit`] if the client cannot be built
    /// or the health probe fails or returns a non-success status.
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let init_err = |reason: String| AnalysisError::ClassifierInit {
            classifier: "remote".to_owned(),
            reason,
        };
        let base = base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| init_err(e.to_string()))?;

        let health = client
            .get(format!("{base}/health"))
            .send()
            .await
            .map_err(|e| init_err(format!("health probe to {base} failed: {e}")))?;
        if !health.status().is_success() {
            return Err(init_err(format!(
                "health probe to {base} returned {}",
                health.status()
            )));
        }
        tracing::info!(url = base, "inference server reachable");

        Ok(Self {
            client,
            predict_url: format!("{base}/predict"),
        })
    }
}

impl SentimentClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    async fn classify_batch(&self, texts: &[&str]) -> Result<Vec<RawPrediction>, ClassifierError> {
        let response = self
            .client
            .post(&self.predict_url)
            .json(&PredictRequest { inputs: texts })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let entries: Vec<PredictionEntry> = serde_json::from_str(&body)
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
        if entries.len() != texts.len() {
            return Err(ClassifierError::CountMismatch {
                expected: texts.len(),
                got: entries.len(),
            });
        }

        Ok(entries
            .into_iter()
            .map(|entry| entry.best().unwrap_or_else(|| RawPrediction::new("", f64::NAN)))
            .collect())
    }
}
