//! Mapping of classifier output onto the fixed label set.

use compwatch_core::{SentimentLabel, SentimentResult};
use serde::Deserialize;

/// One prediction as returned by a classifier, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPrediction {
    pub label: String,
    pub score: f64,
}

impl RawPrediction {
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Maps model label vocabularies onto [`SentimentLabel`].
///
/// Understands plain names (`POSITIVE`, `neg`), indexed labels
/// (`LABEL_0` negative, `LABEL_1` neutral, `LABEL_2` positive) and star
/// ratings (`1 star` through `5 stars`). Returns `None` for anything else.
#[must_use]
pub fn normalize_label(raw: &str) -> Option<SentimentLabel> {
    let label = raw.trim().to_ascii_lowercase();
    match label.as_str() {
        "positive" | "pos" | "label_2" => return Some(SentimentLabel::Positive),
        "neutral" | "neu" | "label_1" => return Some(SentimentLabel::Neutral),
        "negative" | "neg" | "label_0" => return Some(SentimentLabel::Negative),
        _ => {}
    }

    let (stars, unit) = label.split_once(' ')?;
    if !matches!(unit, "star" | "stars") {
        return None;
    }
    match stars.parse::<u8>().ok()? {
        1 | 2 => Some(SentimentLabel::Negative),
        3 => Some(SentimentLabel::Neutral),
        4 | 5 => Some(SentimentLabel::Positive),
        _ => None,
    }
}

/// Converts a raw prediction into a bounded [`SentimentResult`].
///
/// Unrecognized labels and non-finite scores become the `unknown` sentinel.
#[must_use]
pub fn to_result(prediction: &RawPrediction) -> SentimentResult {
    match normalize_label(&prediction.label) {
        Some(label) => SentimentResult::new(label, prediction.score),
        None => SentimentResult::unknown(),
    }
}
