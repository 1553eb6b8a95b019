//! Record shapes persisted at each stage boundary.
//!
//! Every stage produces a new dataset; records are never edited in place.
//! Nullable columns are `Option` and serialize to an empty CSV cell.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cleanable fields of a record. `id` is the dedup key and is not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Price,
    Description,
    Category,
    CollectedAt,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Price,
        Field::Description,
        Field::Category,
        Field::CollectedAt,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Price => "price",
            Field::Description => "description",
            Field::Category => "category",
            Field::CollectedAt => "collected_at",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation exactly as collected. Every column is text and may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub collected_at: Option<String>,
}

impl RawRecord {
    /// Value of a cleanable field.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Price => self.price.as_deref(),
            Field::Description => self.description.as_deref(),
            Field::Category => self.category.as_deref(),
            Field::CollectedAt => self.collected_at.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Price => &mut self.price,
            Field::Description => &mut self.description,
            Field::Category => &mut self.category,
            Field::CollectedAt => &mut self.collected_at,
        };
        *slot = value;
    }
}

/// A record that passed cleaning: required fields present and typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub id: Option<String>,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub category: String,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    /// Sentinel for empty or unclassifiable text.
    Unknown,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 4] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
        SentimentLabel::Unknown,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output attached to a record. `score` is always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f64,
}

impl SentimentResult {
    /// Builds a result, clamping `score` into `[0, 1]`. A non-finite score
    /// yields [`SentimentResult::unknown`].
    #[must_use]
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        if !score.is_finite() || label == SentimentLabel::Unknown {
            return Self::unknown();
        }
        Self {
            label,
            score: score.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self {
            label: SentimentLabel::Unknown,
            score: 0.0,
        }
    }
}

/// A cleaned record plus its sentiment columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: Option<String>,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub category: String,
    pub collected_at: DateTime<Utc>,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
}

impl EnrichedRecord {
    #[must_use]
    pub fn from_clean(record: CleanRecord, sentiment: SentimentResult) -> Self {
        Self {
            id: record.id,
            name: record.name,
            price: record.price,
            description: record.description,
            category: record.category,
            collected_at: record.collected_at,
            sentiment_label: sentiment.label,
            sentiment_score: sentiment.score,
        }
    }
}

/// A row set aside by the cleaner, with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub row: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// Parses the timestamp formats seen in collected data.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and a bare
/// `YYYY-MM-DD`. Values without an offset are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
