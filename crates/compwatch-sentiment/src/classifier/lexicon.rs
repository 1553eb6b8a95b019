//! Offline lexicon classifier for product copy.

use crate::error::ClassifierError;
use crate::labels::RawPrediction;

use super::SentimentClassifier;

/// Product-vocabulary word weights.
///
/// Keys are lowercase single words. Positive weights lie in `(0.0, 1.0]`,
/// negative ones in `[-1.0, 0.0)`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("great", 0.4),
    ("good", 0.3),
    ("excellent", 0.5),
    ("perfect", 0.5),
    ("best", 0.5),
    ("love", 0.5),
    ("beautiful", 0.4),
    ("comfortable", 0.4),
    ("durable", 0.4),
    ("premium", 0.3),
    ("quality", 0.3),
    ("reliable", 0.4),
    ("stylish", 0.3),
    ("elegant", 0.3),
    ("soft", 0.2),
    ("lightweight", 0.2),
    ("fast", 0.2),
    ("easy", 0.3),
    ("recommend", 0.4),
    ("awesome", 0.5),
    ("amazing", 0.5),
    ("classic", 0.2),
    ("solid", 0.3),
    ("sturdy", 0.3),
    ("warm", 0.2),
    ("bright", 0.2),
    ("gift", 0.2),
    // Negative signals
    ("bad", -0.4),
    ("poor", -0.5),
    ("cheap", -0.3),
    ("broken", -0.6),
    ("defective", -0.7),
    ("flimsy", -0.5),
    ("terrible", -0.6),
    ("worst", -0.6),
    ("awful", -0.6),
    ("disappointing", -0.5),
    ("uncomfortable", -0.4),
    ("slow", -0.3),
    ("fragile", -0.4),
    ("faulty", -0.6),
    ("overpriced", -0.5),
    ("problem", -0.3),
    ("returned", -0.4),
    ("refund", -0.4),
    ("damaged", -0.6),
    ("waste", -0.5),
];

const NEGATORS: &[&str] = &["not", "no", "never", "isn't", "wasn't", "don't", "doesn't", "hardly"];

fn weight(word: &str) -> Option<f32> {
    LEXICON
        .iter()
        .find(|(w, _)| *w == word)
        .map(|&(_, weight)| weight)
}

/// Polarity of `text` in `[-1.0, 1.0]`.
///
/// Sums matching word weights; a negator flips the sign of the next word.
#[must_use]
pub fn lexicon_polarity(text: &str) -> f32 {
    let mut score = 0.0_f32;
    let mut negate = false;
    for raw in text.split_whitespace() {
        let word = raw
            .trim_matches(|c: char| !c.is_alphabetic() && c != '\'')
            .to_lowercase();
        if NEGATORS.contains(&word.as_str()) {
            negate = true;
            continue;
        }
        if let Some(w) = weight(&word) {
            score += if negate { -w } else { w };
        }
        negate = false;
    }
    score.clamp(-1.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    /// Polarity magnitude below which text is neutral.
    neutral_threshold: f32,
}

impl LexiconClassifier {
    #[must_use]
    pub fn new(neutral_threshold: f32) -> Self {
        Self { neutral_threshold }
    }

    #[must_use]
    pub fn classify(&self, text: &str) -> RawPrediction {
        let polarity = lexicon_polarity(text);
        let magnitude = f64::from(polarity.abs());
        if polarity.abs() < self.neutral_threshold {
            RawPrediction::new("neutral", 1.0 - magnitude)
        } else if polarity > 0.0 {
            RawPrediction::new("positive", 0.5 + magnitude / 2.0)
        } else {
            RawPrediction::new("negative", 0.5 + magnitude / 2.0)
        }
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn classify_batch(&self, texts: &[&str]) -> Result<Vec<RawPrediction>, ClassifierError> {
        Ok(texts.iter().map(|t| self.classify(t)).collect())
    }
}
