//! Aggregate statistics over an enriched dataset.
//!
//! Recomputed on every render; nothing here is persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use compwatch_core::{EnrichedRecord, SentimentLabel};

use crate::error::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; `None` with fewer than two rows.
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStat {
    pub name: String,
    pub count: usize,
    pub mean_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRef {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub sentiment: SentimentLabel,
}

/// Figures for one collection run (one distinct `collected_at`).
#[derive(Debug, Clone, PartialEq)]
pub struct RunStat {
    pub collected_at: DateTime<Utc>,
    pub count: usize,
    pub mean_price: f64,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub total_rows: usize,
    /// Every label, including zero counts.
    pub sentiment: BTreeMap<SentimentLabel, usize>,
    /// Mean confidence over rows with a known label.
    pub mean_sentiment_score: Option<f64>,
    pub price: PriceStats,
    /// Sorted by count descending, then name.
    pub categories: Vec<CategoryStat>,
    pub most_expensive: Vec<ProductRef>,
    pub cheapest: Vec<ProductRef>,
    /// Sorted by collection time.
    pub runs: Vec<RunStat>,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[allow(clippy::cast_precision_loss)]
fn price_stats(records: &[EnrichedRecord]) -> Option<PriceStats> {
    let mut prices: Vec<f64> = records.iter().map(|r| r.price).collect();
    prices.sort_by(f64::total_cmp);
    let n = prices.len();
    let mean = mean(prices.iter().copied())?;
    let median = if n % 2 == 1 {
        prices[n / 2]
    } else {
        (prices[n / 2 - 1] + prices[n / 2]) / 2.0
    };
    let std_dev = (n > 1).then(|| {
        let var = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    });
    Some(PriceStats {
        mean,
        median,
        min: prices[0],
        max: prices[n - 1],
        std_dev,
    })
}

fn product_ref(r: &EnrichedRecord) -> ProductRef {
    ProductRef {
        name: r.name.clone(),
        category: r.category.clone(),
        price: r.price,
        sentiment: r.sentiment_label,
    }
}

fn known_scores<'a>(records: impl Iterator<Item = &'a EnrichedRecord>) -> Option<f64> {
    mean(
        records
            .filter(|r| r.sentiment_label != SentimentLabel::Unknown)
            .map(|r| r.sentiment_score),
    )
}

impl KpiSummary {
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyDataset`] if `records` is empty.
    pub fn compute(records: &[EnrichedRecord], top_n: usize) -> Result<Self, RenderError> {
        let price = price_stats(records).ok_or(RenderError::EmptyDataset)?;

        let mut sentiment: BTreeMap<SentimentLabel, usize> =
            SentimentLabel::ALL.iter().map(|&l| (l, 0)).collect();
        for r in records {
            *sentiment.entry(r.sentiment_label).or_default() += 1;
        }

        let mut by_category: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for r in records {
            by_category.entry(r.category.as_str()).or_default().push(r.price);
        }
        let mut categories: Vec<CategoryStat> = by_category
            .into_iter()
            .map(|(name, prices)| CategoryStat {
                name: name.to_owned(),
                count: prices.len(),
                mean_price: mean(prices).unwrap_or_default(),
            })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        let mut by_price: Vec<&EnrichedRecord> = records.iter().collect();
        by_price.sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        let cheapest = by_price.iter().take(top_n).map(|r| product_ref(r)).collect();
        by_price.sort_by(|a, b| b.price.total_cmp(&a.price).then_with(|| a.name.cmp(&b.name)));
        let most_expensive = by_price.iter().take(top_n).map(|r| product_ref(r)).collect();

        let mut by_run: BTreeMap<DateTime<Utc>, Vec<&EnrichedRecord>> = BTreeMap::new();
        for r in records {
            by_run.entry(r.collected_at).or_default().push(r);
        }
        let runs = by_run
            .into_iter()
            .map(|(collected_at, rows)| RunStat {
                collected_at,
                count: rows.len(),
                mean_price: mean(rows.iter().map(|r| r.price)).unwrap_or_default(),
                mean_score: known_scores(rows.into_iter()),
            })
            .collect();

        Ok(Self {
            total_rows: records.len(),
            sentiment,
            mean_sentiment_score: known_scores(records.iter()),
            price,
            categories,
            most_expensive,
            cheapest,
            runs,
        })
    }

    #[must_use]
    pub fn count(&self, label: SentimentLabel) -> usize {
        self.sentiment.get(&label).copied().unwrap_or(0)
    }

    /// Share of rows with `label`, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, label: SentimentLabel) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.count(label) as f64 / self.total_rows as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn rec(name: &str, category: &str, price: f64, label: SentimentLabel, day: u32) -> EnrichedRecord {
        EnrichedRecord {
            id: None,
            name: name.to_owned(),
            price,
            description: None,
            category: category.to_owned(),
            collected_at: Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
            sentiment_label: label,
            sentiment_score: if label == SentimentLabel::Unknown { 0.0 } else { 0.8 },
        }
    }

    fn sample() -> Vec<EnrichedRecord> {
        vec![
            rec("A", "Tools", 10.0, SentimentLabel::Positive, 1),
            rec("B", "Tools", 20.0, SentimentLabel::Negative, 1),
            rec("C", "Home", 30.0, SentimentLabel::Positive, 2),
            rec("D", "Tools", 100.0, SentimentLabel::Unknown, 2),
        ]
    }

    #[test]
    fn empty_dataset_is_an_error() {
        assert!(matches!(
            KpiSummary::compute(&[], 5),
            Err(RenderError::EmptyDataset)
        ));
    }

    #[test]
    fn price_statistics() {
        let kpi = KpiSummary::compute(&sample(), 5).unwrap();
        assert!((kpi.price.mean - 40.0).abs() < 1e-9);
        assert!((kpi.price.median - 25.0).abs() < 1e-9);
        assert!((kpi.price.min - 10.0).abs() < 1e-9);
        assert!((kpi.price.max - 100.0).abs() < 1e-9);
        // sample variance of [10,20,30,100] = 5000/3
        let expected = (5000.0_f64 / 3.0).sqrt();
        assert!((kpi.price.std_dev.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn single_row_has_no_std_dev() {
        let kpi = KpiSummary::compute(&sample()[..1], 5).unwrap();
        assert!(kpi.price.std_dev.is_none());
        assert!((kpi.price.median - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sentiment_distribution_lists_every_label() {
        let kpi = KpiSummary::compute(&sample(), 5).unwrap();
        assert_eq!(kpi.sentiment.len(), 4);
        assert_eq!(kpi.count(SentimentLabel::Positive), 2);
        assert_eq!(kpi.count(SentimentLabel::Neutral), 0);
        assert!((kpi.share(SentimentLabel::Positive) - 0.5).abs() < 1e-9);
        // unknown rows are excluded from the mean score
        assert!((kpi.mean_sentiment_score.unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn categories_sorted_by_count() {
        let kpi = KpiSummary::compute(&sample(), 5).unwrap();
        assert_eq!(kpi.categories[0].name, "Tools");
        assert_eq!(kpi.categories[0].count, 3);
        assert!((kpi.categories[0].mean_price - 130.0 / 3.0).abs() < 1e-9);
        assert_eq!(kpi.categories[1].name, "Home");
    }

    #[test]
    fn top_and_bottom_respect_n() {
        let kpi = KpiSummary::compute(&sample(), 2).unwrap();
        let top: Vec<_> = kpi.most_expensive.iter().map(|p| p.name.as_str()).collect();
        let bottom: Vec<_> = kpi.cheapest.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(top, ["D", "C"]);
        assert_eq!(bottom, ["A", "B"]);
    }

    #[test]
    fn runs_grouped_by_collection_time() {
        let kpi = KpiSummary::compute(&sample(), 5).unwrap();
        assert_eq!(kpi.runs.len(), 2);
        assert_eq!(kpi.runs[0].count, 2);
        assert!((kpi.runs[0].mean_price - 15.0).abs() < 1e-9);
        assert!((kpi.runs[1].mean_price - 65.0).abs() < 1e-9);
        assert!((kpi.runs[1].mean_score.unwrap() - 0.8).abs() < 1e-9);
    }
}
