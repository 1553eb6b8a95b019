use compwatch_core::SentimentLabel;

use crate::kpi::KpiSummary;

const MAX_NAME_CHARS: usize = 50;
const POSITIVE_SHARE_HIGH: f64 = 0.70;
const NEGATIVE_SHARE_HIGH: f64 = 0.30;

fn short_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_CHARS {
        return name.to_owned();
    }
    let mut out: String = name.chars().take(MAX_NAME_CHARS).collect();
    out.push_str("...");
    out
}

/// Derives the plain-text observations shown at the bottom of the summary
/// sheet.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn derive_insights(kpi: &KpiSummary) -> Vec<String> {
    let mut lines = Vec::new();
    let price = &kpi.price;

    if price.mean > price.median {
        lines.push(format!(
            "Mean price ${:.2} is above the median ${:.2}: a few high-priced products skew the range upward.",
            price.mean, price.median
        ));
    } else if price.mean < price.median {
        lines.push(format!(
            "Mean price ${:.2} is below the median ${:.2}: a few low-priced products pull the average down.",
            price.mean, price.median
        ));
    }

    if let Some(top) = kpi.categories.first() {
        let pct = top.count as f64 / kpi.total_rows as f64 * 100.0;
        lines.push(format!(
            "{} is the largest category with {} products ({pct:.1}% of the catalog).",
            top.name, top.count
        ));
    }

    let positive = kpi.share(SentimentLabel::Positive);
    let negative = kpi.share(SentimentLabel::Negative);
    if positive > POSITIVE_SHARE_HIGH {
        lines.push(format!(
            "Sentiment is strongly positive: {:.1}% of descriptions read positive.",
            positive * 100.0
        ));
    } else if negative > NEGATIVE_SHARE_HIGH {
        lines.push(format!(
            "Negative sentiment is high: {:.1}% of descriptions read negative.",
            negative * 100.0
        ));
    }

    if let Some(p) = kpi.most_expensive.first() {
        lines.push(format!(
            "Most expensive product: {} at ${:.2}.",
            short_name(&p.name),
            p.price
        ));
    }
    if let Some(p) = kpi.cheapest.first() {
        lines.push(format!(
            "Least expensive product: {} at ${:.2}.",
            short_name(&p.name),
            p.price
        ));
    }

    lines
}
