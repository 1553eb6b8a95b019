use std::collections::BTreeMap;

use compwatch_core::{
    parse_timestamp, CleanRecord, CleaningSettings, Field, MissingPolicy, RawRecord, Rejection,
};

use crate::coerce::{collapse_whitespace, parse_price, present, title_case};
use crate::dedup::{dedup, dedup_cleaned};

/// Counters and quarantined rows from one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    /// Rows dropped by a `drop-row` policy, per field.
    pub dropped: BTreeMap<Field, usize>,
    /// Values imputed by `fill-default` or `fill-mean`, per field.
    pub filled: BTreeMap<Field, usize>,
    /// Rows set aside, including `drop-row` drops. `row` is 1-based.
    pub rejects: Vec<Rejection>,
    pub output_rows: usize,
}

/// Result of [`clean_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cleaned {
    pub records: Vec<CleanRecord>,
    pub report: CleaningReport,
}

/// Deduplicates, applies missing-value policies and coerces types.
///
/// Row-level problems never fail the pass; they end up in
/// [`CleaningReport::rejects`].
#[must_use]
pub fn clean_records(records: Vec<RawRecord>, settings: &CleaningSettings) -> Cleaned {
    let mut report = CleaningReport {
        input_rows: records.len(),
        ..CleaningReport::default()
    };

    let (survivors, removed) = dedup(records);
    report.duplicates_removed = removed;

    let price_mean = mean_price(&survivors, settings);
    let mut out = Vec::with_capacity(survivors.len());

    for (idx, mut record) in survivors {
        let outcome = apply_policies(&mut record, settings, price_mean, &mut report)
            .and_then(|()| coerce(&record, settings));
        match outcome {
            Ok(clean) => out.push(clean),
            Err(reason) => {
                tracing::debug!(row = idx + 1, id = ?record.id, %reason, "row quarantined");
                report.rejects.push(Rejection {
                    row: idx + 1,
                    id: present(record.id.as_deref()).map(str::to_owned),
                    reason,
                });
            }
        }
    }

    let (records, collapsed) = dedup_cleaned(out);
    report.duplicates_removed += collapsed;
    report.output_rows = records.len();
    Cleaned {
        records,
        report,
    }
}

/// Mean of the valid prices among the deduplicated rows, if any.
#[allow(clippy::cast_precision_loss)]
fn mean_price(rows: &[(usize, RawRecord)], settings: &CleaningSettings) -> Option<f64> {
    let prices: Vec<f64> = rows
        .iter()
        .filter_map(|(_, r)| present(r.price.as_deref()))
        .filter_map(|p| parse_price(p, settings.price_range).ok())
        .collect();
    (!prices.is_empty()).then(|| prices.iter().sum::<f64>() / prices.len() as f64)
}

fn apply_policies(
    record: &mut RawRecord,
    settings: &CleaningSettings,
    price_mean: Option<f64>,
    report: &mut CleaningReport,
) -> Result<(), String> {
    for field in Field::ALL {
        if present(record.get(field)).is_some() {
            continue;
        }
        match settings.policy_for(field) {
            MissingPolicy::DropRow => {
                *report.dropped.entry(field).or_default() += 1;
                return Err(format!("missing {field}"));
            }
            MissingPolicy::FillDefault { default } => {
                record.set(field, Some(default.to_string()));
                *report.filled.entry(field).or_default() += 1;
            }
            MissingPolicy::FillMean => {
                let mean = price_mean.ok_or_else(|| "no values to compute mean".to_owned())?;
                record.set(field, Some(mean.to_string()));
                *report.filled.entry(field).or_default() += 1;
            }
            MissingPolicy::Keep => record.set(field, None),
        }
    }
    Ok(())
}

fn coerce(record: &RawRecord, settings: &CleaningSettings) -> Result<CleanRecord, String> {
    let name = present(record.name.as_deref())
        .map(collapse_whitespace)
        .ok_or_else(|| "missing name".to_owned())?;
    let price_raw = present(record.price.as_deref()).ok_or_else(|| "missing price".to_owned())?;
    let price = parse_price(price_raw, settings.price_range)?;
    let ts_raw = present(record.collected_at.as_deref())
        .ok_or_else(|| "missing collected_at".to_owned())?;
    let collected_at =
        parse_timestamp(ts_raw).ok_or_else(|| format!("invalid collected_at '{ts_raw}'"))?;

    Ok(CleanRecord {
        id: present(record.id.as_deref()).map(str::to_owned),
        name,
        price,
        description: present(record.description.as_deref()).map(collapse_whitespace),
        category: present(record.category.as_deref())
            .map(title_case)
            .unwrap_or_default(),
        collected_at,
    })
}

#[cfg(test)]
#[path = "clean_test.rs"]
mod tests;
