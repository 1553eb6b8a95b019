//! Duplicate removal.
//!
//! Records are keyed by their trimmed `id`. Records without an id are keyed
//! by a SHA-256 over their field values in cleaned form: whitespace
//! collapsed, category title-cased, price and `collected_at` parsed. Rows
//! that clean to the same content therefore collapse together.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};
use compwatch_core::{parse_timestamp, CleanRecord, RawRecord};
use sha2::{Digest, Sha256};

use crate::coerce::{collapse_whitespace, parse_price, present, title_case};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Id(String),
    Content(String),
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn content_key(name: &str, price: &str, description: &str, category: &str, ts: &str) -> String {
    let mut hasher = Sha256::new();
    for value in [name, price, description, category, ts] {
        hasher.update(value.as_bytes());
        hasher.update([0x1f]);
    }
    format!("{:x}", hasher.finalize())
}

fn dedup_key(record: &RawRecord) -> DedupKey {
    if let Some(id) = present(record.id.as_deref()) {
        return DedupKey::Id(id.to_owned());
    }
    let text = |value: &Option<String>| {
        present(value.as_deref())
            .map(collapse_whitespace)
            .unwrap_or_default()
    };
    let price = present(record.price.as_deref()).map_or_else(String::new, |raw| {
        parse_price(raw, None).map_or_else(|_| collapse_whitespace(raw), |v| v.to_string())
    });
    let category = present(record.category.as_deref())
        .map(title_case)
        .unwrap_or_default();
    let ts = present(record.collected_at.as_deref()).map_or_else(String::new, |raw| {
        parse_timestamp(raw).map_or_else(|| collapse_whitespace(raw), rfc3339)
    });
    DedupKey::Content(content_key(
        &text(&record.name),
        &price,
        &text(&record.description),
        &category,
        &ts,
    ))
}

fn clean_key(record: &CleanRecord) -> Option<String> {
    if record.id.is_some() {
        return None;
    }
    Some(content_key(
        &record.name,
        &record.price.to_string(),
        record.description.as_deref().unwrap_or_default(),
        &record.category,
        &rfc3339(record.collected_at),
    ))
}

/// `true` if a record stamped `candidate` should replace one stamped
/// `current`. Parseable timestamps beat unparseable ones; ties keep the
/// incumbent.
fn is_earlier(candidate: Option<DateTime<Utc>>, current: Option<DateTime<Utc>>) -> bool {
    match (candidate, current) {
        (Some(c), Some(cur)) => c < cur,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Keeps one record per key: the one with the earliest `collected_at`.
///
/// Survivors keep their original input order and are returned with their
/// 0-based input index. The second value is the number of removed rows.
#[must_use]
pub fn dedup(records: Vec<RawRecord>) -> (Vec<(usize, RawRecord)>, usize) {
    let total = records.len();
    let mut winners: HashMap<DedupKey, (usize, Option<DateTime<Utc>>)> = HashMap::new();

    for (idx, record) in records.iter().enumerate() {
        let ts = record.collected_at.as_deref().and_then(parse_timestamp);
        winners
            .entry(dedup_key(record))
            .and_modify(|slot| {
                if is_earlier(ts, slot.1) {
                    *slot = (idx, ts);
                }
            })
            .or_insert((idx, ts));
    }

    let mut keep = vec![false; total];
    for (idx, _) in winners.values() {
        keep[*idx] = true;
    }

    let survivors: Vec<(usize, RawRecord)> = records
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep[*idx])
        .collect();
    let removed = total - survivors.len();
    (survivors, removed)
}

/// Drops id-less cleaned records whose content repeats an earlier one.
///
/// Imputation can make two rows identical that differed while a field was
/// missing; this sweep runs after coercion to catch them. Returns the
/// survivors in input order and the number removed.
#[must_use]
pub fn dedup_cleaned(records: Vec<CleanRecord>) -> (Vec<CleanRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::new();
    let survivors: Vec<CleanRecord> = records
        .into_iter()
        .filter(|record| clean_key(record).is_none_or(|key| seen.insert(key)))
        .collect();
    let removed = total - survivors.len();
    (survivors, removed)
}
