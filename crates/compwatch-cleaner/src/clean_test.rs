use chrono::{TimeZone, Utc};
use compwatch_core::{FillValue, PriceRange};

use super::*;

fn raw(id: Option<&str>, name: Option<&str>, price: Option<&str>, ts: &str) -> RawRecord {
    RawRecord {
        id: id.map(str::to_owned),
        name: name.map(str::to_owned),
        price: price.map(str::to_owned),
        description: Some("  A   sturdy\nproduct ".to_owned()),
        category: Some(" home goods ".to_owned()),
        collected_at: Some(ts.to_owned()),
    }
}

fn settings_with(field: Field, policy: MissingPolicy) -> CleaningSettings {
    let mut settings = CleaningSettings::default();
    settings.missing.insert(field, policy);
    settings
}

fn fill_price_zero() -> CleaningSettings {
    settings_with(
        Field::Price,
        MissingPolicy::FillDefault {
            default: FillValue::Number(0.0),
        },
    )
}

#[test]
fn end_to_end_duplicate_and_fill_default() {
    let input = vec![
        raw(Some("X1"), Some("Alpha"), Some("19.99"), "2024-05-01T08:00:00Z"),
        raw(Some("X1"), Some("Alpha v2"), Some("21.00"), "2024-05-02T08:00:00Z"),
        raw(Some("C3"), Some("Gamma"), None, "2024-05-01T08:00:00Z"),
    ];

    let cleaned = clean_records(input, &fill_price_zero());

    assert_eq!(cleaned.records.len(), 2);
    let a = &cleaned.records[0];
    assert_eq!(a.id.as_deref(), Some("X1"));
    assert_eq!(a.name, "Alpha");
    assert!((a.price - 19.99).abs() < f64::EPSILON);
    let c = &cleaned.records[1];
    assert_eq!(c.id.as_deref(), Some("C3"));
    assert!(c.price.abs() < f64::EPSILON, "missing price must be filled with 0");
    assert_eq!(cleaned.report.duplicates_removed, 1);
    assert_eq!(cleaned.report.filled.get(&Field::Price), Some(&1));
    assert!(cleaned.report.rejects.is_empty());
}

#[test]
fn drop_row_quarantines_with_reason() {
    let input = vec![
        raw(Some("1"), Some("Ok"), Some("5"), "2024-05-01"),
        raw(Some("2"), None, Some("5"), "2024-05-01"),
    ];
    let cleaned = clean_records(input, &CleaningSettings::default());

    assert_eq!(cleaned.records.len(), 1);
    assert_eq!(cleaned.report.dropped.get(&Field::Name), Some(&1));
    assert_eq!(
        cleaned.report.rejects,
        vec![Rejection {
            row: 2,
            id: Some("2".to_owned()),
            reason: "missing name".to_owned(),
        }]
    );
}

#[test]
fn bad_values_are_quarantined_not_fatal() {
    let input = vec![
        raw(Some("1"), Some("Bad price"), Some("twelve"), "2024-05-01"),
        raw(Some("2"), Some("Bad time"), Some("3"), "last tuesday"),
        raw(Some("3"), Some("Fine"), Some("$1,250.50"), "2024-05-01 09:30:00"),
    ];
    let cleaned = clean_records(input, &CleaningSettings::default());

    assert_eq!(cleaned.records.len(), 1);
    assert!((cleaned.records[0].price - 1250.5).abs() < 1e-9);
    let reasons: Vec<_> = cleaned.report.rejects.iter().map(|r| r.reason.as_str()).collect();
    assert_eq!(reasons, ["invalid price 'twelve'", "invalid collected_at 'last tuesday'"]);
    assert_eq!(cleaned.report.rejects[1].row, 2);
}

#[test]
fn price_range_rejects_outliers() {
    let settings = CleaningSettings {
        price_range: Some(PriceRange {
            min: 0.0,
            max: 10_000.0,
        }),
        ..CleaningSettings::default()
    };
    let input = vec![
        raw(Some("1"), Some("Cheap"), Some("-3"), "2024-05-01"),
        raw(Some("2"), Some("Huge"), Some("99999"), "2024-05-01"),
        raw(Some("3"), Some("Normal"), Some("10000"), "2024-05-01"),
    ];
    let cleaned = clean_records(input, &settings);

    assert_eq!(cleaned.records.len(), 1);
    assert_eq!(cleaned.records[0].name, "Normal");
    assert_eq!(cleaned.report.rejects.len(), 2);
}

#[test]
fn fill_mean_uses_valid_prices() {
    let input = vec![
        raw(Some("1"), Some("A"), Some("10"), "2024-05-01"),
        raw(Some("2"), Some("B"), Some("30"), "2024-05-01"),
        raw(Some("3"), Some("C"), Some("  "), "2024-05-01"),
    ];
    let cleaned = clean_records(input, &settings_with(Field::Price, MissingPolicy::FillMean));

    assert_eq!(cleaned.records.len(), 3);
    assert!((cleaned.records[2].price - 20.0).abs() < 1e-9);
}

#[test]
fn fill_mean_without_values_quarantines() {
    let input = vec![raw(Some("1"), Some("A"), None, "2024-05-01")];
    let cleaned = clean_records(input, &settings_with(Field::Price, MissingPolicy::FillMean));

    assert!(cleaned.records.is_empty());
    assert_eq!(cleaned.report.rejects[0].reason, "no values to compute mean");
}

#[test]
fn normalizes_text_fields() {
    let input = vec![raw(Some(" 7 "), Some("  Desk  Lamp "), Some("12"), "2024-05-01")];
    let cleaned = clean_records(input, &CleaningSettings::default());

    let rec = &cleaned.records[0];
    assert_eq!(rec.id.as_deref(), Some("7"));
    assert_eq!(rec.name, "Desk Lamp");
    assert_eq!(rec.category, "Home Goods");
    assert_eq!(rec.description.as_deref(), Some("A sturdy product"));
    assert_eq!(rec.collected_at, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
}

#[test]
fn missing_category_gets_default() {
    let mut record = raw(Some("1"), Some("A"), Some("1"), "2024-05-01");
    record.category = Some(String::new());
    record.description = None;
    let cleaned = clean_records(vec![record], &CleaningSettings::default());

    assert_eq!(cleaned.records[0].category, "Uncategorized");
    assert!(cleaned.records[0].description.is_none());
    assert_eq!(cleaned.report.filled.get(&Field::Category), Some(&1));
}

#[test]
fn cleaning_cleaned_output_is_a_fixed_point() {
    let input = vec![
        raw(Some("1"), Some("  A "), Some("$10.10"), "2024-05-01 08:00:00"),
        raw(None, Some("B"), Some("3"), "2024-05-01"),
        raw(Some("1"), Some("A later"), Some("11"), "2024-06-01"),
        raw(Some("4"), Some("D"), None, "2024-05-01"),
    ];
    let settings = settings_with(Field::Price, MissingPolicy::FillMean);
    let first = clean_records(input, &settings);

    let as_raw: Vec<RawRecord> = first
        .records
        .iter()
        .map(|r| RawRecord {
            id: r.id.clone(),
            name: Some(r.name.clone()),
            price: Some(r.price.to_string()),
            description: r.description.clone(),
            category: Some(r.category.clone()),
            collected_at: Some(r.collected_at.to_rfc3339()),
        })
        .collect();
    let second = clean_records(as_raw, &settings);

    assert_eq!(second.records, first.records);
    assert_eq!(second.report.duplicates_removed, 0);
    assert!(second.report.rejects.is_empty());
    assert!(second.report.filled.is_empty());
}

fn reclean(records: &[CleanRecord]) -> Vec<RawRecord> {
    records
        .iter()
        .map(|r| RawRecord {
            id: r.id.clone(),
            name: Some(r.name.clone()),
            price: Some(r.price.to_string()),
            description: r.description.clone(),
            category: Some(r.category.clone()),
            collected_at: Some(r.collected_at.to_rfc3339()),
        })
        .collect()
}

#[test]
fn rows_without_id_that_clean_identically_collapse_in_one_pass() {
    let input = vec![
        raw(None, Some("Lamp"), Some("$10"), "2024-05-01"),
        raw(None, Some("Lamp"), Some("10"), "2024-05-01T00:00:00Z"),
        raw(None, Some(" Lamp"), Some("10.0"), "2024-05-01 00:00:00"),
    ];
    let settings = CleaningSettings::default();
    let first = clean_records(input, &settings);

    assert_eq!(first.records.len(), 1);
    assert_eq!(first.report.duplicates_removed, 2);

    let second = clean_records(reclean(&first.records), &settings);
    assert_eq!(second.records, first.records);
    assert_eq!(second.report.duplicates_removed, 0);
}

#[test]
fn imputed_rows_without_id_collapse_after_coercion() {
    let input = vec![
        raw(None, Some("Lamp"), None, "2024-05-01"),
        raw(None, Some("Lamp"), Some("0"), "2024-05-01"),
    ];
    let settings = fill_price_zero();
    let first = clean_records(input, &settings);

    assert_eq!(first.records.len(), 1);
    assert_eq!(first.report.duplicates_removed, 1);
    assert_eq!(first.report.output_rows, 1);

    let second = clean_records(reclean(&first.records), &settings);
    assert_eq!(second.records, first.records);
    assert_eq!(second.report.duplicates_removed, 0);
}

#[test]
fn comma_decimal_price_goes_to_rejects() {
    let input = vec![
        raw(Some("1"), Some("Euro"), Some("1.299,00"), "2024-05-01"),
        raw(Some("2"), Some("Plain"), Some("1,299.00"), "2024-05-01"),
    ];
    let cleaned = clean_records(input, &CleaningSettings::default());

    assert_eq!(cleaned.records.len(), 1);
    assert!((cleaned.records[0].price - 1299.0).abs() < 1e-9);
    assert_eq!(cleaned.report.rejects[0].row, 1);
    assert!(cleaned.report.rejects[0]
        .reason
        .contains("ambiguous decimal separator"));
}
