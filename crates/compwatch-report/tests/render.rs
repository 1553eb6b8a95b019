//! Spreadsheet rendering against real files.

use chrono::{TimeZone, Utc};
use compwatch_core::{write_dataset, EnrichedRecord, ReportSettings, Schema, SentimentLabel};
use compwatch_report::{render_report, run_report, RenderError};
use tempfile::TempDir;

fn rec(id: &str, category: &str, price: f64, label: SentimentLabel, day: u32) -> EnrichedRecord {
    EnrichedRecord {
        id: Some(id.to_owned()),
        name: format!("Product {id}"),
        price,
        description: Some("solid build".to_owned()),
        category: category.to_owned(),
        collected_at: Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
        sentiment_label: label,
        sentiment_score: 0.75,
    }
}

/// Returns the raw bytes of the written `.xlsx` archive as lossy text, enough
/// to look for part names in the zip directory.
fn archive_text(path: &std::path::Path) -> String {
    String::from_utf8_lossy(&std::fs::read(path).unwrap()).into_owned()
}

#[test]
fn empty_dataset_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("dashboard.xlsx");

    let result = render_report(&[], &ReportSettings::default(), &output, Utc::now());

    assert!(matches!(result, Err(RenderError::EmptyDataset)));
    assert!(!output.exists());
    assert!(!output.parent().unwrap().exists());
}

#[test]
fn writes_three_sheets_with_charts() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("nested").join("dashboard.xlsx");
    let rows = vec![
        rec("1", "Tools", 10.0, SentimentLabel::Positive, 1),
        rec("2", "Home", 25.5, SentimentLabel::Negative, 1),
        rec("3", "Tools", 99.0, SentimentLabel::Neutral, 2),
    ];

    let outcome = render_report(&rows, &ReportSettings::default(), &output, Utc::now()).unwrap();

    assert_eq!(outcome.rows, 3);
    assert_eq!(outcome.path, output);
    assert!(!outcome.insights.is_empty());

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    let text = archive_text(&output);
    assert!(text.contains("xl/worksheets/sheet1.xml"));
    assert!(text.contains("xl/worksheets/sheet3.xml"));
    assert!(!text.contains("xl/worksheets/sheet4.xml"));
    // pie, column and the run trend line
    assert!(text.contains("xl/charts/chart1.xml"));
    assert!(text.contains("xl/charts/chart3.xml"));
}

#[test]
fn single_run_has_no_trend_chart() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dashboard.xlsx");
    let rows = vec![
        rec("1", "Tools", 10.0, SentimentLabel::Positive, 1),
        rec("2", "Tools", 12.0, SentimentLabel::Positive, 1),
    ];

    render_report(&rows, &ReportSettings::default(), &output, Utc::now()).unwrap();

    let text = archive_text(&output);
    assert!(text.contains("xl/charts/chart2.xml"));
    assert!(!text.contains("xl/charts/chart3.xml"));
}

#[test]
fn run_report_reads_enriched_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("products_analyzed.csv");
    let output = dir.path().join("report.xlsx");
    write_dataset(
        &input,
        Schema::Enriched,
        &[rec("1", "Tools", 10.0, SentimentLabel::Unknown, 1)],
    )
    .unwrap();

    let outcome = run_report(&input, &output, &ReportSettings::default()).unwrap();

    assert_eq!(outcome.rows, 1);
    assert!(output.exists());
}

#[test]
fn run_report_rejects_cleaned_schema() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("products_clean.csv");
    std::fs::write(
        &input,
        "id,name,price,description,category,collected_at\n1,a,2.0,,Tools,2024-05-01T08:00:00Z\n",
    )
    .unwrap();

    let result = run_report(&input, &dir.path().join("r.xlsx"), &ReportSettings::default());

    assert!(matches!(result, Err(RenderError::Schema(_))));
}

#[test]
fn header_only_file_is_empty_dataset() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("products_analyzed.csv");
    let none: [EnrichedRecord; 0] = [];
    write_dataset(&input, Schema::Enriched, &none).unwrap();

    let output = dir.path().join("r.xlsx");
    let result = run_report(&input, &output, &ReportSettings::default());

    assert!(matches!(result, Err(RenderError::EmptyDataset)));
    assert!(!output.exists());
}

#[test]
fn oversized_text_is_truncated_not_fatal() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dashboard.xlsx");
    let mut long = rec("1", "Tools", 10.0, SentimentLabel::Positive, 1);
    long.description = Some("é".repeat(40_000));
    long.name = "n".repeat(33_000);
    let rows = vec![long, rec("2", "Tools", 12.0, SentimentLabel::Neutral, 1)];

    let outcome = render_report(&rows, &ReportSettings::default(), &output, Utc::now()).unwrap();

    assert_eq!(outcome.rows, 2);
    assert!(output.exists());
}
