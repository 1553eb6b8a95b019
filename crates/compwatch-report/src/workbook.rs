//! Three-sheet spreadsheet layout: `Summary`, `Data`, `Charts`.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use compwatch_core::{EnrichedRecord, Schema, SentimentLabel};
use rust_xlsxwriter::{Chart, ChartType, Color, Format, FormatAlign, Workbook, Worksheet};

use crate::error::RenderError;
use crate::kpi::{KpiSummary, ProductRef};

pub const SUMMARY_SHEET: &str = "Summary";
pub const DATA_SHEET: &str = "Data";
pub const CHARTS_SHEET: &str = "Charts";

/// Worksheet row limit, header row included.
const MAX_ROWS: usize = 1_048_576;

/// Longest string a single cell can hold, in characters.
pub(crate) const MAX_CELL_CHARS: usize = 32_767;

const HEADER_BLUE: u32 = 0x002E_75B6;

struct Formats {
    title: Format,
    header: Format,
    label: Format,
    currency: Format,
    percent: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(16),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_BLUE))
                .set_align(FormatAlign::Center),
            label: Format::new().set_bold(),
            currency: Format::new().set_num_format("$#,##0.00"),
            percent: Format::new().set_num_format("0.0%"),
        }
    }
}

fn row(n: usize) -> Result<u32, RenderError> {
    u32::try_from(n).map_err(|_| RenderError::TooManyRows { rows: n })
}

fn write_header(
    sheet: &mut Worksheet,
    at: u32,
    columns: &[&str],
    format: &Format,
) -> Result<(), RenderError> {
    for (col, name) in (0u16..).zip(columns) {
        sheet.write_string_with_format(at, col, *name, format)?;
    }
    Ok(())
}

/// Cuts `text` to [`MAX_CELL_CHARS`] characters.
pub(crate) fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => Cow::Owned(text[..end].to_owned()),
        None => Cow::Borrowed(text),
    }
}

/// Writes record-derived text, truncating values a cell cannot hold.
fn write_text(sheet: &mut Worksheet, r: u32, col: u16, text: &str) -> Result<(), RenderError> {
    let fitted = fit_cell(text);
    if let Cow::Owned(_) = fitted {
        tracing::warn!(
            sheet = %sheet.name(),
            row = r,
            col,
            chars = text.chars().count(),
            "cell text truncated to {MAX_CELL_CHARS} characters"
        );
    }
    sheet.write_string(r, col, fitted.as_ref())?;
    Ok(())
}

/// Builds the workbook in memory and saves it to `path`.
pub(crate) fn write_workbook(
    path: &std::path::Path,
    records: &[EnrichedRecord],
    kpi: &KpiSummary,
    insights: &[String],
    generated_at: DateTime<Utc>,
) -> Result<(), RenderError> {
    if records.len() >= MAX_ROWS {
        return Err(RenderError::TooManyRows {
            rows: records.len(),
        });
    }
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    workbook.push_worksheet(summary_sheet(kpi, insights, generated_at, &formats)?);
    workbook.push_worksheet(data_sheet(records, &formats)?);
    workbook.push_worksheet(charts_sheet(kpi, &formats)?);
    workbook.save(path)?;
    Ok(())
}

fn summary_sheet(
    kpi: &KpiSummary,
    insights: &[String],
    generated_at: DateTime<Utc>,
    f: &Formats,
) -> Result<Worksheet, RenderError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;
    sheet.set_column_width(0, 34)?;
    sheet.set_column_width(1, 18)?;
    sheet.set_column_width(2, 18)?;
    sheet.set_column_width(3, 14)?;

    sheet.merge_range(0, 0, 0, 3, "Competitor Monitoring Report", &f.title)?;
    sheet.write_string(
        1,
        0,
        format!(
            "Generated {}",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
    )?;

    let mut r = 3u32;
    write_header(&mut sheet, r, &["Metric", "Value"], &f.header)?;
    r += 1;

    let currency = Some(&f.currency);
    #[allow(clippy::cast_precision_loss)]
    let total = kpi.total_rows as f64;
    write_metric(&mut sheet, &mut r, "Total products", total, None, f)?;
    write_metric(&mut sheet, &mut r, "Mean price", kpi.price.mean, currency, f)?;
    write_metric(&mut sheet, &mut r, "Median price", kpi.price.median, currency, f)?;
    write_metric(&mut sheet, &mut r, "Minimum price", kpi.price.min, currency, f)?;
    write_metric(&mut sheet, &mut r, "Maximum price", kpi.price.max, currency, f)?;
    if let Some(std_dev) = kpi.price.std_dev {
        write_metric(&mut sheet, &mut r, "Price std. deviation", std_dev, currency, f)?;
    }
    if let Some(score) = kpi.mean_sentiment_score {
        let label = "Mean sentiment confidence";
        write_metric(&mut sheet, &mut r, label, score, Some(&f.percent), f)?;
    }
    #[allow(clippy::cast_precision_loss)]
    let runs = kpi.runs.len() as f64;
    write_metric(&mut sheet, &mut r, "Collection runs", runs, None, f)?;

    r += 1;
    write_header(&mut sheet, r, &["Sentiment", "Count", "Share"], &f.header)?;
    r += 1;
    for label in SentimentLabel::ALL {
        sheet.write_string(r, 0, label.as_str())?;
        sheet.write_number(r, 1, row(kpi.count(label))?)?;
        sheet.write_number_with_format(r, 2, kpi.share(label), &f.percent)?;
        r += 1;
    }

    r += 1;
    r = product_table(&mut sheet, r, "Most expensive", &kpi.most_expensive, f)?;
    r += 1;
    r = product_table(&mut sheet, r, "Cheapest", &kpi.cheapest, f)?;

    r += 1;
    sheet.write_string_with_format(r, 0, "Insights", &f.label)?;
    r += 1;
    for line in insights {
        write_text(&mut sheet, r, 0, line)?;
        r += 1;
    }

    Ok(sheet)
}

fn write_metric(
    sheet: &mut Worksheet,
    r: &mut u32,
    label: &str,
    value: f64,
    number_format: Option<&Format>,
    f: &Formats,
) -> Result<(), RenderError> {
    sheet.write_string_with_format(*r, 0, label, &f.label)?;
    match number_format {
        Some(fmt) => sheet.write_number_with_format(*r, 1, value, fmt)?,
        None => sheet.write_number(*r, 1, value)?,
    };
    *r += 1;
    Ok(())
}

fn product_table(
    sheet: &mut Worksheet,
    mut r: u32,
    title: &str,
    products: &[ProductRef],
    f: &Formats,
) -> Result<u32, RenderError> {
    sheet.write_string_with_format(r, 0, title, &f.label)?;
    r += 1;
    write_header(sheet, r, &["Name", "Category", "Price", "Sentiment"], &f.header)?;
    r += 1;
    for p in products {
        write_text(sheet, r, 0, &p.name)?;
        write_text(sheet, r, 1, &p.category)?;
        sheet.write_number_with_format(r, 2, p.price, &f.currency)?;
        sheet.write_string(r, 3, p.sentiment.as_str())?;
        r += 1;
    }
    Ok(r)
}

fn data_sheet(records: &[EnrichedRecord], f: &Formats) -> Result<Worksheet, RenderError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(DATA_SHEET)?;

    let columns = Schema::Enriched.columns();
    write_header(&mut sheet, 0, columns, &f.header)?;
    for (col, width) in (0u16..).zip([12, 40, 12, 60, 20, 22, 16, 16]) {
        sheet.set_column_width(col, width)?;
    }

    for (i, rec) in records.iter().enumerate() {
        let r = row(i + 1)?;
        write_text(&mut sheet, r, 0, rec.id.as_deref().unwrap_or_default())?;
        write_text(&mut sheet, r, 1, &rec.name)?;
        sheet.write_number_with_format(r, 2, rec.price, &f.currency)?;
        write_text(&mut sheet, r, 3, rec.description.as_deref().unwrap_or_default())?;
        write_text(&mut sheet, r, 4, &rec.category)?;
        sheet.write_string(
            r,
            5,
            rec.collected_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        sheet.write_string(r, 6, rec.sentiment_label.as_str())?;
        sheet.write_number_with_format(r, 7, rec.sentiment_score, &f.percent)?;
    }

    let last_col = u16::try_from(columns.len() - 1).unwrap_or(u16::MAX);
    sheet.autofilter(0, 0, row(records.len())?, last_col)?;
    sheet.set_freeze_panes(1, 0)?;
    Ok(sheet)
}

/// Chart source tables in columns A-B (sentiment), D-E (categories) and
/// G-I (runs), with the charts placed to the right.
fn charts_sheet(kpi: &KpiSummary, f: &Formats) -> Result<Worksheet, RenderError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(CHARTS_SHEET)?;
    sheet.set_column_width(0, 14)?;
    sheet.set_column_width(3, 22)?;
    sheet.set_column_width(6, 22)?;

    write_header(&mut sheet, 0, &["Sentiment", "Count"], &f.header)?;
    for (r, label) in (1u32..).zip(SentimentLabel::ALL) {
        sheet.write_string(r, 0, label.as_str())?;
        sheet.write_number(r, 1, row(kpi.count(label))?)?;
    }
    let labels_end = row(SentimentLabel::ALL.len())?;

    let mut pie = Chart::new(ChartType::Pie);
    pie.title().set_name("Sentiment distribution");
    pie.add_series()
        .set_name("Products")
        .set_categories((CHARTS_SHEET, 1, 0, labels_end, 0))
        .set_values((CHARTS_SHEET, 1, 1, labels_end, 1));
    sheet.insert_chart(0, 10, &pie)?;

    sheet.write_string_with_format(0, 3, "Category", &f.header)?;
    sheet.write_string_with_format(0, 4, "Mean price", &f.header)?;
    for (r, cat) in (1u32..).zip(&kpi.categories) {
        write_text(&mut sheet, r, 3, &cat.name)?;
        sheet.write_number_with_format(r, 4, cat.mean_price, &f.currency)?;
    }
    let categories_end = row(kpi.categories.len())?;

    let mut column = Chart::new(ChartType::Column);
    column.title().set_name("Mean price per category");
    column
        .add_series()
        .set_name("Mean price")
        .set_categories((CHARTS_SHEET, 1, 3, categories_end, 3))
        .set_values((CHARTS_SHEET, 1, 4, categories_end, 4));
    column.y_axis().set_name("Price");
    sheet.insert_chart(16, 10, &column)?;

    sheet.write_string_with_format(0, 6, "Collected at", &f.header)?;
    sheet.write_string_with_format(0, 7, "Mean price", &f.header)?;
    sheet.write_string_with_format(0, 8, "Products", &f.header)?;
    for (r, run) in (1u32..).zip(&kpi.runs) {
        sheet.write_string(
            r,
            6,
            run.collected_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        sheet.write_number_with_format(r, 7, run.mean_price, &f.currency)?;
        sheet.write_number(r, 8, row(run.count)?)?;
    }

    if kpi.runs.len() > 1 {
        let runs_end = row(kpi.runs.len())?;
        let mut line = Chart::new(ChartType::Line);
        line.title().set_name("Trend across collection runs");
        line.add_series()
            .set_name("Mean price")
            .set_categories((CHARTS_SHEET, 1, 6, runs_end, 6))
            .set_values((CHARTS_SHEET, 1, 7, runs_end, 7));
        line.add_series()
            .set_name("Products")
            .set_categories((CHARTS_SHEET, 1, 6, runs_end, 6))
            .set_values((CHARTS_SHEET, 1, 8, runs_end, 8));
        sheet.insert_chart(32, 10, &line)?;
    }

    Ok(sheet)
}
