mod common;

use std::process::Command;
use std::str::FromStr;

use chrono::NaiveDate;
use forecast_cell_extractor::{
    ExtractOptions, FailureReason, KeywordSpec, MatchSource, PageSelection, PdfDocument,
    extract_forecast, extract_forecast_from_bytes, mine,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use tempfile::tempdir;

fn options(row: &str, column: &str) -> ExtractOptions {
    let keywords = KeywordSpec::new([row], [column]).expect("keywords should be valid");
    ExtractOptions {
        reference_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        ..ExtractOptions::new(keywords)
    }
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal literal")
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[test]
fn extracts_forecast_value_and_issue_date() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("signal.pdf");
    common::write_report_pdf(&input, &[common::signal_report_lines()])
        .expect("PDF fixture should be created");

    let result = extract_forecast(&input, &options("Fiscal", "Forecast"))
        .expect("extraction should succeed");

    assert_eq!(result.value, dec("-26000"));
    assert_eq!(result.date, ymd(2025, 10, 3));
    assert!(
        matches!(result.source, MatchSource::Table { page: 1, .. }),
        "source: {:?}",
        result.source
    );
}

#[test]
fn follows_reordered_columns_and_rows() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("reordered.pdf");
    common::write_report_pdf(
        &input,
        &[vec![
            "Issued 2025/10/06.",
            "Forecast  Market  Item  Prev",
            "-31,500  -20,000  Fiscal  -1,000",
            "1,200  900  Notes  500",
        ]],
    )
    .expect("PDF fixture should be created");

    let result = extract_forecast(&input, &options("Fiscal", "Forecast"))
        .expect("extraction should succeed");
    assert_eq!(result.value, dec("-31500"));
    assert_eq!(result.date, ymd(2025, 10, 6));
}

#[test]
fn searches_tables_on_later_pages() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("multi.pdf");
    common::write_report_pdf(
        &input,
        &[
            vec!["Issued 2025/10/03.", "City  Pop  Rank", "A  10  1", "B  20  2"],
            common::signal_report_lines()[2..].to_vec(),
        ],
    )
    .expect("PDF fixture should be created");

    let document = PdfDocument::open(&input).expect("PDF should open");
    assert_eq!(document.page_count(), 2);
    let mined = mine(&document, None, 2).expect("mining should succeed");
    assert_eq!(mined.pages.len(), 2);
    assert_eq!(mined.tables.len(), 2);
    assert_eq!(mined.tables[0].page, 1);
    assert_eq!(mined.tables[1].page, 2);

    let result = extract_forecast(&input, &options("Fiscal", "Forecast"))
        .expect("extraction should succeed");
    assert_eq!(result.value, dec("-26000"));
    assert!(
        matches!(result.source, MatchSource::Table { page: 2, table_index: 1, .. }),
        "source: {:?}",
        result.source
    );
}

#[test]
fn page_selection_limits_the_search() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("selected.pdf");
    common::write_report_pdf(
        &input,
        &[
            vec!["Issued 2025/10/03.", "City  Pop  Rank", "A  10  1"],
            common::signal_report_lines()[2..].to_vec(),
        ],
    )
    .expect("PDF fixture should be created");

    let first_page_only = ExtractOptions {
        pages: Some(PageSelection::from_str("1").expect("selection should parse")),
        ..options("Fiscal", "Forecast")
    };
    let failure = extract_forecast(&input, &first_page_only).expect_err("page 2 is excluded");
    assert_eq!(failure.reason, FailureReason::NoMatch);
    assert_eq!(failure.diagnostics.pages_scanned, 1);
}

#[test]
fn falls_back_to_page_text_when_no_table_is_detected() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("text-only.pdf");
    common::write_report_pdf(
        &input,
        &[vec![
            "Issued 2025/10/03.",
            "Forecast",
            "Fiscal",
            "-26,000",
        ]],
    )
    .expect("PDF fixture should be created");

    let result = extract_forecast(&input, &options("Fiscal", "Forecast"))
        .expect("extraction should succeed");
    assert_eq!(result.value, dec("-26000"));
    assert!(
        matches!(result.source, MatchSource::Text { page: 1, .. }),
        "source: {:?}",
        result.source
    );
}

#[test]
fn missing_row_keyword_is_no_match() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("nomatch.pdf");
    common::write_report_pdf(&input, &[common::signal_report_lines()])
        .expect("PDF fixture should be created");

    let failure = extract_forecast(&input, &options("Treasury", "Forecast"))
        .expect_err("extraction should fail");
    assert_eq!(failure.reason, FailureReason::NoMatch);
    assert_eq!(failure.diagnostics.row_keywords, vec!["Treasury"]);
    assert_eq!(failure.diagnostics.column_keywords, vec!["Forecast"]);
    assert_eq!(failure.diagnostics.tables_scanned, 1);
}

#[test]
fn report_without_date_is_no_date_found() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("undated.pdf");
    common::write_report_pdf(&input, &[common::signal_report_lines()[2..].to_vec()])
        .expect("PDF fixture should be created");

    let failure = extract_forecast(&input, &options("Fiscal", "Forecast"))
        .expect_err("extraction should fail");
    assert_eq!(failure.reason, FailureReason::NoDateFound);
}

#[test]
fn unreadable_inputs_fail_with_unreadable_document() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir.path().join("missing.pdf");
    let garbage = dir.path().join("garbage.pdf");
    let empty = dir.path().join("empty.pdf");
    std::fs::write(&garbage, b"this is not a PDF").expect("garbage file should be written");
    common::write_report_pdf(&empty, &[]).expect("PDF fixture should be created");

    for input in [missing, garbage, empty] {
        let failure = extract_forecast(&input, &options("Fiscal", "Forecast"))
            .expect_err("extraction should fail");
        assert_eq!(
            failure.reason,
            FailureReason::UnreadableDocument,
            "input: {}",
            input.display()
        );
    }
}

#[test]
fn extracts_from_in_memory_bytes() {
    let bytes = common::report_pdf_bytes(&[common::signal_report_lines()])
        .expect("PDF fixture should be created");

    let result = extract_forecast_from_bytes(&bytes, &options("Fiscal", "Forecast"))
        .expect("extraction should succeed");
    assert_eq!(result.value, dec("-26000"));
    assert_eq!(result.date, ymd(2025, 10, 3));
}

#[test]
fn cli_writes_two_header_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli.pdf");
    let output = dir.path().join("cli.csv");
    common::write_report_pdf(&input, &[common::signal_report_lines()])
        .expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_forecast2csv"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--row-keyword",
            "Fiscal",
            "--column-keyword",
            "Forecast",
            "--header1",
            "SERIES.CODE",
            "--header2",
            "Series description",
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(0));
    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert_eq!(csv, ",SERIES.CODE\n,Series description\n2025-10-03,-26000\n");
}

#[test]
fn cli_reads_keywords_from_config_file() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli-config.pdf");
    let output = dir.path().join("cli-config.csv");
    let config = dir.path().join("report.json");
    common::write_report_pdf(&input, &[common::signal_report_lines()])
        .expect("PDF fixture should be created");
    std::fs::write(
        &config,
        r#"{"rowKeywords":["fiscal"],"columnKeywords":["forecast"],"caseSensitive":false,
            "metricHeader1":"CFG.CODE","metricHeader2":"From config"}"#,
    )
    .expect("config should be written");

    let output_json = Command::new(env!("CARGO_BIN_EXE_forecast2csv"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--config",
            &config.to_string_lossy(),
            "--json",
        ])
        .output()
        .expect("CLI should run");

    assert_eq!(output_json.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output_json.stdout);
    let record: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(record["metricHeader1"], "CFG.CODE");
    assert_eq!(record["date"], "2025-10-03");
    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert!(csv.starts_with(",CFG.CODE\n,From config\n"), "csv: {csv:?}");
}

#[test]
fn cli_exits_with_code_2_on_no_match() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli-nomatch.pdf");
    let output = dir.path().join("cli-nomatch.csv");
    common::write_report_pdf(&input, &[common::signal_report_lines()])
        .expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_forecast2csv"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(2));
    assert!(!output.exists(), "no CSV is written on failure");
}
