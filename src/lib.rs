mod csv_out;
mod date;
mod error;
mod locator;
mod miner;
mod model;
mod options;
mod pdf_reader;
mod table_detect;
mod table_parse;
mod text;
mod value;

use std::path::Path;

pub use csv_out::{write_record, write_record_to_string};
pub use date::{DATE_FORMAT_PRIORITY, DateFormat, parse_document_date};
pub use error::{Diagnostics, ExtractError, ExtractionFailure, FailureReason};
pub use locator::locate;
pub use miner::mine;
pub use model::{
    ExtractionResult, MatchSource, MetricRecord, MinedDocument, PageText, TableCandidate,
    TableOrigin,
};
pub use options::{
    DateStrategy, ExtractOptions, KeywordSpec, PageSelection, ReportConfig, SignRule,
};
pub use pdf_reader::PdfDocument;
pub use value::normalize_value;

fn extract_from_document(
    document: &PdfDocument,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionFailure> {
    let mined = mine(document, options.pages.as_ref(), options.min_cols)?;
    locate(&mined.tables, &mined.pages, options)
}

/// Mines the PDF at `input_pdf` and extracts the dated value selected by
/// `options.keywords`.
pub fn extract_forecast(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionFailure> {
    let document = PdfDocument::open(input_pdf)?;
    extract_from_document(&document, options)
}

pub fn extract_forecast_from_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionFailure> {
    let document = PdfDocument::from_bytes(input_pdf.to_vec())?;
    extract_from_document(&document, options)
}
