use crate::error::ExtractionFailure;
use crate::model::{MinedDocument, PageText, TableOrigin};
use crate::options::PageSelection;
use crate::pdf_reader::PdfDocument;
use crate::table_detect::detect_tables;

/// Extracts every table candidate and the raw text of every selected page.
///
/// Candidates are ordered by page, then by position on the page. Nothing is
/// filtered by content here; relevance is decided by the locator.
pub fn mine(
    document: &PdfDocument,
    page_selection: Option<&PageSelection>,
    min_cols: usize,
) -> Result<MinedDocument, ExtractionFailure> {
    let (pages, whole_text) = document.read_pages(page_selection)?;
    Ok(mine_pages(pages, whole_text.as_deref(), min_cols))
}

pub(crate) fn mine_pages(
    pages: Vec<PageText>,
    whole_text: Option<&str>,
    min_cols: usize,
) -> MinedDocument {
    let mut tables = detect_tables(&pages, min_cols, TableOrigin::Page);

    if tables.is_empty()
        && let Some(text) = whole_text.filter(|text| !text.trim().is_empty())
    {
        let fallback_pages = vec![PageText {
            page_number: pages.first().map_or(1, |page| page.page_number),
            text: text.to_string(),
        }];
        tables = detect_tables(&fallback_pages, min_cols, TableOrigin::DocumentText);
        if !tables.is_empty() {
            tracing::debug!(
                tables = tables.len(),
                "no page-level tables detected; using document-level text"
            );
        }
    }

    for table in &tables {
        tracing::trace!(
            page = table.page,
            rows = table.row_count(),
            columns = table.column_count(),
            confidence = table.confidence,
            "table candidate"
        );
    }
    tracing::debug!(
        pages = pages.len(),
        tables = tables.len(),
        "document mined"
    );

    MinedDocument { tables, pages }
}
