use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{EUC_JP, SHIFT_JIS, UTF_16BE};
use lopdf::Object;
use lopdf::content::Content;

use crate::error::ExtractionFailure;
use crate::model::PageText;
use crate::options::PageSelection;
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

/// A loaded PDF. The source file is read completely and closed when the
/// document is opened; dropping the handle releases everything else.
pub struct PdfDocument {
    bytes: Vec<u8>,
    document: lopdf::Document,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, ExtractionFailure> {
        let bytes = std::fs::read(path).map_err(|error| {
            ExtractionFailure::unreadable(format!(
                "failed to read '{}': {error}",
                path.display()
            ))
        })?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExtractionFailure> {
        let document = lopdf::Document::load_mem(&bytes)?;
        if document.get_pages().is_empty() {
            return Err(ExtractionFailure::unreadable("document has no pages"));
        }
        Ok(Self { bytes, document })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Text of the selected pages in document order, plus the whole-document
    /// text when it could not be attributed to single pages.
    pub(crate) fn read_pages(
        &self,
        page_selection: Option<&PageSelection>,
    ) -> Result<(Vec<PageText>, Option<String>), ExtractionFailure> {
        let pages_map = self.document.get_pages();

        let (pdf_extract_pages, pdf_extract_whole) =
            match pdf_extract::extract_text_from_mem(&self.bytes) {
                Ok(text) => {
                    let pages = split_text_into_pages(&text);
                    if pages.len() == pages_map.len() {
                        (Some(pages), None)
                    } else {
                        (None, Some(text))
                    }
                }
                Err(error) => {
                    tracing::debug!("pdf-extract could not read the document: {error}");
                    (None, None)
                }
            };

        let mut pages = Vec::new();
        for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
            if let Some(selection) = page_selection
                && !selection.contains(*page_no)
            {
                continue;
            }

            let mut candidates = Vec::new();
            if let Some(text) = pdf_extract_pages
                .as_ref()
                .and_then(|fallback| fallback.get(index).cloned())
                .filter(|text| !text.trim().is_empty())
            {
                candidates.push(text);
            }
            if let Some(text) = extract_text_from_page_content(&self.document, *page_id) {
                candidates.push(text);
            }
            if let Some(text) = self
                .document
                .extract_text(&[*page_no])
                .ok()
                .filter(|text| !text.trim().is_empty())
            {
                candidates.push(text);
            }

            let local_best_score = candidates
                .iter()
                .map(|text| extraction_quality_score(text))
                .max()
                .unwrap_or(i64::MIN / 4);
            if index == 0
                && local_best_score < 80
                && let Some(text) = pdf_extract_whole
                    .as_ref()
                    .filter(|text| !text.trim().is_empty())
                    .cloned()
            {
                candidates.push(text);
            }

            let text = choose_best_text(&candidates);
            tracing::trace!(page = *page_no, chars = text.len(), "page text selected");

            pages.push(PageText {
                page_number: *page_no,
                text,
            });
        }

        if pages.is_empty() {
            return Err(ExtractionFailure::unreadable(
                "no pages available after applying page selection",
            ));
        }

        Ok((pages, pdf_extract_whole))
    }
}

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn is_cjk_or_kana(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
        || ('\u{3040}'..='\u{30FF}').contains(&ch)
        || ('\u{3400}'..='\u{4DBF}').contains(&ch)
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    let cjk_count = text.chars().filter(|ch| is_cjk_or_kana(*ch)).count();
    let ext_a_count = text
        .chars()
        .filter(|ch| ('\u{3400}'..='\u{4DBF}').contains(ch))
        .count();

    replacement * 8 > total
        || control * 5 > total
        || (cjk_count > 20 && ext_a_count * 4 > cjk_count)
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = lopdf::Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        let bytes = if bytes.len() > 2 { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("rksj") || lower.contains("sjis") || lower.contains("90ms") {
            let (sjis, _, had_errors) = SHIFT_JIS.decode(bytes);
            if !had_errors && !sjis.is_empty() {
                return sjis.into_owned();
            }
        }

        if lower.starts_with("euc") || lower.contains("-euc-") {
            let (euc, _, had_errors) = EUC_JP.decode(bytes);
            if !had_errors && !euc.is_empty() {
                return euc.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut numeric_lines = 0_i64;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        non_empty_lines += 1;

        if split_line_into_cells(line).len() >= 2 || soft_split_line_into_cells(line).len() >= 3 {
            multi_cell_lines += 1;
        }

        if line.chars().any(|ch| ch.is_ascii_digit()) {
            numeric_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + numeric_lines * 15 + non_empty_lines - broken_penalty
}

fn choose_best_text(candidates: &[String]) -> String {
    candidates
        .iter()
        .max_by_key(|text| extraction_quality_score(text))
        .cloned()
        .unwrap_or_default()
}

fn extract_text_from_page_content(
    document: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    text.push_str(&decode_pdf_bytes(encoding, bytes));
                }
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                Object::Integer(value) => {
                    if *value < -100 {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
