//! Finds the target cell by keyword and turns it into an [`ExtractionResult`].
//!
//! Search order is deterministic: tables in mining order, rows top to bottom,
//! cells left to right. The first table holding both a column header match
//! and a data row match wins. Only when no table matches is the raw page text
//! scanned line by line.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};

use crate::date::{parse_document_date, parse_month_day};
use crate::error::{Diagnostics, ExtractionFailure, FailureReason};
use crate::model::{ExtractionResult, LocatedCell, MatchSource, PageText, TableCandidate};
use crate::options::{DateStrategy, ExtractOptions, KeywordSpec, SignRule};
use crate::table_parse::split_line_lenient;
use crate::value::{looks_numeric, normalize_value};

// Row offsets from the header row searched for a forecast date, nearest first.
const HEADER_DATE_OFFSETS: [isize; 5] = [1, -1, 2, -2, 3];
const HEADER_DATE_LOOKBACK: usize = 5;

fn leading_label_span(cells: &[String], rule: &SignRule) -> usize {
    cells
        .iter()
        .take_while(|cell| !looks_numeric(cell, rule))
        .count()
}

/// Maps a header column onto a row of a different width.
///
/// Equal widths keep the header index. A wider row is aligned from the right
/// edge only when its extra leading cells are labels the header merged. A
/// narrower row is aligned from the right only when `full_label_span`, the
/// label span of a full-width row in the same block, shows the row's labels
/// collapsed by exactly the missing cells. Otherwise the header index is kept
/// when it holds a number, and the row is skipped when it does not.
fn aligned_column(
    header_col: usize,
    header_width: usize,
    cells: &[String],
    full_label_span: Option<usize>,
    rule: &SignRule,
) -> Option<usize> {
    let width = cells.len();
    let exact_numeric = || {
        (header_col < width && looks_numeric(&cells[header_col], rule)).then_some(header_col)
    };

    match width.cmp(&header_width) {
        Ordering::Equal => (header_col < width).then_some(header_col),
        Ordering::Greater => {
            let shift = width - header_width;
            if leading_label_span(cells, rule) >= shift {
                Some(header_col + shift)
            } else {
                exact_numeric()
            }
        }
        Ordering::Less => {
            let shift = header_width - width;
            let labels = leading_label_span(cells, rule);
            if full_label_span == Some(labels + shift) {
                header_col
                    .checked_sub(shift)
                    .filter(|column| *column >= labels)
            } else {
                exact_numeric()
            }
        }
    }
}

fn find_header(table: &TableCandidate, keywords: &KeywordSpec) -> Option<(usize, usize)> {
    table.rows.iter().enumerate().find_map(|(row_index, row)| {
        row.iter()
            .position(|cell| keywords.matches_column(cell))
            .map(|col_index| (row_index, col_index))
    })
}

fn header_date_hints(table: &TableCandidate, header_row: usize, header_col: usize) -> Vec<String> {
    let cell_at = |row_index: usize| {
        table
            .rows
            .get(row_index)
            .and_then(|row| row.get(header_col))
            .filter(|cell| !cell.trim().is_empty())
            .cloned()
    };

    let mut hints = Vec::new();
    hints.extend(cell_at(header_row));
    for offset in HEADER_DATE_OFFSETS {
        if let Some(row_index) = header_row.checked_add_signed(offset) {
            hints.extend(cell_at(row_index));
        }
    }
    for row_index in header_row.saturating_sub(HEADER_DATE_LOOKBACK)..header_row {
        hints.extend(cell_at(row_index));
    }
    hints
}

fn match_table(
    table_index: usize,
    table: &TableCandidate,
    keywords: &KeywordSpec,
    rule: &SignRule,
) -> Option<LocatedCell> {
    let (header_row, header_col) = find_header(table, keywords)?;
    let header_width = table.rows[header_row].len();
    let full_label_span = table
        .rows
        .iter()
        .enumerate()
        .filter(|(row_index, row)| *row_index != header_row && row.len() == header_width)
        .map(|(_, row)| leading_label_span(row, rule))
        .find(|span| *span < header_width);

    for (row_index, row) in table.rows.iter().enumerate() {
        if row_index == header_row || !row.iter().any(|cell| keywords.matches_row(cell)) {
            continue;
        }

        let Some(column) = aligned_column(header_col, header_width, row, full_label_span, rule)
        else {
            continue;
        };
        let cell = row[column].trim();
        if cell.is_empty() || keywords.matches_row(cell) {
            continue;
        }

        return Some(LocatedCell {
            raw: cell.to_string(),
            source: MatchSource::Table {
                page: table.page,
                table_index,
                row: row_index,
                column,
            },
            date_hints: header_date_hints(table, header_row, header_col),
        });
    }

    None
}

pub(crate) fn find_in_tables(
    tables: &[TableCandidate],
    keywords: &KeywordSpec,
    rule: &SignRule,
) -> Option<LocatedCell> {
    tables
        .iter()
        .enumerate()
        .find_map(|(table_index, table)| match_table(table_index, table, keywords, rule))
}

fn first_numeric_after(cells: &[String], start: usize, rule: &SignRule) -> Option<String> {
    cells
        .iter()
        .skip(start)
        .find(|cell| looks_numeric(cell, rule))
        .cloned()
}

fn numeric_for_header(
    cells: &[String],
    header_cells: &[String],
    header_col: usize,
    rule: &SignRule,
) -> Option<String> {
    if let Some(column) = aligned_column(header_col, header_cells.len(), cells, None, rule)
        && looks_numeric(&cells[column], rule)
    {
        return Some(cells[column].clone());
    }

    let mut numeric = cells.iter().filter(|cell| looks_numeric(cell, rule));
    match (numeric.next(), numeric.next()) {
        (Some(only), None) => Some(only.clone()),
        _ => None,
    }
}

fn match_page_text(page: &PageText, options: &ExtractOptions) -> Option<LocatedCell> {
    let keywords = &options.keywords;
    let rule = &options.sign_rule;
    let window = options.fallback_window;
    let lines = page.text.lines().collect::<Vec<_>>();

    for (line_index, line) in lines.iter().enumerate() {
        if !keywords.matches_row(line) {
            continue;
        }

        let cells = split_line_lenient(line);
        if let Some(keyword_cell) = cells.iter().position(|cell| keywords.matches_column(cell)) {
            if let Some(raw) = first_numeric_after(&cells, keyword_cell + 1, rule) {
                return Some(LocatedCell {
                    raw,
                    source: MatchSource::Text {
                        page: page.page_number,
                        line: line_index,
                    },
                    date_hints: vec![(*line).to_string()],
                });
            }
            continue;
        }

        let Some(header_index) = (line_index.saturating_sub(window)..line_index)
            .rev()
            .find(|index| keywords.matches_column(lines[*index]))
        else {
            continue;
        };

        let header_cells = split_line_lenient(lines[header_index]);
        let Some(header_col) = header_cells
            .iter()
            .position(|cell| keywords.matches_column(cell))
        else {
            continue;
        };

        let last = line_index.saturating_add(window).saturating_add(1).min(lines.len());
        for candidate in line_index..last {
            let candidate_cells = split_line_lenient(lines[candidate]);
            // Lines below the row belong to it only while they carry no label.
            if candidate > line_index
                && !candidate_cells.iter().all(|cell| looks_numeric(cell, rule))
            {
                break;
            }
            if let Some(raw) = numeric_for_header(&candidate_cells, &header_cells, header_col, rule) {
                let mut date_hints = vec![lines[header_index].to_string()];
                date_hints.extend(
                    [header_index.checked_add(1), header_index.checked_sub(1)]
                        .into_iter()
                        .flatten()
                        .filter_map(|index| lines.get(index))
                        .map(|line| (*line).to_string()),
                );
                return Some(LocatedCell {
                    raw,
                    source: MatchSource::Text {
                        page: page.page_number,
                        line: candidate,
                    },
                    date_hints,
                });
            }
        }
    }

    None
}

pub(crate) fn find_in_text(pages: &[PageText], options: &ExtractOptions) -> Option<LocatedCell> {
    pages.iter().find_map(|page| match_page_text(page, options))
}

fn resolve_date(
    pages: &[PageText],
    cell: &LocatedCell,
    options: &ExtractOptions,
) -> Option<NaiveDate> {
    let document_text = pages
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let (issue_date, format) = parse_document_date(&document_text, options.reference_date())?;
    tracing::debug!(%issue_date, ?format, year_inferred = !format.has_year(), "issue date resolved");

    match options.date_strategy {
        DateStrategy::IssueDate => Some(issue_date),
        DateStrategy::ColumnHeader => cell
            .date_hints
            .iter()
            .find_map(|hint| parse_month_day(hint, issue_date.year())),
    }
}

/// Locates the target cell in the mined tables (falling back to page text)
/// and normalizes it into a dated value.
pub fn locate(
    tables: &[TableCandidate],
    pages: &[PageText],
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractionFailure> {
    let diagnostics = || Diagnostics::new(&options.keywords, tables.len(), pages.len());

    let cell = find_in_tables(tables, &options.keywords, &options.sign_rule)
        .or_else(|| find_in_text(pages, options))
        .ok_or_else(|| {
            ExtractionFailure::new(
                FailureReason::NoMatch,
                "no row/column keyword intersection in any table or page text",
            )
            .with_diagnostics(diagnostics())
        })?;
    tracing::debug!(source = ?cell.source, raw = %cell.raw, "cell located");

    let value = normalize_value(&cell.raw, &options.sign_rule).map_err(|error| {
        ExtractionFailure::new(FailureReason::UnparseableValue, error).with_diagnostics(diagnostics())
    })?;

    let date = resolve_date(pages, &cell, options).ok_or_else(|| {
        let message = match options.date_strategy {
            DateStrategy::IssueDate => "no recognized date in the document text",
            DateStrategy::ColumnHeader => "no month/day date near the matched column header",
        };
        ExtractionFailure::new(FailureReason::NoDateFound, message).with_diagnostics(diagnostics())
    })?;

    Ok(ExtractionResult {
        date,
        value,
        raw_value: cell.raw,
        source: cell.source,
    })
}
