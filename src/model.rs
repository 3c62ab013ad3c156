use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOrigin {
    Page,
    DocumentText,
}

/// One detected grid of cells. Rows may be ragged.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCandidate {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
    pub origin: TableOrigin,
}

impl TableCandidate {
    #[must_use]
    pub fn new(page: u32, rows: Vec<Vec<String>>) -> Self {
        Self {
            page,
            rows,
            confidence: 1.0,
            origin: TableOrigin::Page,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinedDocument {
    pub tables: Vec<TableCandidate>,
    pub pages: Vec<PageText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSource {
    Table {
        page: u32,
        table_index: usize,
        row: usize,
        column: usize,
    },
    Text {
        page: u32,
        line: usize,
    },
}

/// Raw cell located by the search, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocatedCell {
    pub raw: String,
    pub source: MatchSource,
    /// Texts around the column header, nearest first. Used to find a
    /// forecast date printed with the header.
    pub date_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub date: NaiveDate,
    pub value: Decimal,
    pub raw_value: String,
    pub source: MatchSource,
}

impl ExtractionResult {
    #[must_use]
    pub fn into_record(
        self,
        metric_header1: impl Into<String>,
        metric_header2: impl Into<String>,
    ) -> MetricRecord {
        MetricRecord {
            metric_header1: metric_header1.into(),
            metric_header2: metric_header2.into(),
            date: self.date,
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub metric_header1: String,
    pub metric_header2: String,
    pub date: NaiveDate,
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::{TableCandidate, TableOrigin};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| (*cell).to_string()).collect()
    }

    #[test]
    fn ragged_table_reports_widest_row_as_column_count() {
        let table = TableCandidate::new(
            2,
            vec![
                row(&["項目", "前日", "当社需給予想", "市場予想"]),
                row(&["財政", "-1,000", "-26,000"]),
                row(&["合計"]),
            ],
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.origin, TableOrigin::Page);
    }

    #[test]
    fn empty_table_has_no_columns() {
        let table = TableCandidate::new(1, Vec::new());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }
}
