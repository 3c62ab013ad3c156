use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ExtractError;
use crate::text::normalize_for_match;

// Widest range a single `a-b` token may span.
const MAX_RANGE_PAGES: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                if end - start >= MAX_RANGE_PAGES {
                    return Err(format!(
                        "invalid range '{token}': spans more than {MAX_RANGE_PAGES} pages"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

/// Row and column keywords identifying the target cell.
///
/// Keywords are stored in their match form (width-folded, whitespace removed),
/// so `"当社 需給予想"` and `"当社需給予想"` are the same keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    row_keywords: Vec<String>,
    column_keywords: Vec<String>,
    case_sensitive: bool,
}

fn normalize_keywords<I, S>(kind: &str, keywords: I) -> Result<Vec<String>, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        let normalized = normalize_for_match(keyword.as_ref());
        if normalized.is_empty() {
            return Err(ExtractError::InvalidOption(format!(
                "{kind} keywords must not be blank"
            )));
        }
        if !out.contains(&normalized) {
            out.push(normalized);
        }
    }

    if out.is_empty() {
        return Err(ExtractError::InvalidOption(format!(
            "at least one {kind} keyword is required"
        )));
    }
    Ok(out)
}

impl KeywordSpec {
    pub fn new<R, C, S, T>(row_keywords: R, column_keywords: C) -> Result<Self, ExtractError>
    where
        R: IntoIterator<Item = S>,
        C: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(Self {
            row_keywords: normalize_keywords("row", row_keywords)?,
            column_keywords: normalize_keywords("column", column_keywords)?,
            case_sensitive: true,
        })
    }

    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    #[must_use]
    pub fn row_keywords(&self) -> &[String] {
        &self.row_keywords
    }

    #[must_use]
    pub fn column_keywords(&self) -> &[String] {
        &self.column_keywords
    }

    #[must_use]
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub(crate) fn matches_row(&self, text: &str) -> bool {
        crate::text::contains_any(text, &self.row_keywords, self.case_sensitive)
    }

    pub(crate) fn matches_column(&self, text: &str) -> bool {
        crate::text::contains_any(text, &self.column_keywords, self.case_sensitive)
    }
}

/// How sign glyphs in a value cell are read.
///
/// Japanese financial tables commonly print negatives with a leading `▲` or
/// `△`; accounting tables wrap them in parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRule {
    pub negative_markers: Vec<char>,
    pub parenthesized_negative: bool,
}

impl Default for SignRule {
    fn default() -> Self {
        Self {
            negative_markers: vec!['▲', '△'],
            parenthesized_negative: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStrategy {
    /// Issuance date found anywhere in the document text.
    #[default]
    IssueDate,
    /// Month/day printed in or near the matched column header, with the year
    /// of the issuance date.
    ColumnHeader,
}

impl FromStr for DateStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "issue" | "issue-date" => Ok(Self::IssueDate),
            "column" | "column-header" => Ok(Self::ColumnHeader),
            other => Err(format!(
                "unknown date source '{other}', expected 'issue' or 'column'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub keywords: KeywordSpec,
    pub pages: Option<PageSelection>,
    pub min_cols: usize,
    pub fallback_window: usize,
    pub sign_rule: SignRule,
    pub date_strategy: DateStrategy,
    /// Supplies the year for dates printed without one. Defaults to today.
    pub reference_date: Option<NaiveDate>,
}

impl ExtractOptions {
    #[must_use]
    pub fn new(keywords: KeywordSpec) -> Self {
        Self {
            keywords,
            pages: None,
            min_cols: 2,
            fallback_window: 3,
            sign_rule: SignRule::default(),
            date_strategy: DateStrategy::default(),
            reference_date: None,
        }
    }

    pub(crate) fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Report configuration as stored on disk.
///
/// ```json
/// { "rowKeywords": ["財政"], "columnKeywords": ["当社需給予想"],
///   "metricHeader1": "SERIES.CODE", "metricHeader2": "Series description" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub row_keywords: Vec<String>,
    pub column_keywords: Vec<String>,
    #[serde(default)]
    pub metric_header1: Option<String>,
    #[serde(default)]
    pub metric_header2: Option<String>,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_case_sensitive() -> bool {
    true
}

impl ReportConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(json)
            .map_err(|error| ExtractError::InvalidOption(format!("invalid report config: {error}")))
    }

    pub fn keyword_spec(&self) -> Result<KeywordSpec, ExtractError> {
        let spec = KeywordSpec::new(&self.row_keywords, &self.column_keywords)?;
        Ok(if self.case_sensitive {
            spec
        } else {
            spec.case_insensitive()
        })
    }
}
