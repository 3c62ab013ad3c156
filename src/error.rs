use std::io;

use thiserror::Error;

use crate::options::KeywordSpec;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("unreadable_document")]
    UnreadableDocument,

    #[error("no_match")]
    NoMatch,

    #[error("unparseable_value")]
    UnparseableValue,

    #[error("no_date_found")]
    NoDateFound,
}

impl FailureReason {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnreadableDocument => "unreadable_document",
            Self::NoMatch => "no_match",
            Self::UnparseableValue => "unparseable_value",
            Self::NoDateFound => "no_date_found",
        }
    }
}

/// Context attached to a failure so that a layout change in the report can be
/// diagnosed without re-running the extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub row_keywords: Vec<String>,
    pub column_keywords: Vec<String>,
    pub tables_scanned: usize,
    pub pages_scanned: usize,
}

impl Diagnostics {
    #[must_use]
    pub fn new(keywords: &KeywordSpec, tables_scanned: usize, pages_scanned: usize) -> Self {
        Self {
            row_keywords: keywords.row_keywords().to_vec(),
            column_keywords: keywords.column_keywords().to_vec(),
            tables_scanned,
            pages_scanned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {message}")]
pub struct ExtractionFailure {
    pub reason: FailureReason,
    pub message: String,
    pub diagnostics: Diagnostics,
}

impl ExtractionFailure {
    #[must_use]
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            diagnostics: Diagnostics::default(),
        }
    }

    #[must_use]
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::new(FailureReason::UnreadableDocument, message)
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

impl From<lopdf::Error> for ExtractionFailure {
    fn from(error: lopdf::Error) -> Self {
        Self::unreadable(format!("failed to load PDF: {error}"))
    }
}

impl From<io::Error> for ExtractionFailure {
    fn from(error: io::Error) -> Self {
        Self::unreadable(format!("failed to read PDF: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtractionFailure, FailureReason};

    #[test]
    fn display_starts_with_reason_code() {
        let failure = ExtractionFailure::new(FailureReason::NoMatch, "nothing matched");
        assert_eq!(failure.to_string(), "no_match: nothing matched");
        assert_eq!(FailureReason::NoDateFound.code(), "no_date_found");
    }

    #[test]
    fn io_errors_become_unreadable_document() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pdf");
        let failure = ExtractionFailure::from(error);
        assert_eq!(failure.reason, FailureReason::UnreadableDocument);
        assert!(failure.message.contains("missing.pdf"));
    }
}
