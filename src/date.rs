use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};

use crate::text::fold_width;

/// Supported date layouts, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `2025年10月3日`
    JapaneseFull,
    /// `2025.10.03`
    Dotted,
    /// `2025/10/03`
    Slashed,
    /// `2025-10-03`
    Dashed,
    /// `令和7年10月3日`
    Reiwa,
    /// `10月3日`
    JapaneseMonthDay,
    /// `10/3`
    SlashedMonthDay,
}

pub const DATE_FORMAT_PRIORITY: [DateFormat; 7] = [
    DateFormat::JapaneseFull,
    DateFormat::Dotted,
    DateFormat::Slashed,
    DateFormat::Dashed,
    DateFormat::Reiwa,
    DateFormat::JapaneseMonthDay,
    DateFormat::SlashedMonthDay,
];

// Reiwa 1 is 2019.
const REIWA_OFFSET: i32 = 2018;

static JAPANESE_FULL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日")
        .expect("hardcoded date regex is valid")
});
static DOTTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d{4})\.(\d{1,2})\.(\d{1,2})(?:$|[^\d.])")
        .expect("hardcoded date regex is valid")
});
static SLASHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d/])(\d{4})/(\d{1,2})/(\d{1,2})(?:$|[^\d/])")
        .expect("hardcoded date regex is valid")
});
static DASHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d-])(\d{4})-(\d{1,2})-(\d{1,2})(?:$|[^\d-])")
        .expect("hardcoded date regex is valid")
});
static REIWA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"令和\s*(\d{1,2}|元)\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日")
        .expect("hardcoded date regex is valid")
});
static JAPANESE_MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d年])(\d{1,2})\s*月\s*(\d{1,2})\s*日")
        .expect("hardcoded date regex is valid")
});
static SLASHED_MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d/])(\d{1,2})/(\d{1,2})(?:$|[^\d/])")
        .expect("hardcoded date regex is valid")
});

fn group_u32(captures: &Captures<'_>, index: usize) -> Option<u32> {
    captures.get(index)?.as_str().parse().ok()
}

fn group_i32(captures: &Captures<'_>, index: usize) -> Option<i32> {
    captures.get(index)?.as_str().parse().ok()
}

impl DateFormat {
    fn regex(self) -> &'static Regex {
        match self {
            Self::JapaneseFull => LazyLock::force(&JAPANESE_FULL_RE),
            Self::Dotted => LazyLock::force(&DOTTED_RE),
            Self::Slashed => LazyLock::force(&SLASHED_RE),
            Self::Dashed => LazyLock::force(&DASHED_RE),
            Self::Reiwa => LazyLock::force(&REIWA_RE),
            Self::JapaneseMonthDay => LazyLock::force(&JAPANESE_MONTH_DAY_RE),
            Self::SlashedMonthDay => LazyLock::force(&SLASHED_MONTH_DAY_RE),
        }
    }

    #[must_use]
    pub fn has_year(self) -> bool {
        !matches!(self, Self::JapaneseMonthDay | Self::SlashedMonthDay)
    }

    fn build(self, captures: &Captures<'_>, default_year: i32) -> Option<NaiveDate> {
        let (year, month, day) = match self {
            Self::JapaneseFull | Self::Dotted | Self::Slashed | Self::Dashed => (
                group_i32(captures, 1)?,
                group_u32(captures, 2)?,
                group_u32(captures, 3)?,
            ),
            Self::Reiwa => {
                let era_year = match captures.get(1)?.as_str() {
                    "元" => 1,
                    digits => digits.parse::<i32>().ok()?,
                };
                (
                    REIWA_OFFSET + era_year,
                    group_u32(captures, 2)?,
                    group_u32(captures, 3)?,
                )
            }
            Self::JapaneseMonthDay | Self::SlashedMonthDay => (
                default_year,
                group_u32(captures, 1)?,
                group_u32(captures, 2)?,
            ),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// First valid calendar date of this format in `text`.
    #[must_use]
    pub fn find(self, text: &str, default_year: i32) -> Option<NaiveDate> {
        let text = fold_width(text);
        let regex = self.regex();
        let mut start = 0;
        // Boundary groups consume a character, so restart right after each
        // match's first digit instead of using captures_iter.
        while let Some(captures) = regex.captures_at(&text, start) {
            if let Some(date) = self.build(&captures, default_year) {
                return Some(date);
            }
            let Some(first) = captures.get(1) else {
                break;
            };
            start = first.start() + 1;
            while start < text.len() && !text.is_char_boundary(start) {
                start += 1;
            }
        }
        None
    }
}

/// Tries every supported format in priority order and returns the first
/// valid calendar date. Dates without a year take the year of `reference`.
#[must_use]
pub fn parse_document_date(text: &str, reference: NaiveDate) -> Option<(NaiveDate, DateFormat)> {
    DATE_FORMAT_PRIORITY
        .iter()
        .find_map(|format| format.find(text, reference.year()).map(|date| (date, *format)))
}

/// Month/day printed with a column header, e.g. `当社需給予想 10月3日`.
#[must_use]
pub fn parse_month_day(text: &str, year: i32) -> Option<NaiveDate> {
    [DateFormat::JapaneseMonthDay, DateFormat::SlashedMonthDay]
        .iter()
        .find_map(|format| format.find(text, year))
}
