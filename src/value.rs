use std::str::FromStr;

use rust_decimal::Decimal;

use crate::options::SignRule;
use crate::text::fold_width;

fn is_minus(ch: char) -> bool {
    matches!(ch, '-' | '\u{2212}' | '\u{2010}' | '\u{2011}' | '\u{2013}' | '\u{FE63}')
}

/// Parses a value cell into a signed decimal.
///
/// Full-width digits and signs are folded, whitespace and thousands
/// separators are dropped, and the sign is read from `-`/`+`, the configured
/// negative marker glyphs, or surrounding parentheses.
pub fn normalize_value(raw: &str, rule: &SignRule) -> Result<Decimal, String> {
    let folded: String = fold_width(raw)
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',')
        .collect();
    if folded.is_empty() {
        return Err("value cell is empty".to_string());
    }

    let mut body = folded.as_str();
    let mut negative = false;

    if rule.parenthesized_negative
        && let Some(inner) = body.strip_prefix('(').and_then(|rest| rest.strip_suffix(')'))
    {
        negative = true;
        body = inner;
    }

    if let Some(first) = body.chars().next() {
        if rule.negative_markers.contains(&first) || is_minus(first) {
            negative = true;
            body = &body[first.len_utf8()..];
        } else if first == '+' {
            body = &body[1..];
        }
    }

    let well_formed = !body.is_empty()
        && body.split('.').count() <= 2
        && body.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        && body.starts_with(|ch: char| ch.is_ascii_digit())
        && body.ends_with(|ch: char| ch.is_ascii_digit());
    if !well_formed {
        return Err(format!("'{}' is not a number", raw.trim()));
    }

    let mut value = Decimal::from_str(body)
        .map_err(|error| format!("'{}' is out of range: {error}", raw.trim()))?;
    if negative {
        value = -value;
    }
    if value.is_zero() {
        value.set_sign_positive(true);
    }
    Ok(value)
}

pub(crate) fn looks_numeric(raw: &str, rule: &SignRule) -> bool {
    normalize_value(raw, rule).is_ok()
}
