/// Folds full-width ASCII variants (`０`, `Ａ`, `－`, `，` ...) and the
/// ideographic space onto their half-width forms.
pub(crate) fn fold_width(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn fold_char(ch: char) -> char {
    match ch {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => {
            char::from_u32(u32::from(ch) - 0xFEE0).unwrap_or(ch)
        }
        _ => ch,
    }
}

/// Width-folded text with every whitespace character removed. PDF text
/// extraction tends to insert spaces between CJK glyphs, so keyword matching
/// runs on this form.
pub(crate) fn normalize_for_match(text: &str) -> String {
    text.chars()
        .map(fold_char)
        .filter(|ch| !ch.is_whitespace())
        .collect()
}

pub(crate) fn contains_any(haystack: &str, needles: &[String], case_sensitive: bool) -> bool {
    let haystack = normalize_for_match(haystack);
    if haystack.is_empty() {
        return false;
    }

    if case_sensitive {
        needles.iter().any(|needle| haystack.contains(needle.as_str()))
    } else {
        let haystack = haystack.to_lowercase();
        needles
            .iter()
            .any(|needle| haystack.contains(&needle.to_lowercase()))
    }
}
