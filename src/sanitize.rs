//! Query sanitization applied to raw request text before anything else sees it.

/// Longest question (in characters) forwarded to the pipeline.
pub const MAX_QUERY_CHARS: usize = 2000;

/// Clean raw request text.
///
/// Control characters (0x00-0x1F, 0x7F) become spaces, whitespace runs
/// collapse to a single space, the ends are trimmed and the result is capped
/// at [`MAX_QUERY_CHARS`] characters. Blank input yields an empty string.
pub fn sanitize_query(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len().min(MAX_QUERY_CHARS * 4));
    let mut pending_space = false;

    for c in raw.chars() {
        let c = if is_control(c) { ' ' } else { c };
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !cleaned.is_empty() {
            cleaned.push(' ');
        }
        pending_space = false;
        cleaned.push(c);
    }

    truncate_chars(&cleaned, MAX_QUERY_CHARS).trim_end().to_string()
}

/// First `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_characters_become_single_spaces() {
        let cleaned = sanitize_query("spend\tby\u{0000}\u{0001}channel\r\nlast month\u{007F}");
        assert_eq!(cleaned, "spend by channel last month");
        assert!(!cleaned.chars().any(is_control));
    }

    #[test]
    fn test_whitespace_runs_collapse_and_trim() {
        assert_eq!(sanitize_query("   top    publishers \n\n by   CTR  "), "top publishers by CTR");
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert_eq!(sanitize_query(""), "");
        assert_eq!(sanitize_query(" \t\r\n "), "");
        assert_eq!(sanitize_query("\u{0003}\u{0004}"), "");
    }

    #[test]
    fn test_long_input_is_capped() {
        let long = "impressions ".repeat(400);
        let cleaned = sanitize_query(&long);
        assert!(cleaned.chars().count() <= MAX_QUERY_CHARS);
        assert!(!cleaned.ends_with(' '));
    }

    #[test]
    fn test_cap_counts_characters_not_bytes() {
        let long = "é".repeat(MAX_QUERY_CHARS + 50);
        let cleaned = sanitize_query(&long);
        assert_eq!(cleaned.chars().count(), MAX_QUERY_CHARS);
    }

    #[test]
    fn test_truncate_chars_short_input_untouched() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
