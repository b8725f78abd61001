use unicode_normalization::UnicodeNormalization;

/// Canonical vocabulary key: trimmed, NFKC-normalized, lowercased.
pub fn normalize_key(word: &str) -> String {
    word.trim().nfkc().collect::<String>().to_lowercase()
}

/// `\w` in a non-unicode regular expression.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Accepted shape for a hover candidate: ASCII letters and apostrophes only,
/// with a bounded length.
#[derive(Debug, Clone, Copy)]
pub struct WordShape {
    pub min_len: usize,
    pub max_len: usize,
}

impl WordShape {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self { min_len, max_len }
    }

    pub fn accepts(&self, text: &str) -> bool {
        let len = text.chars().count();
        len >= self.min_len
            && len <= self.max_len
            && text.chars().all(|c| c.is_ascii_alphabetic() || c == '\'')
    }
}

impl Default for WordShape {
    fn default() -> Self {
        Self::new(2, 50)
    }
}

/// Expand outward from `offset` over word characters. Returns a char range.
pub fn expand_word(text: &str, offset: usize) -> (usize, usize) {
    let chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());

    let mut start = offset;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }

    let mut end = offset;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }

    (start, end)
}

pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_fold_case_and_compatibility_forms() {
        assert_eq!(normalize_key("  Hello "), "hello");
        assert_eq!(normalize_key("ｃａｔ"), "cat");
    }

    #[test]
    fn shape_rejects_digits_and_single_letters() {
        let shape = WordShape::default();
        assert!(shape.accepts("don't"));
        assert!(!shape.accepts("a"));
        assert!(!shape.accepts("abc123"));
        assert!(!shape.accepts("two words"));
        assert!(!shape.accepts(&"x".repeat(51)));
    }

    #[test]
    fn expansion_stops_at_non_word_chars() {
        let text = "an extraordinary day";
        let (start, end) = expand_word(text, 9);
        assert_eq!(char_slice(text, start, end), "extraordinary");

        let (start, end) = expand_word("don't", 1);
        assert_eq!(char_slice("don't", start, end), "don");
    }
}
