/// Returns at most `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_chars("clinic", 300), "clinic");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(truncate_chars("नीति दस्तावेज़", 4), "नीति");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
