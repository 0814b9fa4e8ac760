/// Removes NUL and non-printable ASCII control characters from a prompt.
///
/// Tab, line feed and carriage return survive; everything else in `0x00..=0x1F` and
/// `0x7F` is dropped. Non-ASCII text is untouched.
pub fn sanitize_prompt(input: &str) -> String {
    input.chars().filter(|c| !is_stripped(*c)).collect()
}

fn is_stripped(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}
