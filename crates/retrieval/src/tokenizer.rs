use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Tokens must be longer than this many characters to be kept.
pub const MIN_TOKEN_CHARS: usize = 2;

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W+").expect("static regex must compile"))
}

/// Lowercases `text`, splits on runs of non-word characters, drops tokens of two
/// characters or fewer and repeated tokens. Order of first occurrence is kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    non_word()
        .split(&lowered)
        .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
        .filter(|t| seen.insert(*t))
        .map(str::to_string)
        .collect()
}
