/// Queries with fewer trimmed characters than this never reach retrieval or the engine.
pub const FAST_PATH_MAX_CHARS: usize = 5;

const GREETINGS: &[(&str, &str)] = &[
    (
        "hi",
        "Hello! How can I help you with healthcare policies today?",
    ),
    (
        "hey",
        "Hey! What would you like to know about healthcare policies?",
    ),
];

const FALLBACK_GREETING: &str = "Hello! What can I help you with?";

/// Canned reply for trivially short input, or `None` when the full pipeline should run.
pub fn try_fast_path(query: &str) -> Option<&'static str> {
    let trimmed = query.trim();
    if trimmed.chars().count() >= FAST_PATH_MAX_CHARS {
        return None;
    }
    let key = trimmed.to_lowercase();
    let reply = GREETINGS
        .iter()
        .find(|(greeting, _)| *greeting == key)
        .map_or(FALLBACK_GREETING, |(_, reply)| *reply);
    Some(reply)
}
