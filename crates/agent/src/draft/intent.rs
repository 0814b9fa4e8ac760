use policy_protocol::PolicyIntent;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    #[error("no JSON object in model reply")]
    NoJson,

    #[error("model reply is not a valid intent: {0}")]
    Malformed(String),
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Outermost `{ ... }` span of a reply, from the first `{` to the last `}`.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    json_object_regex().find(reply).map(|m| m.as_str())
}

pub fn parse_intent(reply: &str) -> Result<PolicyIntent, IntentError> {
    let raw = extract_json_object(reply).ok_or(IntentError::NoJson)?;
    serde_json::from_str(raw).map_err(|e| IntentError::Malformed(e.to_string()))
}
