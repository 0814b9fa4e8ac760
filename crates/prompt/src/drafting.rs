/// Sections drafted for every policy, in document order.
pub const DEFAULT_DRAFT_SECTIONS: [&str; 6] = [
    "Introduction",
    "Consent",
    "Data Collection",
    "User Rights",
    "Data Retention",
    "Grievance Redressal",
];

/// Asks the model for a single JSON object describing the request.
pub fn build_intent_prompt(request: &str) -> String {
    format!(
        "You are a legal intent extraction system.\n\n\
STRICT RULES:\n\
- Output ONLY valid JSON\n\
- No explanations\n\
- No markdown\n\
- No backticks\n\n\
Schema:\n\
{{\n  \
\"policy_type\": string | null,\n  \
\"industry\": string | null,\n  \
\"jurisdiction\": string | null,\n  \
\"entity_type\": string | null,\n  \
\"risk_level\": \"low\" | \"medium\" | \"high\" | null,\n  \
\"special_conditions\": string[]\n\
}}\n\n\
User input:\n{request}\n"
    )
}

/// `intent` and `rules` arrive pre-rendered as plain text.
pub fn build_section_prompt(section: &str, intent: &str, rules: &str) -> String {
    format!(
        "Draft ONLY the section titled \"{section}\".\n\n\
Rules:\n\
- Formal legal language\n\
- No assumptions\n\
- Follow Indian law only\n\
- Cite law in brackets\n\n\
Intent:\n{intent}\n\n\
Relevant rules:\n{rules}\n"
    )
}
