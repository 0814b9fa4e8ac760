use policy_prompt::{CONFLICTS_FOUND_MARKER, CONFLICTS_MARKER, SUGGESTIONS_MARKER};
use serde::{Deserialize, Serialize};

pub const CONFLICT_PLACEHOLDER: &str = "Potential conflict detected";
pub const SUGGESTION_PLACEHOLDER: &str = "Review policy scope";

/// Structured result of a conflict analysis. Both lists are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictVerdict {
    pub has_conflict: bool,
    pub conflicts: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    InConflicts,
    InSuggestions,
}

/// Parses the engine's reply to a conflict prompt. Never fails.
///
/// `has_conflict` is set when a line carries `CONFLICTS:` together with `YES`, or when any
/// line mentions "conflict" in any case. The second rule also fires on `CONFLICTS: NO`.
pub fn parse_conflict_response(text: &str) -> ConflictVerdict {
    let mut section = Section::None;
    let mut conflicts = Vec::new();
    let mut suggestions = Vec::new();
    let mut has_conflict = false;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if (line.contains(CONFLICTS_MARKER) && line.contains("YES"))
            || line.to_lowercase().contains("conflict")
        {
            has_conflict = true;
        }

        if let Some(rest) = after_marker(line, CONFLICTS_FOUND_MARKER) {
            section = Section::InConflicts;
            if !rest.is_empty() && rest != "None" {
                conflicts.push(rest.to_string());
            }
        } else if let Some(rest) = after_marker(line, SUGGESTIONS_MARKER) {
            section = Section::InSuggestions;
            if !rest.is_empty() {
                suggestions.push(rest.to_string());
            }
        } else if let Some(item) = strip_list_prefix(line) {
            match section {
                Section::InConflicts => conflicts.push(item.to_string()),
                Section::InSuggestions => suggestions.push(item.to_string()),
                Section::None => {}
            }
        }
    }

    if conflicts.is_empty() {
        conflicts.push(CONFLICT_PLACEHOLDER.to_string());
    }
    if suggestions.is_empty() {
        suggestions.push(SUGGESTION_PLACEHOLDER.to_string());
    }

    ConflictVerdict {
        has_conflict,
        conflicts,
        suggestions,
    }
}

fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.split_once(marker).map(|(_, rest)| rest.trim())
}

/// Strips one leading `1.`, `-` or `•`. Returns `None` for lines without a list prefix
/// and for bullets with nothing after them.
fn strip_list_prefix(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let rest = if let Some(rest) = line.strip_prefix('-') {
        rest
    } else if let Some(rest) = line.strip_prefix('•') {
        rest
    } else {
        let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        line[digits..].strip_prefix('.')?
    };
    Some(rest.trim()).filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn verdict(has_conflict: bool, conflicts: &[&str], suggestions: &[&str]) -> ConflictVerdict {
        ConflictVerdict {
            has_conflict,
            conflicts: conflicts.iter().map(|s| s.to_string()).collect(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parses_single_line_sections() {
        let text = "CONFLICTS: YES\nCONFLICTS_FOUND: A vs B\nSUGGESTIONS: Merge clauses";
        assert_eq!(
            parse_conflict_response(text),
            verdict(true, &["A vs B"], &["Merge clauses"])
        );
    }

    #[test]
    fn collects_bullets_under_active_section() {
        let text = "\
CONFLICTS: YES
CONFLICTS_FOUND:
1. Clinic hours differ from the 2021 circular
- Night staffing is not covered
Some commentary that is ignored
SUGGESTIONS:
• Align hours with circular 14
  2. Add a night staffing clause
";
        assert_eq!(
            parse_conflict_response(text),
            verdict(
                true,
                &[
                    "Clinic hours differ from the 2021 circular",
                    "Night staffing is not covered",
                ],
                &["Align hours with circular 14", "Add a night staffing clause"],
            )
        );
    }

    #[test]
    fn none_entry_falls_back_to_placeholder() {
        let text = "CONFLICTS: NO\nCONFLICTS_FOUND: None\nSUGGESTIONS:";
        let parsed = parse_conflict_response(text);
        assert_eq!(parsed.conflicts, vec![CONFLICT_PLACEHOLDER]);
        assert_eq!(parsed.suggestions, vec![SUGGESTION_PLACEHOLDER]);
    }

    #[test]
    fn no_markers_yields_placeholders() {
        let parsed = parse_conflict_response("The policies look compatible.");
        assert_eq!(
            parsed,
            verdict(false, &[CONFLICT_PLACEHOLDER], &[SUGGESTION_PLACEHOLDER])
        );
    }

    #[test]
    fn bullets_before_any_marker_are_ignored() {
        let parsed = parse_conflict_response("- stray bullet\n1. another");
        assert_eq!(parsed.conflicts, vec![CONFLICT_PLACEHOLDER]);
        assert_eq!(parsed.suggestions, vec![SUGGESTION_PLACEHOLDER]);
    }

    #[test]
    fn the_word_conflict_anywhere_is_a_positive_verdict() {
        assert!(parse_conflict_response("There is no conflict here.").has_conflict);
        assert!(parse_conflict_response("CONFLICTS: NO").has_conflict);
        assert!(parse_conflict_response("Possible CONFLICTING rules").has_conflict);
        assert!(!parse_conflict_response("All clear.").has_conflict);
    }

    #[test]
    fn empty_input_is_well_formed() {
        assert_eq!(
            parse_conflict_response(""),
            verdict(false, &[CONFLICT_PLACEHOLDER], &[SUGGESTION_PLACEHOLDER])
        );
    }

    #[test]
    fn list_prefix_stripping() {
        assert_eq!(strip_list_prefix("12. Twelve"), Some("Twelve"));
        assert_eq!(strip_list_prefix("-dash"), Some("dash"));
        assert_eq!(strip_list_prefix("12 no dot"), None);
        assert_eq!(strip_list_prefix("plain"), None);
        assert_eq!(strip_list_prefix("- "), None);
    }
}
