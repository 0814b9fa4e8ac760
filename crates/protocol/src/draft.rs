use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Heading used when the request names no policy type.
pub const DEFAULT_POLICY_TYPE: &str = "Custom Policy";

/// Structured reading of a free-text drafting request.
///
/// Field names follow the extraction schema the model is asked to emit.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PolicyIntent {
    #[serde(default)]
    pub policy_type: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[schemars(with = "Vec<String>")]
    pub special_conditions: Vec<String>,
}

impl PolicyIntent {
    pub fn policy_type_or_default(&self) -> &str {
        non_blank(self.policy_type.as_deref()).unwrap_or(DEFAULT_POLICY_TYPE)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeasibilityStatus {
    Allowed,
    AllowedWithConditions,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct FeasibilityReport {
    pub status: FeasibilityStatus,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct DraftSection {
    pub title: String,
    pub body: String,
}

/// A drafted policy: the parsed intent, the legal checks, each section, and the
/// assembled markdown document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub intent: PolicyIntent,
    pub feasibility: FeasibilityReport,
    pub sections: Vec<DraftSection>,
    #[serde(default)]
    pub citations: Vec<String>,
    pub document: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn intent_tolerates_nulls_and_missing_fields() {
        let intent: PolicyIntent = serde_json::from_str(
            r#"{"policy_type": "Privacy Policy", "jurisdiction": "India", "risk_level": null, "special_conditions": null}"#,
        )
        .unwrap();
        assert_eq!(intent.policy_type.as_deref(), Some("Privacy Policy"));
        assert_eq!(intent.industry, None);
        assert!(intent.special_conditions.is_empty());
    }

    #[test]
    fn blank_policy_type_uses_default_heading() {
        let intent = PolicyIntent {
            policy_type: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(intent.policy_type_or_default(), DEFAULT_POLICY_TYPE);
    }

    #[test]
    fn feasibility_status_is_snake_case() {
        let raw = serde_json::to_string(&FeasibilityStatus::AllowedWithConditions).unwrap();
        assert_eq!(raw, "\"allowed_with_conditions\"");
    }
}
