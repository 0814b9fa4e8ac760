use crate::Department;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Metadata submitted with a new policy document.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFormData {
    #[serde(default)]
    pub policy_name: String,
    #[serde(default)]
    pub policy_number: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default, rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_to: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub department: String,
}

impl PolicyFormData {
    pub fn department(&self) -> Option<Department> {
        Department::parse(&self.department)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub fn validate_policy_form(data: &PolicyFormData) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let required = [
        ("policyName", &data.policy_name),
        ("policyNumber", &data.policy_number),
        ("issuer", &data.issuer),
        ("type", &data.policy_type),
        ("validFrom", &data.valid_from),
        ("validTo", &data.valid_to),
        ("description", &data.description),
        ("department", &data.department),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Required"));
        }
    }

    if !data.department.trim().is_empty() && data.department().is_none() {
        errors.push(ValidationError::new("department", "Unknown department"));
    }

    let from = parse_date(&data.valid_from);
    let to = parse_date(&data.valid_to);
    if !data.valid_from.trim().is_empty() && from.is_none() {
        errors.push(ValidationError::new("validFrom", "Invalid date"));
    }
    if !data.valid_to.trim().is_empty() && to.is_none() {
        errors.push(ValidationError::new("validTo", "Invalid date"));
    }
    if let (Some(from), Some(to)) = (from, to) {
        if from >= to {
            errors.push(ValidationError::new(
                "validTo",
                "Must be after Valid From date",
            ));
        }
    }

    errors
}

pub fn validate_policy_id(policy_id: &str) -> Vec<ValidationError> {
    if policy_id.trim().is_empty() {
        vec![ValidationError::new("policyId", "Required")]
    } else {
        Vec::new()
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Accept full timestamps by keeping only the date part.
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_form() -> PolicyFormData {
        PolicyFormData {
            policy_name: "Hospital Waste Disposal".to_string(),
            policy_number: "HW-2024-01".to_string(),
            issuer: "Ministry of Health".to_string(),
            policy_type: "Regulation".to_string(),
            valid_from: "2024-01-01".to_string(),
            valid_to: "2026-12-31".to_string(),
            description: "Rules for biomedical waste segregation".to_string(),
            department: "health".to_string(),
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        assert!(validate_policy_form(&valid_form()).is_empty());
    }

    #[test]
    fn blank_fields_are_required() {
        let form = PolicyFormData {
            issuer: "   ".to_string(),
            description: String::new(),
            ..valid_form()
        };
        let fields: Vec<String> = validate_policy_form(&form)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["issuer".to_string(), "description".to_string()]);
    }

    #[test]
    fn valid_to_must_follow_valid_from() {
        let form = PolicyFormData {
            valid_from: "2025-06-01".to_string(),
            valid_to: "2025-06-01".to_string(),
            ..valid_form()
        };
        let errors = validate_policy_form(&form);
        assert_eq!(
            errors,
            vec![ValidationError::new("validTo", "Must be after Valid From date")]
        );
    }

    #[test]
    fn unknown_department_is_rejected() {
        let form = PolicyFormData {
            department: "defence".to_string(),
            ..valid_form()
        };
        let errors = validate_policy_form(&form);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "department");
    }

    #[test]
    fn form_uses_camel_case_wire_names() {
        let raw = r#"{"policyName":"A","policyNumber":"1","type":"Guideline","department":"finance"}"#;
        let form: PolicyFormData = serde_json::from_str(raw).unwrap();
        assert_eq!(form.policy_type, "Guideline");
        assert_eq!(form.department(), Some(Department::Finance));
    }

    #[test]
    fn policy_id_required() {
        assert_eq!(validate_policy_id(" ").len(), 1);
        assert!(validate_policy_id("HW-1").is_empty());
    }
}
