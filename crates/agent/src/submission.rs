use policy_protocol::{validate_policy_form, validate_policy_id, PolicyFormData, ValidationError};
use policy_prompt::truncate_chars;
use policy_store::{DocumentQuery, IdentityClause, Metadata, NewDocument};
use serde_json::Value;

/// Characters of uploaded file text embedded in the new-policy description.
pub const FILE_EXCERPT_CHARS: usize = 2000;

/// A policy being created or replaced, together with its extracted file text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySubmission {
    Create {
        form: PolicyFormData,
        file_content: String,
        file_name: Option<String>,
    },
    Update {
        policy_id: String,
        file_content: String,
        file_name: Option<String>,
    },
}

impl PolicySubmission {
    pub fn create(form: PolicyFormData, file_content: impl Into<String>) -> Self {
        Self::Create {
            form,
            file_content: file_content.into(),
            file_name: None,
        }
    }

    pub fn update(policy_id: impl Into<String>, file_content: impl Into<String>) -> Self {
        Self::Update {
            policy_id: policy_id.into(),
            file_content: file_content.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Self::Create { file_name, .. } | Self::Update { file_name, .. } => {
                *file_name = Some(name.into());
            }
        }
        self
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        match self {
            Self::Create { form, .. } => validate_policy_form(form),
            Self::Update { policy_id, .. } => validate_policy_id(policy_id),
        }
    }

    /// Text describing the new policy in the conflict prompt.
    pub fn describe(&self) -> String {
        match self {
            Self::Create {
                form, file_content, ..
            } => format!(
                "Policy Name: {}\nPolicy Number: {}\nIssuer: {}\nType: {}\nValid From: {}\n\
Valid To: {}\nDepartment: {}\nDescription: {}\n\nFile Content (excerpt):\n{}",
                form.policy_name,
                form.policy_number,
                form.issuer,
                form.policy_type,
                form.valid_from,
                form.valid_to,
                form.department,
                form.description,
                truncate_chars(file_content, FILE_EXCERPT_CHARS),
            ),
            Self::Update {
                policy_id,
                file_content,
                ..
            } => format!(
                "Policy ID: {policy_id}\nUpdated File Content (excerpt):\n{}",
                truncate_chars(file_content, FILE_EXCERPT_CHARS)
            ),
        }
    }

    /// Existing documents the submission could clash with.
    pub fn candidate_query(&self) -> DocumentQuery {
        match self {
            Self::Create { form, .. } => DocumentQuery::new()
                .department(form.department.trim())
                .or_identity(IdentityClause::PolicyNumber(form.policy_number.clone()))
                .or_identity(IdentityClause::TitleContains(form.policy_name.clone())),
            Self::Update { policy_id, .. } => DocumentQuery::new()
                .or_identity(IdentityClause::PolicyNumber(policy_id.clone()))
                .or_identity(IdentityClause::Id(policy_id.clone())),
        }
    }
}

/// Document inserted for a create submission.
pub(crate) fn new_document(
    form: &PolicyFormData,
    file_content: &str,
    file_name: Option<&str>,
    uploaded_at: &str,
) -> NewDocument {
    let mut metadata = Metadata::new();
    if let Some(name) = file_name {
        metadata.insert("fileName".to_string(), Value::from(name));
    }
    metadata.insert("fileSize".to_string(), Value::from(file_content.len()));
    metadata.insert("uploadedAt".to_string(), Value::from(uploaded_at));

    NewDocument {
        title: form.policy_name.clone(),
        content: file_content.to_string(),
        department: form.department.trim().to_string(),
        policy_number: Some(form.policy_number.clone()),
        issuer: Some(form.issuer.clone()),
        policy_type: Some(form.policy_type.clone()),
        valid_from: Some(form.valid_from.clone()),
        valid_to: Some(form.valid_to.clone()),
        description: Some(form.description.clone()),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_store::Document;
    use pretty_assertions::assert_eq;

    fn form() -> PolicyFormData {
        PolicyFormData {
            policy_name: "Clinic Hours".to_string(),
            policy_number: "CH-2024".to_string(),
            issuer: "Directorate of Health".to_string(),
            policy_type: "Circular".to_string(),
            valid_from: "2024-01-01".to_string(),
            valid_to: "2025-01-01".to_string(),
            description: "Opening hours for district clinics".to_string(),
            department: "health".to_string(),
        }
    }

    fn stored(id: &str, title: &str, department: &str, number: Option<&str>) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            content: String::new(),
            department: department.to_string(),
            policy_number: number.map(str::to_string),
            issuer: None,
            policy_type: None,
            valid_from: None,
            valid_to: None,
            description: None,
            stored_at: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn create_description_lists_form_then_capped_excerpt() {
        let submission = PolicySubmission::create(form(), "ж".repeat(5000));
        let text = submission.describe();
        assert!(text.starts_with(
            "Policy Name: Clinic Hours\nPolicy Number: CH-2024\nIssuer: Directorate of Health\n\
Type: Circular\nValid From: 2024-01-01\nValid To: 2025-01-01\nDepartment: health\n\
Description: Opening hours for district clinics\n\nFile Content (excerpt):\n"
        ));
        assert_eq!(text.matches('ж').count(), FILE_EXCERPT_CHARS);
    }

    #[test]
    fn update_description() {
        let submission = PolicySubmission::update("CH-2024", "New hours");
        assert_eq!(
            submission.describe(),
            "Policy ID: CH-2024\nUpdated File Content (excerpt):\nNew hours"
        );
    }

    #[test]
    fn create_candidates_are_scoped_to_department() {
        let query = PolicySubmission::create(form(), "").candidate_query();
        assert!(query.matches(&stored("doc-1", "clinic hours (2019)", "health", None)));
        assert!(query.matches(&stored("doc-2", "Other", "health", Some("CH-2024"))));
        assert!(!query.matches(&stored("doc-3", "Clinic Hours", "finance", None)));
        assert!(!query.matches(&stored("doc-4", "Waste", "health", Some("HW-1"))));
    }

    #[test]
    fn update_candidates_match_number_or_id() {
        let query = PolicySubmission::update("doc-000007", "").candidate_query();
        assert!(query.matches(&stored("doc-000007", "Any", "finance", None)));
        assert!(query.matches(&stored("doc-1", "Any", "health", Some("doc-000007"))));
        assert!(!query.matches(&stored("doc-2", "doc-000007", "health", None)));
    }

    #[test]
    fn new_document_carries_upload_metadata() {
        let doc = new_document(&form(), "body", Some("hours.txt"), "2024-06-01T00:00:00Z");
        assert_eq!(doc.title, "Clinic Hours");
        assert_eq!(doc.policy_number.as_deref(), Some("CH-2024"));
        assert_eq!(doc.metadata["fileName"], "hours.txt");
        assert_eq!(doc.metadata["fileSize"], 4);
        assert_eq!(doc.metadata["uploadedAt"], "2024-06-01T00:00:00Z");
    }

    #[test]
    fn validation_follows_mode() {
        assert!(PolicySubmission::create(form(), "").validate().is_empty());
        assert_eq!(PolicySubmission::update("  ", "").validate().len(), 1);
    }
}
