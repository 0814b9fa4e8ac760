use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored policy document.
///
/// `content` is always present (possibly empty); together with `title` and `description`
/// it is the only text the pipeline reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Title used in prompts and citations when the stored one is blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Policy Document"
        } else {
            &self.title
        }
    }
}

/// Fields supplied when inserting a document; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub department: String,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default, rename = "type")]
    pub policy_type: Option<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_to: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewDocument {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            department: department.into(),
            ..Default::default()
        }
    }

    pub fn policy_number(mut self, number: impl Into<String>) -> Self {
        self.policy_number = Some(number.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn into_document(self, id: String) -> Document {
        Document {
            id,
            title: self.title,
            content: self.content,
            department: self.department,
            policy_number: self.policy_number,
            issuer: self.issuer,
            policy_type: self.policy_type,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            description: self.description,
            stored_at: Some(Utc::now()),
            metadata: self.metadata,
        }
    }
}

/// Partial update applied to an existing document. Metadata keys are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub content: Option<String>,
    pub metadata: Metadata,
}

impl DocumentPatch {
    pub(crate) fn apply(self, doc: &mut Document) {
        if let Some(content) = self.content {
            doc.content = content;
        }
        for (key, value) in self.metadata {
            doc.metadata.insert(key, value);
        }
        doc.stored_at = Some(Utc::now());
    }
}
