use crate::Document;

/// Identity predicates used to find candidates for a specific policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityClause {
    Id(String),
    PolicyNumber(String),
    /// Case-insensitive substring of the title.
    TitleContains(String),
}

impl IdentityClause {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Id(id) => doc.id == *id,
            Self::PolicyNumber(number) => doc.policy_number.as_deref() == Some(number.as_str()),
            Self::TitleContains(needle) => contains_ignore_case(&doc.title, needle),
        }
    }
}

/// Match predicate understood by every [`crate::DocumentStore`].
///
/// Clauses combine as: `department` AND (ANY term) AND (ANY identity clause). Empty groups
/// do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub any_terms: Vec<String>,
    pub department: Option<String>,
    pub identity: Vec<IdentityClause>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn any_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_terms.extend(terms.into_iter().map(Into::into));
        self
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn or_identity(mut self, clause: IdentityClause) -> Self {
        self.identity.push(clause);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(department) = &self.department {
            if doc.department != *department {
                return false;
            }
        }

        if !self.any_terms.is_empty() && !self.any_terms.iter().any(|t| term_matches(doc, t)) {
            return false;
        }

        self.identity.is_empty() || self.identity.iter().any(|c| c.matches(doc))
    }
}

fn term_matches(doc: &Document, term: &str) -> bool {
    contains_ignore_case(&doc.title, term)
        || contains_ignore_case(&doc.content, term)
        || doc
            .description
            .as_deref()
            .is_some_and(|d| contains_ignore_case(d, term))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewDocument;

    fn doc(title: &str, content: &str, department: &str) -> Document {
        NewDocument::new(title, content, department).into_document("doc-1".to_string())
    }

    #[test]
    fn terms_match_any_text_field_case_insensitively() {
        let mut d = doc("Malaria Control", "Spraying schedule", "health");
        d.description = Some("Vector BORNE disease".to_string());

        assert!(DocumentQuery::new().any_terms(["malaria"]).matches(&d));
        assert!(DocumentQuery::new().any_terms(["SCHEDULE"]).matches(&d));
        assert!(DocumentQuery::new().any_terms(["borne"]).matches(&d));
        assert!(DocumentQuery::new()
            .any_terms(["budget", "spray"])
            .matches(&d));
        assert!(!DocumentQuery::new().any_terms(["budget"]).matches(&d));
    }

    #[test]
    fn department_is_conjunctive() {
        let d = doc("Malaria Control", "Spraying", "health");
        assert!(!DocumentQuery::new()
            .any_terms(["malaria"])
            .department("finance")
            .matches(&d));
        assert!(DocumentQuery::new()
            .any_terms(["malaria"])
            .department("health")
            .matches(&d));
    }

    #[test]
    fn identity_clauses_are_disjunctive() {
        let mut d = doc("Drug Pricing Order", "", "finance");
        d.policy_number = Some("DP-7".to_string());

        let by_number = DocumentQuery::new()
            .or_identity(IdentityClause::PolicyNumber("DP-7".to_string()))
            .or_identity(IdentityClause::TitleContains("unrelated".to_string()));
        assert!(by_number.matches(&d));

        let by_title =
            DocumentQuery::new().or_identity(IdentityClause::TitleContains("pricing".to_string()));
        assert!(by_title.matches(&d));

        let miss = DocumentQuery::new().or_identity(IdentityClause::Id("doc-9".to_string()));
        assert!(!miss.matches(&d));
    }
}
