use crate::tokenizer::tokenize;
use policy_store::{Document, DocumentQuery, DocumentStore};
use std::sync::Arc;

pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// Match terms and scope derived from a free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub terms: Vec<String>,
    pub department: Option<String>,
    pub limit: usize,
}

impl RetrievalQuery {
    /// Returns `None` when the text yields no usable terms.
    pub fn from_text(text: &str, department: Option<&str>, limit: usize) -> Option<Self> {
        let terms = tokenize(text);
        if terms.is_empty() {
            return None;
        }
        Some(Self {
            terms,
            department: department
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            limit: limit.max(1),
        })
    }

    pub fn to_store_query(&self) -> DocumentQuery {
        let query = DocumentQuery::new().any_terms(self.terms.iter().cloned());
        match &self.department {
            Some(department) => query.department(department.clone()),
            None => query,
        }
    }
}

/// Fetches a bounded, unranked candidate set for a query.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
    default_limit: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            default_limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn retrieve(&self, query: &str, department: Option<&str>) -> Vec<Document> {
        self.retrieve_with_limit(query, department, self.default_limit)
            .await
    }

    /// Store failures degrade to an empty result.
    pub async fn retrieve_with_limit(
        &self,
        query: &str,
        department: Option<&str>,
        limit: usize,
    ) -> Vec<Document> {
        let Some(retrieval) = RetrievalQuery::from_text(query, department, limit) else {
            log::debug!("Query produced no retrieval terms, skipping store");
            return Vec::new();
        };

        match self
            .store
            .find(&retrieval.to_store_query(), retrieval.limit)
            .await
        {
            Ok(docs) => {
                log::info!(
                    "Found {} docs matching {} query terms",
                    docs.len(),
                    retrieval.terms.len()
                );
                docs
            }
            Err(err) => {
                log::warn!("Document store error during retrieval: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use policy_store::{DocumentPatch, MemoryStore, NewDocument, StoreError};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts `find` calls and can be told to fail.
    struct ProbeStore {
        inner: MemoryStore,
        finds: AtomicUsize,
        fail: bool,
    }

    impl ProbeStore {
        fn new(fail: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                finds: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl DocumentStore for ProbeStore {
        async fn find(
            &self,
            query: &DocumentQuery,
            limit: usize,
        ) -> policy_store::Result<Vec<Document>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::unavailable("connection refused"));
            }
            self.inner.find(query, limit).await
        }

        async fn insert(&self, doc: NewDocument) -> policy_store::Result<String> {
            self.inner.insert(doc).await
        }

        async fn update(&self, id: &str, patch: DocumentPatch) -> policy_store::Result<Document> {
            self.inner.update(id, patch).await
        }

        fn generation(&self) -> u64 {
            self.inner.generation()
        }
    }

    async fn seeded_store() -> Arc<ProbeStore> {
        let store = Arc::new(ProbeStore::new(false));
        let docs = [
            ("Maternity Leave", "Twenty six weeks of paid leave", "health"),
            ("Travel Allowance", "Leave travel concession rules", "finance"),
            ("Clinic Hours", "Primary health centres open at nine", "health"),
        ];
        for (title, content, department) in docs {
            store
                .insert(NewDocument::new(title, content, department))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn short_token_query_never_touches_store() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store.clone());

        let docs = retriever.retrieve("is it ok", Some("health")).await;
        assert!(docs.is_empty());
        assert_eq!(store.finds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn department_filter_excludes_other_departments() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store.clone());

        let docs = retriever.retrieve("leave rules", Some("health")).await;
        assert!(!docs.is_empty());
        assert!(docs.iter().all(|d| d.department == "health"));

        let unscoped = retriever.retrieve("leave rules", None).await;
        let titles: Vec<&str> = unscoped.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Maternity Leave", "Travel Allowance"]);
    }

    #[tokio::test]
    async fn results_are_capped_at_limit() {
        let store = seeded_store().await;
        let retriever = Retriever::new(store).with_limit(1);
        let docs = retriever.retrieve("health leave hours", None).await;
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty() {
        let store = Arc::new(ProbeStore::new(true));
        let retriever = Retriever::new(store.clone());
        let docs = retriever.retrieve("maternity leave", None).await;
        assert!(docs.is_empty());
        assert_eq!(store.finds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blank_department_is_unscoped() {
        let query = RetrievalQuery::from_text("clinic hours", Some("  "), 0).unwrap();
        assert_eq!(query.department, None);
        assert_eq!(query.limit, 1);
    }
}
