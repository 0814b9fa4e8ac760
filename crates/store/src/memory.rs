use crate::{
    Document, DocumentPatch, DocumentQuery, DocumentStore, NewDocument, Result, StoreError,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Insertion-ordered in-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
    next_id: AtomicU64,
    generation: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(docs: Vec<Document>) -> Self {
        let next_id = docs
            .iter()
            .filter_map(|d| d.id.strip_prefix("doc-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .map_or(0, |n| n + 1);
        Self {
            docs: RwLock::new(docs),
            next_id: AtomicU64::new(next_id),
            generation: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn find_sync(&self, query: &DocumentQuery, limit: usize) -> Result<Vec<Document>> {
        let docs = self.read()?;
        Ok(docs
            .iter()
            .filter(|d| query.matches(d))
            .take(limit)
            .cloned()
            .collect())
    }

    pub(crate) fn insert_sync(&self, doc: NewDocument) -> Result<String> {
        let mut docs = self.write()?;
        let mut next_id = self.next_id.load(Ordering::Relaxed);
        let id = insert_into(&mut docs, &mut next_id, doc)?;
        self.next_id.store(next_id, Ordering::Relaxed);
        drop(docs);
        self.generation.fetch_add(1, Ordering::Relaxed);
        log::debug!("Inserted document {id}");
        Ok(id)
    }

    pub(crate) fn update_sync(&self, id: &str, patch: DocumentPatch) -> Result<Document> {
        let mut docs = self.write()?;
        let updated = update_in(&mut docs, id, patch)?;
        drop(docs);
        self.generation.fetch_add(1, Ordering::Relaxed);
        Ok(updated)
    }

    /// Copy of the current state; mutations on it stay invisible until committed.
    pub(crate) fn stage(&self) -> Result<Staged> {
        Ok(Staged {
            docs: self.read()?.clone(),
            next_id: self.next_id.load(Ordering::Relaxed),
        })
    }

    /// Publishes a staged state. Callers serialize stage/commit pairs.
    pub(crate) fn commit(&self, staged: Staged) -> Result<()> {
        let mut docs = self.write()?;
        *docs = staged.docs;
        self.next_id.store(staged.next_id, Ordering::Relaxed);
        drop(docs);
        self.generation.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Document>>> {
        self.docs
            .read()
            .map_err(|_| StoreError::unavailable("document lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Document>>> {
        self.docs
            .write()
            .map_err(|_| StoreError::unavailable("document lock poisoned"))
    }
}

#[derive(Debug)]
pub(crate) struct Staged {
    docs: Vec<Document>,
    next_id: u64,
}

impl Staged {
    pub(crate) fn docs(&self) -> &[Document] {
        &self.docs
    }

    pub(crate) fn insert(&mut self, doc: NewDocument) -> Result<String> {
        insert_into(&mut self.docs, &mut self.next_id, doc)
    }

    pub(crate) fn update(&mut self, id: &str, patch: DocumentPatch) -> Result<Document> {
        update_in(&mut self.docs, id, patch)
    }
}

/// Rejects a second document carrying an already stored policy number.
fn insert_into(docs: &mut Vec<Document>, next_id: &mut u64, doc: NewDocument) -> Result<String> {
    if let Some(number) = doc.policy_number.as_deref().filter(|n| !n.trim().is_empty()) {
        if docs.iter().any(|d| d.policy_number.as_deref() == Some(number)) {
            return Err(StoreError::Duplicate(number.to_string()));
        }
    }
    let id = format!("doc-{:06}", *next_id);
    *next_id += 1;
    docs.push(doc.into_document(id.clone()));
    Ok(id)
}

fn update_in(docs: &mut [Document], id: &str, patch: DocumentPatch) -> Result<Document> {
    let doc = docs
        .iter_mut()
        .find(|d| d.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    patch.apply(doc);
    Ok(doc.clone())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, query: &DocumentQuery, limit: usize) -> Result<Vec<Document>> {
        self.find_sync(query, limit)
    }

    async fn insert(&self, doc: NewDocument) -> Result<String> {
        self.insert_sync(doc)
    }

    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Document> {
        self.update_sync(id, patch)
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}
