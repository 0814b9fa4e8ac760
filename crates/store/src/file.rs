use crate::{
    Document, DocumentPatch, DocumentQuery, DocumentStore, MemoryStore, NewDocument, Result,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Document collection persisted as a JSON array.
///
/// Reads are served from memory. A mutation is staged, written via tmp + rename, and
/// only becomes visible once the file write succeeded.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    // Serializes stage/write/commit.
    persist_lock: Mutex<()>,
}

impl JsonFileStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let docs: Vec<Document> = if tokio::fs::try_exists(&path).await? {
            let bytes = tokio::fs::read(&path).await?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Vec::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            Vec::new()
        };
        log::info!("Opened document store at {:?} ({} docs)", path, docs.len());
        Ok(Self {
            path,
            inner: MemoryStore::from_documents(docs),
            persist_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    async fn write_file(&self, docs: &[Document]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(docs)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn find(&self, query: &DocumentQuery, limit: usize) -> Result<Vec<Document>> {
        self.inner.find_sync(query, limit)
    }

    async fn insert(&self, doc: NewDocument) -> Result<String> {
        let _guard = self.persist_lock.lock().await;
        let mut staged = self.inner.stage()?;
        let id = staged.insert(doc)?;
        self.write_file(staged.docs()).await?;
        self.inner.commit(staged)?;
        log::debug!("Inserted document {id}");
        Ok(id)
    }

    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Document> {
        let _guard = self.persist_lock.lock().await;
        let mut staged = self.inner.stage()?;
        let doc = staged.update(id, patch)?;
        self.write_file(staged.docs()).await?;
        self.inner.commit(staged)?;
        Ok(doc)
    }

    fn generation(&self) -> u64 {
        self.inner.generation()
    }
}
