use crate::{sanitize_prompt, GenerationOverrides};
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// SHA-256 of the sanitized prompt plus the generation overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(prompt: &str, overrides: &GenerationOverrides) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sanitize_prompt(prompt).as_bytes());
        hasher.update([0u8]);
        hasher.update(format_option(overrides.max_tokens.map(u64::from)));
        hasher.update(format_option(overrides.temperature.map(|t| u64::from(t.to_bits()))));
        hasher.update(format_option(overrides.context_size.map(u64::from)));
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn format_option(value: Option<u64>) -> Vec<u8> {
    match value {
        Some(v) => format!("s{v};").into_bytes(),
        None => b"n;".to_vec(),
    }
}

struct CacheEntry {
    generation: u64,
    text: String,
}

/// Bounded cache of successful engine responses.
///
/// Each entry remembers the document-store generation it was produced under; a lookup
/// with a different generation is a miss and evicts the stale entry.
pub struct ResponseCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &CacheKey, generation: u64) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.generation == generation => {
                log::debug!("Response cache hit {}", &key.to_hex()[..12]);
                Some(entry.text.clone())
            }
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: CacheKey, generation: u64, text: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, CacheEntry { generation, text });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("len", &self.len())
            .finish()
    }
}
