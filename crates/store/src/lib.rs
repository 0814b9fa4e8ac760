//! # Policy Store
//!
//! Document model and the store collaborator used by the policy assistant pipeline.
//!
//! The pipeline never owns persistence: it reads documents through [`DocumentStore`]
//! (retrieval, conflict candidates) and hands new or updated documents back to it
//! (upload flow). Two implementations ship with the crate:
//!
//! - [`MemoryStore`] keeps documents in insertion order, for tests and ephemeral runs
//! - [`JsonFileStore`] persists the same collection to a JSON array on disk
//!
//! ## Example
//!
//! ```no_run
//! use policy_store::{DocumentQuery, DocumentStore, MemoryStore, NewDocument};
//!
//! #[tokio::main]
//! async fn main() -> policy_store::Result<()> {
//!     let store = MemoryStore::new();
//!     store
//!         .insert(NewDocument::new("Vaccination Drive", "All clinics must ...", "health"))
//!         .await?;
//!
//!     let query = DocumentQuery::new().any_terms(["vaccination"]).department("health");
//!     let docs = store.find(&query, 5).await?;
//!     assert_eq!(docs.len(), 1);
//!     Ok(())
//! }
//! ```

mod document;
mod error;
mod file;
mod memory;
mod query;
mod store;

pub use document::{Document, DocumentPatch, Metadata, NewDocument};
pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use query::{DocumentQuery, IdentityClause};
pub use store::DocumentStore;
