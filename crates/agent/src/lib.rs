//! # Policy Agent
//!
//! Caller-facing operations of the policy assistant:
//!
//! - [`PolicyAgent::answer_query`] answers a question from retrieved policy context
//! - [`PolicyAgent::check_conflict`] compares a new policy against existing excerpts
//! - [`PolicyAgent::check_submission`] finds related stored policies and checks them
//! - [`PolicyAgent::upload`] stores a new policy or replaces an existing one
//! - [`Drafter::draft`] drafts a policy from a free-text request and a legal KB
//!
//! ## Flow
//!
//! ```text
//! query ──> fast path ──(short)──> canned reply
//!             │
//!             └──> retriever ──> prompt builder ──> inference engine ──> answer
//!
//! submission ──> candidate search ──(none)──> no conflict
//!                      │
//!                      └──> conflict prompt ──> inference engine ──> response parser
//! ```
//!
//! The engine is any [`policy_inference::InferenceEngine`]; production code passes a
//! [`policy_inference::ProcessRunner`].

mod config;
mod draft;
mod error;
mod fast_path;
mod parser;
mod pipeline;
mod submission;
#[cfg(test)]
mod test_support;

pub use config::{
    AgentConfig, CacheConfig, DraftingConfig, RetrievalConfig, TokenBudgets, DEFAULT_DEPARTMENT,
    ENV_KB_DIR, ENV_LLM_BINARY, ENV_MAX_CONCURRENCY, ENV_MODEL_PATH, ENV_TIMEOUT_MS,
};
pub use draft::{
    check_feasibility, extract_citations, extract_json_object, parse_intent, render_markdown,
    Drafter, GroupedRules, IntentError, LegalKb, LegalRule, RuleKind,
};
pub use error::{PipelineError, Result};
pub use fast_path::{try_fast_path, FAST_PATH_MAX_CHARS};
pub use parser::{
    parse_conflict_response, ConflictVerdict, CONFLICT_PLACEHOLDER, SUGGESTION_PLACEHOLDER,
};
pub use pipeline::PolicyAgent;
pub use submission::{PolicySubmission, FILE_EXCERPT_CHARS};
