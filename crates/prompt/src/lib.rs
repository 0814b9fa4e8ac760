//! # Policy Prompt
//!
//! Pure, deterministic prompt templates. Every document excerpt embedded in a prompt is
//! cut at a character cap so prompt size (and therefore engine latency) stays bounded.
//!
//! ```rust
//! use policy_prompt::{build_answer_prompt, format_answer_context};
//! use policy_store::Document;
//!
//! let docs: Vec<Document> = Vec::new();
//! let prompt = build_answer_prompt("What is the leave policy?", &format_answer_context(&docs));
//! assert!(prompt.contains("User Question: What is the leave policy?"));
//! ```

mod drafting;
mod templates;
mod text;

pub use drafting::{build_intent_prompt, build_section_prompt, DEFAULT_DRAFT_SECTIONS};
pub use templates::{
    build_answer_prompt, build_conflict_prompt, format_answer_context, render_candidate_excerpt,
    PromptBuilder, PromptTemplates, ANSWER_EXCERPT_CHARS, CONFLICTS_FOUND_MARKER,
    CONFLICTS_MARKER, CONFLICT_EXCERPT_CHARS, SUGGESTIONS_MARKER,
};
pub use text::truncate_chars;
