//! # Policy Inference
//!
//! Runs a local text-generation binary (llama.cpp style CLI) as a subprocess, one
//! process per request.
//!
//! ## Architecture
//!
//! ```text
//! prompt
//!     │
//!     ├──> sanitize (strip NUL / control characters)
//!     │
//!     ├──> concurrency gate (bounded semaphore, queue timeout)
//!     │
//!     ├──> spawn engine ── stdout chunks ──> bounded buffer
//!     │         │       └─ stderr chunks ──> filtered debug log
//!     │         │
//!     │         └─ wall-clock timeout ──> kill + InferenceError::Timeout
//!     │
//!     └──> clean output (drop engine log lines, trailing echo markers)
//!              └─> non-empty text or the fixed fallback sentinel
//! ```

mod cache;
mod clean;
mod config;
mod engine;
mod error;
mod runner;
mod sanitize;

pub use cache::{CacheKey, ResponseCache};
pub use clean::{clean_output, is_engine_log_line, should_surface_stderr, NO_RESPONSE_SENTINEL};
pub use config::{default_max_concurrency, EngineConfig, GenerationOptions, GenerationOverrides};
pub use engine::InferenceEngine;
pub use error::{ConfigError, InferenceError, Result};
pub use runner::{GateSnapshot, ProcessRunner};
pub use sanitize::sanitize_prompt;
