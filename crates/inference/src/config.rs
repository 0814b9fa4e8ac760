use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const MAX_CONCURRENCY: usize = 32;
const DEFAULT_TIMEOUT_MS: u64 = 100_000;
const DEFAULT_QUEUE_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Sampling parameters passed to the engine for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub context_size: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.7,
            context_size: 2048,
        }
    }
}

impl GenerationOptions {
    pub fn apply(self, overrides: &GenerationOverrides) -> Self {
        Self {
            max_tokens: overrides.max_tokens.unwrap_or(self.max_tokens),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            context_size: overrides.context_size.unwrap_or(self.context_size),
        }
    }
}

/// Per-request partial override of [`GenerationOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOverrides {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub context_size: Option<u32>,
}

impl GenerationOverrides {
    pub fn max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }
}

/// Everything the process runner needs; passed in at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the engine executable (e.g. `llama-cli`).
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Path to the model weights file handed to the engine.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default)]
    pub defaults: GenerationOptions,

    /// Wall-clock budget for a single engine process.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum engine processes running at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrent: usize,

    /// How long a request may wait for a free slot before failing.
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,

    /// Stdout beyond this many bytes is drained and discarded.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("llama-cli")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/gemma-3-4b-it-q4_0.gguf")
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

const fn default_queue_timeout_ms() -> u64 {
    DEFAULT_QUEUE_TIMEOUT_MS
}

const fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

/// CPU-aware default: local inference is memory and core hungry, so keep it small.
pub fn default_max_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let value = if cpus <= 4 {
        1
    } else if cpus <= 12 {
        2
    } else {
        3
    };
    value.clamp(1, MAX_CONCURRENCY)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            model_path: default_model_path(),
            defaults: GenerationOptions::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent: default_max_concurrency(),
            queue_timeout_ms: DEFAULT_QUEUE_TIMEOUT_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl EngineConfig {
    pub fn new(binary_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.binary_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("binary_path", "must not be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms", "must be > 0"));
        }
        if self.max_concurrent == 0 || self.max_concurrent > MAX_CONCURRENCY {
            return Err(ConfigError::invalid(
                "max_concurrent",
                format!("must be within 1..={MAX_CONCURRENCY}"),
            ));
        }
        if self.defaults.max_tokens == 0 {
            return Err(ConfigError::invalid("defaults.max_tokens", "must be > 0"));
        }
        if self.defaults.context_size == 0 {
            return Err(ConfigError::invalid("defaults.context_size", "must be > 0"));
        }
        let temp = self.defaults.temperature;
        if !(0.0..=2.0).contains(&temp) {
            return Err(ConfigError::invalid(
                "defaults.temperature",
                format!("{temp} is outside 0.0..=2.0"),
            ));
        }
        if self.max_output_bytes == 0 {
            return Err(ConfigError::invalid("max_output_bytes", "must be > 0"));
        }
        Ok(())
    }
}
