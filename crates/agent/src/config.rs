use crate::error::{PipelineError, Result};
use policy_inference::{ConfigError, EngineConfig};
use policy_prompt::{PromptTemplates, DEFAULT_DRAFT_SECTIONS};
use policy_retrieval::DEFAULT_RETRIEVAL_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DEPARTMENT: &str = "health";
const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Environment variables consulted by [`AgentConfig::apply_env`], first match wins.
pub const ENV_LLM_BINARY: &[&str] = &["POLICY_AGENT_LLM_BINARY", "LLAMA_CPP_PATH"];
pub const ENV_MODEL_PATH: &[&str] = &["POLICY_AGENT_MODEL_PATH", "LLM_MODEL_PATH"];
pub const ENV_TIMEOUT_MS: &str = "POLICY_AGENT_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENCY: &str = "POLICY_AGENT_MAX_CONCURRENCY";
pub const ENV_KB_DIR: &str = "POLICY_AGENT_KB_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Department used by question answering when the caller gives none.
    #[serde(default = "default_department")]
    pub default_department: String,
    /// Candidate cap for conflict checks.
    #[serde(default = "default_limit")]
    pub candidate_limit: usize,
}

const fn default_limit() -> usize {
    DEFAULT_RETRIEVAL_LIMIT
}

fn default_department() -> String {
    DEFAULT_DEPARTMENT.to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RETRIEVAL_LIMIT,
            default_department: default_department(),
            candidate_limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Token budgets for the two prompt kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenBudgets {
    pub answer: u32,
    pub conflict: u32,
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            answer: 200,
            conflict: 1500,
        }
    }
}

/// Policy drafting. Every drafting call runs with these sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingConfig {
    /// Directory of legal KB `*.json` files.
    pub kb_dir: PathBuf,
    pub intent_tokens: u32,
    pub section_tokens: u32,
    pub temperature: f32,
    pub context_size: u32,
    /// Section titles, in document order.
    pub sections: Vec<String>,
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            kb_dir: PathBuf::from("kb"),
            intent_tokens: 512,
            section_tokens: 2000,
            temperature: 0.1,
            context_size: 4096,
            sections: DEFAULT_DRAFT_SECTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub engine: EngineConfig,
    pub retrieval: RetrievalConfig,
    pub cache: CacheConfig,
    pub tokens: TokenBudgets,
    pub prompts: PromptTemplates,
    pub drafting: DraftingConfig,
}

impl AgentConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(PipelineError::Config(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(k));

        if let Some(binary) = first(ENV_LLM_BINARY) {
            self.engine.binary_path = PathBuf::from(binary);
        }
        if let Some(model) = first(ENV_MODEL_PATH) {
            self.engine.model_path = PathBuf::from(model);
        }
        if let Some(raw) = get(ENV_TIMEOUT_MS) {
            self.engine.timeout_ms = parse_number(ENV_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_MAX_CONCURRENCY) {
            self.engine.max_concurrent = parse_number(ENV_MAX_CONCURRENCY, &raw)?;
        }
        if let Some(dir) = get(ENV_KB_DIR) {
            self.drafting.kb_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.engine.validate()?;
        if self.retrieval.limit == 0 || self.retrieval.candidate_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.limit",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.capacity",
                reason: "must be > 0 when the cache is enabled".to_string(),
            });
        }
        if self.tokens.answer == 0 || self.tokens.conflict == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tokens",
                reason: "must be > 0".to_string(),
            });
        }
        let drafting = &self.drafting;
        if drafting.intent_tokens == 0 || drafting.section_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "drafting.tokens",
                reason: "must be > 0".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&drafting.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "drafting.temperature",
                reason: format!("{} is outside 0.0..=2.0", drafting.temperature),
            });
        }
        if drafting.sections.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "drafting.sections",
                reason: "at least one section is required".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("{key}={raw:?} is not a valid number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_is_default() {
        let config = AgentConfig::from_toml_str("").unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.retrieval.default_department, "health");
        assert!(!config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AgentConfig::from_toml_str(
            r#"
[engine]
binary_path = "/opt/llama/llama-cli"
timeout_ms = 30000

[engine.defaults]
temperature = 0.2

[cache]
enabled = true
"#,
        )
        .unwrap();
        assert_eq!(config.engine.binary_path, PathBuf::from("/opt/llama/llama-cli"));
        assert_eq!(config.engine.timeout_ms, 30_000);
        assert_eq!(config.engine.defaults.temperature, 0.2);
        assert_eq!(config.engine.defaults.max_tokens, 256);
        assert_eq!(config.cache.capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.tokens, TokenBudgets::default());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = AgentConfig::from_toml_str("[engine\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn overrides_prefer_primary_names() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("POLICY_AGENT_LLM_BINARY", "/usr/local/bin/llama-cli"),
            ("LLAMA_CPP_PATH", "/ignored"),
            ("LLM_MODEL_PATH", "/models/phi.gguf"),
            ("POLICY_AGENT_TIMEOUT_MS", " 2500 "),
            ("POLICY_AGENT_MAX_CONCURRENCY", ""),
        ]);
        let mut config = AgentConfig::default();
        let before = config.engine.max_concurrent;
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.engine.binary_path, PathBuf::from("/usr/local/bin/llama-cli"));
        assert_eq!(config.engine.model_path, PathBuf::from("/models/phi.gguf"));
        assert_eq!(config.engine.timeout_ms, 2500);
        assert_eq!(config.engine.max_concurrent, before);
    }

    #[test]
    fn non_numeric_override_is_rejected() {
        let mut config = AgentConfig::default();
        let err = config
            .apply_overrides(|k| (k == ENV_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("POLICY_AGENT_TIMEOUT_MS"));
    }

    #[test]
    fn validation_rejects_zero_limits() {
        let mut config = AgentConfig::default();
        config.retrieval.limit = 0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.cache = CacheConfig {
            enabled: true,
            capacity: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn drafting_section_reads_from_toml_and_env() {
        let mut config = AgentConfig::from_toml_str(
            r#"
[drafting]
section_tokens = 800
sections = ["Scope", "Consent"]
"#,
        )
        .unwrap();
        assert_eq!(config.drafting.section_tokens, 800);
        assert_eq!(config.drafting.intent_tokens, 512);
        assert_eq!(config.drafting.sections, vec!["Scope", "Consent"]);
        assert_eq!(config.drafting.kb_dir, PathBuf::from("kb"));

        config
            .apply_overrides(|k| (k == ENV_KB_DIR).then(|| "/srv/kb".to_string()))
            .unwrap();
        assert_eq!(config.drafting.kb_dir, PathBuf::from("/srv/kb"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_unusable_drafting() {
        let mut config = AgentConfig::default();
        config.drafting.sections = vec![" ".to_string()];
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.drafting.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.drafting.section_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = AgentConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config, AgentConfig::default());
    }
}
