use crate::EngineFlags;
use anyhow::{Context, Result};
use policy_agent::{AgentConfig, Drafter, LegalKb, PolicyAgent};
use policy_inference::ProcessRunner;
use policy_store::JsonFileStore;
use std::path::Path;
use std::sync::Arc;

/// Config file, then environment, then command-line flags.
pub fn load_config(path: &Path, flags: &EngineFlags) -> Result<AgentConfig> {
    let mut config = AgentConfig::load(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    config.apply_env().context("Invalid environment override")?;

    if let Some(binary) = &flags.llm_binary {
        config.engine.binary_path = binary.clone();
    }
    if let Some(model) = &flags.model {
        config.engine.model_path = model.clone();
    }
    if let Some(timeout_ms) = flags.timeout_ms {
        config.engine.timeout_ms = timeout_ms;
    }
    if let Some(max) = flags.max_concurrency {
        config.engine.max_concurrent = max;
    }

    config.validate().context("Invalid configuration")?;
    log::debug!(
        "Engine {} with model {} (timeout {}ms, {} slots)",
        config.engine.binary_path.display(),
        config.engine.model_path.display(),
        config.engine.timeout_ms,
        config.engine.max_concurrent
    );
    Ok(config)
}

pub async fn agent(
    config_path: &Path,
    store_path: &Path,
    flags: &EngineFlags,
) -> Result<PolicyAgent> {
    let config = load_config(config_path, flags)?;
    let store = JsonFileStore::open(store_path)
        .await
        .with_context(|| format!("Failed to open document store {}", store_path.display()))?;
    let runner =
        ProcessRunner::new(config.engine.clone()).context("Invalid engine configuration")?;
    Ok(PolicyAgent::new(Arc::new(store), Arc::new(runner), &config))
}

pub fn drafter(config_path: &Path, flags: &EngineFlags, kb_dir: Option<&Path>) -> Result<Drafter> {
    let config = load_config(config_path, flags)?;
    let kb = LegalKb::load_dir(kb_dir.unwrap_or(&config.drafting.kb_dir));
    if kb.is_empty() {
        log::warn!("Legal KB is empty; drafting without legal rules");
    }
    let runner =
        ProcessRunner::new(config.engine.clone()).context("Invalid engine configuration")?;
    Ok(Drafter::new(Arc::new(runner), kb, &config.drafting))
}
