use async_trait::async_trait;
use policy_inference::{GenerationOverrides, InferenceEngine, InferenceError};
use std::sync::{Arc, Mutex};

type Reply = Box<dyn Fn(&str) -> policy_inference::Result<String> + Send + Sync>;

/// Engine double that records prompts and answers each one from a script.
pub(crate) struct ScriptedEngine {
    reply: Reply,
    calls: Mutex<Vec<(String, GenerationOverrides)>>,
}

impl ScriptedEngine {
    pub(crate) fn responding<F>(reply: F) -> Arc<Self>
    where
        F: Fn(&str) -> policy_inference::Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn replying(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::responding(move |_| Ok(text.clone()))
    }

    pub(crate) fn failing(err: fn() -> InferenceError) -> Arc<Self> {
        Self::responding(move |_| Err(err()))
    }

    pub(crate) fn calls(&self) -> Vec<(String, GenerationOverrides)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn generate(
        &self,
        prompt: &str,
        overrides: GenerationOverrides,
    ) -> policy_inference::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), overrides));
        (self.reply)(prompt)
    }
}
