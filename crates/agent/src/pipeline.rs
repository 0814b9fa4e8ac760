use crate::config::AgentConfig;
use crate::error::{PipelineError, Result};
use crate::fast_path::try_fast_path;
use crate::parser::{parse_conflict_response, ConflictVerdict};
use crate::submission::{new_document, PolicySubmission};
use chrono::{SecondsFormat, Utc};
use policy_inference::{
    CacheKey, GenerationOverrides, InferenceEngine, ResponseCache, NO_RESPONSE_SENTINEL,
};
use policy_protocol::{AnswerResponse, ConflictCheckResponse, SourceRef, UploadPolicyResponse};
use policy_prompt::PromptBuilder;
use policy_retrieval::Retriever;
use policy_store::{DocumentPatch, DocumentStore, Metadata, StoreError};
use serde_json::Value;
use std::sync::Arc;

const LOG_PREVIEW_CHARS: usize = 80;

/// Orchestrates fast path, retrieval, prompting, inference and parsing.
pub struct PolicyAgent {
    retriever: Retriever,
    prompts: PromptBuilder,
    engine: Arc<dyn InferenceEngine>,
    cache: Option<ResponseCache>,
    default_department: String,
    candidate_limit: usize,
    answer_tokens: u32,
    conflict_tokens: u32,
}

impl PolicyAgent {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        engine: Arc<dyn InferenceEngine>,
        config: &AgentConfig,
    ) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResponseCache::new(config.cache.capacity));
        Self {
            retriever: Retriever::new(store).with_limit(config.retrieval.limit),
            prompts: PromptBuilder::new(config.prompts.clone()),
            engine,
            cache,
            default_department: config.retrieval.default_department.clone(),
            candidate_limit: config.retrieval.candidate_limit.max(1),
            answer_tokens: config.tokens.answer,
            conflict_tokens: config.tokens.conflict,
        }
    }

    fn store(&self) -> &Arc<dyn DocumentStore> {
        self.retriever.store()
    }

    pub async fn answer_query(
        &self,
        query: &str,
        department: Option<&str>,
    ) -> Result<AnswerResponse> {
        // Whitespace-only input is a short query and takes the fast path.
        if query.is_empty() {
            return Err(PipelineError::InvalidQuery);
        }

        if let Some(reply) = try_fast_path(query) {
            log::debug!("Fast path reply for short query");
            return Ok(AnswerResponse {
                answer: reply.to_string(),
                sources: Vec::new(),
            });
        }

        let department = department
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.default_department);
        log::info!(
            "Answering query in {department}: {}",
            preview(query, LOG_PREVIEW_CHARS)
        );

        let docs = self.retriever.retrieve(query, Some(department)).await;
        let context = self.prompts.answer_context(&docs);
        let prompt = self.prompts.answer_prompt(query, &context);

        let answer = self
            .generate(&prompt, GenerationOverrides::max_tokens(self.answer_tokens))
            .await?;

        let sources = docs
            .iter()
            .map(|doc| SourceRef {
                title: doc.display_title().to_string(),
                department: doc.department.clone(),
            })
            .collect();

        Ok(AnswerResponse { answer, sources })
    }

    /// Compares a new policy description against existing policy descriptions.
    pub async fn check_conflict(
        &self,
        new_description: &str,
        candidates: &[String],
    ) -> Result<ConflictVerdict> {
        let prompt = self.prompts.conflict_prompt(new_description, candidates);
        self.analyze_conflicts(&prompt).await
    }

    async fn analyze_conflicts(&self, prompt: &str) -> Result<ConflictVerdict> {
        let reply = self
            .generate(prompt, GenerationOverrides::max_tokens(self.conflict_tokens))
            .await?;
        let verdict = parse_conflict_response(&reply);
        log::info!(
            "Conflict analysis complete: conflict={}, {} findings",
            verdict.has_conflict,
            verdict.conflicts.len()
        );
        Ok(verdict)
    }

    /// Finds related stored policies and runs conflict analysis against them.
    ///
    /// No candidates means no conflict and no engine call.
    pub async fn check_submission(
        &self,
        submission: &PolicySubmission,
    ) -> Result<ConflictCheckResponse> {
        let errors = submission.validate();
        if !errors.is_empty() {
            return Err(PipelineError::InvalidSubmission(errors));
        }

        let candidates = self
            .store()
            .find(&submission.candidate_query(), self.candidate_limit)
            .await?;
        log::info!("Found {} potentially related policies", candidates.len());

        if candidates.is_empty() {
            return Ok(ConflictCheckResponse::clear());
        }

        let prompt = self
            .prompts
            .conflict_prompt_for_documents(&submission.describe(), &candidates);
        let verdict = self.analyze_conflicts(&prompt).await?;

        if verdict.has_conflict {
            Ok(ConflictCheckResponse::conflicting(
                verdict.conflicts,
                verdict.suggestions,
            ))
        } else {
            Ok(ConflictCheckResponse::clear())
        }
    }

    /// Stores a new policy or replaces the content of an existing one.
    ///
    /// Duplicate and unknown policies are reported in the response, not as errors.
    pub async fn upload(&self, submission: &PolicySubmission) -> Result<UploadPolicyResponse> {
        let errors = submission.validate();
        if !errors.is_empty() {
            return Err(PipelineError::InvalidSubmission(errors));
        }
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        match submission {
            PolicySubmission::Create {
                form,
                file_content,
                file_name,
            } => {
                let doc = new_document(form, file_content, file_name.as_deref(), &now);
                match self.store().insert(doc).await {
                    Ok(id) => {
                        log::info!("Stored policy {} as {id}", form.policy_number);
                        Ok(upload_response(true, "Policy saved successfully", Some(id)))
                    }
                    Err(StoreError::Duplicate(number)) => Ok(upload_response(
                        false,
                        &format!("Policy {number} already exists. Use update instead."),
                        None,
                    )),
                    Err(err) => Err(err.into()),
                }
            }
            PolicySubmission::Update {
                policy_id,
                file_content,
                file_name,
            } => {
                let query = submission.candidate_query();
                let Some(existing) = self.store().find_one(&query).await? else {
                    return Ok(upload_response(
                        false,
                        &format!("Policy {policy_id} not found"),
                        None,
                    ));
                };

                let mut metadata = Metadata::new();
                metadata.insert("lastUpdated".to_string(), Value::from(now));
                if let Some(name) = file_name {
                    metadata.insert("updatedFileName".to_string(), Value::from(name.as_str()));
                }
                let patch = DocumentPatch {
                    content: Some(file_content.clone()),
                    metadata,
                };
                let updated = self.store().update(&existing.id, patch).await?;
                log::info!("Updated policy {}", updated.id);
                Ok(upload_response(
                    true,
                    "Policy updated successfully",
                    Some(updated.id),
                ))
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        overrides: GenerationOverrides,
    ) -> policy_inference::Result<String> {
        let Some(cache) = &self.cache else {
            return self.engine.generate(prompt, overrides).await;
        };

        let key = CacheKey::new(prompt, &overrides);
        let generation = self.store().generation();
        if let Some(hit) = cache.get(&key, generation) {
            return Ok(hit);
        }

        let text = self.engine.generate(prompt, overrides).await?;
        if text != NO_RESPONSE_SENTINEL {
            cache.put(key, generation, text.clone());
        }
        Ok(text)
    }
}

fn upload_response(
    success: bool,
    message: &str,
    policy_id: Option<String>,
) -> UploadPolicyResponse {
    UploadPolicyResponse {
        success,
        message: message.to_string(),
        policy_id,
    }
}

fn preview(text: &str, max: usize) -> &str {
    policy_prompt::truncate_chars(text.trim(), max)
}
