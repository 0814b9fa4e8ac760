use crate::text::truncate_chars;
use policy_store::Document;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const ANSWER_EXCERPT_CHARS: usize = 300;
pub const CONFLICT_EXCERPT_CHARS: usize = 500;

pub const CONFLICTS_MARKER: &str = "CONFLICTS:";
pub const CONFLICTS_FOUND_MARKER: &str = "CONFLICTS_FOUND:";
pub const SUGGESTIONS_MARKER: &str = "SUGGESTIONS:";

const DEFAULT_ASSISTANT_PERSONA: &str =
    "You are a helpful Policy Assistant for the Ministry of Healthcare in India.";
const DEFAULT_ANALYST_PERSONA: &str = "You are a senior policy analyst specializing in healthcare.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    #[serde(default = "default_assistant_persona")]
    pub assistant_persona: String,
    #[serde(default = "default_analyst_persona")]
    pub analyst_persona: String,
    #[serde(default = "default_answer_excerpt_chars")]
    pub answer_excerpt_chars: usize,
    #[serde(default = "default_conflict_excerpt_chars")]
    pub conflict_excerpt_chars: usize,
}

fn default_assistant_persona() -> String {
    DEFAULT_ASSISTANT_PERSONA.to_string()
}

fn default_analyst_persona() -> String {
    DEFAULT_ANALYST_PERSONA.to_string()
}

const fn default_answer_excerpt_chars() -> usize {
    ANSWER_EXCERPT_CHARS
}

const fn default_conflict_excerpt_chars() -> usize {
    CONFLICT_EXCERPT_CHARS
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            assistant_persona: default_assistant_persona(),
            analyst_persona: default_analyst_persona(),
            answer_excerpt_chars: ANSWER_EXCERPT_CHARS,
            conflict_excerpt_chars: CONFLICT_EXCERPT_CHARS,
        }
    }
}

/// Renders prompts with a fixed set of templates.
#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
    templates: PromptTemplates,
}

impl PromptBuilder {
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Numbered list of titles with short content excerpts.
    pub fn answer_context(&self, docs: &[Document]) -> String {
        docs.iter()
            .enumerate()
            .map(|(idx, doc)| {
                format!(
                    "{}. Title: {}\nContent: {}",
                    idx + 1,
                    doc.display_title(),
                    truncate_chars(&doc.content, self.templates.answer_excerpt_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn candidate_excerpt(&self, doc: &Document) -> String {
        let mut out = format!("Title: {}\n", doc.display_title());
        if let Some(number) = non_blank(doc.policy_number.as_deref()) {
            let _ = writeln!(out, "Policy Number: {number}");
        }
        let _ = writeln!(out, "Department: {}", doc.department);
        if let Some(description) = non_blank(doc.description.as_deref()) {
            let _ = writeln!(out, "Description: {description}");
        }
        let _ = write!(
            out,
            "Content (excerpt): {}...",
            truncate_chars(&doc.content, self.templates.conflict_excerpt_chars)
        );
        out
    }

    pub fn answer_prompt(&self, query: &str, context: &str) -> String {
        let context_block = if context.is_empty() {
            String::new()
        } else {
            format!(
                "Policy Context (summarize key points from these documents concisely):\n{context}\n"
            )
        };

        format!(
            "{persona}\n\n{context_block}\n\nUser Question: {query}\n\n\
Instructions:\n\
- Provide a concise summary answer no longer than 200 tokens.\n\
- If you use information from the provided documents, explicitly cite the document titles.\n\
- Use clear and professional language.\n\
- If no relevant information is found in the documents, answer based on your general knowledge.\n\n\
Answer:\n",
            persona = self.templates.assistant_persona,
        )
    }

    /// Each existing description is cut at the conflict excerpt cap.
    pub fn conflict_prompt<S: AsRef<str>>(&self, new_policy: &str, existing: &[S]) -> String {
        let cap = self.templates.conflict_excerpt_chars;
        self.render_conflict_prompt(
            new_policy,
            existing
                .iter()
                .map(|policy| truncate_chars(policy.as_ref(), cap).to_string()),
        )
    }

    /// Stored candidates rendered with [`PromptBuilder::candidate_excerpt`].
    pub fn conflict_prompt_for_documents(&self, new_policy: &str, existing: &[Document]) -> String {
        self.render_conflict_prompt(
            new_policy,
            existing.iter().map(|doc| self.candidate_excerpt(doc)),
        )
    }

    fn render_conflict_prompt(
        &self,
        new_policy: &str,
        existing: impl Iterator<Item = String>,
    ) -> String {
        let existing_block = existing
            .enumerate()
            .map(|(idx, policy)| format!("{}. {}", idx + 1, policy))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "{persona}\n\n\
Your task is to compare the NEW POLICY text given below to the list of EXISTING POLICIES.\n\n\
Focus your analysis ONLY on real, substantive content conflicts or contradictions, NOT on metadata, dates, similar wording, format, or technical document info.\n\n\
Look for and highlight any:\n\
- Logical contradictions or disagreements in the actual instructions, prohibitions, requirements, or rules\n\
- Overlaps (where both say the same thing, so duplicative policy is created)\n\
- Gaps (where the new policy says less or is missing a critical aspect handled in the old one)\n\
- Obsolete provisions (if the new contradicts or makes the old unnecessary)\n\
- Real-world issues in applying BOTH at the same time (e.g., two policies \"mandate\" opposite things)\n\n\
Ignore differences in:\n\
- Dates\n\
- Formatting, author, version, number/id, font, style\n\
- Phrasing if policies mean the same things in context\n\n\
Be concise, specific, and cite source excerpts if needed.\n\n\
NEW POLICY:\n{new_policy}\n\n\
EXISTING POLICIES:\n{existing_block}\n\n\
Format your answer as follows:\n\
{CONFLICTS_MARKER} [YES/NO]\n\
{CONFLICTS_FOUND_MARKER} [clear, REAL policy-level conflicts]\n\
{SUGGESTIONS_MARKER} [short, clear ways to resolve conflicts or merge, only if needed]\n",
            persona = self.templates.analyst_persona,
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn format_answer_context(docs: &[Document]) -> String {
    PromptBuilder::default().answer_context(docs)
}

pub fn render_candidate_excerpt(doc: &Document) -> String {
    PromptBuilder::default().candidate_excerpt(doc)
}

pub fn build_answer_prompt(query: &str, context: &str) -> String {
    PromptBuilder::default().answer_prompt(query, context)
}

pub fn build_conflict_prompt<S: AsRef<str>>(new_policy: &str, existing: &[S]) -> String {
    PromptBuilder::default().conflict_prompt(new_policy, existing)
}
