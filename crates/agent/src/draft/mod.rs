//! Policy drafting from a free-text request.
//!
//! ```text
//! request ──> intent prompt ──> engine ──> JSON intent
//!                                              │
//!     legal KB ──> jurisdiction match ──> grouped rules ──> feasibility warnings
//!                                              │
//!                       one section prompt per section ──> engine ──> section text
//!                                              │
//!                                 citations + markdown document
//! ```

mod intent;
mod kb;

pub use intent::{extract_json_object, parse_intent, IntentError};
pub use kb::{GroupedRules, LegalKb, LegalRule, RuleKind};

use crate::config::DraftingConfig;
use crate::error::{PipelineError, Result};
use policy_inference::{GenerationOverrides, InferenceEngine};
use policy_prompt::{build_intent_prompt, build_section_prompt};
use policy_protocol::{
    DraftResponse, DraftSection, FeasibilityReport, FeasibilityStatus, PolicyIntent,
};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

const UNSPECIFIED: &str = "Unspecified";

/// Every obligation becomes a mandatory warning.
pub fn check_feasibility(grouped: &GroupedRules) -> FeasibilityReport {
    let warnings: Vec<String> = grouped
        .obligations
        .iter()
        .map(|rule| format!("Mandatory: {} ({} Section {})", rule.text, rule.law, rule.section))
        .collect();
    let status = if warnings.is_empty() {
        FeasibilityStatus::Allowed
    } else {
        FeasibilityStatus::AllowedWithConditions
    };
    FeasibilityReport { status, warnings }
}

/// Distinct references, sorted.
pub fn extract_citations(grouped: &GroupedRules) -> Vec<String> {
    grouped
        .iter()
        .map(|rule| {
            format!(
                "{} – Section {} (Source: {})",
                rule.law, rule.section, rule.source_file
            )
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn render_intent(intent: &PolicyIntent) -> String {
    let field = |value: &Option<String>| value.as_deref().unwrap_or(UNSPECIFIED).to_string();
    let conditions = if intent.special_conditions.is_empty() {
        "none".to_string()
    } else {
        intent.special_conditions.join("; ")
    };
    format!(
        "policy_type: {}\nindustry: {}\njurisdiction: {}\nentity_type: {}\nrisk_level: {}\nspecial_conditions: {}",
        field(&intent.policy_type),
        field(&intent.industry),
        field(&intent.jurisdiction),
        field(&intent.entity_type),
        field(&intent.risk_level),
        conditions
    )
}

pub fn render_rules(grouped: &GroupedRules) -> String {
    let mut out = String::new();
    for (heading, rules) in [
        ("Obligations", &grouped.obligations),
        ("Prohibitions", &grouped.prohibitions),
        ("Exceptions", &grouped.exceptions),
    ] {
        let _ = writeln!(out, "{heading}:");
        if rules.is_empty() {
            out.push_str("- none\n");
        }
        for rule in rules {
            let _ = writeln!(out, "- {} Section {}: {}", rule.law, rule.section, rule.text);
        }
    }
    out.trim_end().to_string()
}

pub fn render_markdown(
    intent: &PolicyIntent,
    feasibility: &FeasibilityReport,
    sections: &[DraftSection],
    citations: &[String],
) -> String {
    let mut doc = format!("# Draft Policy: {}\n\n", intent.policy_type_or_default());
    let _ = write!(
        doc,
        "**Jurisdiction:** {} | **Risk Level:** {}\n\n",
        intent.jurisdiction.as_deref().unwrap_or(UNSPECIFIED),
        intent.risk_level.as_deref().unwrap_or(UNSPECIFIED)
    );

    if !feasibility.warnings.is_empty() {
        doc.push_str("### Legal Feasibility Warnings\n");
        for warning in &feasibility.warnings {
            let _ = writeln!(doc, "- {warning}");
        }
        doc.push('\n');
    }

    for section in sections {
        let _ = write!(doc, "## {}\n{}\n\n", section.title, section.body);
    }

    if !citations.is_empty() {
        doc.push_str("### Legal References\n");
        for cite in citations {
            let _ = writeln!(doc, "- {cite}");
        }
    }
    doc
}

/// Drafts policies against a legal knowledge base with one engine.
pub struct Drafter {
    engine: Arc<dyn InferenceEngine>,
    kb: LegalKb,
    config: DraftingConfig,
}

impl Drafter {
    pub fn new(engine: Arc<dyn InferenceEngine>, kb: LegalKb, config: &DraftingConfig) -> Self {
        Self {
            engine,
            kb,
            config: config.clone(),
        }
    }

    pub fn kb(&self) -> &LegalKb {
        &self.kb
    }

    fn overrides(&self, max_tokens: u32) -> GenerationOverrides {
        GenerationOverrides {
            max_tokens: Some(max_tokens),
            temperature: Some(self.config.temperature),
            context_size: Some(self.config.context_size),
        }
    }

    pub async fn extract_intent(&self, request: &str) -> Result<PolicyIntent> {
        let reply = self
            .engine
            .generate(
                &build_intent_prompt(request),
                self.overrides(self.config.intent_tokens),
            )
            .await?;
        Ok(parse_intent(&reply)?)
    }

    pub async fn draft(&self, request: &str) -> Result<DraftResponse> {
        let request = request.trim();
        if request.is_empty() {
            return Err(PipelineError::InvalidQuery);
        }

        let intent = self.extract_intent(request).await?;
        let grouped = GroupedRules::group(self.kb.matching(intent.jurisdiction.as_deref()));
        log::info!(
            "Drafting {} for {}: {} matched rules",
            intent.policy_type_or_default(),
            intent.jurisdiction.as_deref().unwrap_or(UNSPECIFIED),
            grouped.iter().count()
        );

        let feasibility = check_feasibility(&grouped);
        let intent_text = render_intent(&intent);
        let rules_text = render_rules(&grouped);

        let mut sections = Vec::with_capacity(self.config.sections.len());
        for title in &self.config.sections {
            log::debug!("Drafting section {title}");
            let prompt = build_section_prompt(title, &intent_text, &rules_text);
            let body = self
                .engine
                .generate(&prompt, self.overrides(self.config.section_tokens))
                .await?;
            sections.push(DraftSection {
                title: title.clone(),
                body: body.trim().to_string(),
            });
        }

        let citations = extract_citations(&grouped);
        let document = render_markdown(&intent, &feasibility, &sections, &citations);
        Ok(DraftResponse {
            intent,
            feasibility,
            sections,
            citations,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedEngine;
    use policy_inference::InferenceError;
    use policy_prompt::DEFAULT_DRAFT_SECTIONS;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const INTENT_REPLY: &str = r#"Here you go: {"policy_type": "Privacy Policy", "industry": "health", "jurisdiction": "India", "entity_type": "clinic", "risk_level": "high", "special_conditions": ["minors"]}"#;

    fn rule(law: &str, section: &str, kind: RuleKind, jurisdiction: &str) -> LegalRule {
        LegalRule {
            law: law.to_string(),
            section: section.to_string(),
            text: format!("text of {law} {section}"),
            jurisdiction: Some(jurisdiction.to_string()),
            kind,
            source_file: "dpdp.json".to_string(),
        }
    }

    fn kb() -> LegalKb {
        LegalKb::new(vec![
            rule("DPDP Act 2023", "6", RuleKind::Obligation, "India"),
            rule("DPDP Act 2023", "9", RuleKind::Prohibition, "India"),
            rule("DPDP Act 2023", "6", RuleKind::Obligation, "India"),
            rule("GDPR", "7", RuleKind::Obligation, "EU"),
        ])
    }

    fn scripted() -> Arc<ScriptedEngine> {
        ScriptedEngine::responding(|prompt| {
            if prompt.starts_with("You are a legal intent extraction system.") {
                return Ok(INTENT_REPLY.to_string());
            }
            let title = prompt
                .split('"')
                .nth(1)
                .unwrap_or_default()
                .to_string();
            Ok(format!("  Body of {title}.\n"))
        })
    }

    #[tokio::test]
    async fn draft_runs_intent_then_every_section() {
        let engine = scripted();
        let drafter = Drafter::new(engine.clone(), kb(), &DraftingConfig::default());
        let response = drafter
            .draft("Privacy policy for a clinic app in India")
            .await
            .unwrap();

        let calls = engine.calls();
        assert_eq!(calls.len(), 1 + DEFAULT_DRAFT_SECTIONS.len());
        assert!(calls[0].0.ends_with("User input:\nPrivacy policy for a clinic app in India\n"));
        assert_eq!(calls[0].1.max_tokens, Some(DraftingConfig::default().intent_tokens));
        assert_eq!(calls[1].1.temperature, Some(0.1));
        assert_eq!(calls[1].1.context_size, Some(4096));
        assert!(calls[1].0.contains("jurisdiction: India"));
        assert!(calls[1].0.contains("- DPDP Act 2023 Section 9: text of DPDP Act 2023 9"));
        assert!(!calls[1].0.contains("GDPR"));

        let titles: Vec<&str> = response.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, DEFAULT_DRAFT_SECTIONS.to_vec());
        assert_eq!(response.sections[1].body, "Body of Consent.");

        assert_eq!(response.feasibility.status, FeasibilityStatus::AllowedWithConditions);
        assert_eq!(response.feasibility.warnings.len(), 2);
        assert_eq!(
            response.citations,
            vec![
                "DPDP Act 2023 – Section 6 (Source: dpdp.json)",
                "DPDP Act 2023 – Section 9 (Source: dpdp.json)",
            ]
        );
        assert!(response.document.starts_with(
            "# Draft Policy: Privacy Policy\n\n**Jurisdiction:** India | **Risk Level:** high\n\n\
### Legal Feasibility Warnings\n- Mandatory: text of DPDP Act 2023 6 (DPDP Act 2023 Section 6)\n"
        ));
        assert!(response.document.contains("## Consent\nBody of Consent.\n\n"));
        assert!(response
            .document
            .ends_with("### Legal References\n- DPDP Act 2023 – Section 6 (Source: dpdp.json)\n- DPDP Act 2023 – Section 9 (Source: dpdp.json)\n"));
    }

    #[tokio::test]
    async fn unknown_jurisdiction_drafts_without_rules() {
        let engine = ScriptedEngine::responding(|prompt| {
            if prompt.starts_with("You are a legal intent extraction system.") {
                Ok(r#"{"policy_type": null, "jurisdiction": null}"#.to_string())
            } else {
                Ok("Text.".to_string())
            }
        });
        let config = DraftingConfig {
            sections: vec!["Introduction".to_string()],
            ..Default::default()
        };
        let response = Drafter::new(engine, kb(), &config)
            .draft("Write something")
            .await
            .unwrap();
        assert_eq!(response.feasibility.status, FeasibilityStatus::Allowed);
        assert!(response.citations.is_empty());
        assert_eq!(
            response.document,
            "# Draft Policy: Custom Policy\n\n**Jurisdiction:** Unspecified | **Risk Level:** Unspecified\n\n\
## Introduction\nText.\n\n"
        );
    }

    #[tokio::test]
    async fn reply_without_json_fails_before_sections() {
        let engine = ScriptedEngine::replying("I could not generate a response.");
        let err = Drafter::new(engine.clone(), kb(), &DraftingConfig::default())
            .draft("Privacy policy")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Intent(IntentError::NoJson)));
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_request_is_invalid() {
        let engine = ScriptedEngine::replying("unused");
        let err = Drafter::new(engine.clone(), kb(), &DraftingConfig::default())
            .draft("  ")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidQuery));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn engine_failure_stops_drafting() {
        let engine = ScriptedEngine::failing(|| InferenceError::Timeout(Duration::from_secs(1)));
        let err = Drafter::new(engine, kb(), &DraftingConfig::default())
            .draft("Privacy policy")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Inference(InferenceError::Timeout(_))));
    }

    #[test]
    fn rules_render_with_empty_groups() {
        let grouped = GroupedRules::group(&[rule("IT Act", "43A", RuleKind::Exception, "India")]);
        assert_eq!(
            render_rules(&grouped),
            "Obligations:\n- none\nProhibitions:\n- none\nExceptions:\n- IT Act Section 43A: text of IT Act 43A"
        );
    }
}
