use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Obligation,
    Prohibition,
    Exception,
}

/// One provision of the legal knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalRule {
    pub law: String,
    #[serde(deserialize_with = "section_text")]
    pub section: String,
    pub text: String,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// KB file the rule was loaded from.
    #[serde(default)]
    pub source_file: String,
}

fn section_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(section) => Ok(section),
        Value::Number(section) => Ok(section.to_string()),
        other => Err(D::Error::custom(format!("invalid section {other}"))),
    }
}

/// Rules loaded from every `*.json` file of a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalKb {
    rules: Vec<LegalRule>,
}

impl LegalKb {
    pub fn new(rules: Vec<LegalRule>) -> Self {
        Self { rules }
    }

    /// Loads files in name order. A missing directory, an unreadable file or a malformed
    /// rule is logged and skipped; the KB is advisory.
    pub fn load_dir(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Legal KB directory {} unavailable: {err}", dir.display());
                return Self::default();
            }
        };
        let mut files: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut rules = Vec::new();
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match read_rules(&path, &name) {
                Ok(loaded) => rules.extend(loaded),
                Err(err) => log::warn!("Skipping legal KB file {name}: {err}"),
            }
        }
        log::info!("Loaded {} legal rules from {}", rules.len(), dir.display());
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[LegalRule] {
        &self.rules
    }

    /// Rules of the given jurisdiction, compared trimmed and case-insensitively. No
    /// jurisdiction matches nothing.
    pub fn matching(&self, jurisdiction: Option<&str>) -> Vec<&LegalRule> {
        let Some(wanted) = jurisdiction.map(str::trim).filter(|j| !j.is_empty()) else {
            return Vec::new();
        };
        self.rules
            .iter()
            .filter(|rule| {
                rule.jurisdiction
                    .as_deref()
                    .is_some_and(|j| j.trim().eq_ignore_ascii_case(wanted))
            })
            .collect()
    }
}

fn read_rules(path: &Path, name: &str) -> Result<Vec<LegalRule>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    let Value::Array(items) = value else {
        return Err("expected a JSON array of rules".to_string());
    };

    let mut rules = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<LegalRule>(item) {
            Ok(mut rule) => {
                rule.source_file = name.to_string();
                rules.push(rule);
            }
            Err(err) => log::warn!("Skipping rule {idx} in {name}: {err}"),
        }
    }
    Ok(rules)
}

/// Matched rules split by kind, each group in KB order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupedRules {
    pub obligations: Vec<LegalRule>,
    pub prohibitions: Vec<LegalRule>,
    pub exceptions: Vec<LegalRule>,
}

impl GroupedRules {
    pub fn group<'a>(rules: impl IntoIterator<Item = &'a LegalRule>) -> Self {
        let mut grouped = Self::default();
        for rule in rules {
            let bucket = match rule.kind {
                RuleKind::Obligation => &mut grouped.obligations,
                RuleKind::Prohibition => &mut grouped.prohibitions,
                RuleKind::Exception => &mut grouped.exceptions,
            };
            bucket.push(rule.clone());
        }
        grouped
    }

    pub fn iter(&self) -> impl Iterator<Item = &LegalRule> {
        self.obligations
            .iter()
            .chain(&self.prohibitions)
            .chain(&self.exceptions)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
