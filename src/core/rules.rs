//! Rules - User preferences applied to surfaced knowledge
//!
//! Rules live in a JSON file and are applied in stored order:
//!
//! | type             | effect                                          |
//! |------------------|-------------------------------------------------|
//! | `exclude`        | delete every match                              |
//! | `never_mention`  | delete every match                              |
//! | `prefer`         | replace every match with `replacement`          |
//! | `always_mention` | append a note when the pattern matches nowhere  |
//!
//! Validation happens when a rule is added; application compiles every rule
//! up front and refuses to return partially transformed text.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ulid::Ulid;

use super::error::{KnowledgeError, Result};

/// What a rule does to matching text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Exclude,
    Prefer,
    AlwaysMention,
    NeverMention,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Exclude => write!(f, "exclude"),
            RuleKind::Prefer => write!(f, "prefer"),
            RuleKind::AlwaysMention => write!(f, "always_mention"),
            RuleKind::NeverMention => write!(f, "never_mention"),
        }
    }
}

impl std::str::FromStr for RuleKind {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "exclude" => Ok(RuleKind::Exclude),
            "prefer" => Ok(RuleKind::Prefer),
            "always_mention" => Ok(RuleKind::AlwaysMention),
            "never_mention" => Ok(RuleKind::NeverMention),
            _ => Err(KnowledgeError::InvalidRuleType(s.to_string())),
        }
    }
}

/// A stored rule
///
/// `rule_type` stays a string so hand-edited files with unknown types still
/// load; they are rejected on validation and on apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Generated on add when empty
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub rule_type: String,

    /// Regular expression
    pub pattern: String,

    /// Only used by `prefer`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub replacement: String,

    #[serde(default)]
    pub reason: String,

    /// Stamped on add when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Rule {
    pub fn new(rule_type: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            rule_type: rule_type.into(),
            pattern: pattern.into(),
            replacement: String::new(),
            reason: String::new(),
            created_at: None,
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn kind(&self) -> Result<RuleKind> {
        self.rule_type.parse()
    }
}

/// Check a rule before it is stored
///
/// # Errors
/// In order: `InvalidRuleType`, `EmptyPattern`, `InvalidPattern`,
/// `MissingReplacement` (prefer only).
pub fn validate(rule: &Rule) -> Result<RuleKind> {
    let kind = rule.kind()?;

    if rule.pattern.is_empty() {
        return Err(KnowledgeError::EmptyPattern);
    }

    Regex::new(&rule.pattern).map_err(|source| KnowledgeError::InvalidPattern {
        pattern: rule.pattern.clone(),
        source,
    })?;

    if kind == RuleKind::Prefer && rule.replacement.is_empty() {
        return Err(KnowledgeError::MissingReplacement);
    }

    Ok(kind)
}

/// A rule ready to run
struct CompiledRule<'a> {
    rule: &'a Rule,
    kind: RuleKind,
    regex: Regex,
}

impl<'a> CompiledRule<'a> {
    fn compile(rule: &'a Rule) -> Result<Self> {
        let kind = rule.kind().map_err(|e| KnowledgeError::RuleApplication {
            id: rule.id.clone(),
            reason: e.to_string(),
        })?;
        let regex = Regex::new(&rule.pattern).map_err(|e| KnowledgeError::RuleApplication {
            id: rule.id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { rule, kind, regex })
    }

    fn apply(&self, text: &str) -> String {
        match self.kind {
            RuleKind::Exclude | RuleKind::NeverMention => {
                self.regex.replace_all(text, "").into_owned()
            }
            RuleKind::Prefer => self
                .regex
                .replace_all(text, self.rule.replacement.as_str())
                .into_owned(),
            RuleKind::AlwaysMention => {
                if self.regex.is_match(text) {
                    text.to_string()
                } else {
                    format!("{}{}", text, mention_note(self.rule))
                }
            }
        }
    }
}

fn mention_note(rule: &Rule) -> String {
    if rule.reason.is_empty() {
        format!("\n\nNote: remember to mention {}", rule.pattern)
    } else {
        format!(
            "\n\nNote: remember to mention {} ({})",
            rule.pattern, rule.reason
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// Ordered rule set synchronized with a JSON file
pub struct RuleEngine {
    path: PathBuf,
    rules: RwLock<Vec<Rule>>,
}

impl RuleEngine {
    /// Load rules from `path`; a missing file is an empty rule set
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rules = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str::<RulesFile>(&content)?.rules
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), rules = rules.len(), "loaded rules");

        Ok(Self {
            path,
            rules: RwLock::new(rules),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate, fill in id and timestamp, append and persist
    ///
    /// A `replacement` on a non-`prefer` rule is dropped.
    pub fn add_rule(&self, mut rule: Rule) -> Result<Rule> {
        let kind = validate(&rule)?;

        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);

        if rule.id.is_empty() {
            rule.id = Ulid::new().to_string();
        } else if rules.iter().any(|r| r.id == rule.id) {
            return Err(KnowledgeError::AlreadyExists(rule.id));
        }
        if rule.created_at.is_none() {
            rule.created_at = Some(Utc::now());
        }
        if kind != RuleKind::Prefer {
            rule.replacement.clear();
        }

        rules.push(rule.clone());
        self.persist(&rules)?;

        info!(id = %rule.id, kind = %kind, pattern = %rule.pattern, "added rule");
        Ok(rule)
    }

    /// Remove the rule with `id` and persist; returns the removed rule
    pub fn remove_rule(&self, id: &str) -> Result<Rule> {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);

        let index = rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| KnowledgeError::rule_not_found(id))?;
        let removed = rules.remove(index);
        self.persist(&rules)?;

        info!(id = %id, "removed rule");
        Ok(removed)
    }

    /// Snapshot of the rules in stored order
    pub fn rules(&self) -> Vec<Rule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run every rule over `content`, in order
    ///
    /// # Errors
    /// `RuleApplication` naming the first rule that does not compile; no
    /// partial result is returned.
    pub fn apply(&self, content: &str) -> Result<String> {
        let snapshot = self.rules();
        let compiled = snapshot
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(compiled
            .iter()
            .fold(content.to_string(), |text, rule| rule.apply(&text)))
    }

    /// Write `rules` to disk; caller holds the write lock
    fn persist(&self, rules: &[Rule]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = RulesFile {
            rules: rules.to_vec(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
