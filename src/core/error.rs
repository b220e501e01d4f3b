//! Error - Knowledge subsystem error taxonomy
//!
//! Every fallible operation in `core` returns [`KnowledgeError`]. The CLI
//! wraps these in `anyhow` and renders the message as-is.

use thiserror::Error;

/// Result alias for the knowledge subsystem
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Errors raised by the store, codec, version log and rule engine
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Topic or rule is absent
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Add on a topic that already exists
    #[error("topic already exists: {0}")]
    AlreadyExists(String),

    /// Document could not be decoded
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("invalid rule type: {0} (expected exclude, prefer, always_mention or never_mention)")]
    InvalidRuleType(String),

    #[error("rule pattern cannot be empty")]
    EmptyPattern,

    #[error("invalid rule pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("prefer rules require a replacement")]
    MissingReplacement,

    /// External version-control command exited non-zero
    #[error("version log command `{command}` failed: {output}")]
    VersionLogFailure { command: String, output: String },

    /// Auto-learning was handed a missing or empty research result
    #[error("research result is empty")]
    EmptyResult,

    /// A stored rule could not be applied; nothing was returned
    #[error("rule {id} could not be applied: {reason}")]
    RuleApplication { id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("metadata encoding error: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

impl KnowledgeError {
    pub fn topic_not_found(topic: impl Into<String>) -> Self {
        KnowledgeError::NotFound {
            kind: "topic",
            key: topic.into(),
        }
    }

    pub fn rule_not_found(id: impl Into<String>) -> Self {
        KnowledgeError::NotFound {
            kind: "rule",
            key: id.into(),
        }
    }

    /// True for `NotFound` of any kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, KnowledgeError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = KnowledgeError::topic_not_found("swift/testing");
        assert_eq!(err.to_string(), "topic not found: swift/testing");
        assert!(err.is_not_found());

        let err = KnowledgeError::rule_not_found("01ABC");
        assert_eq!(err.to_string(), "rule not found: 01ABC");
    }

    #[test]
    fn test_version_log_failure_carries_output() {
        let err = KnowledgeError::VersionLogFailure {
            command: "git commit".to_string(),
            output: "nothing to commit".to_string(),
        };
        assert!(err.to_string().contains("nothing to commit"));
        assert!(!err.is_not_found());
    }
}
