//! Entry - Core data structure
//!
//! A knowledge entry is the unit stored in the knowledge store: one topic,
//! one markdown body, one file on disk.
//!
//! # Key Properties
//! - **id**: SHA-256 of `topic ++ content` (identity, not the storage key)
//! - **topic**: unique key, sanitized into the file name
//! - **confidence**: 0.0-1.0
//! - **version**: starts at 1, +1 per update

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{KnowledgeError, Result};

/// Extension of every document file in the store root
pub const DOCUMENT_EXTENSION: &str = "md";

/// Confidence given to entries learned from research results
pub const DEFAULT_AUTO_LEARN_CONFIDENCE: f64 = 0.7;

/// Provenance of an entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    /// Written by a person
    #[default]
    Manual,
    /// Captured from a research result
    AutoLearned,
    /// Anything else a caller chose to record
    Other(String),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Manual => write!(f, "manual"),
            Source::AutoLearned => write!(f, "auto-learned"),
            Source::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        match s.as_str() {
            "manual" => Source::Manual,
            "auto-learned" => Source::AutoLearned,
            _ => Source::Other(s),
        }
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.to_string()
    }
}

impl std::str::FromStr for Source {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Source::from(s.to_string()))
    }
}

/// A knowledge entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Content identity (hex SHA-256 of topic + content)
    pub id: String,

    /// Unique topic, e.g. `swift/testing`
    pub topic: String,

    /// Markdown body
    pub content: String,

    /// Provenance tag
    #[serde(default)]
    pub source: Source,

    /// Confidence (0.0-1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Short labels
    #[serde(default)]
    pub tags: Vec<String>,

    /// First write; never changes afterwards
    pub created_at: DateTime<Utc>,

    /// Last write
    pub updated_at: DateTime<Utc>,

    /// Starts at 1, incremented on every update
    pub version: u32,
}

fn default_confidence() -> f64 {
    0.5
}

impl KnowledgeEntry {
    /// Create a new, not yet stored entry
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        let topic = topic.into();
        let content = content.into();

        Self {
            id: compute_id(&topic, &content),
            topic,
            content,
            source: Source::default(),
            confidence: default_confidence(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Build the auto-learned entry for a finished research result
    ///
    /// Fails with `EmptyResult` when there is no result or its content is
    /// blank.
    pub fn from_research(result: Option<&ResearchResult>, confidence: f64) -> Result<Self> {
        let result = result.ok_or(KnowledgeError::EmptyResult)?;
        if result.content.trim().is_empty() {
            return Err(KnowledgeError::EmptyResult);
        }

        Ok(Self::new(&result.query, &result.content)
            .with_source(Source::AutoLearned)
            .with_confidence(confidence)
            .with_tags(vec!["auto-learned".to_string(), result.mode.clone()]))
    }

    /// Set tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set source
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Set confidence, clamped to 0.0-1.0
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Recompute `id` from the current topic and content
    pub fn refresh_id(&mut self) {
        self.id = compute_id(&self.topic, &self.content);
    }

    /// File name (stem + extension) this entry is stored under
    pub fn file_name(&self) -> String {
        document_file_name(&self.topic)
    }

    /// Get short ID (first 8 hex chars)
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }

    /// True if any tag equals `tag`, ignoring case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl std::fmt::Display for KnowledgeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} (v{})", self.short_id(), self.topic, self.version)
    }
}

/// A finished research result handed over by the research engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchResult {
    pub query: String,
    pub mode: String,
    pub content: String,
}

/// Content identity: lowercase hex SHA-256 of `topic ++ content`
pub fn compute_id(topic: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(topic.as_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Clamp to 0.0-1.0; NaN becomes 0.0
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Turn a topic into a filesystem-safe file stem
///
/// Path separators become `_`, spaces become `-`, anything else outside
/// `[A-Za-z0-9_.-]` becomes `_`. A leading dot is replaced so no hidden files
/// are produced.
pub fn sanitize_topic(topic: &str) -> String {
    let mut stem: String = topic
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            ' ' => '-',
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' => c,
            _ => '_',
        })
        .collect();

    if stem.starts_with('.') {
        stem.replace_range(..1, "_");
    }
    if stem.is_empty() {
        stem.push('_');
    }
    stem
}

/// `sanitize_topic(topic)` plus the document extension
pub fn document_file_name(topic: &str) -> String {
    format!("{}.{}", sanitize_topic(topic), DOCUMENT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry() {
        let entry = KnowledgeEntry::new("swift/testing", "Use Swift Testing.");

        assert_eq!(entry.topic, "swift/testing");
        assert_eq!(entry.version, 1);
        assert_eq!(entry.confidence, 0.5);
        assert_eq!(entry.source, Source::Manual);
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.id.len(), 64);
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = KnowledgeEntry::new("x", "A");
        let b = KnowledgeEntry::new("x", "A");
        assert_eq!(a.id, b.id);

        let c = KnowledgeEntry::new("x", "B");
        assert_ne!(a.id, c.id);

        let d = KnowledgeEntry::new("y", "A");
        assert_ne!(a.id, d.id);
    }

    #[test]
    fn test_identity_matches_sha256() {
        // sha256("xA")
        let expected = {
            let mut h = Sha256::new();
            h.update(b"xA");
            hex::encode(h.finalize())
        };
        assert_eq!(compute_id("x", "A"), expected);
    }

    #[test]
    fn test_refresh_id_after_edit() {
        let mut entry = KnowledgeEntry::new("x", "A");
        let before = entry.id.clone();
        entry.content.push_str(" more");
        entry.refresh_id();
        assert_ne!(entry.id, before);
        assert_eq!(entry.id, compute_id("x", "A more"));
    }

    #[test]
    fn test_with_confidence_clamps() {
        assert_eq!(KnowledgeEntry::new("x", "A").with_confidence(1.7).confidence, 1.0);
        assert_eq!(KnowledgeEntry::new("x", "A").with_confidence(-0.2).confidence, 0.0);
        assert_eq!(KnowledgeEntry::new("x", "A").with_confidence(f64::NAN).confidence, 0.0);
        assert_eq!(KnowledgeEntry::new("x", "A").with_confidence(0.8).confidence, 0.8);
    }

    #[test]
    fn test_sanitize_topic() {
        assert_eq!(sanitize_topic("swift/testing"), "swift_testing");
        assert_eq!(sanitize_topic("ios app architecture"), "ios-app-architecture");
        assert_eq!(sanitize_topic("c++ & rust?"), "c__-_-rust_");
        assert_eq!(sanitize_topic("a\\b"), "a_b");
        assert_eq!(sanitize_topic(".hidden"), "_hidden");
        assert_eq!(sanitize_topic(""), "_");
        assert_eq!(document_file_name("swift/testing"), "swift_testing.md");
    }

    #[test]
    fn test_source_strings() {
        assert_eq!(Source::Manual.to_string(), "manual");
        assert_eq!(Source::AutoLearned.to_string(), "auto-learned");
        assert_eq!("auto-learned".parse::<Source>().unwrap(), Source::AutoLearned);
        assert_eq!(
            "imported".parse::<Source>().unwrap(),
            Source::Other("imported".to_string())
        );
    }

    #[test]
    fn test_from_research() {
        let result = ResearchResult {
            query: "swift concurrency".to_string(),
            mode: "deep".to_string(),
            content: "Actors isolate state.".to_string(),
        };

        let entry = KnowledgeEntry::from_research(Some(&result), 0.7).unwrap();
        assert_eq!(entry.topic, "swift concurrency");
        assert_eq!(entry.content, "Actors isolate state.");
        assert_eq!(entry.source, Source::AutoLearned);
        assert_eq!(entry.confidence, 0.7);
        assert_eq!(entry.tags, vec!["auto-learned".to_string(), "deep".to_string()]);
    }

    #[test]
    fn test_from_research_rejects_empty() {
        assert!(matches!(
            KnowledgeEntry::from_research(None, 0.7),
            Err(KnowledgeError::EmptyResult)
        ));

        let blank = ResearchResult {
            query: "q".to_string(),
            mode: "quick".to_string(),
            content: "  \n".to_string(),
        };
        assert!(matches!(
            KnowledgeEntry::from_research(Some(&blank), 0.7),
            Err(KnowledgeError::EmptyResult)
        ));
    }

    #[test]
    fn test_display() {
        let entry = KnowledgeEntry::new("swift/testing", "Content");
        let display = format!("{}", entry);
        assert!(display.contains("swift/testing"));
        assert!(display.contains("v1"));
        assert!(display.starts_with(&format!("[{}]", entry.short_id())));
    }
}
