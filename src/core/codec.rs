//! Codec - Document encoding
//!
//! One knowledge entry per markdown file:
//!
//! ```text
//! ---
//! topic: swift/testing
//! version: 2
//! confidence: 0.8
//! tags:
//! - swift
//! source: manual
//! created_at: 2025-01-01T00:00:00Z
//! updated_at: 2025-01-02T00:00:00Z
//! ---
//!
//! Body markdown...
//! ```
//!
//! The id is never written; it is recomputed on every decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{compute_id, KnowledgeEntry, Source};
use super::error::{KnowledgeError, Result};

/// Line that opens and closes the metadata block
pub const DELIMITER: &str = "---";

#[derive(Debug, Serialize, Deserialize)]
struct Metadata {
    topic: String,
    version: u32,
    confidence: f64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    source: Source,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Encode an entry as a document
pub fn encode(entry: &KnowledgeEntry) -> Result<String> {
    let metadata = Metadata {
        topic: entry.topic.clone(),
        version: entry.version,
        confidence: entry.confidence,
        tags: entry.tags.clone(),
        source: entry.source.clone(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    };

    let yaml = serde_yaml::to_string(&metadata)?;
    Ok(format!(
        "{delim}\n{yaml}{delim}\n\n{content}",
        delim = DELIMITER,
        yaml = yaml,
        content = entry.content
    ))
}

/// Decode a document into an entry
///
/// # Errors
/// `MalformedDocument` if the opening or closing delimiter is missing, or
/// the metadata block is not valid YAML for an entry.
pub fn decode(text: &str) -> Result<KnowledgeEntry> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
        .ok_or_else(|| {
            KnowledgeError::MalformedDocument("no opening delimiter found".to_string())
        })?;

    let (header, body) = split_at_closing_delimiter(rest).ok_or_else(|| {
        KnowledgeError::MalformedDocument("metadata block is not closed".to_string())
    })?;

    let metadata: Metadata = serde_yaml::from_str(header)
        .map_err(|e| KnowledgeError::MalformedDocument(format!("bad metadata: {}", e)))?;

    // Exactly one blank separator line follows the closing delimiter
    let content = body
        .strip_prefix('\n')
        .or_else(|| body.strip_prefix("\r\n"))
        .unwrap_or(body);

    Ok(KnowledgeEntry {
        id: compute_id(&metadata.topic, content),
        topic: metadata.topic,
        content: content.to_string(),
        source: metadata.source,
        confidence: metadata.confidence,
        tags: metadata.tags,
        created_at: metadata.created_at,
        updated_at: metadata.updated_at,
        version: metadata.version,
    })
}

/// Split `rest` into (metadata, everything after the closing delimiter line)
fn split_at_closing_delimiter(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> KnowledgeEntry {
        let mut entry = KnowledgeEntry::new(
            "swift/testing",
            "# Swift Testing\n\nPrefer `#expect` over XCTAssert.\n\n---\n\nTrailing rule above.\n",
        )
        .with_confidence(0.83)
        .with_tags(vec!["swift".to_string(), "testing".to_string()])
        .with_source(Source::Other("imported".to_string()));
        entry.version = 4;
        entry.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        entry.updated_at = Utc::now();
        entry
    }

    #[test]
    fn test_round_trip() {
        let entry = sample();
        let decoded = decode(&encode(&entry).unwrap()).unwrap();

        assert_eq!(decoded.topic, entry.topic);
        assert_eq!(decoded.content, entry.content);
        assert_eq!(decoded.confidence, entry.confidence);
        assert_eq!(decoded.tags, entry.tags);
        assert_eq!(decoded.source, entry.source);
        assert_eq!(decoded.version, entry.version);
        assert_eq!(decoded.created_at, entry.created_at);
        assert_eq!(decoded.updated_at, entry.updated_at);
        assert_eq!(decoded.id, compute_id(&entry.topic, &entry.content));
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_round_trip_awkward_values() {
        let mut entry = KnowledgeEntry::new("topic: with colon", "")
            .with_tags(vec!["- dash".to_string(), "yes".to_string()])
            .with_confidence(0.1);
        entry.refresh_id();

        let decoded = decode(&encode(&entry).unwrap()).unwrap();
        assert_eq!(decoded.topic, "topic: with colon");
        assert_eq!(decoded.content, "");
        assert_eq!(decoded.tags, entry.tags);
    }

    #[test]
    fn test_layout() {
        let text = encode(&sample()).unwrap();
        assert!(text.starts_with("---\ntopic: swift/testing\n"));
        assert!(text.contains("\n---\n\n# Swift Testing"));
        assert!(!text.contains("id:"));
    }

    #[test]
    fn test_id_is_recomputed_not_trusted() {
        let text = encode(&sample()).unwrap();
        let tampered = text.replacen("---\n", "---\nid: deadbeef\n", 1);
        let decoded = decode(&tampered).unwrap();
        assert_ne!(decoded.id, "deadbeef");
        assert_eq!(decoded.id, compute_id(&decoded.topic, &decoded.content));
    }

    #[test]
    fn test_missing_opening_delimiter() {
        let err = decode("topic: x\n---\n\nbody").unwrap_err();
        assert!(matches!(err, KnowledgeError::MalformedDocument(_)));
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let err = decode("---\ntopic: x\nversion: 1\n\nbody").unwrap_err();
        assert!(matches!(err, KnowledgeError::MalformedDocument(_)));
    }

    #[test]
    fn test_unparseable_metadata() {
        let err = decode("---\ntopic: [unclosed\n---\n\nbody").unwrap_err();
        assert!(matches!(err, KnowledgeError::MalformedDocument(_)));

        // Well-formed YAML, but not an entry
        let err = decode("---\nfoo: bar\n---\n\nbody").unwrap_err();
        assert!(matches!(err, KnowledgeError::MalformedDocument(_)));
    }

    #[test]
    fn test_decode_crlf() {
        let text = "---\r\ntopic: x\r\nversion: 2\r\nconfidence: 0.5\r\ncreated_at: 2024-01-01T00:00:00Z\r\nupdated_at: 2024-01-02T00:00:00Z\r\n---\r\n\r\nbody";
        let entry = decode(text).unwrap();
        assert_eq!(entry.topic, "x");
        assert_eq!(entry.version, 2);
        assert_eq!(entry.content, "body");
        assert_eq!(entry.source, Source::Manual);
        assert!(entry.tags.is_empty());
    }
}
