//! Manifest - Topic index
//!
//! A single `manifest.json` at the store root summarizing every topic, so
//! listing does not have to parse every document. It is derivative data:
//! the store rebuilds it from its cache whenever asked, and never reads it
//! back to decide what exists.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::KnowledgeEntry;
use super::error::{KnowledgeError, Result};

/// File name of the manifest inside the store root
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest header; both fields are derived on save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub total_topics: usize,
    pub updated: DateTime<Utc>,
}

impl Default for ManifestMetadata {
    fn default() -> Self {
        Self {
            total_topics: 0,
            updated: Utc::now(),
        }
    }
}

/// One topic as summarized in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub name: String,
    /// File name relative to the store root
    pub file: String,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub confidence: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&KnowledgeEntry> for TopicRecord {
    fn from(entry: &KnowledgeEntry) -> Self {
        Self {
            name: entry.topic.clone(),
            file: entry.file_name(),
            version: entry.version,
            updated_at: entry.updated_at,
            confidence: entry.confidence,
            tags: entry.tags.clone(),
        }
    }
}

/// The topic index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub metadata: ManifestMetadata,
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
}

impl Manifest {
    /// Path of the manifest inside `dir`
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Load the manifest from `dir`; a missing file is an empty manifest
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to `dir`, recomputing `total_topics` and stamping `updated`
    pub fn save(&mut self, dir: &Path) -> Result<()> {
        self.metadata.total_topics = self.topics.len();
        self.metadata.updated = Utc::now();

        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(dir), content)?;
        Ok(())
    }

    /// Replace the record with the same name in place, or append it
    pub fn upsert(&mut self, record: TopicRecord) {
        match self.topics.iter_mut().find(|t| t.name == record.name) {
            Some(existing) => *existing = record,
            None => self.topics.push(record),
        }
    }

    /// Remove the record named `name`; returns whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.topics.len();
        self.topics.retain(|t| t.name != name);
        self.topics.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&TopicRecord> {
        self.topics.iter().find(|t| t.name == name)
    }
}

/// Load, upsert `record`, save
pub fn upsert_topic(dir: &Path, record: TopicRecord) -> Result<()> {
    let mut manifest = Manifest::load(dir)?;
    manifest.upsert(record);
    manifest.save(dir)
}

/// Load, remove `name`, save; returns whether the topic was listed
pub fn remove_topic(dir: &Path, name: &str) -> Result<bool> {
    let mut manifest = Manifest::load(dir)?;
    let removed = manifest.remove(name);
    manifest.save(dir)?;
    Ok(removed)
}

/// Look up a single topic record
pub fn get_topic(dir: &Path, name: &str) -> Result<TopicRecord> {
    Manifest::load(dir)?
        .get(name)
        .cloned()
        .ok_or_else(|| KnowledgeError::topic_not_found(name))
}
