//! CLI utility functions
//!
//! Common helpers shared across CLI commands:
//! - Workspace resolution (config + store root)
//! - Opening the store and rule engine with configured settings
//! - Entry formatting

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use crate::core::entry::KnowledgeEntry;
use crate::core::rules::RuleEngine;
use crate::core::store::KnowledgeStore;
use crate::core::version_log::GitLog;

/// Resolved configuration and store root for one invocation
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: Config,
    pub root: PathBuf,
}

impl Workspace {
    /// Load config and pick the store root
    ///
    /// # Errors
    /// Returns an error if an explicitly named config file cannot be read.
    pub fn resolve(config_path: Option<&Path>, root: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        let root = config.store_root(root);
        Ok(Self { config, root })
    }

    /// Open the knowledge store, creating it on first use
    pub fn open_store(&self) -> Result<KnowledgeStore> {
        let log = GitLog::new(&self.root)
            .with_binary(&self.config.version_log.binary)
            .with_author(
                &self.config.version_log.author_name,
                &self.config.version_log.author_email,
            );
        KnowledgeStore::with_log(&self.root, Arc::new(log))
            .with_context(|| format!("Failed to open knowledge store at {}", self.root.display()))
    }

    /// Open the rule engine for this store
    pub fn open_rules(&self) -> Result<RuleEngine> {
        let path = self.config.rules_path(&self.root);
        RuleEngine::open(&path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))
    }
}

/// Read content from `--file` or fall back to the positional argument
pub fn read_content(content: Option<String>, file: Option<&Path>) -> Result<String> {
    match (file, content) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, Some(content)) => Ok(content),
        (None, None) => anyhow::bail!("Content is required. Pass it as an argument or use --file."),
    }
}

/// One-line summary: topic, version, confidence, tags
pub fn summary_line(entry: &KnowledgeEntry) -> String {
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", entry.tags.join(", "))
    };
    format!(
        "{}  v{}  {}{}",
        entry.topic.bold(),
        entry.version,
        format_confidence(entry.confidence),
        tags.dimmed()
    )
}

/// Confidence as a bar, colored by level
pub fn format_confidence(score: f64) -> String {
    let bars = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    let text = format!("{}{} {:.2}", "█".repeat(bars), "░".repeat(10 - bars), score);
    if score >= 0.8 {
        text.green().to_string()
    } else if score >= 0.5 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_content_prefers_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("body.md");
        std::fs::write(&path, "from file")?;

        assert_eq!(read_content(Some("arg".into()), Some(&path))?, "from file");
        assert_eq!(read_content(Some("arg".into()), None)?, "arg");
        assert!(read_content(None, None).is_err());
        Ok(())
    }

    #[test]
    fn test_format_confidence_width() {
        colored::control::set_override(false);
        assert_eq!(format_confidence(0.8), "████████░░ 0.80");
        assert_eq!(format_confidence(0.0), "░░░░░░░░░░ 0.00");
    }

    #[test]
    fn test_resolve_with_explicit_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let workspace = Workspace::resolve(None, Some(dir.path()))?;
        assert_eq!(workspace.root, dir.path());
        assert_eq!(workspace.config.rules_path(&workspace.root), dir.path().join("rules.json"));
        Ok(())
    }
}
