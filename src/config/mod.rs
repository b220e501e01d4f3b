//! Configuration module

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::entry::DEFAULT_AUTO_LEARN_CONFIDENCE;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub version_log: VersionLogConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Knowledge directory; defaults to ~/.knowhow/knowledge
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Rules file, relative to the root unless absolute
    #[serde(default = "default_rules_file")]
    pub rules_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            rules_file: default_rules_file(),
        }
    }
}

fn default_rules_file() -> PathBuf {
    PathBuf::from("rules.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionLogConfig {
    #[serde(default = "default_binary")]
    pub binary: String,

    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for VersionLogConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

fn default_binary() -> String {
    "git".to_string()
}

fn default_author_name() -> String {
    "knowhow".to_string()
}

fn default_author_email() -> String {
    "knowhow@localhost".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Byte budget for `knowhow context`
    #[serde(default = "default_max_context_bytes")]
    pub max_context_bytes: usize,

    #[serde(default = "default_auto_learn_confidence")]
    pub auto_learn_confidence: f64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            max_context_bytes: default_max_context_bytes(),
            auto_learn_confidence: default_auto_learn_confidence(),
        }
    }
}

fn default_max_context_bytes() -> usize {
    8000
}

fn default_auto_learn_confidence() -> f64 {
    DEFAULT_AUTO_LEARN_CONFIDENCE
}

impl Config {
    /// Load config from `explicit`, or the global location, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// ~/.knowhow
    pub fn home_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.home_dir().join(".knowhow"))
    }

    /// ~/.knowhow/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        Self::home_dir().map(|h| h.join("config.toml"))
    }

    /// Store root with priority:
    /// 1. `explicit` (flag or KNOWHOW_ROOT, resolved by clap)
    /// 2. `store.root` from the config file
    /// 3. ~/.knowhow/knowledge
    /// 4. ./.knowhow/knowledge
    pub fn store_root(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        if let Some(root) = &self.store.root {
            return root.clone();
        }

        Self::home_dir()
            .unwrap_or_else(|| PathBuf::from(".knowhow"))
            .join("knowledge")
    }

    /// Rules file for a store at `root`
    pub fn rules_path(&self, root: &Path) -> PathBuf {
        if self.store.rules_file.is_absolute() {
            self.store.rules_file.clone()
        } else {
            root.join(&self.store.rules_file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.version_log.binary, "git");
        assert_eq!(config.knowledge.max_context_bytes, 8000);
        assert_eq!(config.knowledge.auto_learn_confidence, 0.7);
        assert_eq!(
            config.rules_path(Path::new("/kb")),
            PathBuf::from("/kb/rules.json")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[knowledge]\nmax_context_bytes = 100\n")?;

        let config = Config::load(Some(&path))?;
        assert_eq!(config.knowledge.max_context_bytes, 100);
        assert_eq!(config.knowledge.auto_learn_confidence, 0.7);
        assert_eq!(config.version_log.author_name, "knowhow");
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.store.root = Some(dir.path().join("kb"));
        config.store.rules_file = dir.path().join("elsewhere.json");
        config.save_to(&path)?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.store.root, Some(dir.path().join("kb")));
        assert_eq!(loaded.store_root(None), dir.path().join("kb"));
        assert_eq!(
            loaded.rules_path(Path::new("/ignored")),
            dir.path().join("elsewhere.json")
        );
        Ok(())
    }

    #[test]
    fn test_explicit_root_wins() {
        let mut config = Config::default();
        config.store.root = Some(PathBuf::from("/from/config"));
        assert_eq!(
            config.store_root(Some(Path::new("/from/flag"))),
            PathBuf::from("/from/flag")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(Config::load(Some(Path::new("/definitely/missing/config.toml"))).is_err());
    }
}
