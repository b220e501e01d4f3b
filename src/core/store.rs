//! Store - File-backed knowledge store
//!
//! One markdown document per topic under a root directory, mirrored in an
//! in-memory cache and recorded in a version log.
//!
//! # Key Points
//! - Cache is the runtime source of truth; it is filled once on open
//! - Every mutation writes the file, updates the cache, then commits, all
//!   under the exclusive lock
//! - A failed commit is returned to the caller; the cache is not rolled back
//! - A crash between file write and commit leaves the version log behind the
//!   files; nothing here reconciles that

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::codec;
use super::entry::{clamp_confidence, document_file_name, KnowledgeEntry, DOCUMENT_EXTENSION};
use super::error::{KnowledgeError, Result};
use super::manifest::{self, Manifest, TopicRecord, MANIFEST_FILE};
use super::similarity::is_duplicate;
use super::version_log::{Commit, GitLog, VersionLog};

type Cache = BTreeMap<String, KnowledgeEntry>;

/// Topics sharing a prefix, as found by a consolidation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidationGroup {
    pub prefix: String,
    pub topics: Vec<String>,
}

/// Result of [`KnowledgeStore::consolidate`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationReport {
    /// Groups with more than one member, by prefix
    pub groups: Vec<ConsolidationGroup>,
    /// Whether a commit was recorded
    pub committed: bool,
}

/// The knowledge store
pub struct KnowledgeStore {
    root: PathBuf,
    cache: RwLock<Cache>,
    log: Arc<dyn VersionLog>,
}

impl KnowledgeStore {
    /// Open (or create) a store at `root` backed by git
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let log = GitLog::new(&root);
        Self::with_log(root, Arc::new(log))
    }

    /// Open (or create) a store at `root` with a specific version log
    pub fn with_log(root: impl Into<PathBuf>, log: Arc<dyn VersionLog>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        ensure_gitignore(&root)?;
        log.init()?;

        let cache = load_cache(&root)?;
        info!(root = %root.display(), topics = cache.len(), "opened knowledge store");

        Ok(Self {
            root,
            cache: RwLock::new(cache),
            log,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the document for `topic`
    pub fn document_path(&self, topic: &str) -> PathBuf {
        self.root.join(document_file_name(topic))
    }

    /// Store a new entry at version 1
    ///
    /// # Errors
    /// `AlreadyExists` if the topic is present, or another topic already
    /// owns the same file name.
    pub fn add(&self, mut entry: KnowledgeEntry) -> Result<KnowledgeEntry> {
        let mut cache = self.write_cache();

        if cache.contains_key(&entry.topic) {
            return Err(KnowledgeError::AlreadyExists(entry.topic));
        }
        let file_name = entry.file_name();
        if let Some(owner) = cache.values().find(|e| e.file_name() == file_name) {
            warn!(topic = %entry.topic, owner = %owner.topic, file = %file_name, "file name collision");
            return Err(KnowledgeError::AlreadyExists(entry.topic));
        }

        let now = Utc::now();
        entry.version = 1;
        entry.created_at = now;
        entry.updated_at = now;
        entry.confidence = clamp_confidence(entry.confidence);
        entry.refresh_id();

        let file = self.write_document(&entry)?;
        cache.insert(entry.topic.clone(), entry.clone());
        self.upsert_manifest(&cache, &entry);

        let message = format!("Add {}: {}", entry.topic, preview(&entry.content, 60));
        self.log.commit_paths(&[file], &message)?;

        info!(topic = %entry.topic, "added knowledge entry");
        Ok(entry)
    }

    /// Replace the entry for `topic`, bumping its version
    ///
    /// The topic of `entry` is ignored; an entry cannot rename itself.
    pub fn update(&self, topic: &str, mut entry: KnowledgeEntry) -> Result<KnowledgeEntry> {
        let mut cache = self.write_cache();

        let existing = cache
            .get(topic)
            .ok_or_else(|| KnowledgeError::topic_not_found(topic))?;

        entry.topic = topic.to_string();
        entry.created_at = existing.created_at;
        entry.version = existing.version + 1;
        entry.updated_at = Utc::now();
        entry.confidence = clamp_confidence(entry.confidence);
        entry.refresh_id();

        let file = self.write_document(&entry)?;
        cache.insert(entry.topic.clone(), entry.clone());
        self.upsert_manifest(&cache, &entry);

        let message = format!("Update {} to v{}", entry.topic, entry.version);
        self.log.commit_paths(&[file], &message)?;

        info!(topic = %entry.topic, version = entry.version, "updated knowledge entry");
        Ok(entry)
    }

    /// Cached entry for `topic`
    pub fn get(&self, topic: &str) -> Result<KnowledgeEntry> {
        self.read_cache()
            .get(topic)
            .cloned()
            .ok_or_else(|| KnowledgeError::topic_not_found(topic))
    }

    /// Remove `topic` from disk, cache and manifest, and record the removal
    pub fn delete(&self, topic: &str) -> Result<()> {
        let mut cache = self.write_cache();

        if !cache.contains_key(topic) {
            return Err(KnowledgeError::topic_not_found(topic));
        }

        let file = PathBuf::from(document_file_name(topic));
        remove_file_if_present(&self.root.join(&file))?;
        cache.remove(topic);
        self.remove_from_manifest(&cache, &[topic.to_string()]);

        self.log.remove_path(&file, &format!("Delete {}", topic))?;

        info!(topic = %topic, "deleted knowledge entry");
        Ok(())
    }

    /// All entries, in topic order
    pub fn list(&self) -> Vec<KnowledgeEntry> {
        self.read_cache().values().cloned().collect()
    }

    /// Case-insensitive substring match on topic, content or any tag
    pub fn search(&self, query: &str) -> Vec<KnowledgeEntry> {
        let query = query.to_lowercase();
        self.read_cache()
            .values()
            .filter(|e| matches_query(e, &query))
            .cloned()
            .collect()
    }

    /// Remove near-identical entries among topics starting with `prefix`
    ///
    /// Pairs scoring above the duplicate threshold lose one member: lower
    /// confidence goes first, then older `updated_at`, then the lexically
    /// larger topic. Returns removed topics in removal order.
    pub fn deduplicate(&self, prefix: &str) -> Result<Vec<String>> {
        let mut cache = self.write_cache();

        let candidates: Vec<&KnowledgeEntry> = cache
            .values()
            .filter(|e| e.topic.starts_with(prefix))
            .collect();

        let mut marked = vec![false; candidates.len()];
        let mut removed = Vec::new();
        for i in 0..candidates.len() {
            if marked[i] {
                continue;
            }
            for j in (i + 1)..candidates.len() {
                if marked[j] {
                    continue;
                }
                if !is_duplicate(&candidates[i].content, &candidates[j].content) {
                    continue;
                }

                let loser = if survives(candidates[i], candidates[j]) { j } else { i };
                marked[loser] = true;
                removed.push(candidates[loser].topic.clone());
                debug!(
                    kept = %candidates[i + j - loser].topic,
                    removed = %candidates[loser].topic,
                    "duplicate found"
                );
                if loser == i {
                    break;
                }
            }
        }

        if removed.is_empty() {
            return Ok(removed);
        }

        for topic in &removed {
            remove_file_if_present(&self.document_path(topic))?;
            cache.remove(topic);
        }
        self.remove_from_manifest(&cache, &removed);

        let message = format!(
            "Deduplicate {}: removed {} ({})",
            if prefix.is_empty() { "*" } else { prefix },
            removed.len(),
            removed.join(", ")
        );
        self.log.commit_all(&message)?;

        info!(prefix = %prefix, removed = removed.len(), "deduplicated knowledge entries");
        Ok(removed)
    }

    /// Group topics by their first path segment and record a consolidation
    /// pass when any group has more than one member
    ///
    /// Document content is not changed.
    pub fn consolidate(&self) -> Result<ConsolidationReport> {
        let cache = self.write_cache();

        let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for topic in cache.keys() {
            let prefix = topic.split(['/', '\\']).next().unwrap_or(topic);
            groups.entry(prefix).or_default().push(topic.clone());
        }

        let groups: Vec<ConsolidationGroup> = groups
            .into_iter()
            .filter(|(_, topics)| topics.len() > 1)
            .map(|(prefix, topics)| ConsolidationGroup {
                prefix: prefix.to_string(),
                topics,
            })
            .collect();

        if groups.is_empty() {
            debug!("nothing to consolidate");
            return Ok(ConsolidationReport::default());
        }

        let prefixes: Vec<&str> = groups.iter().map(|g| g.prefix.as_str()).collect();
        let message = format!(
            "Consolidate {} group(s): {}",
            groups.len(),
            prefixes.join(", ")
        );
        self.log.commit_all(&message)?;

        info!(groups = groups.len(), "consolidation pass recorded");
        Ok(ConsolidationReport {
            groups,
            committed: true,
        })
    }

    /// Matching entries formatted as `## topic` blocks, up to `max_size` bytes
    ///
    /// Stops at the first block that would exceed the budget.
    pub fn get_relevant_knowledge(&self, query: &str, max_size: usize) -> String {
        let query = query.to_lowercase();
        let cache = self.read_cache();

        let mut out = String::new();
        for entry in cache.values().filter(|e| matches_query(e, &query)) {
            let block = format!("## {}\n\n{}\n\n", entry.topic, entry.content);
            if out.len() + block.len() > max_size {
                break;
            }
            out.push_str(&block);
        }
        out
    }

    /// Version log entries for the document of `topic`, newest first
    pub fn history(&self, topic: &str) -> Result<Vec<Commit>> {
        self.log.history(Path::new(&document_file_name(topic)))
    }

    /// Diff of the whole store between two revisions
    pub fn diff(&self, rev_a: &str, rev_b: &str) -> Result<String> {
        self.log.diff(rev_a, rev_b, None)
    }

    /// Diff of one topic's document between two revisions
    pub fn diff_topic(&self, topic: &str, rev_a: &str, rev_b: &str) -> Result<String> {
        self.log
            .diff(rev_a, rev_b, Some(Path::new(&document_file_name(topic))))
    }

    /// Commit whatever is currently under the root
    pub fn commit(&self, message: &str) -> Result<()> {
        let _cache = self.write_cache();
        self.log.commit_all(message)
    }

    /// Regenerate the manifest from the cache and save it
    pub fn rebuild_manifest(&self) -> Result<Manifest> {
        let cache = self.read_cache();
        let mut manifest = manifest_from(&cache);
        manifest.save(&self.root)?;
        info!(topics = manifest.topics.len(), "rebuilt manifest");
        Ok(manifest)
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Cache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encode and write `entry`; returns the path relative to the root
    fn write_document(&self, entry: &KnowledgeEntry) -> Result<PathBuf> {
        let file = PathBuf::from(entry.file_name());
        std::fs::write(self.root.join(&file), codec::encode(entry)?)?;
        Ok(file)
    }

    fn upsert_manifest(&self, cache: &Cache, entry: &KnowledgeEntry) {
        if let Err(e) = manifest::upsert_topic(&self.root, TopicRecord::from(entry)) {
            warn!(error = %e, "manifest update failed, rebuilding");
            self.save_rebuilt_manifest(cache);
        }
    }

    fn remove_from_manifest(&self, cache: &Cache, topics: &[String]) {
        let result = Manifest::load(&self.root).and_then(|mut m| {
            for topic in topics {
                m.remove(topic);
            }
            m.save(&self.root)
        });
        if let Err(e) = result {
            warn!(error = %e, "manifest update failed, rebuilding");
            self.save_rebuilt_manifest(cache);
        }
    }

    fn save_rebuilt_manifest(&self, cache: &Cache) {
        if let Err(e) = manifest_from(cache).save(&self.root) {
            warn!(error = %e, "manifest could not be rebuilt");
        }
    }
}

/// Scan `root` for documents and decode each; undecodable files are skipped
fn load_cache(root: &Path) -> Result<Cache> {
    let mut cache = Cache::new();

    for dir_entry in std::fs::read_dir(root)? {
        let path = dir_entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION)
        {
            continue;
        }

        let entry = match std::fs::read_to_string(&path)
            .map_err(KnowledgeError::from)
            .and_then(|text| codec::decode(&text))
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable document");
                continue;
            }
        };

        if let Some(previous) = cache.get(&entry.topic) {
            warn!(
                file = %path.display(),
                topic = %previous.topic,
                "skipping second document for the same topic"
            );
            continue;
        }
        debug!(topic = %entry.topic, version = entry.version, "loaded document");
        cache.insert(entry.topic.clone(), entry);
    }

    Ok(cache)
}

/// Keep the regenerable manifest out of the version log
fn ensure_gitignore(root: &Path) -> Result<()> {
    let path = root.join(".gitignore");
    if !path.exists() {
        std::fs::write(path, format!("{}\n", MANIFEST_FILE))?;
    }
    Ok(())
}

fn remove_file_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn manifest_from(cache: &Cache) -> Manifest {
    Manifest {
        topics: cache.values().map(TopicRecord::from).collect(),
        ..Manifest::default()
    }
}

/// `query` must already be lowercase
fn matches_query(entry: &KnowledgeEntry, query: &str) -> bool {
    entry.topic.to_lowercase().contains(query)
        || entry.content.to_lowercase().contains(query)
        || entry.tags.iter().any(|t| t.to_lowercase().contains(query))
}

/// Whether `a` should be kept over its duplicate `b`
fn survives(a: &KnowledgeEntry, b: &KnowledgeEntry) -> bool {
    match a.confidence.total_cmp(&b.confidence) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match a.updated_at.cmp(&b.updated_at) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => a.topic <= b.topic,
        },
    }
}

/// First line of `content`, cut to `max_chars`
fn preview(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let first_line = first_line.trim();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
