//! knowhow - Versioned knowledge store
//!
//! Topic documents on disk, one markdown file each, cached in memory and
//! recorded in a git history. Retrieved knowledge is passed through
//! user-defined rules before it reaches a caller.
//!
//! ## Key Concepts
//!
//! - **Topic**: unique key of an entry and the stem of its file name
//! - **Content identity**: SHA-256 of topic + content, used to spot duplicates
//! - **Version log**: one commit per mutation
//! - **Manifest**: regenerable index of topic metadata
//! - **Rules**: ordered regex transforms applied on read

pub mod cli;
pub mod config;
pub mod core;

pub use core::context::{learn_from_research, relevant_context};
pub use core::entry::{KnowledgeEntry, ResearchResult, Source};
pub use core::error::{KnowledgeError, Result};
pub use core::manifest::{Manifest, TopicRecord};
pub use core::rules::{Rule, RuleEngine, RuleKind};
pub use core::store::KnowledgeStore;
pub use core::version_log::{Commit, GitLog, MemoryLog, VersionLog};
