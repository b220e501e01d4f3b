//! Context - What callers actually consume
//!
//! Glue between the store, the rule engine and the research engine:
//! relevant knowledge is filtered through the user's rules before it is
//! handed out, and finished research results are fed back into the store.

use tracing::info;

use super::entry::{KnowledgeEntry, ResearchResult};
use super::error::{KnowledgeError, Result};
use super::rules::RuleEngine;
use super::store::KnowledgeStore;

/// Relevant knowledge for `query`, at most `max_size` bytes before rules run
///
/// Returns an empty string when nothing matches; rules are not applied to
/// empty knowledge.
pub fn relevant_context(
    store: &KnowledgeStore,
    rules: &RuleEngine,
    query: &str,
    max_size: usize,
) -> Result<String> {
    let knowledge = store.get_relevant_knowledge(query, max_size);
    if knowledge.is_empty() {
        return Ok(knowledge);
    }
    rules.apply(&knowledge)
}

/// Store a finished research result as auto-learned knowledge
///
/// A new query becomes a new topic; a query that is already a topic updates
/// it instead.
pub fn learn_from_research(
    store: &KnowledgeStore,
    result: Option<&ResearchResult>,
    confidence: f64,
) -> Result<KnowledgeEntry> {
    let entry = KnowledgeEntry::from_research(result, confidence)?;
    let topic = entry.topic.clone();

    let stored = match store.add(entry.clone()) {
        Err(KnowledgeError::AlreadyExists(_)) if store.get(&topic).is_ok() => {
            store.update(&topic, entry)?
        }
        other => other?,
    };

    info!(topic = %stored.topic, version = stored.version, "learned from research");
    Ok(stored)
}
