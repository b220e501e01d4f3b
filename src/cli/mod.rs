//! CLI module - Command definitions and handlers
//!
//! Each subcommand lives in its own file with an `Args` struct and a `run`
//! function taking the resolved [`utils::Workspace`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod add;
pub mod history;
pub mod init;
pub mod maintain;
pub mod rules;
pub mod search;
pub mod show;
pub mod utils;

/// knowhow - versioned knowledge store
///
/// One markdown file per topic, every change committed to git.
#[derive(Parser, Debug)]
#[command(name = "knowhow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "KNOWHOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Knowledge directory
    #[arg(short, long, global = true, env = "KNOWHOW_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the knowledge directory and its history
    Init(init::InitArgs),

    /// Add a new topic
    Add(add::AddArgs),

    /// Replace the content of a topic (new version)
    Edit(add::EditArgs),

    /// Delete a topic
    Rm(add::RmArgs),

    /// Store a research result as auto-learned knowledge
    Learn(add::LearnArgs),

    /// Show a topic
    Show(show::ShowArgs),

    /// List all topics
    List(show::ListArgs),

    /// Search topics, content and tags
    Search(search::SearchArgs),

    /// Print relevant knowledge with rules applied
    Context(search::ContextArgs),

    /// Show the history of a topic
    History(history::HistoryArgs),

    /// Diff two revisions of the store
    Diff(history::DiffArgs),

    /// Remove near-duplicate topics
    Dedup(maintain::DedupArgs),

    /// Run a consolidation pass
    Consolidate(maintain::ConsolidateArgs),

    /// Rebuild the manifest from the documents
    Reindex(maintain::ReindexArgs),

    /// Manage content rules
    Rules(rules::RulesArgs),
}
