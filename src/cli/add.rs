//! `knowhow add`, `edit`, `rm` and `learn` commands
//!
//! # Usage
//! ```bash
//! knowhow add swift/testing "Prefer Swift Testing over XCTest" --tags swift,testing
//! knowhow add swift/testing --file notes.md --confidence 0.9
//! knowhow edit swift/testing --file notes.md
//! knowhow rm swift/testing
//! knowhow learn "swift actors" --mode deep --file result.md
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{read_content, summary_line, Workspace};
use crate::core::context::learn_from_research;
use crate::core::entry::{KnowledgeEntry, ResearchResult, Source};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Topic (e.g. swift/testing)
    pub topic: String,

    /// Content of the entry
    pub content: Option<String>,

    /// Read content from file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Tags (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Confidence (0.0-1.0)
    #[arg(long, default_value = "0.5")]
    pub confidence: f64,

    /// Provenance tag
    #[arg(short, long, default_value = "manual")]
    pub source: String,
}

pub fn run(args: AddArgs, workspace: &Workspace) -> Result<()> {
    let content = read_content(args.content, args.file.as_deref())?;
    let store = workspace.open_store()?;

    let entry = KnowledgeEntry::new(&args.topic, content)
        .with_tags(args.tags.unwrap_or_default())
        .with_confidence(args.confidence)
        .with_source(Source::from(args.source));

    let added = store.add(entry)?;

    println!("{} Added {}", "✅".green(), summary_line(&added));
    println!("   File: {}", store.document_path(&added.topic).display());
    Ok(())
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Topic to edit
    pub topic: String,

    /// New content
    pub content: Option<String>,

    /// Read new content from file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Replace tags (comma-separated); kept when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// New confidence; kept when omitted
    #[arg(long)]
    pub confidence: Option<f64>,
}

pub fn run_edit(args: EditArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let current = store.get(&args.topic)?;

    let content = match (&args.content, &args.file) {
        (None, None) => current.content.clone(),
        _ => read_content(args.content, args.file.as_deref())?,
    };

    let entry = KnowledgeEntry::new(&args.topic, content)
        .with_tags(args.tags.unwrap_or_else(|| current.tags.clone()))
        .with_confidence(args.confidence.unwrap_or(current.confidence))
        .with_source(current.source.clone());

    let updated = store.update(&args.topic, entry)?;
    println!("{} Updated {}", "✅".green(), summary_line(&updated));
    Ok(())
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Topic to delete
    pub topic: String,
}

pub fn run_rm(args: RmArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    store.delete(&args.topic)?;
    println!("{} Deleted {}", "🗑️".red(), args.topic.bold());
    Ok(())
}

#[derive(Args, Debug)]
pub struct LearnArgs {
    /// Research query; becomes the topic
    pub query: String,

    /// Research result content
    pub content: Option<String>,

    /// Read the result from file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Research mode the result came from
    #[arg(short, long, default_value = "quick")]
    pub mode: String,
}

pub fn run_learn(args: LearnArgs, workspace: &Workspace) -> Result<()> {
    let content = read_content(args.content, args.file.as_deref())?;
    let store = workspace.open_store()?;

    let result = ResearchResult {
        query: args.query,
        mode: args.mode,
        content,
    };
    let learned = learn_from_research(
        &store,
        Some(&result),
        workspace.config.knowledge.auto_learn_confidence,
    )?;

    println!("{} Learned {}", "🧠".cyan(), summary_line(&learned));
    Ok(())
}
