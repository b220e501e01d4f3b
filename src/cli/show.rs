//! `knowhow show` and `knowhow list` commands
//!
//! # Usage
//! ```bash
//! knowhow show swift/testing
//! knowhow show swift/testing --json
//! knowhow list
//! knowhow list --prefix swift/ --json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{format_confidence, summary_line, Workspace};
use crate::core::entry::KnowledgeEntry;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Topic to show
    pub topic: String,

    /// Print the entry as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ShowArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let entry = store.get(&args.topic)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_pretty(&entry);
    }
    Ok(())
}

fn print_pretty(entry: &KnowledgeEntry) {
    let rule = "─".repeat(41);
    println!("\n{}", rule);
    println!("📄 {}", entry.topic.bold());
    println!("{}", rule);
    println!("ID:         {}", entry.id);
    println!("Version:    {}", entry.version);
    println!("Confidence: {}", format_confidence(entry.confidence));
    println!("Source:     {}", entry.source);
    if !entry.tags.is_empty() {
        println!("Tags:       {}", entry.tags.join(", "));
    }
    println!("Created:    {}", entry.created_at);
    println!("Updated:    {}", entry.updated_at);
    println!();
    println!("{}", entry.content);
    println!("{}", rule);
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only topics starting with this prefix
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_list(args: ListArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let entries: Vec<_> = store
        .list()
        .into_iter()
        .filter(|e| {
            args.prefix
                .as_deref()
                .map_or(true, |p| e.topic.starts_with(p))
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No topics found in {}", workspace.root.display());
        return Ok(());
    }

    println!("📂 {} ({} topics)\n", workspace.root.display(), entries.len());
    for entry in &entries {
        println!("  {}", summary_line(entry));
    }
    Ok(())
}
