//! Maintenance commands: `dedup`, `consolidate`, `reindex`
//!
//! # Usage
//! ```bash
//! knowhow dedup              # whole store
//! knowhow dedup swift/       # only topics under swift/
//! knowhow consolidate
//! knowhow reindex            # rebuild manifest.json from the documents
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::Workspace;

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Only consider topics starting with this prefix
    #[arg(default_value = "")]
    pub prefix: String,

    /// Print removed topics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_dedup(args: DedupArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let removed = store.deduplicate(&args.prefix)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&removed)?);
        return Ok(());
    }

    if removed.is_empty() {
        println!("No duplicates found.");
        return Ok(());
    }

    println!("{} Removed {} duplicate(s):", "🧹".green(), removed.len());
    for topic in &removed {
        println!("   - {}", topic);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ConsolidateArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_consolidate(args: ConsolidateArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let report = store.consolidate()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.groups.is_empty() {
        println!("Nothing to consolidate.");
        return Ok(());
    }

    println!("{} Consolidation recorded:", "📦".green());
    for group in &report.groups {
        println!(
            "   {} ({}): {}",
            group.prefix.bold(),
            group.topics.len(),
            group.topics.join(", ")
        );
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ReindexArgs {}

pub fn run_reindex(_args: ReindexArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let manifest = store.rebuild_manifest()?;
    println!(
        "{} Manifest rebuilt: {} topic(s)",
        "✅".green(),
        manifest.metadata.total_topics
    );
    Ok(())
}
