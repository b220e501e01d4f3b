//! `knowhow history` and `knowhow diff` commands
//!
//! # Usage
//! ```bash
//! knowhow history swift/testing
//! knowhow diff HEAD~1 HEAD
//! knowhow diff HEAD~2 HEAD --topic swift/testing
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::Workspace;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Topic to show history for
    pub topic: String,

    /// Print commits as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: HistoryArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let commits = store.history(&args.topic)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }

    if commits.is_empty() {
        println!("No history for: {}", args.topic);
        return Ok(());
    }

    println!("📜 History of {}\n", args.topic.bold());
    for commit in &commits {
        println!(
            "  {}  {}  {}  {}",
            commit.hash.chars().take(8).collect::<String>().yellow(),
            commit.timestamp.format("%Y-%m-%d %H:%M"),
            commit.author.dimmed(),
            commit.message
        );
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Older revision
    pub from: String,

    /// Newer revision
    #[arg(default_value = "HEAD")]
    pub to: String,

    /// Limit the diff to one topic
    #[arg(short, long)]
    pub topic: Option<String>,
}

pub fn run_diff(args: DiffArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let diff = match &args.topic {
        Some(topic) => store.diff_topic(topic, &args.from, &args.to)?,
        None => store.diff(&args.from, &args.to)?,
    };

    if diff.is_empty() {
        println!("No differences.");
    } else {
        print!("{}", diff);
    }
    Ok(())
}
