//! `knowhow search` and `knowhow context` commands
//!
//! # Usage
//! ```bash
//! knowhow search swift
//! knowhow search "actor isolation" --json
//! knowhow context swift --max-bytes 4000
//! knowhow context swift --raw          # skip rules
//! ```
//!
//! Search is a case-insensitive substring match over topics, content and
//! tags; there is no ranking.

use anyhow::Result;
use clap::Args;

use super::utils::{summary_line, Workspace};
use crate::core::context::relevant_context;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for
    pub query: String,

    /// Maximum results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SearchArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let mut results = store.search(&args.query);
    let total = results.len();
    results.truncate(args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for: {}", args.query);
        return Ok(());
    }

    println!("🔍 {} result(s) for \"{}\"\n", total, args.query);
    for entry in &results {
        println!("  {}", summary_line(entry));
    }
    if total > results.len() {
        println!("\n  ... {} more (use --limit)", total - results.len());
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Text to look for
    pub query: String,

    /// Byte budget (default from config)
    #[arg(short, long)]
    pub max_bytes: Option<usize>,

    /// Do not apply rules
    #[arg(long)]
    pub raw: bool,
}

pub fn run_context(args: ContextArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let max_bytes = args
        .max_bytes
        .unwrap_or(workspace.config.knowledge.max_context_bytes);

    let context = if args.raw {
        store.get_relevant_knowledge(&args.query, max_bytes)
    } else {
        let rules = workspace.open_rules()?;
        relevant_context(&store, &rules, &args.query, max_bytes)?
    };

    print!("{}", context);
    Ok(())
}
