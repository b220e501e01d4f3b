//! `knowhow init` command
//!
//! Creates the knowledge directory, its `.gitignore` and the initial commit.
//! Running it on an existing store is a no-op.
//!
//! # Usage
//! ```bash
//! knowhow init                          # ~/.knowhow/knowledge
//! knowhow --root ./kb init              # specific directory
//! knowhow --root ./kb init --save-config
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::utils::Workspace;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Write the resolved root into the global config file
    #[arg(long)]
    pub save_config: bool,
}

pub fn run(args: InitArgs, workspace: &Workspace) -> Result<()> {
    let store = workspace.open_store()?;
    let topics = store.list().len();

    println!(
        "{} Knowledge store ready at {}",
        "✅".green(),
        store.root().display()
    );
    println!("   Topics: {}", topics);

    if args.save_config {
        let path = Config::global_config_path()
            .context("Could not determine home directory for config")?;
        let mut config = workspace.config.clone();
        config.store.root = Some(workspace.root.clone());
        config.save_to(&path)?;
        println!("   Config: {}", path.display());
    }

    println!();
    println!("Next steps:");
    println!("  knowhow add <topic> \"<content>\"   Add your first topic");
    println!("  knowhow rules add --type prefer --pattern <re> --replacement <text>");
    Ok(())
}
