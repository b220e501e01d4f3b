//! `knowhow rules` commands
//!
//! # Usage
//! ```bash
//! knowhow rules add --type prefer --pattern XCTest --replacement "Swift Testing"
//! knowhow rules add --type always_mention --pattern MVVM --reason "house style"
//! knowhow rules list
//! knowhow rules rm 01HXYZ...
//! knowhow rules apply "Use XCTest for tests"
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::utils::{read_content, Workspace};
use crate::core::rules::Rule;

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// Add a rule
    Add {
        /// exclude, prefer, always_mention or never_mention
        #[arg(short = 't', long = "type")]
        rule_type: String,

        /// Regular expression to match
        #[arg(short, long)]
        pattern: String,

        /// Replacement text (prefer only)
        #[arg(long)]
        replacement: Option<String>,

        /// Why the rule exists
        #[arg(long)]
        reason: Option<String>,
    },

    /// List rules in the order they are applied
    List {
        /// Print rules as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a rule by id
    Rm {
        /// Rule id
        id: String,
    },

    /// Run the rules over some text and print the result
    Apply {
        /// Text to transform
        text: Option<String>,

        /// Read the text from file
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
    },
}

pub fn run(args: RulesArgs, workspace: &Workspace) -> Result<()> {
    let engine = workspace.open_rules()?;

    match args.command {
        RulesCommand::Add {
            rule_type,
            pattern,
            replacement,
            reason,
        } => {
            let mut rule = Rule::new(rule_type, pattern);
            if let Some(replacement) = replacement {
                rule = rule.with_replacement(replacement);
            }
            if let Some(reason) = reason {
                rule = rule.with_reason(reason);
            }
            let added = engine.add_rule(rule)?;
            println!(
                "{} Added rule {} ({} /{}/)",
                "✅".green(),
                added.id.bold(),
                added.rule_type,
                added.pattern
            );
        }
        RulesCommand::List { json } => {
            let rules = engine.rules();
            if json {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else if rules.is_empty() {
                println!("No rules defined.");
            } else {
                for rule in &rules {
                    print_rule(rule);
                }
            }
        }
        RulesCommand::Rm { id } => {
            let removed = engine.remove_rule(&id)?;
            println!(
                "{} Removed rule {} ({} /{}/)",
                "🗑️".red(),
                removed.id,
                removed.rule_type,
                removed.pattern
            );
        }
        RulesCommand::Apply { text, file } => {
            let text = read_content(text, file.as_deref())?;
            println!("{}", engine.apply(&text)?);
        }
    }
    Ok(())
}

fn print_rule(rule: &Rule) {
    let mut line = format!(
        "{}  {:<14} /{}/",
        rule.id.dimmed(),
        rule.rule_type,
        rule.pattern
    );
    if !rule.replacement.is_empty() {
        line.push_str(&format!(" -> {}", rule.replacement));
    }
    if !rule.reason.is_empty() {
        line.push_str(&format!("  ({})", rule.reason));
    }
    println!("{}", line);
}
