//! knowhow CLI - Entry point
//!
//! Usage: knowhow <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use knowhow::cli::utils::Workspace;
use knowhow::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("knowhow=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let workspace = Workspace::resolve(cli.config.as_deref(), cli.root.as_deref())?;

    match cli.command {
        Commands::Init(args) => knowhow::cli::init::run(args, &workspace),
        Commands::Add(args) => knowhow::cli::add::run(args, &workspace),
        Commands::Edit(args) => knowhow::cli::add::run_edit(args, &workspace),
        Commands::Rm(args) => knowhow::cli::add::run_rm(args, &workspace),
        Commands::Learn(args) => knowhow::cli::add::run_learn(args, &workspace),
        Commands::Show(args) => knowhow::cli::show::run(args, &workspace),
        Commands::List(args) => knowhow::cli::show::run_list(args, &workspace),
        Commands::Search(args) => knowhow::cli::search::run(args, &workspace),
        Commands::Context(args) => knowhow::cli::search::run_context(args, &workspace),
        Commands::History(args) => knowhow::cli::history::run(args, &workspace),
        Commands::Diff(args) => knowhow::cli::history::run_diff(args, &workspace),
        Commands::Dedup(args) => knowhow::cli::maintain::run_dedup(args, &workspace),
        Commands::Consolidate(args) => knowhow::cli::maintain::run_consolidate(args, &workspace),
        Commands::Reindex(args) => knowhow::cli::maintain::run_reindex(args, &workspace),
        Commands::Rules(args) => knowhow::cli::rules::run(args, &workspace),
    }
}
