use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{dryrun, prune::OutputArgs, relocate, remove};

#[derive(Parser)]
#[command(name = "pacprune")]
#[command(about = "Prune old package files from the pacman package cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidates and the space they take without touching them
    Dryrun(dryrun::DryrunArgs),

    /// Move candidates (and their signatures) into another directory
    Move(relocate::MoveArgs),

    /// Delete candidates (and their signatures)
    Remove(remove::RemoveArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.output.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dryrun(args) => dryrun::run(args, &cli.output)?,
        Commands::Move(args) => relocate::run(args, &cli.output)?,
        Commands::Remove(args) => remove::run(args, &cli.output)?,
    }

    Ok(())
}
