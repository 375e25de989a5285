use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use pacprune::action::{Action, check_move_dir};

use super::prune::{self, OutputArgs, PruneArgs};

#[derive(Args)]
#[command(override_usage = "pacprune move <DIR> [OPTIONS]")]
pub struct MoveArgs {
    /// Directory to move candidates into (must exist)
    dest: PathBuf,

    /// Overwrite files already present in the target directory
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    prune: PruneArgs,
}

pub fn run(args: MoveArgs, output: &OutputArgs) -> Result<()> {
    check_move_dir(&args.dest).context("Invalid move target")?;

    let settings = args.prune.resolve(output)?;
    let reports = prune::collect(&settings)?;

    if prune::report_empty(&reports, output) {
        return Ok(());
    }

    prune::list_candidates(&reports, output)?;

    let action = Action::Move {
        dest: args.dest,
        force: args.force,
    };
    prune::execute(&reports, &action, output)?;

    prune::finish(
        output,
        format!(
            "finished: {} packages moved ({})",
            prune::candidate_count(&reports),
            prune::size_summary(&reports)
        ),
    );

    Ok(())
}
