use anyhow::Result;
use clap::Args;

use pacprune::action::Action;

use super::prune::{self, OutputArgs, PruneArgs};

#[derive(Args)]
#[command(override_usage = "pacprune remove [OPTIONS]")]
pub struct RemoveArgs {
    /// Ignore candidates that disappear before they are removed
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    prune: PruneArgs,
}

pub fn run(args: RemoveArgs, output: &OutputArgs) -> Result<()> {
    let settings = args.prune.resolve(output)?;
    let reports = prune::collect(&settings)?;

    if prune::report_empty(&reports, output) {
        return Ok(());
    }

    prune::list_candidates(&reports, output)?;
    prune::execute(&reports, &Action::Remove { force: args.force }, output)?;

    prune::finish(
        output,
        format!(
            "finished: {} packages removed (disk space saved: {})",
            prune::candidate_count(&reports),
            prune::size_summary(&reports)
        ),
    );

    Ok(())
}
