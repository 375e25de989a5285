use anyhow::Result;
use clap::Args;

use super::prune::{self, OutputArgs, PruneArgs};

#[derive(Args)]
#[command(override_usage = "pacprune dryrun [OPTIONS]")]
pub struct DryrunArgs {
    #[command(flatten)]
    prune: PruneArgs,
}

pub fn run(args: DryrunArgs, output: &OutputArgs) -> Result<()> {
    let settings = args.prune.resolve(output)?;
    let reports = prune::collect(&settings)?;

    if prune::report_empty(&reports, output) {
        return Ok(());
    }

    prune::list_candidates(&reports, output)?;
    prune::finish(
        output,
        format!(
            "finished dry run: {} candidates (disk space saved: {})",
            prune::candidate_count(&reports),
            prune::size_summary(&reports)
        ),
    );

    Ok(())
}
