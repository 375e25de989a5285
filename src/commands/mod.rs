pub mod dryrun;
pub mod prune;
pub mod relocate;
pub mod remove;
