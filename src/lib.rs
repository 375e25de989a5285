//! # pacprune
//!
//! Prune old package archives from a pacman package cache.
//!
//! The heart of the crate is [`select()`]: a pure pass that groups cache file
//! names by package name and architecture, orders each group by package
//! version and flags everything but the newest `keep` entries. The other
//! modules supply what the command line tool needs around it.

pub mod action;
pub mod config;
pub mod error;
pub mod filename;
pub mod installed;
pub mod scan;
pub mod select;
pub mod version;

pub use error::{Error, Result};
pub use filename::{Identity, PackageFileName};
pub use select::{Filters, Partition, Selection, select};
pub use version::{PkgVersion, compare_versions};
