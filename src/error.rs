//! Error types for pacprune
//!
//! The selection core never fails; these cover everything around it:
//! reading configuration, querying the installed set, scanning cache
//! directories and executing the final move or delete.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration file exists but could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The user defaults file is not valid TOML for [`crate::config::UserConfig`]
    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cachedir '{0}' does not exist or is not a directory")]
    MissingCacheDir(PathBuf),

    #[error("move target '{0}' does not exist or is not a directory")]
    MissingMoveDir(PathBuf),

    /// `pacman -Qq` could not be run or exited non-zero
    #[error("Failed to query installed packages: {0}")]
    InstalledQuery(String),

    /// A move or remove did not complete
    #[error("Failed to {action} {path}: {reason}")]
    Action {
        action: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
