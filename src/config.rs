//! # Configuration for pacprune
//!
//! Two sources feed the defaults the command line can override:
//!
//! - the package manager's own configuration (`/etc/pacman.conf`), read only
//!   for its `CacheDir` entries;
//! - an optional user defaults file, `$XDG_CONFIG_HOME/pacprune/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Package manager configuration read when `--config` is not given.
pub const DEFAULT_PACMAN_CONF: &str = "/etc/pacman.conf";

/// Cache location used when no configuration names one.
pub const DEFAULT_CACHE_DIR: &str = "/var/cache/pacman/pkg/";

/// Number of versions kept per package when nothing else says otherwise.
pub const DEFAULT_KEEP: usize = 3;

/// Contents of the user defaults file.
///
/// Every field is optional; unset fields fall through to the built-in
/// defaults.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Versions kept per package.
    pub keep: Option<usize>,
    /// Cache directories to prune.
    pub cache_dirs: Vec<PathBuf>,
    /// Package manager configuration to read `CacheDir` from.
    pub pacman_conf: Option<PathBuf>,
    /// Colored output.
    pub color: Option<bool>,
}

impl UserConfig {
    /// Default location of the user defaults file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pacprune").join("config.toml"))
    }

    /// Load a `UserConfig` from disk.
    ///
    /// A missing file yields the empty configuration.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not
    /// valid TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No user config at {}", path.display());
                return Ok(UserConfig::default());
            }
            Err(source) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from [`UserConfig::default_path`], or the empty configuration
    /// when no config directory is known.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Ok(UserConfig::default()),
        }
    }
}

/// Collect every `CacheDir` entry from the `[options]` section of a
/// pacman-style configuration.
///
/// A value may list several directories separated by whitespace, and the
/// option may be repeated.
pub fn parse_cache_dirs(content: &str) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut in_options = false;

    for line in content.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_options = section.trim() == "options";
            continue;
        }

        if !in_options {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        if key.trim() == "CacheDir" {
            dirs.extend(value.split_whitespace().map(PathBuf::from));
        }
    }

    dirs
}

/// Read the cache directories configured in `path`.
///
/// Falls back to [`DEFAULT_CACHE_DIR`] when the file is missing or names
/// none.
pub fn configured_cache_dirs<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    let dirs = match fs::read_to_string(path) {
        Ok(content) => parse_cache_dirs(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not found, using default cache dir", path.display());
            Vec::new()
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if dirs.is_empty() {
        Ok(vec![PathBuf::from(DEFAULT_CACHE_DIR)])
    } else {
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_cache_dirs() {
        let conf = r#"
# CacheDir = /commented/out/
[options]
RootDir     = /
CacheDir    = /var/cache/pacman/pkg/   # trailing comment
CacheDir = /mnt/a /mnt/b
HoldPkg     = pacman glibc

[core]
CacheDir = /not/an/option/
Include = /etc/pacman.d/mirrorlist
"#;
        assert_eq!(
            parse_cache_dirs(conf),
            [
                PathBuf::from("/var/cache/pacman/pkg/"),
                PathBuf::from("/mnt/a"),
                PathBuf::from("/mnt/b"),
            ]
        );
    }

    #[test]
    fn test_configured_cache_dirs_defaults() {
        let dir = TempDir::new().unwrap();

        let missing = configured_cache_dirs(dir.path().join("missing.conf")).unwrap();
        assert_eq!(missing, [PathBuf::from(DEFAULT_CACHE_DIR)]);

        let empty = dir.path().join("pacman.conf");
        fs::write(&empty, "[options]\nColor\n").unwrap();
        assert_eq!(
            configured_cache_dirs(&empty).unwrap(),
            [PathBuf::from(DEFAULT_CACHE_DIR)]
        );
    }

    #[test]
    fn test_user_config_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "keep = 1\ncache_dirs = [\"/srv/cache\"]\ncolor = false\n",
        )
        .unwrap();

        let config = UserConfig::load(&path).unwrap();
        assert_eq!(config.keep, Some(1));
        assert_eq!(config.cache_dirs, [PathBuf::from("/srv/cache")]);
        assert_eq!(config.color, Some(false));
        assert_eq!(config.pacman_conf, None);
    }

    #[test]
    fn test_user_config_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = UserConfig::load(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_user_config_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "keep = \"three\"\n").unwrap();
        assert!(matches!(
            UserConfig::load(&path),
            Err(Error::ConfigParse { .. })
        ));
    }
}
