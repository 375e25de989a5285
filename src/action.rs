//! # Move and Remove Executors
//!
//! Applies the final action to each pruning candidate and its sidecars.
//! Directories the current user can write to are handled with `std::fs`;
//! anything else is handed to `sudo mv` / `sudo rm`.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::scan::Candidate;

/// What to do with each candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move into `dest`, overwriting existing files only when `force` is set.
    Move { dest: PathBuf, force: bool },
    /// Delete. With `force`, files that vanished in the meantime are ignored.
    Remove { force: bool },
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Move { .. } => "move",
            Action::Remove { .. } => "remove",
        }
    }
}

/// How file operations are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Plain filesystem calls as the current user.
    Direct,
    /// Through `sudo`.
    Sudo,
}

/// Check whether the current user can create files in `dir`.
pub fn is_writable(dir: &Path) -> bool {
    let marker = dir.join(format!(".pacprune-write-test-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&marker) {
        Ok(_) => {
            if let Err(e) = fs::remove_file(&marker) {
                warn!("Failed to remove write test file {}: {}", marker.display(), e);
            }
            true
        }
        Err(_) => false,
    }
}

/// Ensure a move target exists and is a directory.
pub fn check_move_dir(dest: &Path) -> Result<()> {
    if dest.is_dir() {
        Ok(())
    } else {
        Err(Error::MissingMoveDir(dest.to_path_buf()))
    }
}

/// Applies one [`Action`] to candidates from a single cache directory.
#[derive(Debug, Clone)]
pub struct Executor {
    action: Action,
    privilege: Privilege,
}

impl Executor {
    pub fn new(action: Action, privilege: Privilege) -> Self {
        Executor { action, privilege }
    }

    /// Pick the privilege level needed to act on files in `cache_dir`.
    pub fn for_cache_dir(action: Action, cache_dir: &Path) -> Self {
        let mut writable = is_writable(cache_dir);
        if let Action::Move { dest, .. } = &action {
            writable = writable && is_writable(dest);
        }

        let privilege = if writable {
            Privilege::Direct
        } else {
            info!(
                "{} is not writable, escalating with sudo",
                cache_dir.display()
            );
            Privilege::Sudo
        };

        Executor::new(action, privilege)
    }

    pub fn privilege(&self) -> Privilege {
        self.privilege
    }

    /// Move or remove a candidate together with its sidecars.
    pub fn apply(&self, candidate: &Candidate) -> Result<()> {
        let files: Vec<&Path> = candidate.files().collect();

        if let Action::Move { dest, force: false } = &self.action {
            for file in &files {
                let target = move_target(dest, file)?;
                if target.exists() {
                    return Err(self.failure(file, "target exists (use --force to overwrite)"));
                }
            }
        }

        match self.privilege {
            Privilege::Direct => files.iter().try_for_each(|file| self.apply_direct(file)),
            Privilege::Sudo => self.apply_sudo(&files),
        }
    }

    fn apply_direct(&self, file: &Path) -> Result<()> {
        match &self.action {
            Action::Move { dest, .. } => {
                let target = move_target(dest, file)?;
                debug!("Moving {} to {}", file.display(), target.display());

                if fs::rename(file, &target).is_err() {
                    // Different filesystem: copy then unlink
                    fs::copy(file, &target).map_err(|e| self.failure(file, &e.to_string()))?;
                    fs::remove_file(file).map_err(|e| self.failure(file, &e.to_string()))?;
                }
                Ok(())
            }
            Action::Remove { force } => {
                debug!("Removing {}", file.display());
                match fs::remove_file(file) {
                    Ok(()) => Ok(()),
                    Err(e) if *force && e.kind() == ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(self.failure(file, &e.to_string())),
                }
            }
        }
    }

    fn apply_sudo(&self, files: &[&Path]) -> Result<()> {
        let mut cmd = Command::new("sudo");
        match &self.action {
            Action::Move { dest, force } => {
                cmd.arg("mv");
                if *force {
                    cmd.arg("-f");
                }
                cmd.arg("--").args(files).arg(dest);
            }
            Action::Remove { force } => {
                cmd.arg("rm");
                if *force {
                    cmd.arg("-f");
                }
                cmd.arg("--").args(files);
            }
        }

        debug!("Running {:?}", cmd);
        let status = cmd
            .status()
            .map_err(|e| self.failure(files[0], &format!("failed to run sudo: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            let reason = format!("sudo {} exited with {status}", self.action.verb());
            Err(self.failure(files[0], &reason))
        }
    }

    fn failure(&self, path: &Path, reason: &str) -> Error {
        Error::Action {
            action: self.action.verb(),
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

fn move_target(dest: &Path, file: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| Error::Action {
        action: "move",
        path: file.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;
    Ok(dest.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::collect_candidates;
    use tempfile::TempDir;

    fn candidate(dir: &Path, name: &str, signed: bool) -> Candidate {
        let path = dir.join(name);
        fs::write(&path, b"pkg").unwrap();
        if signed {
            fs::write(dir.join(format!("{name}.sig")), b"sig").unwrap();
        }
        collect_candidates(vec![path.to_str().unwrap().to_string()]).remove(0)
    }

    #[test]
    fn test_remove_with_sidecar() {
        let dir = TempDir::new().unwrap();
        let c = candidate(dir.path(), "a-1-1-any.pkg.tar.zst", true);

        let executor = Executor::new(Action::Remove { force: false }, Privilege::Direct);
        executor.apply(&c).unwrap();

        assert!(!c.path.exists());
        assert!(!dir.path().join("a-1-1-any.pkg.tar.zst.sig").exists());
    }

    #[test]
    fn test_remove_missing_file() {
        let dir = TempDir::new().unwrap();
        let c = candidate(dir.path(), "a-1-1-any.pkg.tar.zst", false);
        fs::remove_file(&c.path).unwrap();

        let strict = Executor::new(Action::Remove { force: false }, Privilege::Direct);
        assert!(matches!(strict.apply(&c), Err(Error::Action { action: "remove", .. })));

        let forced = Executor::new(Action::Remove { force: true }, Privilege::Direct);
        assert!(forced.apply(&c).is_ok());
    }

    #[test]
    fn test_move_with_sidecar() {
        let cache = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let c = candidate(cache.path(), "a-1-1-any.pkg.tar.zst", true);

        let action = Action::Move {
            dest: dest.path().to_path_buf(),
            force: false,
        };
        let executor = Executor::for_cache_dir(action, cache.path());
        assert_eq!(executor.privilege(), Privilege::Direct);
        executor.apply(&c).unwrap();

        assert!(!c.path.exists());
        assert!(dest.path().join("a-1-1-any.pkg.tar.zst").exists());
        assert!(dest.path().join("a-1-1-any.pkg.tar.zst.sig").exists());
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let cache = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let c = candidate(cache.path(), "a-1-1-any.pkg.tar.zst", false);
        fs::write(dest.path().join("a-1-1-any.pkg.tar.zst"), b"old").unwrap();

        let strict = Executor::new(
            Action::Move {
                dest: dest.path().to_path_buf(),
                force: false,
            },
            Privilege::Direct,
        );
        assert!(strict.apply(&c).is_err());
        assert!(c.path.exists());

        let forced = Executor::new(
            Action::Move {
                dest: dest.path().to_path_buf(),
                force: true,
            },
            Privilege::Direct,
        );
        forced.apply(&c).unwrap();
        assert_eq!(fs::read(dest.path().join("a-1-1-any.pkg.tar.zst")).unwrap(), b"pkg");
    }

    #[test]
    fn test_check_move_dir() {
        let dir = TempDir::new().unwrap();
        assert!(check_move_dir(dir.path()).is_ok());
        assert!(matches!(
            check_move_dir(&dir.path().join("nope")),
            Err(Error::MissingMoveDir(_))
        ));
    }

    #[test]
    fn test_is_writable_cleans_up() {
        let dir = TempDir::new().unwrap();
        assert!(is_writable(dir.path()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(!is_writable(&dir.path().join("missing")));
    }
}
