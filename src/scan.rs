//! # Cache Directory Scanning
//!
//! Everything that needs to look at the filesystem before or after the pure
//! selection pass: listing package files, age based retention, finding
//! detached signatures and adding up sizes.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::select::sort_paths;

/// Whether a file name looks like a complete package archive.
pub fn is_package_file(name: &str) -> bool {
    name.contains(".pkg.tar") && !name.ends_with(".sig") && !name.ends_with(".part")
}

/// List the package archives in `dir`, sorted by name and version.
///
/// # Errors
/// Returns [`Error::MissingCacheDir`] if `dir` is not a directory, or an I/O
/// error if it cannot be listed.
pub fn scan_cache_dir(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::MissingCacheDir(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };

        if !is_package_file(name) {
            continue;
        }

        match path.to_str() {
            Some(path) => files.push(path.to_string()),
            None => warn!("Skipping {}: path is not valid UTF-8", path.display()),
        }
    }

    sort_paths(&mut files);
    debug!("Found {} package files in {}", files.len(), dir.display());
    Ok(files)
}

/// Parse a human readable duration such as `30days` or `2weeks`.
pub fn parse_age(value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|e| Error::InvalidDuration {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Keep files that were accessed or modified recently, regardless of how
/// many newer versions exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeFilter {
    pub min_atime: Option<Duration>,
    pub min_mtime: Option<Duration>,
}

impl AgeFilter {
    pub fn is_active(&self) -> bool {
        self.min_atime.is_some() || self.min_mtime.is_some()
    }

    /// Whether `path` is too recent to prune, measured against `now`.
    ///
    /// Files whose metadata cannot be read are never considered recent.
    pub fn is_recent(&self, path: &Path, now: SystemTime) -> bool {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to stat {}: {}", path.display(), e);
                return false;
            }
        };

        let newer_than = |time: std::io::Result<SystemTime>, age: Option<Duration>| {
            match (time, age) {
                (Ok(time), Some(age)) => now
                    .checked_sub(age)
                    .is_some_and(|cutoff| time > cutoff),
                _ => false,
            }
        };

        newer_than(metadata.accessed(), self.min_atime)
            || newer_than(metadata.modified(), self.min_mtime)
    }

    /// Drop candidates that are too recent to prune.
    pub fn apply(&self, candidates: Vec<String>, now: SystemTime) -> Vec<String> {
        if !self.is_active() {
            return candidates;
        }

        candidates
            .into_iter()
            .filter(|path| {
                let recent = self.is_recent(Path::new(path), now);
                if recent {
                    debug!("Keeping recently used {}", path);
                }
                !recent
            })
            .collect()
    }
}

/// A file chosen for pruning, with the files that travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Detached signatures (`<path>.sig`) found next to the package.
    pub sidecars: Vec<PathBuf>,
    /// Combined size of the package and its sidecars in bytes.
    pub size: u64,
}

impl Candidate {
    /// The package followed by its sidecars.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.path.as_path()).chain(self.sidecars.iter().map(PathBuf::as_path))
    }
}

/// Attach signatures and sizes to each candidate path, preserving order.
pub fn collect_candidates(paths: Vec<String>) -> Vec<Candidate> {
    paths
        .into_par_iter()
        .map(|path| {
            let path = PathBuf::from(path);
            let mut sig = path.clone().into_os_string();
            sig.push(".sig");
            let sig = PathBuf::from(sig);

            let sidecars = if sig.is_file() { vec![sig] } else { Vec::new() };

            let size = std::iter::once(&path)
                .chain(sidecars.iter())
                .map(|file| fs::metadata(file).map(|m| m.len()).unwrap_or(0))
                .sum();

            Candidate {
                path,
                sidecars,
                size,
            }
        })
        .collect()
}

pub fn total_size(candidates: &[Candidate]) -> u64 {
    candidates.iter().map(|c| c.size).sum()
}

/// Format a byte count with binary units, e.g. `1.5 MiB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size > 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{size:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    #[test]
    fn test_is_package_file() {
        assert!(is_package_file("foo-1-1-any.pkg.tar.zst"));
        assert!(is_package_file("foo-1-1-any.pkg.tar"));
        assert!(!is_package_file("foo-1-1-any.pkg.tar.zst.sig"));
        assert!(!is_package_file("foo-1-1-any.pkg.tar.zst.part"));
        assert!(!is_package_file("README"));
    }

    #[test]
    fn test_scan_cache_dir() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "foo-1.10-1-any.pkg.tar.zst", 1);
        touch(dir.path(), "foo-1.9-1-any.pkg.tar.zst", 1);
        touch(dir.path(), "foo-1.9-1-any.pkg.tar.zst.sig", 1);
        touch(dir.path(), "notes.txt", 1);
        fs::create_dir(dir.path().join("sub.pkg.tar.zst")).unwrap();

        let files = scan_cache_dir(dir.path()).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|f| Path::new(f).file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["foo-1.9-1-any.pkg.tar.zst", "foo-1.10-1-any.pkg.tar.zst"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_scan_skips_non_utf8_directory() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = TempDir::new().unwrap();
        let dir = root.path().join(OsStr::from_bytes(b"cache-\xff"));
        fs::create_dir(&dir).unwrap();
        touch(&dir, "foo-1-1-any.pkg.tar.zst", 1);

        assert!(scan_cache_dir(&dir).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            scan_cache_dir(&missing),
            Err(Error::MissingCacheDir(p)) if p == missing
        ));
    }

    #[test]
    fn test_collect_candidates_with_sidecar() {
        let dir = TempDir::new().unwrap();
        let signed = touch(dir.path(), "a-1-1-any.pkg.tar.zst", 100);
        let sig = touch(dir.path(), "a-1-1-any.pkg.tar.zst.sig", 10);
        let unsigned = touch(dir.path(), "b-1-1-any.pkg.tar.zst", 5);

        let candidates = collect_candidates(vec![
            signed.to_str().unwrap().to_string(),
            unsigned.to_str().unwrap().to_string(),
        ]);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].sidecars, [sig.clone()]);
        assert_eq!(candidates[0].size, 110);
        assert!(candidates[1].sidecars.is_empty());
        assert_eq!(candidates[1].size, 5);
        assert_eq!(total_size(&candidates), 115);

        let files: Vec<&Path> = candidates[0].files().collect();
        assert_eq!(files, [signed.as_path(), sig.as_path()]);
    }

    #[test]
    fn test_age_filter_keeps_recent_files() {
        let dir = TempDir::new().unwrap();
        let path = touch(dir.path(), "a-1-1-any.pkg.tar.zst", 1);
        let paths = vec![path.to_str().unwrap().to_string()];
        let now = SystemTime::now();

        let inactive = AgeFilter::default();
        assert_eq!(inactive.apply(paths.clone(), now), paths);

        let week = AgeFilter {
            min_mtime: Some(Duration::from_secs(7 * 24 * 3600)),
            ..Default::default()
        };
        assert!(week.apply(paths.clone(), now).is_empty());

        let instant = AgeFilter {
            min_mtime: Some(Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(instant.apply(paths.clone(), now), paths);
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age("30days").unwrap(), Duration::from_secs(30 * 86400));
        assert!(matches!(parse_age("soon"), Err(Error::InvalidDuration { .. })));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1024), "1024 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(5 * 1024 * 1024 + 1024 * 256), "5.25 MiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3 GiB");
    }
}
