//! # Candidate Selection
//!
//! Groups cache filenames into families keyed by (name, arch), orders each
//! family by package version and flags everything except the newest `keep`
//! entries. All functions here are pure: they take filenames as strings and
//! never touch the filesystem, so a [`Selection`] can be shared freely
//! between threads.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, trace};

use crate::filename::{Identity, PackageFileName};
use crate::version::{PkgVersion, compare_versions};

/// Name based include and exclude lists.
///
/// An empty set means "no filter". A name present in both sets is excluded.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub include: HashSet<String>,
    pub exclude: HashSet<String>,
}

impl Filters {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        Filters {
            include: include.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    /// Whether files of package `name` take part in selection at all.
    pub fn allows(&self, name: &str) -> bool {
        if !self.exclude.is_empty() && self.exclude.contains(name) {
            return false;
        }
        self.include.is_empty() || self.include.contains(name)
    }
}

/// Parameters of one selection pass.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Number of newest versions kept per family.
    pub keep: usize,
    /// Only consider families built for this architecture.
    pub arch: Option<String>,
    pub filters: Filters,
}

/// One cache file inside a family.
#[derive(Debug, Clone)]
pub struct Member {
    pub path: String,
    pub version: PkgVersion,
}

/// Files grouped by identity, each family in enumeration order.
pub type Families = HashMap<Identity, Vec<Member>>;

/// Result of a selection pass.
///
/// Files from skipped families (wrong architecture) and unparsable files
/// appear in neither list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub candidates: Vec<String>,
    pub retained: Vec<String>,
}

/// Group `paths` into families, dropping files the filters reject.
pub fn group<S: AsRef<str>>(paths: &[S], filters: &Filters) -> Families {
    let mut families = Families::new();

    for path in paths {
        let path = path.as_ref();
        let Some(parsed) = PackageFileName::parse(path) else {
            debug!("Skipping malformed package filename: {}", path);
            continue;
        };

        if !filters.allows(&parsed.name) {
            trace!("Filtered out {}", path);
            continue;
        }

        let version = parsed.pkg_version();
        families
            .entry(parsed.identity())
            .or_default()
            .push(Member {
                path: path.to_string(),
                version,
            });
    }

    families
}

/// Split every family into pruning candidates and retained files.
pub fn partition(families: Families, keep: usize, arch: Option<&str>) -> Partition {
    let mut result = Partition::default();

    for (identity, mut family) in families {
        if arch.is_some_and(|arch| arch != identity.arch) {
            continue;
        }

        // Stable, so equal versions keep enumeration order
        family.sort_by(|a, b| a.version.cmp(&b.version));

        let cut = family.len().saturating_sub(keep);
        for (idx, member) in family.into_iter().enumerate() {
            if idx < cut {
                result.candidates.push(member.path);
            } else {
                result.retained.push(member.path);
            }
        }
    }

    result
}

/// Candidates only, in family iteration order.
pub fn select_candidates(families: Families, keep: usize, arch: Option<&str>) -> Vec<String> {
    partition(families, keep, arch).candidates
}

/// Group and partition `paths` in one go.
pub fn select<S: AsRef<str>>(paths: &[S], selection: &Selection) -> Partition {
    let families = group(paths, &selection.filters);
    debug!("Grouped {} files into {} families", paths.len(), families.len());
    partition(families, selection.keep, selection.arch.as_deref())
}

/// Order two cache paths for display: by directory, then package name,
/// version and architecture. Unparsable names sort first, by plain text.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    let dir_a = Path::new(a).parent();
    let dir_b = Path::new(b).parent();

    dir_a
        .cmp(&dir_b)
        .then_with(|| match (PackageFileName::parse(a), PackageFileName::parse(b)) {
            (Some(x), Some(y)) => x
                .name
                .cmp(&y.name)
                .then_with(|| compare_versions(&x.version, &y.version))
                .then_with(|| x.arch.cmp(&y.arch)),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.cmp(b))
}

/// Sort paths with [`compare_paths`].
pub fn sort_paths(paths: &mut [String]) {
    paths.sort_by(|a, b| compare_paths(a, b));
}
