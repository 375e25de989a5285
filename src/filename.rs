//! # Package Archive Filenames
//!
//! Cache entries are named `<name>-<[epoch:]version>-<release>-<arch>.<ext>`,
//! for example `my-cool-lib-1:1.2.3-4-x86_64.pkg.tar.zst`. Package names may
//! themselves contain hyphens, so the name is recovered by dropping the last
//! three `-` separated segments rather than by splitting from the front.

use std::path::Path;

use crate::version::PkgVersion;

/// The pieces of a package archive filename needed to group and order it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFileName {
    /// Package name, hyphens included.
    pub name: String,
    /// `[epoch:]version-release`
    pub version: String,
    /// Architecture, e.g. `x86_64` or `any`.
    pub arch: String,
}

/// The (name, arch) pair every file in a family shares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub name: String,
    pub arch: String,
}

impl PackageFileName {
    /// Parse the base name of `path`.
    ///
    /// Returns `None` when the name does not have the expected shape: fewer
    /// than four `-` separated segments, no `.` after the architecture, or an
    /// empty architecture.
    pub fn parse(path: &str) -> Option<Self> {
        let base = Path::new(path).file_name()?.to_str()?;
        let parts: Vec<&str> = base.split('-').collect();

        if parts.len() < 4 {
            return None;
        }

        let count = parts.len();
        let arch_ext = parts[count - 1];
        let dot = arch_ext.find('.')?;
        let arch = &arch_ext[..dot];
        if arch.is_empty() {
            return None;
        }

        let name = parts[..count - 3].join("-");
        if name.is_empty() {
            return None;
        }

        Some(PackageFileName {
            name,
            version: format!("{}-{}", parts[count - 3], parts[count - 2]),
            arch: arch.to_string(),
        })
    }

    pub fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            arch: self.arch.clone(),
        }
    }

    pub fn pkg_version(&self) -> PkgVersion {
        PkgVersion::new(self.version.as_str())
    }
}
