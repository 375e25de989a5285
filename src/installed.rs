//! Query the names of currently installed packages.

use std::collections::HashSet;
use std::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Every installed package name, as reported by `pacman -Qq`.
pub fn installed_packages() -> Result<HashSet<String>> {
    debug!("Querying installed pacman packages");

    let output = Command::new("pacman")
        .args(["-Qq"])
        .output()
        .map_err(|e| {
            Error::InstalledQuery(format!("failed to run pacman: {e}. Is pacman installed?"))
        })?;

    if !output.status.success() {
        return Err(Error::InstalledQuery(format!(
            "pacman -Qq failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let names = parse_names(&String::from_utf8_lossy(&output.stdout));
    debug!("Found {} installed packages", names.len());
    Ok(names)
}

/// Split whitespace separated package names into a set.
pub fn parse_names(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        let names = parse_names("bash\ncoreutils\n\n  linux-firmware\n");
        assert_eq!(names.len(), 3);
        assert!(names.contains("linux-firmware"));
    }
}
