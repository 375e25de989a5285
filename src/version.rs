//! # Package Version Ordering
//!
//! Versions in a package cache look like `[epoch:]version[-release]` and are
//! ordered segment by segment rather than lexically, so `1.10` is newer than
//! `1.9` and `1:0.5` is newer than `2.0`. This module provides that ordering
//! as a pure comparator plus a small [`PkgVersion`] wrapper for use as a sort
//! key.

use std::cmp::Ordering;
use std::fmt;

/// A package version string ordered with [`compare_versions`].
#[derive(Debug, Clone)]
pub struct PkgVersion(String);

impl PkgVersion {
    pub fn new(evr: impl Into<String>) -> Self {
        PkgVersion(evr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The epoch component, `"0"` when absent.
    pub fn epoch(&self) -> &str {
        split_evr(&self.0).0
    }

    /// The upstream version component.
    pub fn version(&self) -> &str {
        split_evr(&self.0).1
    }

    /// The release component, if the string carries one.
    pub fn release(&self) -> Option<&str> {
        split_evr(&self.0).2
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq for PkgVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PkgVersion {}

impl Ord for PkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0)
    }
}

impl PartialOrd for PkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two full `[epoch:]version[-release]` strings.
///
/// Epochs are compared first, then versions. Releases only take part when
/// both sides have one, so `1.0` and `1.0-3` compare equal.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (epoch_a, version_a, release_a) = split_evr(a);
    let (epoch_b, version_b, release_b) = split_evr(b);

    compare_segments(epoch_a, epoch_b)
        .then_with(|| compare_segments(version_a, version_b))
        .then_with(|| match (release_a, release_b) {
            (Some(ra), Some(rb)) => compare_segments(ra, rb),
            _ => Ordering::Equal,
        })
}

/// Split `[epoch:]version[-release]` into its three parts.
///
/// The epoch is only recognised when it is a run of digits directly followed
/// by `:`; an empty epoch (`:1.0`) counts as `"0"`. The release is whatever
/// follows the last `-`.
fn split_evr(evr: &str) -> (&str, &str, Option<&str>) {
    let digits = evr.bytes().take_while(u8::is_ascii_digit).count();

    let (epoch, rest) = if evr.as_bytes().get(digits) == Some(&b':') {
        let epoch = &evr[..digits];
        (if epoch.is_empty() { "0" } else { epoch }, &evr[digits + 1..])
    } else {
        ("0", evr)
    };

    match rest.rfind('-') {
        Some(pos) => (epoch, &rest[..pos], Some(&rest[pos + 1..])),
        None => (epoch, rest, None),
    }
}

/// Compare a single version component segment by segment.
///
/// Segments are maximal runs of digits or of ASCII letters; anything else is
/// a separator. Digit runs compare numerically and always beat letter runs.
/// When one side runs out first, a trailing letter run is older than nothing
/// (`1.0rc1 < 1.0`) and anything else is newer (`1.0.1 > 1.0`).
pub fn compare_segments(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let one = a.as_bytes();
    let two = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < one.len() && j < two.len() {
        let (sep_i, sep_j) = (i, j);
        while i < one.len() && !one[i].is_ascii_alphanumeric() {
            i += 1;
        }
        while j < two.len() && !two[j].is_ascii_alphanumeric() {
            j += 1;
        }

        if i >= one.len() || j >= two.len() {
            break;
        }

        // More separators means a newer version ("1..0" > "1.0")
        let (sep_len_i, sep_len_j) = (i - sep_i, j - sep_j);
        if sep_len_i != sep_len_j {
            return sep_len_i.cmp(&sep_len_j);
        }

        let numeric = one[i].is_ascii_digit();
        let in_segment = |c: u8| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        };

        let end_i = i + one[i..].iter().take_while(|&&c| in_segment(c)).count();
        let end_j = j + two[j..].iter().take_while(|&&c| in_segment(c)).count();

        // Segment types differ: numbers win over letters
        if end_j == j {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg_one = &one[i..end_i];
        let mut seg_two = &two[j..end_j];

        if numeric {
            seg_one = trim_leading_zeros(seg_one);
            seg_two = trim_leading_zeros(seg_two);

            match seg_one.len().cmp(&seg_two.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        match seg_one.cmp(seg_two) {
            Ordering::Equal => {}
            ord => return ord,
        }

        i = end_i;
        j = end_j;
    }

    let one_done = i >= one.len();
    let two_done = j >= two.len();
    if one_done && two_done {
        return Ordering::Equal;
    }

    let one_alpha = !one_done && one[i].is_ascii_alphabetic();
    let two_alpha = !two_done && two[j].is_ascii_alphabetic();

    if (one_done && !two_alpha) || one_alpha {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&c| c == b'0').count();
    &digits[zeros..]
}
