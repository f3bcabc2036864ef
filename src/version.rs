//! NuGet version parsing and ordering
//!
//! NuGet versions carry up to four numeric components plus an optional
//! prerelease tag (`major.minor.patch[.build][-tag]`). Missing trailing
//! components default to zero, so `1.2` and `1.2.0` describe the same
//! release. A release (no tag) orders after every prerelease of the same
//! numeric core, and prerelease tags compare ordinally.
//!
//! # Examples
//!
//! ```
//! use nupm::version::{compare_versions, NugetVersion};
//! use std::cmp::Ordering;
//!
//! let a = NugetVersion::parse("1.2.0-beta").unwrap();
//! let b = NugetVersion::parse("1.2").unwrap();
//! assert!(a < b); // release beats prerelease
//!
//! assert_eq!(compare_versions("1.2.0", "1.2"), Ordering::Equal);
//! ```

use crate::{Error, Result};
use log::warn;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed NuGet package version.
///
/// `prerelease` is empty for release versions; an empty tag sorts greater
/// than any non-empty tag so that releases are "newest".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NugetVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
    pub prerelease: String,
}

impl NugetVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: 0,
            prerelease: String::new(),
        }
    }

    /// Parse a version string of the form `N[.N[.N[.N]]][-tag]`.
    ///
    /// The tag is everything after the first `-`, so tags containing
    /// further dashes (`-beta-2`) are preserved whole.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::malformed(input, "empty version string"));
        }

        let (core, prerelease) = match trimmed.split_once('-') {
            Some((core, tag)) => (core, tag.to_string()),
            None => (trimmed, String::new()),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 4 {
            return Err(Error::malformed(input, "more than four numeric components"));
        }

        let mut numbers = [0u32; 4];
        for (i, part) in parts.iter().enumerate() {
            numbers[i] = part.parse::<u32>().map_err(|_| {
                Error::malformed(input, format!("non-numeric component '{}'", part))
            })?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            build: numbers[3],
            prerelease,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

impl FromStr for NugetVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Ord for NugetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then(self.build.cmp(&other.build))
            .then_with(|| compare_prerelease(&self.prerelease, &other.prerelease))
    }
}

impl PartialOrd for NugetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NugetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.build != 0 {
            write!(f, ".{}", self.build)?;
        }
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease)?;
        }
        Ok(())
    }
}

/// The empty tag acts as the maximal sentinel: no-prerelease > any tag.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

/// Compare two version strings.
///
/// This is the top-level string boundary: a string that fails to parse is
/// logged and treated as equal rather than propagated, so a single bad
/// version in a feed never aborts a comparison-driven scan. Typed code
/// paths should use [`NugetVersion::parse`] and handle the error.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = match NugetVersion::parse(a) {
        Ok(v) => v,
        Err(e) => {
            warn!("treating unparseable version as equal: {}", e);
            return Ordering::Equal;
        }
    };
    let right = match NugetVersion::parse(b) {
        Ok(v) => v,
        Err(e) => {
            warn!("treating unparseable version as equal: {}", e);
            return Ordering::Equal;
        }
    };
    left.cmp(&right)
}
