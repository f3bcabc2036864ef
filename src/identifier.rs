//! Package identifier value type
//!
//! A `PackageIdentifier` pairs a package id with the literal version
//! constraint it was declared with. Ids match case-insensitively but keep
//! their original casing for display. Two identifiers are equal only when
//! their literal constraint strings match: a pinned `1.0` and the range
//! `[1.0,1.0]` name the same release but remain distinct identifier
//! values, because they round-trip differently through config files.

use crate::range::{RangePosition, VersionSpec};
use crate::version::{compare_versions, NugetVersion};
use crate::Result;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct PackageIdentifier {
    /// Package id, original casing preserved.
    pub id: String,
    /// The constraint exactly as it appeared in the config file or feed.
    version: String,
    spec: VersionSpec,
}

impl PackageIdentifier {
    /// Build an identifier from an id and a literal version or range string.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        let spec = VersionSpec::parse(&version)?;
        Ok(Self {
            id: id.into(),
            version,
            spec,
        })
    }

    /// Build an identifier pinned to a concrete version.
    pub fn pinned(id: impl Into<String>, version: NugetVersion) -> Self {
        Self {
            id: id.into(),
            version: version.to_string(),
            spec: VersionSpec::Pinned(version),
        }
    }

    pub fn version_literal(&self) -> &str {
        &self.version
    }

    pub fn version_spec(&self) -> &VersionSpec {
        &self.spec
    }

    /// Case-insensitive id match (NuGet convention).
    pub fn matches_id(&self, other_id: &str) -> bool {
        self.id.eq_ignore_ascii_case(other_id)
    }

    /// Ordering by id (case-insensitive), then by version.
    pub fn compare_to(&self, other: &PackageIdentifier) -> Ordering {
        let ids = self
            .id
            .to_ascii_lowercase()
            .cmp(&other.id.to_ascii_lowercase());
        ids.then_with(|| compare_versions(&self.version, &other.version))
    }

    /// Identifier-value equality: same id (ignoring case) and the same
    /// literal constraint string.
    pub fn is_same_as(&self, other: &PackageIdentifier) -> bool {
        self.matches_id(&other.id) && self.version == other.version
    }

    /// Whether this identifier names a strictly newer version of the same
    /// package than `other`.
    pub fn is_upgrade_for(&self, other: &PackageIdentifier) -> bool {
        self.matches_id(&other.id)
            && compare_versions(&self.version, &other.version) == Ordering::Greater
    }

    /// Whether an installed concrete version makes this request redundant.
    ///
    /// Policy: equal-or-newer satisfies. A pinned request and a range's
    /// lower bound both act as inclusive floors, so anything at or above
    /// the floor counts even when it exceeds a declared upper bound; the
    /// resolver never downgrades an already-installed package to fit a
    /// ceiling.
    pub fn satisfied_by_installed(&self, installed: &NugetVersion) -> bool {
        self.spec.position_of(installed) != RangePosition::Below
    }

    /// Strict range membership for a candidate version.
    pub fn in_range(&self, candidate: &NugetVersion) -> bool {
        self.spec.is_satisfied_by(candidate)
    }
}

impl PartialEq for PackageIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_as(other)
    }
}

impl Eq for PackageIdentifier {}

impl Hash for PackageIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_ascii_lowercase().hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: &str, version: &str) -> PackageIdentifier {
        PackageIdentifier::new(id, version).unwrap()
    }

    #[test]
    fn test_equality_is_literal_not_semantic() {
        let pinned = ident("Newtonsoft.Json", "1.0");
        let range = ident("Newtonsoft.Json", "[1.0,1.0]");
        // Same release, different identifier values.
        assert!(!pinned.is_same_as(&range));
        assert_ne!(pinned, range);
    }

    #[test]
    fn test_id_match_ignores_case() {
        let a = ident("Newtonsoft.Json", "12.0.1");
        let b = ident("newtonsoft.json", "12.0.1");
        assert!(a.is_same_as(&b));
        assert_eq!(a, b);
        assert!(a.matches_id("NEWTONSOFT.JSON"));
    }

    #[test]
    fn test_display_preserves_casing() {
        let a = ident("Newtonsoft.Json", "12.0.1");
        assert_eq!(a.to_string(), "Newtonsoft.Json@12.0.1");
    }

    #[test]
    fn test_is_upgrade_for() {
        let old = ident("Pkg", "1.0.0");
        let new = ident("pkg", "2.0.0");
        assert!(new.is_upgrade_for(&old));
        assert!(!old.is_upgrade_for(&new));
        assert!(!new.is_upgrade_for(&ident("Other", "1.0.0")));
    }

    #[test]
    fn test_compare_to_orders_id_then_version() {
        let a = ident("Alpha", "2.0");
        let b = ident("beta", "1.0");
        assert_eq!(a.compare_to(&b), Ordering::Less);

        let c = ident("Alpha", "1.0");
        assert_eq!(c.compare_to(&a), Ordering::Less);
        assert_eq!(a.compare_to(&a), Ordering::Equal);
    }

    #[test]
    fn test_satisfied_by_installed_uses_inclusive_floor() {
        let v = |s| NugetVersion::parse(s).unwrap();
        let pinned = ident("Pkg", "1.5");
        assert!(pinned.satisfied_by_installed(&v("1.5")));
        assert!(pinned.satisfied_by_installed(&v("2.0")));
        assert!(!pinned.satisfied_by_installed(&v("1.4")));

        // Installed above a range ceiling still satisfies: no downgrades.
        let ranged = ident("Pkg", "[1.0,2.0)");
        assert!(ranged.satisfied_by_installed(&v("1.5")));
        assert!(ranged.satisfied_by_installed(&v("3.0")));
        assert!(!ranged.satisfied_by_installed(&v("0.9")));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ident("Pkg", "1.0"));
        assert!(set.contains(&ident("PKG", "1.0")));
        assert!(!set.contains(&ident("Pkg", "[1.0]")));
    }
}
