//! Installed-package registry backed by `packages.config`
//!
//! `packages.config` holds one `<package id=".." version=".."/>` entry per
//! installed package. Only one version of a given id may be registered at
//! a time; installing a new version replaces the old registration. The
//! set is loaded at startup, mutated by install/uninstall/update, and
//! written back after every mutation. Insertion order is preserved on
//! round-trip even though it carries no meaning.
//!
//! # Examples
//!
//! ```no_run
//! use nupm::installed::InstalledPackagesSet;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut installed = InstalledPackagesSet::load_from("packages.config")?;
//! println!("{} packages installed", installed.len());
//! installed.remove("Newtonsoft.Json");
//! installed.save_to("packages.config")?;
//! # Ok(())
//! # }
//! ```

use crate::package::Package;
use crate::version::NugetVersion;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The installed-set filename.
pub const PACKAGES_CONFIG: &str = "packages.config";

/// One registered package.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub id: String,
    pub version: NugetVersion,
    /// The version string exactly as it appears in packages.config.
    pub version_literal: String,
    /// True when the user asked for this package directly rather than it
    /// arriving as a dependency.
    pub manually_installed: bool,
}

impl InstalledPackage {
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }

    /// Directory name the content unpacks into. Uses the normalized
    /// version so it always matches what the installer created, even
    /// when the packages.config literal is shorthand like `1.2`.
    pub fn content_dir_name(&self) -> String {
        format!("{}.{}", self.id, self.version)
    }
}

/// The process-scoped set of installed packages, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InstalledPackagesSet {
    packages: Vec<InstalledPackage>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "packages")]
struct PackagesConfigXml {
    #[serde(default, rename = "package")]
    packages: Vec<PackageEntryXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PackageEntryXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@version")]
    version: String,
    #[serde(default, rename = "@manuallyInstalled")]
    manually_installed: bool,
}

impl InstalledPackagesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a packages.config file. A missing file is an empty set,
    /// not an error; the config appears on first install.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let raw: PackagesConfigXml = quick_xml::de::from_str(&content)?;

        let mut set = Self::new();
        for entry in raw.packages {
            let version = NugetVersion::parse(&entry.version)?;
            set.packages.push(InstalledPackage {
                id: entry.id,
                version,
                version_literal: entry.version,
                manually_installed: entry.manually_installed,
            });
        }
        Ok(set)
    }

    /// Write the set back out, preserving entry order.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let doc = PackagesConfigXml {
            packages: self
                .packages
                .iter()
                .map(|p| PackageEntryXml {
                    id: p.id.clone(),
                    version: p.version_literal.clone(),
                    manually_installed: p.manually_installed,
                })
                .collect(),
        };

        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        doc.serialize(serializer)?;

        let content = format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{}\n", body);
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Look up the registered package for an id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&InstalledPackage> {
        self.packages.iter().find(|p| p.matches_id(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Register a package, replacing any existing registration for the
    /// same id. Replacement keeps the original entry position.
    pub fn register(&mut self, package: &Package, manually_installed: bool) {
        let entry = InstalledPackage {
            id: package.id.clone(),
            version: package.version.clone(),
            version_literal: package.version.to_string(),
            manually_installed,
        };
        match self.packages.iter_mut().find(|p| p.matches_id(&package.id)) {
            Some(existing) => *existing = entry,
            None => self.packages.push(entry),
        }
    }

    /// Remove the registration for an id.
    pub fn remove(&mut self, id: &str) -> Option<InstalledPackage> {
        let index = self.packages.iter().position(|p| p.matches_id(id))?;
        Some(self.packages.remove(index))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.iter()
    }

    /// A copy of the current entries, for batch operations that must not
    /// iterate a set they are about to mutate.
    pub fn snapshot(&self) -> Vec<InstalledPackage> {
        self.packages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pkg(id: &str, version: &str) -> Package {
        Package::new(id, NugetVersion::parse(version).unwrap())
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let set = InstalledPackagesSet::load_from(dir.path().join(PACKAGES_CONFIG)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_register_is_unique_per_id() {
        let mut set = InstalledPackagesSet::new();
        set.register(&pkg("Pkg.A", "1.0"), true);
        set.register(&pkg("pkg.a", "2.0"), false);
        assert_eq!(set.len(), 1);
        let entry = set.get("PKG.A").unwrap();
        assert_eq!(entry.version, NugetVersion::parse("2.0").unwrap());
        assert!(!entry.manually_installed);
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PACKAGES_CONFIG);

        let mut set = InstalledPackagesSet::new();
        set.register(&pkg("Zebra", "3.0"), true);
        set.register(&pkg("Alpha", "1.0.0-beta"), false);
        set.save_to(&path).unwrap();

        let loaded = InstalledPackagesSet::load_from(&path).unwrap();
        let ids: Vec<&str> = loaded.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Zebra", "Alpha"]);
        assert!(loaded.get("Zebra").unwrap().manually_installed);
        assert!(loaded.get("Alpha").unwrap().version.is_prerelease());
    }

    #[test]
    fn test_parse_external_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PACKAGES_CONFIG);
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="12.0.1" manuallyInstalled="true"/>
  <package id="Dep.Only" version="1.0"/>
</packages>"#,
        )
        .unwrap();

        let set = InstalledPackagesSet::load_from(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("newtonsoft.json").unwrap().manually_installed);
        assert!(!set.get("Dep.Only").unwrap().manually_installed);
        assert_eq!(set.get("Dep.Only").unwrap().version_literal, "1.0");
    }

    #[test]
    fn test_remove() {
        let mut set = InstalledPackagesSet::new();
        set.register(&pkg("Pkg.A", "1.0"), false);
        assert!(set.remove("PKG.A").is_some());
        assert!(set.remove("Pkg.A").is_none());
        assert!(set.is_empty());
    }
}
