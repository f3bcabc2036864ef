//! Package sources: local folders and remote OData feeds
//!
//! A source answers three questions: "what matches this search term",
//! "what is the best package for this identifier", and "what updates
//! exist for these installed packages". Local folder sources scan
//! `.nupkg` files on disk; remote sources speak the NuGet V2 protocol
//! (see [`crate::source_remote`]).
//!
//! # Examples
//!
//! ```no_run
//! use nupm::source::PackageSource;
//! use nupm::identifier::PackageIdentifier;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = PackageSource::local("Local Feed", "./LocalPackages");
//! let wanted = PackageIdentifier::new("Newtonsoft.Json", "[13.0,14.0)")?;
//! if let Some(package) = source.get_specific_package(&wanted)? {
//!     println!("found {} {}", package.id, package.version);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::PackageSourceConfig;
use crate::identifier::PackageIdentifier;
use crate::installed::InstalledPackage;
use crate::nuspec::Nuspec;
use crate::package::Package;
use crate::range::RangePosition;
use crate::source_remote::RemoteFeedSource;
use crate::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub enum PackageSource {
    Local(LocalFolderSource),
    Remote(RemoteFeedSource),
}

impl PackageSource {
    /// Build a source from one configured entry, choosing local or
    /// remote by the shape of its path.
    pub fn from_config(config: &PackageSourceConfig, config_dir: &Path) -> Self {
        if config.is_local() {
            let raw = Path::new(&config.path);
            let root = if raw.is_absolute() {
                raw.to_path_buf()
            } else {
                config_dir.join(raw)
            };
            PackageSource::Local(LocalFolderSource::new(&config.name, root))
        } else {
            PackageSource::Remote(RemoteFeedSource::new(
                &config.name,
                &config.path,
                config.password.clone(),
            ))
        }
    }

    pub fn local(name: &str, root: impl Into<PathBuf>) -> Self {
        PackageSource::Local(LocalFolderSource::new(name, root))
    }

    pub fn name(&self) -> &str {
        match self {
            PackageSource::Local(source) => &source.name,
            PackageSource::Remote(source) => source.name(),
        }
    }

    /// Search the source. Without `include_all_versions` only the
    /// highest version of each package id is returned.
    pub fn search(
        &self,
        term: &str,
        include_all_versions: bool,
        include_prerelease: bool,
    ) -> Result<Vec<Package>> {
        match self {
            PackageSource::Local(source) => {
                source.search(term, include_all_versions, include_prerelease)
            }
            PackageSource::Remote(source) => {
                source.search(term, include_all_versions, include_prerelease)
            }
        }
    }

    /// Find the best package for the identifier's constraint. Among the
    /// satisfying versions the lowest wins, matching NuGet's
    /// lowest-applicable-version dependency policy. When nothing is in
    /// range, the lowest version above the range is returned instead so
    /// callers can still offer the closest available release.
    pub fn get_specific_package(&self, wanted: &PackageIdentifier) -> Result<Option<Package>> {
        match self {
            PackageSource::Local(source) => source.get_specific_package(wanted),
            PackageSource::Remote(source) => source.get_specific_package(wanted),
        }
    }

    /// List newer versions available for the given installed packages.
    pub fn get_updates(
        &self,
        installed: &[InstalledPackage],
        include_prerelease: bool,
        include_all_versions: bool,
    ) -> Result<Vec<Package>> {
        match self {
            PackageSource::Local(source) => {
                source.get_updates(installed, include_prerelease, include_all_versions)
            }
            PackageSource::Remote(source) => {
                source.get_updates(installed, include_prerelease, include_all_versions)
            }
        }
    }
}

/// A directory of `.nupkg` files, scanned recursively.
pub struct LocalFolderSource {
    pub name: String,
    root: PathBuf,
}

impl LocalFolderSource {
    pub fn new(name: &str, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every parseable `.nupkg` under the root. Archives that
    /// fail to parse are logged and skipped rather than failing the
    /// whole scan.
    fn scan(&self) -> Vec<Package> {
        let mut packages = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file()
                || path
                    .extension()
                    .map(|ext| !ext.eq_ignore_ascii_case("nupkg"))
                    .unwrap_or(true)
            {
                continue;
            }
            match Nuspec::from_nupkg(path) {
                Ok(nuspec) => {
                    let url = path.to_string_lossy().into_owned();
                    packages.push(nuspec.into_package(&self.name, Some(url)));
                }
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
        packages
    }

    pub fn search(
        &self,
        term: &str,
        include_all_versions: bool,
        include_prerelease: bool,
    ) -> Result<Vec<Package>> {
        let term = term.to_lowercase();
        let mut matches: Vec<Package> = self
            .scan()
            .into_iter()
            .filter(|p| term.is_empty() || p.id.to_lowercase().contains(&term))
            .filter(|p| include_prerelease || !p.version.is_prerelease())
            .collect();
        matches.sort_by(|a, b| {
            a.id.to_lowercase()
                .cmp(&b.id.to_lowercase())
                .then_with(|| a.version.cmp(&b.version))
        });
        if !include_all_versions {
            matches = collapse_to_highest(matches);
        }
        Ok(matches)
    }

    pub fn get_specific_package(&self, wanted: &PackageIdentifier) -> Result<Option<Package>> {
        let mut candidates: Vec<Package> = self
            .scan()
            .into_iter()
            .filter(|p| p.matches_id(&wanted.id))
            .collect();
        candidates.sort_by(|a, b| a.version.cmp(&b.version));
        // Ascending order puts in-range versions before above-range ones,
        // so the first candidate not below the range is the lowest match
        // or, failing that, the lowest version above the range.
        Ok(candidates
            .into_iter()
            .find(|p| wanted.version_spec().position_of(&p.version) != RangePosition::Below))
    }

    pub fn get_updates(
        &self,
        installed: &[InstalledPackage],
        include_prerelease: bool,
        include_all_versions: bool,
    ) -> Result<Vec<Package>> {
        let available = self.scan();
        let mut updates: Vec<Package> = Vec::new();
        for current in installed {
            let mut newer: Vec<Package> = available
                .iter()
                .filter(|p| p.matches_id(&current.id))
                .filter(|p| p.version > current.version)
                .filter(|p| include_prerelease || !p.version.is_prerelease())
                .cloned()
                .collect();
            newer.sort_by(|a, b| a.version.cmp(&b.version));
            if !include_all_versions {
                newer = collapse_to_highest(newer);
            }
            updates.extend(newer);
        }
        Ok(updates)
    }
}

/// Keep only the highest version per package id. Input must be sorted
/// by id then ascending version.
pub(crate) fn collapse_to_highest(sorted: Vec<Package>) -> Vec<Package> {
    let mut collapsed: Vec<Package> = Vec::new();
    for package in sorted {
        match collapsed.last_mut() {
            Some(last) if last.matches_id(&package.id) => *last = package,
            _ => collapsed.push(package),
        }
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::NugetVersion;

    fn pkg(id: &str, version: &str) -> Package {
        Package::new(id, NugetVersion::parse(version).unwrap())
    }

    #[test]
    fn test_collapse_keeps_highest_per_id() {
        let sorted = vec![
            pkg("A", "1.0"),
            pkg("A", "2.0"),
            pkg("B", "0.9"),
            pkg("b", "1.1"),
        ];
        let collapsed = collapse_to_highest(sorted);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].version, NugetVersion::parse("2.0").unwrap());
        assert_eq!(collapsed[1].version, NugetVersion::parse("1.1").unwrap());
    }

    #[test]
    fn test_from_config_picks_local_for_paths() {
        let config = PackageSourceConfig::new("feed", "./packages");
        let source = PackageSource::from_config(&config, Path::new("/project"));
        assert!(matches!(source, PackageSource::Local(_)));

        let config = PackageSourceConfig::new("feed", "https://example.com/nuget");
        let source = PackageSource::from_config(&config, Path::new("/project"));
        assert!(matches!(source, PackageSource::Remote(_)));
    }

    #[test]
    fn test_empty_folder_searches_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = LocalFolderSource::new("empty", dir.path());
        assert!(source.search("", true, true).unwrap().is_empty());
    }
}
