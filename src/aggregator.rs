//! Aggregation across multiple package sources
//!
//! Queries fan out over every enabled source. A source that errors is
//! logged and skipped so one dead feed never blocks another. When an
//! identifier pins an exact version, the first source carrying exactly
//! that version wins; otherwise the lowest satisfying candidate across
//! all sources is chosen, falling back to the lowest version above the
//! range when no source has one inside it.

use crate::identifier::PackageIdentifier;
use crate::installed::InstalledPackage;
use crate::package::Package;
use crate::source::PackageSource;
use crate::Result;
use log::warn;

pub struct SourceAggregator {
    sources: Vec<PackageSource>,
}

impl SourceAggregator {
    pub fn new(sources: Vec<PackageSource>) -> Self {
        if sources.is_empty() {
            warn!("no enabled package sources configured; queries will return nothing");
        }
        Self { sources }
    }

    pub fn sources(&self) -> &[PackageSource] {
        &self.sources
    }

    pub fn search(
        &self,
        term: &str,
        include_all_versions: bool,
        include_prerelease: bool,
    ) -> Vec<Package> {
        let mut results = Vec::new();
        for source in &self.sources {
            match source.search(term, include_all_versions, include_prerelease) {
                Ok(packages) => results.extend(packages),
                Err(e) => warn!("search on '{}' failed: {}", source.name(), e),
            }
        }
        dedup(results)
    }

    /// Find the best package for the identifier across all sources.
    ///
    /// In-range candidates are preferred over above-range fallbacks from
    /// the individual sources; within each tier the lowest version wins.
    pub fn get_specific_package(&self, wanted: &PackageIdentifier) -> Result<Option<Package>> {
        let spec = wanted.version_spec();
        let exact = spec.exact_version();
        let mut best: Option<Package> = None;
        for source in &self.sources {
            let candidate = match source.get_specific_package(wanted) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(e) => {
                    warn!("lookup on '{}' failed: {}", source.name(), e);
                    continue;
                }
            };
            // An exact pin ends the scan at the first source that has it.
            if let Some(exact) = exact {
                if candidate.version == *exact {
                    return Ok(Some(candidate));
                }
            }
            best = match best {
                Some(current) => {
                    let current_in_range = spec.is_satisfied_by(&current.version);
                    let candidate_in_range = spec.is_satisfied_by(&candidate.version);
                    let candidate_wins = candidate_in_range > current_in_range
                        || (candidate_in_range == current_in_range
                            && candidate.version < current.version);
                    if candidate_wins {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
                None => Some(candidate),
            };
        }
        Ok(best)
    }

    /// The newest version of one package id across all sources.
    pub fn get_latest(&self, id: &str, include_prerelease: bool) -> Option<Package> {
        self.search(id, false, include_prerelease)
            .into_iter()
            .filter(|p| p.matches_id(id))
            .max_by(|a, b| a.version.cmp(&b.version))
    }

    pub fn get_updates(
        &self,
        installed: &[InstalledPackage],
        include_prerelease: bool,
        include_all_versions: bool,
    ) -> Vec<Package> {
        let mut results = Vec::new();
        for source in &self.sources {
            match source.get_updates(installed, include_prerelease, include_all_versions) {
                Ok(packages) => results.extend(packages),
                Err(e) => warn!("update check on '{}' failed: {}", source.name(), e),
            }
        }
        dedup(results)
    }
}

/// Drop duplicate (id, version) pairs, keeping the first source's copy.
fn dedup(packages: Vec<Package>) -> Vec<Package> {
    let mut unique: Vec<Package> = Vec::new();
    for package in packages {
        if !unique
            .iter()
            .any(|p| p.matches_id(&package.id) && p.version == package.version)
        {
            unique.push(package);
        }
    }
    unique
}
