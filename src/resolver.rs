//! Dependency resolution and the install/update/restore engine
//!
//! Resolution is planned against a snapshot of the installed set
//! before anything touches disk: the full dependency closure is
//! walked first, producing an [`InstallPlan`] whose actions are
//! ordered dependencies-first, and only then applied. Re-running an
//! install for something already present is a logged no-op.
//!
//! # Examples
//!
//! ```no_run
//! use nupm::resolver::ResolutionContext;
//! use nupm::identifier::PackageIdentifier;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut context = ResolutionContext::open(".")?;
//! let wanted = PackageIdentifier::new("Newtonsoft.Json", "13.0.1")?;
//! let installed = context.install(&wanted, None)?;
//! println!("installed {} packages", installed.len());
//! # Ok(())
//! # }
//! ```

use crate::aggregator::SourceAggregator;
use crate::config::{NugetConfig, NUGET_CONFIG};
use crate::error::{Error, Result};
use crate::identifier::PackageIdentifier;
use crate::installed::{InstalledPackagesSet, PACKAGES_CONFIG};
use crate::installer::{ConflictPolicy, PackageInstaller, ProgressCallback};
use crate::package::Package;
use crate::source::PackageSource;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How an available package relates to what is already installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    InstalledSameVersion,
    InstalledOlder,
    InstalledNewer,
}

/// Compare a candidate package against the installed set.
pub fn install_state(installed: &InstalledPackagesSet, package: &Package) -> InstallState {
    match installed.get(&package.id) {
        None => InstallState::NotInstalled,
        Some(current) => match current.version.cmp(&package.version) {
            std::cmp::Ordering::Equal => InstallState::InstalledSameVersion,
            std::cmp::Ordering::Less => InstallState::InstalledOlder,
            std::cmp::Ordering::Greater => InstallState::InstalledNewer,
        },
    }
}

/// Cooperative cancellation shared between the engine and a UI thread.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One resolved action: fetch and unpack this package, then record it.
#[derive(Clone)]
pub struct PlannedInstall {
    pub package: Package,
    /// True for the package the user asked for, false for dependencies.
    pub manually_installed: bool,
}

/// The full closure for one install request, dependencies first.
#[derive(Default)]
pub struct InstallPlan {
    pub actions: Vec<PlannedInstall>,
    /// Identifiers already satisfied by the installed set.
    pub already_satisfied: Vec<PackageIdentifier>,
}

impl InstallPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Outcome of a best-effort restore pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub already_present: usize,
    pub failed: usize,
}

pub struct ResolutionContext {
    pub config: NugetConfig,
    pub installed: InstalledPackagesSet,
    pub aggregator: SourceAggregator,
    pub installer: PackageInstaller,
    project_dir: PathBuf,
    cancel: CancelToken,
}

impl ResolutionContext {
    /// Open a project directory: load `NuGet.config` and
    /// `packages.config` and wire up sources and installer.
    pub fn open<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let project_dir = project_dir.as_ref().to_path_buf();
        let config = NugetConfig::load_from(project_dir.join(NUGET_CONFIG))?;
        let installed = InstalledPackagesSet::load_from(project_dir.join(PACKAGES_CONFIG))?;
        let sources = config
            .enabled_sources()
            .map(|s| PackageSource::from_config(s, &project_dir))
            .collect();
        let repository = config.resolved_repository_path(&project_dir);
        let installer = PackageInstaller::new(repository, PackageInstaller::default_cache_dir());
        Ok(Self {
            config,
            installed,
            aggregator: SourceAggregator::new(sources),
            installer,
            project_dir,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.installer = self.installer.with_conflict_policy(policy);
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.installer = self.installer.with_cache_dir(cache_dir);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Persist `packages.config` after mutating operations.
    pub fn save(&self) -> Result<()> {
        self.installed
            .save_to(self.project_dir.join(PACKAGES_CONFIG))
    }

    /// Resolve the dependency closure for one identifier without
    /// touching disk. The root must exist in some source; a missing
    /// transitive dependency is logged and left out of the plan.
    pub fn plan_install(&self, wanted: &PackageIdentifier) -> Result<InstallPlan> {
        let mut plan = InstallPlan::default();
        let mut visited = HashSet::new();
        self.resolve_into(wanted, true, &mut plan, &mut visited)?;
        Ok(plan)
    }

    fn resolve_into(
        &self,
        wanted: &PackageIdentifier,
        is_root: bool,
        plan: &mut InstallPlan,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        if !visited.insert(wanted.id.to_lowercase()) {
            return Ok(());
        }
        if let Some(current) = self.installed.get(&wanted.id) {
            if wanted.satisfied_by_installed(&current.version) {
                info!(
                    "{} {} already satisfies {}",
                    current.id, current.version, wanted
                );
                plan.already_satisfied.push(wanted.clone());
                return Ok(());
            }
        }
        let package = match self.aggregator.get_specific_package(wanted)? {
            Some(package) => package,
            None if is_root => {
                return Err(Error::PackageNotFound(wanted.to_string()));
            }
            None => {
                error!("dependency {} not found in any source", wanted);
                return Ok(());
            }
        };
        if let Some(group) = package.selected_group() {
            for dependency in &group.dependencies {
                self.resolve_into(dependency, false, plan, visited)?;
            }
        }
        // Dependencies land in the plan before their dependents; a
        // dependent that also appears as a dependency keeps its first
        // (dependency) slot.
        if !plan.actions.iter().any(|a| a.package.matches_id(&package.id)) {
            plan.actions.push(PlannedInstall {
                package,
                manually_installed: is_root,
            });
        }
        Ok(())
    }

    /// Apply a plan: fetch, unpack and record each action in order.
    /// Returns the packages actually placed on disk.
    pub fn apply(
        &mut self,
        plan: &InstallPlan,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Package>> {
        let mut applied = Vec::new();
        for action in &plan.actions {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let package = &action.package;
            let state = install_state(&self.installed, package);
            if state == InstallState::InstalledSameVersion
                && self.installer.is_content_present(package)
            {
                info!("{} already installed, skipping", package.identifier());
                continue;
            }
            // An upgrade replaces the old content directory, which is
            // named after the old version.
            if let Some(previous) = self.installed.get(&package.id).cloned() {
                if previous.version != package.version {
                    self.installer.uninstall(&previous)?;
                }
            }
            self.installer.install(package, progress)?;
            self.installed.register(package, action.manually_installed);
            applied.push(package.clone());
        }
        self.save()?;
        Ok(applied)
    }

    /// Resolve and install one package with its dependencies.
    pub fn install(
        &mut self,
        wanted: &PackageIdentifier,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Package>> {
        let plan = self.plan_install(wanted)?;
        self.apply(&plan, progress)
    }

    /// Remove a package's content and bookkeeping entry.
    pub fn uninstall(&mut self, id: &str) -> Result<()> {
        let installed = self
            .installed
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound(id.to_string()))?;
        self.installer.uninstall(&installed)?;
        self.installed.remove(id);
        self.save()
    }

    /// Upgrade one package (or every installed package when `id` is
    /// `None`) to the newest available version. Packages that are
    /// already current are untouched.
    pub fn update(
        &mut self,
        id: Option<&str>,
        include_prerelease: bool,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Package>> {
        let targets: Vec<_> = self
            .installed
            .snapshot()
            .into_iter()
            .filter(|p| id.map(|id| p.matches_id(id)).unwrap_or(true))
            .collect();
        if let Some(id) = id {
            if targets.is_empty() {
                return Err(Error::PackageNotFound(id.to_string()));
            }
        }
        let updates = self
            .aggregator
            .get_updates(&targets, include_prerelease, false);
        let mut upgraded = Vec::new();
        for update in updates {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if install_state(&self.installed, &update) != InstallState::InstalledOlder {
                continue;
            }
            let wanted = update.identifier();
            match self.install(&wanted, progress) {
                Ok(packages) => upgraded.extend(packages),
                Err(e) => error!("update of {} failed: {}", wanted, e),
            }
        }
        Ok(upgraded)
    }

    /// Reinstate content for everything listed in `packages.config`.
    /// Failures are per-package: one broken entry never aborts the
    /// rest of the restore.
    pub fn restore(&mut self, progress: Option<&ProgressCallback>) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        let mut drifted = false;
        for entry in self.installed.snapshot() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if self
                .installer
                .installed_content_dir(&entry)
                .exists()
            {
                report.already_present += 1;
                continue;
            }
            let wanted = match PackageIdentifier::new(&entry.id, &entry.version_literal) {
                Ok(wanted) => wanted,
                Err(e) => {
                    error!("skipping {}: {}", entry.id, e);
                    report.failed += 1;
                    continue;
                }
            };
            let found = match self.aggregator.get_specific_package(&wanted) {
                Ok(Some(found)) => found,
                Ok(None) => {
                    error!("{} not found in any source", wanted);
                    report.failed += 1;
                    continue;
                }
                Err(e) => {
                    error!("restore of {} failed: {}", wanted, e);
                    report.failed += 1;
                    continue;
                }
            };
            match self.installer.install(&found, progress) {
                Ok(_) => {
                    report.restored += 1;
                    // The recorded version may have vanished from every
                    // feed, in which case the resolved version differs.
                    // Re-register it so the next restore finds its
                    // content directory instead of downloading again.
                    if found.version != entry.version {
                        warn!(
                            "{} {} no longer available, restored {} instead",
                            entry.id, entry.version_literal, found.version
                        );
                        self.installed.register(&found, entry.manually_installed);
                        drifted = true;
                    }
                }
                Err(e) => {
                    error!("restore of {} failed: {}", wanted, e);
                    report.failed += 1;
                }
            }
        }
        if drifted {
            self.save()?;
        }
        if report.failed > 0 {
            warn!("restore finished with {} failure(s)", report.failed);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::NugetVersion;

    fn pkg(id: &str, version: &str) -> Package {
        Package::new(id, NugetVersion::parse(version).unwrap())
    }

    #[test]
    fn test_install_state_transitions() {
        let mut installed = InstalledPackagesSet::new();
        assert_eq!(
            install_state(&installed, &pkg("A", "1.0")),
            InstallState::NotInstalled
        );
        installed.register(&pkg("A", "1.5"), true);
        assert_eq!(
            install_state(&installed, &pkg("A", "1.5")),
            InstallState::InstalledSameVersion
        );
        assert_eq!(
            install_state(&installed, &pkg("a", "2.0")),
            InstallState::InstalledOlder
        );
        assert_eq!(
            install_state(&installed, &pkg("A", "1.0")),
            InstallState::InstalledNewer
        );
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
