//! nupm - A NuGet package manager for Unity projects
//!
//! nupm brings NuGet dependency management to Unity-style projects. It
//! provides a simple CLI for installing .NET packages with features like:
//!
//! - NuGet version parsing with four-component builds and prerelease tags
//! - Interval-notation version ranges (`[1.0,2.0)`)
//! - Local folder feeds and remote NuGet V2 (OData) feeds
//! - Aggregated lookups across every configured source
//! - Transitive dependency resolution with planned, idempotent installs
//! - `packages.config` / `NuGet.config` round-tripping
//!
//! # Examples
//!
//! ```no_run
//! use nupm::{PackageIdentifier, ResolutionContext};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open the project (reads NuGet.config and packages.config)
//! let mut context = ResolutionContext::open(".")?;
//!
//! // Install a package with its dependency closure
//! let wanted = PackageIdentifier::new("Newtonsoft.Json", "[13.0,14.0)")?;
//! let installed = context.install(&wanted, None)?;
//!
//! println!("Installed {} packages", installed.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`version`] - NuGet version parsing and ordering
//! - [`range`] - Interval-notation version ranges
//! - [`identifier`] - Package id + version constraint pairs
//! - [`package`] - Available package metadata and framework groups
//! - [`nuspec`] - `.nuspec` manifests and `.nupkg` archives
//! - [`installed`] - The `packages.config` installed set
//! - [`config`] - `NuGet.config` sources and repository path
//! - [`source`] - Local folder package sources
//! - [`source_remote`] - NuGet V2 (OData) remote feeds
//! - [`aggregator`] - Fan-out queries over all enabled sources
//! - [`installer`] - Download, verify and unpack package content
//! - [`resolver`] - Dependency resolution and install/update/restore
//! - [`error`] - Error types and result handling

pub mod aggregator;
pub mod config;
pub mod error;
pub mod identifier;
pub mod installed;
pub mod installer;
pub mod nuspec;
pub mod package;
pub mod range;
pub mod resolver;
pub mod source;
pub mod source_remote;
pub mod version;

pub use aggregator::SourceAggregator;
pub use config::{NugetConfig, PackageSourceConfig, DEFAULT_FEED_URL, NUGET_CONFIG};
pub use error::{Error, Result};
pub use identifier::PackageIdentifier;
pub use installed::{InstalledPackage, InstalledPackagesSet, PACKAGES_CONFIG};
pub use installer::{verify_hash, ConflictPolicy, PackageInstaller, ProgressCallback};
pub use nuspec::Nuspec;
pub use package::{FrameworkGroup, Package};
pub use range::{RangePosition, VersionSpec};
pub use resolver::{
    install_state, CancelToken, InstallPlan, InstallState, ResolutionContext, RestoreReport,
};
pub use source::{LocalFolderSource, PackageSource};
pub use source_remote::RemoteFeedSource;
pub use version::{compare_versions, NugetVersion};
