//! Package metadata records
//!
//! A [`Package`] is the full metadata a source returns for one concrete
//! version of one package: identity, display fields, dependency groups
//! and where to download the payload from. `source_name` is a back-
//! reference to the producing source by name only; a package never owns
//! the source that produced it.

use crate::identifier::PackageIdentifier;
use crate::version::NugetVersion;

/// Dependencies scoped to one target-framework moniker.
/// An empty moniker means the group applies unconditionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameworkGroup {
    pub target_framework: String,
    pub dependencies: Vec<PackageIdentifier>,
}

impl FrameworkGroup {
    pub fn is_unconditional(&self) -> bool {
        self.target_framework.is_empty()
    }
}

/// Full metadata for one concrete package version.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: String,
    pub version: NugetVersion,
    pub title: Option<String>,
    pub description: Option<String>,
    pub dependency_groups: Vec<FrameworkGroup>,
    /// Where the `.nupkg` payload can be fetched from. A URL for remote
    /// feeds, a file path for local folders.
    pub download_url: Option<String>,
    /// Feed-advertised package hash (base64 SHA-512), when available.
    pub package_hash: Option<String>,
    /// Name of the source this record came from.
    pub source_name: String,
}

impl Package {
    pub fn new(id: impl Into<String>, version: NugetVersion) -> Self {
        Self {
            id: id.into(),
            version,
            title: None,
            description: None,
            dependency_groups: Vec::new(),
            download_url: None,
            package_hash: None,
            source_name: String::new(),
        }
    }

    /// This package as a pinned identifier.
    pub fn identifier(&self) -> PackageIdentifier {
        PackageIdentifier::pinned(self.id.clone(), self.version.clone())
    }

    pub fn matches_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }

    /// The dependency group the resolver walks: the unconditional group
    /// when one exists, otherwise the first declared group.
    pub fn selected_group(&self) -> Option<&FrameworkGroup> {
        self.dependency_groups
            .iter()
            .find(|g| g.is_unconditional())
            .or_else(|| self.dependency_groups.first())
    }

    /// Directory name the package content is installed under, `Id.Version`.
    pub fn content_dir_name(&self) -> String {
        format!("{}.{}", self.id, self.version)
    }
}
