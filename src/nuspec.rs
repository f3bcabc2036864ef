//! `.nuspec` manifest parsing
//!
//! Every `.nupkg` archive carries exactly one `.nuspec` manifest at its
//! root describing the package id, version and dependency groups. Both
//! the grouped form (`<group targetFramework="..">`) and the legacy flat
//! `<dependency>` list are accepted; a flat list becomes one
//! unconditional group.
//!
//! # Examples
//!
//! ```no_run
//! use nupm::nuspec::Nuspec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let nuspec = Nuspec::from_nupkg("Newtonsoft.Json.12.0.1.nupkg")?;
//! println!("{} {}", nuspec.id, nuspec.version);
//! # Ok(())
//! # }
//! ```

use crate::identifier::PackageIdentifier;
use crate::package::{FrameworkGroup, Package};
use crate::version::NugetVersion;
use crate::{Error, Result};
use log::warn;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A parsed `.nuspec` manifest.
#[derive(Debug, Clone)]
pub struct Nuspec {
    pub id: String,
    pub version: NugetVersion,
    pub title: Option<String>,
    pub description: Option<String>,
    pub dependency_groups: Vec<FrameworkGroup>,
}

#[derive(Debug, Deserialize)]
struct NuspecXml {
    metadata: MetadataXml,
}

#[derive(Debug, Deserialize)]
struct MetadataXml {
    id: String,
    version: String,
    title: Option<String>,
    description: Option<String>,
    dependencies: Option<DependenciesXml>,
}

#[derive(Debug, Default, Deserialize)]
struct DependenciesXml {
    #[serde(default, rename = "group")]
    groups: Vec<GroupXml>,
    #[serde(default, rename = "dependency")]
    dependencies: Vec<DependencyXml>,
}

#[derive(Debug, Deserialize)]
struct GroupXml {
    #[serde(default, rename = "@targetFramework")]
    target_framework: String,
    #[serde(default, rename = "dependency")]
    dependencies: Vec<DependencyXml>,
}

#[derive(Debug, Deserialize)]
struct DependencyXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default, rename = "@version")]
    version: String,
}

impl Nuspec {
    /// Parse a `.nuspec` document from XML text.
    pub fn parse(xml: &str) -> Result<Self> {
        let raw: NuspecXml = quick_xml::de::from_str(xml)?;
        let metadata = raw.metadata;

        let version = NugetVersion::parse(&metadata.version)?;

        let mut dependency_groups = Vec::new();
        if let Some(deps) = metadata.dependencies {
            for group in deps.groups {
                dependency_groups.push(FrameworkGroup {
                    target_framework: group.target_framework,
                    dependencies: convert_dependencies(&metadata.id, group.dependencies),
                });
            }
            // Legacy flat list: one unconditional group.
            if !deps.dependencies.is_empty() {
                dependency_groups.push(FrameworkGroup {
                    target_framework: String::new(),
                    dependencies: convert_dependencies(&metadata.id, deps.dependencies),
                });
            }
        }

        Ok(Self {
            id: metadata.id,
            version,
            title: metadata.title.filter(|t| !t.is_empty()),
            description: metadata.description.filter(|d| !d.is_empty()),
            dependency_groups,
        })
    }

    /// Load a `.nuspec` file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Read the manifest out of a `.nupkg` archive.
    pub fn from_nupkg<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let entry_name = (0..archive.len())
            .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
            .find(|name| name.ends_with(".nuspec") && !name.contains('/'))
            .ok_or_else(|| {
                Error::Other(format!("no .nuspec manifest in {}", path.display()))
            })?;

        let mut content = String::new();
        archive.by_name(&entry_name)?.read_to_string(&mut content)?;
        Self::parse(&content)
    }

    /// Convert into a full package record attributed to a source.
    pub fn into_package(self, source_name: &str, download_url: Option<String>) -> Package {
        Package {
            id: self.id,
            version: self.version,
            title: self.title,
            description: self.description,
            dependency_groups: self.dependency_groups,
            download_url,
            package_hash: None,
            source_name: source_name.to_string(),
        }
    }
}

/// A dependency with no version constraint accepts anything; `0.0` as an
/// inclusive floor expresses that. Entries with unparseable constraints
/// are logged and skipped rather than failing the whole manifest.
fn convert_dependencies(owner: &str, raw: Vec<DependencyXml>) -> Vec<PackageIdentifier> {
    raw.into_iter()
        .filter_map(|dep| {
            let version = if dep.version.trim().is_empty() {
                "0.0".to_string()
            } else {
                dep.version
            };
            match PackageIdentifier::new(dep.id, version) {
                Ok(ident) => Some(ident),
                Err(e) => {
                    warn!("skipping dependency of '{}': {}", owner, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>Example.Package</id>
    <version>1.2.3</version>
    <title>Example</title>
    <description>An example package.</description>
    <dependencies>
      <group targetFramework="net46">
        <dependency id="Dep.A" version="[1.0,2.0)" />
      </group>
      <group targetFramework="netstandard2.0">
        <dependency id="Dep.B" version="2.1" />
        <dependency id="Dep.C" />
      </group>
    </dependencies>
  </metadata>
</package>"#;

    const FLAT: &str = r#"<?xml version="1.0"?>
<package>
  <metadata>
    <id>Legacy.Package</id>
    <version>0.9.0-beta</version>
    <description>Old-style dependency list.</description>
    <dependencies>
      <dependency id="Dep.A" version="1.0" />
    </dependencies>
  </metadata>
</package>"#;

    #[test]
    fn test_parse_grouped_dependencies() {
        let nuspec = Nuspec::parse(GROUPED).unwrap();
        assert_eq!(nuspec.id, "Example.Package");
        assert_eq!(nuspec.version, NugetVersion::parse("1.2.3").unwrap());
        assert_eq!(nuspec.title.as_deref(), Some("Example"));
        assert_eq!(nuspec.dependency_groups.len(), 2);

        let net46 = &nuspec.dependency_groups[0];
        assert_eq!(net46.target_framework, "net46");
        assert_eq!(net46.dependencies[0].version_literal(), "[1.0,2.0)");

        let std20 = &nuspec.dependency_groups[1];
        assert_eq!(std20.dependencies.len(), 2);
        // Missing version attribute becomes the any-version floor.
        assert_eq!(std20.dependencies[1].version_literal(), "0.0");
    }

    #[test]
    fn test_parse_flat_dependencies_become_unconditional_group() {
        let nuspec = Nuspec::parse(FLAT).unwrap();
        assert_eq!(nuspec.dependency_groups.len(), 1);
        let group = &nuspec.dependency_groups[0];
        assert!(group.is_unconditional());
        assert_eq!(group.dependencies[0].id, "Dep.A");
        assert!(nuspec.version.is_prerelease());
    }

    #[test]
    fn test_parse_no_dependencies() {
        let xml = r#"<package><metadata><id>Solo</id><version>1.0</version></metadata></package>"#;
        let nuspec = Nuspec::parse(xml).unwrap();
        assert!(nuspec.dependency_groups.is_empty());
        assert!(nuspec.title.is_none());
    }

    #[test]
    fn test_parse_bad_version_is_error() {
        let xml =
            r#"<package><metadata><id>Bad</id><version>abc</version></metadata></package>"#;
        assert!(Nuspec::parse(xml).is_err());
    }

    #[test]
    fn test_bad_dependency_constraint_is_skipped() {
        let xml = r#"<package><metadata><id>P</id><version>1.0</version>
            <dependencies>
              <dependency id="Good" version="1.0" />
              <dependency id="Bad" version="[oops" />
            </dependencies></metadata></package>"#;
        let nuspec = Nuspec::parse(xml).unwrap();
        assert_eq!(nuspec.dependency_groups[0].dependencies.len(), 1);
    }

    #[test]
    fn test_into_package() {
        let pkg = Nuspec::parse(FLAT)
            .unwrap()
            .into_package("local", Some("/feed/Legacy.Package.0.9.0-beta.nupkg".into()));
        assert_eq!(pkg.source_name, "local");
        assert_eq!(pkg.content_dir_name(), "Legacy.Package.0.9.0-beta");
    }
}
