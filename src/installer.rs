//! Downloading, verifying and unpacking package content
//!
//! Packages are fetched into a local `.nupkg` cache first (HTTP
//! download for remote sources, a plain copy for local folders), hash
//! checked when the feed supplied one, then unpacked into
//! `{repository}/{Id}.{Version}/`.

use crate::error::{Error, Result};
use crate::installed::InstalledPackage;
use crate::package::Package;
use base64::Engine as _;
use log::{debug, warn};
use sha2::{Digest, Sha512};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use zip::ZipArchive;

/// Progress callback for download/extraction operations
///
/// Called with:
/// - `message`: Description of current operation (e.g., "Downloading...")
/// - `current`: Bytes or items processed so far
/// - `total`: Total bytes or items (0 when unknown)
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// What to do when extraction targets an existing content directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Replace the existing directory.
    #[default]
    Overwrite,
    /// Refuse and surface the conflict.
    Fail,
}

pub struct PackageInstaller {
    repository_path: PathBuf,
    cache_dir: PathBuf,
    conflict_policy: ConflictPolicy,
    client: reqwest::blocking::Client,
}

impl PackageInstaller {
    pub fn new(repository_path: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository_path: repository_path.into(),
            cache_dir: cache_dir.into(),
            conflict_policy: ConflictPolicy::default(),
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Default cache location (`~/.nupm/cache`, or a local fallback).
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".nupm").join("cache"))
            .unwrap_or_else(|| PathBuf::from(".nupm-cache"))
    }

    pub fn repository_path(&self) -> &Path {
        &self.repository_path
    }

    /// Directory a package's content unpacks into.
    pub fn content_dir(&self, package: &Package) -> PathBuf {
        self.repository_path.join(package.content_dir_name())
    }

    pub fn installed_content_dir(&self, installed: &InstalledPackage) -> PathBuf {
        self.repository_path.join(installed.content_dir_name())
    }

    fn cache_path(&self, package: &Package) -> PathBuf {
        self.cache_dir
            .join(format!("{}.nupkg", package.content_dir_name()))
    }

    /// Ensure the `.nupkg` is present in the cache and return its path.
    /// A previously cached archive is reused without re-downloading.
    pub fn fetch(&self, package: &Package, progress: Option<&ProgressCallback>) -> Result<PathBuf> {
        let cached = self.cache_path(package);
        if cached.exists() {
            debug!("cache hit for {}", package.identifier());
            return Ok(cached);
        }
        let url = package.download_url.as_deref().ok_or_else(|| {
            Error::Other(format!("no download location for {}", package.identifier()))
        })?;

        fs::create_dir_all(&self.cache_dir)?;
        let staging = cached.with_extension("nupkg.part");
        if url.starts_with("http://") || url.starts_with("https://") {
            self.download(url, &staging, &package.source_name, progress)?;
        } else {
            if let Some(cb) = progress {
                cb("Copying package...", 0, 0);
            }
            fs::copy(url, &staging)?;
        }

        if let Some(expected) = &package.package_hash {
            if let Err(e) = verify_hash(&staging, expected) {
                let _ = fs::remove_file(&staging);
                return Err(e);
            }
        }
        fs::rename(&staging, &cached)?;
        Ok(cached)
    }

    fn download(
        &self,
        url: &str,
        target: &Path,
        source_name: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::SourceUnavailable {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(Error::SourceUnavailable {
                source_name: source_name.to_string(),
                reason: format!("HTTP {} for {}", response.status().as_u16(), url),
            });
        }
        let total = response.content_length().unwrap_or(0);
        let mut reader = response;
        let mut file = File::create(target)?;
        let mut buffer = vec![0u8; 64 * 1024];
        let mut written: u64 = 0;
        loop {
            let read = reader.read(&mut buffer).map_err(|e| Error::SourceUnavailable {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;
            if read == 0 {
                break;
            }
            io::Write::write_all(&mut file, &buffer[..read])?;
            written += read as u64;
            if let Some(cb) = progress {
                cb("Downloading...", written, total);
            }
        }
        Ok(())
    }

    /// Unpack a package's content into the repository. Returns the
    /// content directory.
    pub fn install(
        &self,
        package: &Package,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf> {
        let archive_path = self.fetch(package, progress)?;
        let content_dir = self.content_dir(package);

        if content_dir.exists() {
            match self.conflict_policy {
                ConflictPolicy::Overwrite => {
                    fs::remove_dir_all(&content_dir)?;
                }
                ConflictPolicy::Fail => {
                    return Err(Error::ContentConflict(content_dir));
                }
            }
        }
        fs::create_dir_all(&content_dir)?;

        let file = File::open(&archive_path)?;
        let mut archive = ZipArchive::new(file)?;
        let total = archive.len() as u64;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let Some(relative) = entry.enclosed_name() else {
                warn!("skipping unsafe archive path: {}", entry.name());
                continue;
            };
            if is_archive_metadata(&relative) {
                continue;
            }
            let target = content_dir.join(&relative);
            if entry.is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&target)?;
                io::copy(&mut entry, &mut out)?;
            }
            if let Some(cb) = progress {
                cb("Extracting...", index as u64 + 1, total);
            }
        }
        Ok(content_dir)
    }

    /// Remove an installed package's content directory. Missing content
    /// is not an error; the bookkeeping may simply be ahead of disk.
    pub fn uninstall(&self, installed: &InstalledPackage) -> Result<()> {
        let content_dir = self.installed_content_dir(installed);
        if content_dir.exists() {
            fs::remove_dir_all(&content_dir)?;
        } else {
            debug!("content for {} already absent", installed.id);
        }
        Ok(())
    }

    /// True when the package's content directory already exists.
    pub fn is_content_present(&self, package: &Package) -> bool {
        self.content_dir(package).exists()
    }
}

/// Zip housekeeping entries that are not package content.
fn is_archive_metadata(path: &Path) -> bool {
    let Some(first) = path.iter().next().map(|c| c.to_string_lossy()) else {
        return true;
    };
    first == "_rels"
        || first == "package"
        || first.eq_ignore_ascii_case("[Content_Types].xml")
}

/// Check a file against the feed's SHA-512 hash (base64 encoded).
pub fn verify_hash<P: AsRef<Path>>(path: P, expected_base64: &str) -> Result<()> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    let computed = base64::engine::general_purpose::STANDARD.encode(hasher.finalize());
    if computed == expected_base64 {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "hash mismatch for {}: expected {}, computed {}",
            path.as_ref().display(),
            expected_base64,
            computed
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::NugetVersion;
    use std::io::Write;

    fn make_nupkg(dir: &Path, id: &str, version: &str) -> PathBuf {
        let path = dir.join(format!("{}.{}.nupkg", id, version));
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("{}.nuspec", id), options).unwrap();
        write!(
            zip,
            r#"<package><metadata><id>{}</id><version>{}</version></metadata></package>"#,
            id, version
        )
        .unwrap();
        zip.start_file("lib/netstandard2.0/Lib.dll", options).unwrap();
        zip.write_all(b"binary").unwrap();
        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(b"<Relationships/>").unwrap();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.finish().unwrap();
        path
    }

    fn local_package(dir: &Path, id: &str, version: &str) -> Package {
        let nupkg = make_nupkg(dir, id, version);
        let mut package = Package::new(id, NugetVersion::parse(version).unwrap());
        package.download_url = Some(nupkg.to_string_lossy().into_owned());
        package
    }

    #[test]
    fn test_install_unpacks_content_and_skips_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let installer =
            PackageInstaller::new(dir.path().join("Packages"), dir.path().join("cache"));
        let package = local_package(dir.path(), "Demo", "1.2.3");

        let content = installer.install(&package, None).unwrap();
        assert_eq!(content, dir.path().join("Packages").join("Demo.1.2.3"));
        assert!(content.join("lib/netstandard2.0/Lib.dll").exists());
        assert!(content.join("Demo.nuspec").exists());
        assert!(!content.join("_rels").exists());
        assert!(!content.join("[Content_Types].xml").exists());
    }

    #[test]
    fn test_conflict_policy_fail() {
        let dir = tempfile::TempDir::new().unwrap();
        let installer =
            PackageInstaller::new(dir.path().join("Packages"), dir.path().join("cache"))
                .with_conflict_policy(ConflictPolicy::Fail);
        let package = local_package(dir.path(), "Demo", "1.0");

        installer.install(&package, None).unwrap();
        let err = installer.install(&package, None).unwrap_err();
        assert!(matches!(err, Error::ContentConflict(_)));
    }

    #[test]
    fn test_overwrite_replaces_existing_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let installer =
            PackageInstaller::new(dir.path().join("Packages"), dir.path().join("cache"));
        let package = local_package(dir.path(), "Demo", "1.0");

        let content = installer.install(&package, None).unwrap();
        fs::write(content.join("stale.txt"), "old").unwrap();
        installer.install(&package, None).unwrap();
        assert!(!content.join("stale.txt").exists());
    }

    #[test]
    fn test_fetch_reuses_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let installer =
            PackageInstaller::new(dir.path().join("Packages"), dir.path().join("cache"));
        let mut package = local_package(dir.path(), "Demo", "1.0");

        let cached = installer.fetch(&package, None).unwrap();
        // Break the origin; the cache must still satisfy the fetch.
        fs::remove_file(package.download_url.as_deref().unwrap()).unwrap();
        package.download_url = None;
        assert_eq!(installer.fetch(&package, None).unwrap(), cached);
    }

    #[test]
    fn test_hash_verification() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"hello").unwrap();

        let mut hasher = Sha512::new();
        hasher.update(b"hello");
        let good = base64::engine::general_purpose::STANDARD.encode(hasher.finalize());

        verify_hash(&path, &good).unwrap();
        assert!(verify_hash(&path, "AAAA").is_err());
    }

    #[test]
    fn test_uninstall_removes_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let installer =
            PackageInstaller::new(dir.path().join("Packages"), dir.path().join("cache"));
        let package = local_package(dir.path(), "Demo", "1.0");
        installer.install(&package, None).unwrap();

        let installed = InstalledPackage {
            id: "Demo".to_string(),
            version: NugetVersion::parse("1.0").unwrap(),
            version_literal: "1.0".to_string(),
            manually_installed: true,
        };
        installer.uninstall(&installed).unwrap();
        assert!(!installer.installed_content_dir(&installed).exists());
        // Uninstalling again is a no-op.
        installer.uninstall(&installed).unwrap();
    }
}
