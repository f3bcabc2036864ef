//! NuGet V2 (OData) remote feed client
//!
//! Speaks the legacy V2 protocol: `FindPackagesById()`, `Search()` and
//! `GetUpdates()` endpoints returning Atom XML with `m:properties`
//! payloads. Dependency lists arrive as flat strings of the form
//! `id:range:framework|id:range:framework|...` and are regrouped by
//! target framework here.

use crate::error::{Error, Result};
use crate::identifier::PackageIdentifier;
use crate::installed::InstalledPackage;
use crate::package::{FrameworkGroup, Package};
use crate::range::RangePosition;
use crate::version::NugetVersion;
use base64::Engine as _;
use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::time::Duration;

/// GetUpdates rejects overly long id lists, so requests are batched.
const UPDATE_BATCH_SIZE: usize = 10;

pub struct RemoteFeedSource {
    name: String,
    base_url: String,
    password: Option<String>,
    client: reqwest::blocking::Client,
}

impl RemoteFeedSource {
    pub fn new(name: &str, url: &str, password: Option<String>) -> Self {
        let base_url = url.trim_end_matches('/').to_string();
        Self {
            name: name.to_string(),
            base_url,
            password,
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    fn fetch(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(password) = &self.password {
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!(":{}", password));
            request = request.header("Authorization", format!("Basic {}", token));
        }
        let response = request.send().map_err(|e| {
            let reason = if e.is_connect() {
                "connection refused".to_string()
            } else if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            Error::SourceUnavailable {
                source_name: self.name.clone(),
                reason,
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                source_name: self.name.clone(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        response.text().map_err(|e| Error::SourceUnavailable {
            source_name: self.name.clone(),
            reason: e.to_string(),
        })
    }

    pub fn search(
        &self,
        term: &str,
        include_all_versions: bool,
        include_prerelease: bool,
    ) -> Result<Vec<Package>> {
        let mut filters = Vec::new();
        if !include_all_versions {
            filters.push(if include_prerelease {
                "IsAbsoluteLatestVersion"
            } else {
                "IsLatestVersion"
            });
        }
        let mut url = format!("{}/Search()?$orderby=Id", self.base_url);
        if !filters.is_empty() {
            url.push_str(&format!("&$filter={}", filters.join(" and ")));
        }
        url.push_str(&format!(
            "&searchTerm='{}'&targetFramework=''&includePrerelease={}",
            urlencoding::encode(term),
            include_prerelease
        ));
        let body = self.fetch(&url)?;
        Ok(self.parse_feed(&body))
    }

    pub fn get_specific_package(&self, wanted: &PackageIdentifier) -> Result<Option<Package>> {
        let url = format!(
            "{}/FindPackagesById()?id='{}'&$orderby=Version asc",
            self.base_url,
            urlencoding::encode(&wanted.id)
        );
        let body = self.fetch(&url)?;
        let mut candidates = self.parse_feed(&body);
        candidates.sort_by(|a, b| a.version.cmp(&b.version));
        // Lowest in-range version, or the lowest above-range one when the
        // range has emptied out of the feed.
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
        let mut updates = Vec::new();
        for batch in installed.chunks(UPDATE_BATCH_SIZE) {
            let ids: Vec<&str> = batch.iter().map(|p| p.id.as_str()).collect();
            let versions: Vec<&str> = batch.iter().map(|p| p.version_literal.as_str()).collect();
            let url = format!(
                "{}/GetUpdates()?packageIds='{}'&versions='{}'&includePrerelease={}&includeAllVersions={}",
                self.base_url,
                urlencoding::encode(&ids.join("|")),
                urlencoding::encode(&versions.join("|")),
                include_prerelease,
                include_all_versions
            );
            let body = self.fetch(&url)?;
            updates.extend(self.parse_feed(&body));
        }
        updates.sort_by(|a, b| {
            a.id.to_lowercase()
                .cmp(&b.id.to_lowercase())
                .then_with(|| a.version.cmp(&b.version))
        });
        Ok(updates)
    }

    /// Parse an Atom feed (or a single-entry response) into packages.
    /// Entries with unparseable versions are logged and dropped.
    fn parse_feed(&self, xml: &str) -> Vec<Package> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut packages = Vec::new();
        let mut entry: Option<EntryFields> = None;
        let mut path: Vec<String> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = local_name(e.name().as_ref());
                    if name == "entry" {
                        entry = Some(EntryFields::default());
                    } else if name == "content" {
                        // Feeds emit <content/> both self-closed and paired.
                        capture_content_src(entry.as_mut(), &e);
                    }
                    path.push(name);
                }
                Ok(Event::Empty(e)) => {
                    if local_name(e.name().as_ref()) == "content" {
                        capture_content_src(entry.as_mut(), &e);
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(fields), Some(element)) = (entry.as_mut(), path.last()) {
                        if let Ok(text) = t.unescape() {
                            fields.set(element, text.into_owned(), &path);
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    if local_name(e.name().as_ref()) == "entry" {
                        if let Some(fields) = entry.take() {
                            match fields.into_package(&self.name) {
                                Ok(package) => packages.push(package),
                                Err(e) => warn!("skipping feed entry from {}: {}", self.name, e),
                            }
                        }
                    }
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("malformed feed from {}: {}", self.name, e);
                    break;
                }
            }
        }
        packages
    }
}

fn local_name(qname: &[u8]) -> String {
    let raw = String::from_utf8_lossy(qname);
    raw.rsplit(':').next().unwrap_or(&raw).to_string()
}

fn capture_content_src(fields: Option<&mut EntryFields>, element: &BytesStart) {
    if let (Some(fields), Ok(Some(attr))) = (fields, element.try_get_attribute("src")) {
        if let Ok(src) = attr.unescape_value() {
            fields.download_url = Some(src.into_owned());
        }
    }
}

#[derive(Default)]
struct EntryFields {
    id: String,
    version: String,
    title: Option<String>,
    description: Option<String>,
    dependencies: String,
    package_hash: Option<String>,
    download_url: Option<String>,
}

impl EntryFields {
    fn set(&mut self, element: &str, text: String, path: &[String]) {
        let in_properties = path.iter().any(|p| p == "properties");
        match element {
            // The Atom <title> carries the package id; d:Title inside
            // m:properties is the human-readable title.
            "title" if !in_properties => self.id = text,
            "Id" => self.id = text,
            "Version" => self.version = text,
            "Title" => self.title = Some(text),
            "Description" => self.description = Some(text),
            "Dependencies" => self.dependencies = text,
            "PackageHash" => self.package_hash = Some(text),
            _ => {}
        }
    }

    fn into_package(self, source_name: &str) -> Result<Package> {
        let version = NugetVersion::parse(&self.version)?;
        let mut package = Package::new(&self.id, version);
        package.title = self.title;
        package.description = self.description;
        package.dependency_groups = parse_dependency_string(&self.dependencies);
        package.download_url = self.download_url;
        package.package_hash = self.package_hash;
        package.source_name = source_name.to_string();
        Ok(package)
    }
}

/// Regroup a V2 dependency string into per-framework groups. Each
/// `|`-separated segment is `id:range:framework`; range and framework
/// may be empty. A missing range means any version.
fn parse_dependency_string(raw: &str) -> Vec<FrameworkGroup> {
    let mut groups: Vec<FrameworkGroup> = Vec::new();
    for segment in raw.split('|') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let mut parts = segment.splitn(3, ':');
        let id = parts.next().unwrap_or_default();
        let range = parts.next().unwrap_or_default();
        let framework = parts.next().unwrap_or_default();
        if id.is_empty() {
            // Empty-id segments mark frameworks with no dependencies.
            if !framework.is_empty()
                && !groups.iter().any(|g| g.target_framework == framework)
            {
                groups.push(FrameworkGroup {
                    target_framework: framework.to_string(),
                    dependencies: Vec::new(),
                });
            }
            continue;
        }
        let range = if range.is_empty() { "0.0" } else { range };
        let dependency = match PackageIdentifier::new(id, range) {
            Ok(dependency) => dependency,
            Err(e) => {
                warn!("skipping dependency '{}': {}", segment, e);
                continue;
            }
        };
        match groups.iter_mut().find(|g| g.target_framework == framework) {
            Some(group) => group.dependencies.push(dependency),
            None => groups.push(FrameworkGroup {
                target_framework: framework.to_string(),
                dependencies: vec![dependency],
            }),
        }
    }
    groups
}
