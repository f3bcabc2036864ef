//! NuGet.config parsing and serialisation
//!
//! `NuGet.config` carries the package source list (with per-source
//! enable/disable state and optional clear-text credentials), the
//! repository path packages are installed under, and the default push
//! source. Source names match case-insensitively, like package ids.
//!
//! # Examples
//!
//! ```no_run
//! use nupm::config::NugetConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NugetConfig::load_from("NuGet.config")?;
//! for source in config.enabled_sources() {
//!     println!("{} -> {}", source.name, source.path);
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// The config filename.
pub const NUGET_CONFIG: &str = "NuGet.config";

/// The canonical public feed, used when no config exists yet.
pub const DEFAULT_FEED_URL: &str = "https://www.nuget.org/api/v2/";

/// One configured package source: a remote feed URL or a local folder.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSourceConfig {
    pub name: String,
    pub path: String,
    pub enabled: bool,
    /// Clear-text password from `<packageSourceCredentials>`, if any.
    pub password: Option<String>,
}

impl PackageSourceConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            enabled: true,
            password: None,
        }
    }

    /// Local folder sources are anything that is not an http(s) URL.
    pub fn is_local(&self) -> bool {
        !self.path.starts_with("http://") && !self.path.starts_with("https://")
    }
}

#[derive(Debug, Clone)]
pub struct NugetConfig {
    pub sources: Vec<PackageSourceConfig>,
    /// Directory installed package content lands in; may be relative to
    /// the config file's directory.
    pub repository_path: String,
    pub default_push_source: Option<String>,
}

impl Default for NugetConfig {
    fn default() -> Self {
        Self {
            sources: vec![PackageSourceConfig::new("nuget.org", DEFAULT_FEED_URL)],
            repository_path: "Packages".to_string(),
            default_push_source: None,
        }
    }
}

impl NugetConfig {
    /// Load from a NuGet.config file. A missing file yields the default
    /// configuration (nuget.org enabled, `Packages` repository path).
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse NuGet.config XML.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<String> = Vec::new();
        let mut sources: Vec<PackageSourceConfig> = Vec::new();
        let mut disabled: Vec<String> = Vec::new();
        let mut credentials: Vec<(String, String)> = Vec::new();
        let mut repository_path = "Packages".to_string();
        let mut default_push_source = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    handle_element(
                        &stack,
                        &name,
                        &e,
                        &mut sources,
                        &mut disabled,
                        &mut credentials,
                        &mut repository_path,
                        &mut default_push_source,
                    )?;
                    stack.push(name);
                }
                Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    handle_element(
                        &stack,
                        &name,
                        &e,
                        &mut sources,
                        &mut disabled,
                        &mut credentials,
                        &mut repository_path,
                        &mut default_push_source,
                    )?;
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(e.into()),
            }
        }

        for source in &mut sources {
            if disabled.iter().any(|d| d.eq_ignore_ascii_case(&source.name)) {
                source.enabled = false;
            }
            if let Some((_, password)) = credentials
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&source.name))
            {
                source.password = Some(password.clone());
            }
        }

        Ok(Self {
            sources,
            repository_path,
            default_push_source,
        })
    }

    /// Write the config back out.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str("<configuration>\n");

        out.push_str("  <packageSources>\n");
        for source in &self.sources {
            let _ = writeln!(
                out,
                "    <add key=\"{}\" value=\"{}\" />",
                escape(&source.name),
                escape(&source.path)
            );
        }
        out.push_str("  </packageSources>\n");

        let disabled: Vec<&PackageSourceConfig> =
            self.sources.iter().filter(|s| !s.enabled).collect();
        if !disabled.is_empty() {
            out.push_str("  <disabledPackageSources>\n");
            for source in disabled {
                let _ = writeln!(
                    out,
                    "    <add key=\"{}\" value=\"true\" />",
                    escape(&source.name)
                );
            }
            out.push_str("  </disabledPackageSources>\n");
        }

        let with_credentials: Vec<&PackageSourceConfig> = self
            .sources
            .iter()
            .filter(|s| s.password.is_some())
            .collect();
        if !with_credentials.is_empty() {
            out.push_str("  <packageSourceCredentials>\n");
            for source in with_credentials {
                let _ = writeln!(out, "    <{}>", escape(&source.name));
                let _ = writeln!(
                    out,
                    "      <add key=\"ClearTextPassword\" value=\"{}\" />",
                    escape(source.password.as_deref().unwrap_or_default())
                );
                let _ = writeln!(out, "    </{}>", escape(&source.name));
            }
            out.push_str("  </packageSourceCredentials>\n");
        }

        out.push_str("  <config>\n");
        let _ = writeln!(
            out,
            "    <add key=\"repositoryPath\" value=\"{}\" />",
            escape(&self.repository_path)
        );
        if let Some(push) = &self.default_push_source {
            let _ = writeln!(
                out,
                "    <add key=\"DefaultPushSource\" value=\"{}\" />",
                escape(push)
            );
        }
        out.push_str("  </config>\n");
        out.push_str("</configuration>\n");

        fs::write(path.as_ref(), out)?;
        Ok(())
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &PackageSourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    pub fn find_source(&self, name: &str) -> Option<&PackageSourceConfig> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Absolute repository path, resolved against the config's directory.
    pub fn resolved_repository_path(&self, config_dir: &Path) -> std::path::PathBuf {
        let raw = Path::new(&self.repository_path);
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            config_dir.join(raw)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_element(
    stack: &[String],
    name: &str,
    element: &quick_xml::events::BytesStart<'_>,
    sources: &mut Vec<PackageSourceConfig>,
    disabled: &mut Vec<String>,
    credentials: &mut Vec<(String, String)>,
    repository_path: &mut String,
    default_push_source: &mut Option<String>,
) -> Result<()> {
    let parent = stack.last().map(String::as_str).unwrap_or_default();
    let grandparent = stack
        .len()
        .checked_sub(2)
        .map(|i| stack[i].as_str())
        .unwrap_or_default();

    if name == "clear" && parent == "packageSources" {
        sources.clear();
        return Ok(());
    }
    if name != "add" {
        return Ok(());
    }

    let key = attribute(element, "key")?;
    let value = attribute(element, "value")?;
    let (key, value) = match (key, value) {
        (Some(k), Some(v)) => (k, v),
        _ => return Ok(()),
    };

    match parent {
        "packageSources" => sources.push(PackageSourceConfig::new(key, value)),
        "disabledPackageSources" => {
            if value.eq_ignore_ascii_case("true") {
                disabled.push(key);
            }
        }
        "config" => {
            if key.eq_ignore_ascii_case("repositoryPath") {
                *repository_path = value;
            } else if key.eq_ignore_ascii_case("DefaultPushSource") {
                *default_push_source = Some(value);
            }
        }
        source_name if grandparent == "packageSourceCredentials" => {
            if key.eq_ignore_ascii_case("ClearTextPassword") || key.eq_ignore_ascii_case("Password")
            {
                credentials.push((source_name.to_string(), value));
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(
    element: &quick_xml::events::BytesStart<'_>,
    name: &str,
) -> Result<Option<String>> {
    match element.try_get_attribute(name) {
        Ok(Some(attr)) => {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(Error::InvalidConfig(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <packageSources>
    <add key="nuget.org" value="https://www.nuget.org/api/v2/" />
    <add key="Local Feed" value="./LocalPackages" />
    <add key="Private" value="https://feed.example.com/nuget" />
  </packageSources>
  <disabledPackageSources>
    <add key="local feed" value="true" />
  </disabledPackageSources>
  <packageSourceCredentials>
    <Private>
      <add key="Username" value="deploy" />
      <add key="ClearTextPassword" value="s3cret" />
    </Private>
  </packageSourceCredentials>
  <activePackageSource>
    <add key="All" value="(Aggregate source)" />
  </activePackageSource>
  <config>
    <add key="repositoryPath" value="./Assets/Packages" />
    <add key="DefaultPushSource" value="https://feed.example.com/nuget" />
  </config>
</configuration>"#;

    #[test]
    fn test_parse_sources() {
        let config = NugetConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[0].name, "nuget.org");
        assert!(!config.sources[0].is_local());
        assert!(config.sources[1].is_local());
    }

    #[test]
    fn test_disabled_source_matching_is_case_insensitive() {
        let config = NugetConfig::parse(SAMPLE).unwrap();
        assert!(!config.find_source("Local Feed").unwrap().enabled);
        assert_eq!(config.enabled_sources().count(), 2);
    }

    #[test]
    fn test_credentials_attach_to_source() {
        let config = NugetConfig::parse(SAMPLE).unwrap();
        let private = config.find_source("Private").unwrap();
        assert_eq!(private.password.as_deref(), Some("s3cret"));
        assert!(config.find_source("nuget.org").unwrap().password.is_none());
    }

    #[test]
    fn test_config_section() {
        let config = NugetConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.repository_path, "./Assets/Packages");
        assert_eq!(
            config.default_push_source.as_deref(),
            Some("https://feed.example.com/nuget")
        );
    }

    #[test]
    fn test_clear_resets_sources() {
        let xml = r#"<configuration><packageSources>
            <add key="stale" value="https://old.example.com/" />
            <clear />
            <add key="fresh" value="https://new.example.com/" />
        </packageSources></configuration>"#;
        let config = NugetConfig::parse(xml).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "fresh");
    }

    #[test]
    fn test_default_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = NugetConfig::load_from(dir.path().join(NUGET_CONFIG)).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].path, DEFAULT_FEED_URL);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(NUGET_CONFIG);

        let original = NugetConfig::parse(SAMPLE).unwrap();
        original.save_to(&path).unwrap();

        let reloaded = NugetConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.sources, original.sources);
        assert_eq!(reloaded.repository_path, original.repository_path);
        assert_eq!(reloaded.default_push_source, original.default_push_source);
    }

    #[test]
    fn test_resolved_repository_path() {
        let config = NugetConfig::parse(SAMPLE).unwrap();
        let resolved = config.resolved_repository_path(Path::new("/project"));
        assert_eq!(resolved, Path::new("/project/./Assets/Packages"));
    }
}
