use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML deserialize error: {0}")]
    XmlDe(#[from] quick_xml::de::DeError),

    #[error("XML serialize error: {0}")]
    XmlSe(#[from] quick_xml::se::SeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed version '{input}': {reason}")]
    MalformedVersion { input: String, reason: String },

    #[error("Package not found: {0}\n\n\
             Hint: No enabled package source returned a version satisfying the request.\n\n\
             Suggestions:\n\
             \x20 • Check the package id spelling\n\
             \x20 • Check which sources are enabled in NuGet.config\n\
             \x20 • Widen the version range (e.g. [1.0,) instead of [1.0])")]
    PackageNotFound(String),

    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Install target already exists: {0}\n\n\
             Hint: A copy of this package's content is already on disk.\n\
             Remove the directory, or re-run without --no-overwrite to replace it.")]
    ContentConflict(std::path::PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a `MalformedVersion` error for a given input string.
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Error::MalformedVersion {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
