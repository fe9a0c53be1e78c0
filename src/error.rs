use thiserror::Error;

use crate::archive::ArchiveFormat;

/// Failure of a single catalog-service operation. Never fatal to the
/// run: the resolver treats any variant as "no result from this
/// service" and the driver moves on to the next configured service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("unable to parse response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("response cache error: {0}")]
    Cache(#[from] rusqlite::Error),
    #[error("{0} lookups are not supported by this service")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{0} is not a recognised comic archive")]
    UnrecognisedExtension(String),
    #[error("{0} archives are read-only; pick a different output format")]
    ReadOnlyFormat(ArchiveFormat),
    #[error("no `{0}` binary found on PATH")]
    MissingTool(&'static str),
    #[error("`{tool}` failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
