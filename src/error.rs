//! Error types for the rendering pipeline

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

use crate::response::{STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_NOT_FOUND};

/// Errors raised while resolving, transforming or rendering a request
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Content not found: {}", .0.display())]
    ContentNotFound(PathBuf),

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    #[error("Plugin {0} not found in registry")]
    UnknownPlugin(String),

    #[error("Plugin {plugin} failed: {source}")]
    PluginFailure {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read static asset {}: {source}", path.display())]
    StaticAssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    #[error("Template error in {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SiteError {
    /// HTTP-equivalent status for this error
    pub fn status(&self) -> u16 {
        match self {
            SiteError::ContentNotFound(_) | SiteError::UnknownContentType(_) => STATUS_NOT_FOUND,
            SiteError::InvalidPath(_) => STATUS_BAD_REQUEST,
            _ => STATUS_INTERNAL_ERROR,
        }
    }

    /// Wrap an IO error, turning a missing file into `ContentNotFound`
    pub(crate) fn content_io(path: PathBuf, source: std::io::Error) -> Self {
        if is_missing(&source) {
            SiteError::ContentNotFound(path)
        } else {
            SiteError::Io { path, source }
        }
    }
}

/// True for errors meaning "no file at this path"
///
/// A path through a regular file ("hello.md/x") reports `NotADirectory`.
pub(crate) fn is_missing(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Chain of an error and all its sources, joined with ": "
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !chain.ends_with(&cause_text) {
            chain.push_str(": ");
            chain.push_str(&cause_text);
        }
        source = cause.source();
    }
    chain
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, SiteError>;
