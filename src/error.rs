//! Error types for gitree
//!
//! Only configuration problems and unusable roots are errors. Anything that
//! goes wrong inside the walk (unreadable directories, unreadable files) is
//! recorded on the result instead, so a single bad entry never aborts a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the caller before or around a traversal.
#[derive(Debug, Error)]
pub enum Error {
    /// A user-supplied include/exclude pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A `--include-file-types` entry could not be turned into a type matcher.
    #[error("invalid file type '{name}': {source}")]
    InvalidFileType {
        name: String,
        #[source]
        source: ignore::Error,
    },

    /// Conflicting or out-of-range settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot access '{path}': {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("interactive prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidConfig`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
