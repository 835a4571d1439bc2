//! Error type shared by both workflows.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A GitHub endpoint answered with a non-success status.
    #[error("GitHub API returned {status}: {body}")]
    ApiStatus { status: StatusCode, body: String },

    #[error("not a GitHub repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("no asset of type {file_type} in the latest release of {url}")]
    NoMatchingAsset { url: String, file_type: String },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{path} is not a valid archive or is corrupted: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("archive entry escapes the destination: {0}")]
    UnsafeEntryPath(String),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("git {command} failed: {reason}")]
    Git { command: String, reason: String },
}

impl Error {
    /// Errors caused by the archive contents rather than the local system.
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            Error::Zip(_) | Error::CorruptArchive { .. } | Error::UnsafeEntryPath(_)
        )
    }
}
