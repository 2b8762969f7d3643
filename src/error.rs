use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

/// An enum for describing and handling the run-level errors encountered while
/// collecting merges or writing release notes.
///
/// Problems that only concern a single pull request are not errors; they are
/// reported as a [`Diagnostic`](crate::Diagnostic) and the run continues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse config file {0}: {1}")]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    #[error("incorrect format for config file: {0}")]
    ConfigFormat(PathBuf),

    #[error("cannot get current directory")]
    CurrentDir,

    #[error("fatal I/O error")]
    Io(#[from] std::io::Error),

    #[error("`git {args}` failed: {stderr}")]
    Git { args: String, stderr: String },

    #[error("unexpected `git log` record: {0:?}")]
    GitRecord(String),

    #[error("http request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to serialize report")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern {0:?}")]
    Pattern(String, #[source] regex::Error),

    #[error("repository must be given as <owner>/<name>, got {0:?}")]
    Repository(String),
}
