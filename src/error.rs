use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while talking to a remote server or persisting its payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http error for {url}: status {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no media link on landing page {url}: {reason}")]
    NotFound { url: String, reason: &'static str },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Why a single work item ended up `Failed`.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("worker task aborted: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read input {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("input {} has no `{column}` column", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no pipeline configured")]
    NoPipeline,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("landing page template `{0}` lacks the {{url}} placeholder")]
    BadTemplate(String),
}

/// Conditions that stop a run before (or, in strict mode, after) dispatch.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("cannot build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("{failed} item(s) failed")]
    FailedItems { failed: usize },
}

pub type Result<T, E = RunError> = std::result::Result<T, E>;
