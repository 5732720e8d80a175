//! Error taxonomy for the harvest pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::RunnerError;

/// Errors produced by catalog discovery, download, extraction and the runner.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Server answered with a non-success status.
    #[error("{context}: unexpected HTTP status {status}")]
    FetchStatus { context: String, status: u32 },

    /// Network-level failure (DNS, connect, timeout, reset).
    #[error("{context}: request failed")]
    FetchNetwork {
        context: String,
        #[source]
        source: curl::Error,
    },

    /// A page did not have the expected shape.
    #[error("{0}")]
    Parse(String),

    /// Archive missing, unreadable or corrupt.
    #[error("cannot open archive {}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Read or write failure while streaming a download or an archive entry.
    #[error("I/O error on {}", path.display())]
    StreamIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking worker (page fetch, download, extraction) panicked.
    #[error("blocking worker did not complete")]
    Worker(#[source] tokio::task::JoinError),

    /// First failure captured by the bounded runner.
    #[error(transparent)]
    Runner(Box<RunnerError<HarvestError>>),
}

impl HarvestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarvestError::StreamIo {
            path: path.into(),
            source,
        }
    }
}

impl From<RunnerError<HarvestError>> for HarvestError {
    fn from(e: RunnerError<HarvestError>) -> Self {
        HarvestError::Runner(Box::new(e))
    }
}

pub type Result<T, E = HarvestError> = std::result::Result<T, E>;
