/// Crate-wide error types.
///
/// Every failure in the core is fatal to whatever started it: a level that
/// fails to load aborts the load, a draw call that fails aborts the frame
/// (and with it the session). Nothing here is retried.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Failure reported by a rendering backend.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("non-finite geometry passed to {0}")]
    NonFinite(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not reserve storage for {what}: {source}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },
    #[error("render backend failed: {0}")]
    RenderBackend(#[from] RenderError),
    #[error("malformed level data at line {line}: {reason}")]
    MalformedLevelData { line: usize, reason: String },
    #[error("could not read level: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedLevelData { line, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
