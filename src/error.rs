//! Crate-specific errors.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The scanner could not acquire its source.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Something went wrong while streaming points.
    ///
    /// The scanner stays usable after a `stop`/`init` cycle.
    #[error("scan failed: {0}")]
    Scan(String),

    /// A timestamp could not be built from the given input.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Object characterization found no dominant cluster or no faces.
    #[error("not enough points to characterize an object")]
    InsufficientPoints,

    /// The registry already holds an entry under this name.
    #[error("name already taken: {0}")]
    NameTaken(String),

    /// The registry holds no entry under this name.
    #[error("no such entry: {0}")]
    UnknownName(String),

    /// The file extension selects no known reader.
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFile(PathBuf),

    /// The LVX container is malformed.
    #[error("invalid lvx data: {0}")]
    InvalidLvx(String),

    /// Wrapper around `std::io::Error`.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
