//! Error types for the photomap engine.
//!
//! Per-file ingestion failures are deliberately *not* represented here: a
//! file without usable GPS metadata is dropped with a diagnostic and never
//! surfaces as an `Err` at the pipeline boundary.

use thiserror::Error;

use crate::types::NodeId;

/// Errors surfaced by the engine's public API.
#[derive(Debug, Error)]
pub enum PhotoMapError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A click or expansion referenced a node the current index does not
    /// contain (typically a stale id from a previous index snapshot).
    #[error("unknown node id: {0:?}")]
    UnknownNode(NodeId),

    /// The background ingestion task could not be joined.
    #[error("ingestion task failed: {0}")]
    IngestTask(String),
}

/// Errors produced while reading geotag metadata from a single file.
///
/// These never propagate past the ingestion pipeline; they only decide
/// whether a file is dropped.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The container or its EXIF segment could not be parsed.
    #[error("failed to read image metadata: {0}")]
    Metadata(#[from] exif::Error),

    /// A GPS field was present but not in the expected shape.
    #[error("malformed GPS field: {0}")]
    MalformedGps(&'static str),
}

pub type Result<T> = std::result::Result<T, PhotoMapError>;
