//! Error types for local GRIB2 operations.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::inventory::InventoryError;

/// Errors raised by the external tool or by local splicing.
#[derive(Debug, Error)]
pub enum GribError {
    /// The tool could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Program name.
        command: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Feeding inventory lines to the tool failed.
    #[error("failed writing to {command}: {source}")]
    Stdin {
        /// Program name.
        command: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully.
    #[error("{command} exited with {status}")]
    ToolFailed {
        /// Program name.
        command: String,
        /// Exit status.
        status: ExitStatus,
    },

    /// File system error on a local file.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The tool's inventory could not be parsed.
    #[error("error loading grib: {0}")]
    Inventory(#[from] InventoryError),

    /// A `-nxny` line did not carry a `(NX x NY)` field.
    #[error("grid shape line has wrong format: '{line}'")]
    ShapeFormat {
        /// The offending line.
        line: String,
    },

    /// The source file ended inside a record.
    #[error("record {record} ended early: copied {copied} of {expected} byte(s)")]
    ShortRecord {
        /// Record number.
        record: u32,
        /// Bytes the inventory promised.
        expected: u64,
        /// Bytes actually copied.
        copied: u64,
    },

    /// The file holds no usable records.
    #[error("no usable records in {path}")]
    EmptyInventory {
        /// The file inspected.
        path: PathBuf,
    },

    /// The tool reported no grid for the file.
    #[error("no grids in {path}")]
    NoGrids {
        /// The file inspected.
        path: PathBuf,
    },

    /// Refusing to replace an existing output file.
    #[error("not overwriting existing file {path}")]
    OutputExists {
        /// The existing file.
        path: PathBuf,
    },
}

impl GribError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
