//! Errors raised while parsing a short inventory.

use thiserror::Error;

/// A short inventory could not be parsed.
///
/// Line numbers are 1-based. None of these are retried: a malformed inventory
/// is fatal to the fetch or file that produced it.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Fewer than seven colon-separated fields.
    #[error("line {line}: inventory record has {found} field(s), expecting at least 7")]
    TooFewFields {
        /// Offending line.
        line: usize,
        /// Fields present.
        found: usize,
    },

    /// The record id is not `N` or `N.M`.
    #[error("line {line}: invalid record number '{value}'")]
    InvalidRecordNumber {
        /// Offending line.
        line: usize,
        /// The raw record id.
        value: String,
    },

    /// A sub-record (`N.M`, `M > 1`) appeared before any record.
    #[error("line {line}: unexpected sub-record number >1 with no record in progress")]
    UnexpectedSubrecord {
        /// Offending line.
        line: usize,
    },

    /// The date field is not `d=YYYYMMDDHH` or names no real hour.
    #[error("line {line}: invalid date field '{value}'")]
    InvalidDateField {
        /// Offending line.
        line: usize,
        /// The raw date field.
        value: String,
    },

    /// A numeric field failed to parse.
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        /// Offending line.
        line: usize,
        /// Which field.
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// A record starts before the previous one.
    #[error("line {line}: offset {offset} precedes previous record offset {previous}")]
    OffsetsNotIncreasing {
        /// Offending line.
        line: usize,
        /// This record's offset.
        offset: u64,
        /// The previous record's offset.
        previous: u64,
    },

    /// The total length given for the file ends before its last record starts.
    #[error("total length {total_length} is before last record offset {offset}")]
    LengthBeforeLastOffset {
        /// Length supplied by the caller.
        total_length: u64,
        /// Offset of the last record.
        offset: u64,
    },

    /// The inventory stream itself failed.
    #[error("error reading inventory: {source}")]
    Read {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
