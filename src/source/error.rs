//! Error types for source discovery.

use thiserror::Error;

use crate::download::DownloadError;
use crate::inventory::InventoryError;

/// Errors raised while discovering runs and datasets or fetching an inventory.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A network operation failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A dataset's inventory was malformed.
    #[error("malformed inventory: {0}")]
    Inventory(#[from] InventoryError),

    /// A run or dataset pattern does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern text.
        pattern: String,
        /// The regex compile error.
        #[source]
        source: regex::Error,
    },

    /// The root URL does not parse.
    #[error("invalid root URL '{url}': {source}")]
    InvalidRootUrl {
        /// The URL text.
        url: String,
        /// The parse error.
        #[source]
        source: url::ParseError,
    },
}
