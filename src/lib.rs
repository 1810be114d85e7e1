//! Aonui Core Library
//!
//! This library fetches the wind-relevant subset of Global Forecast System
//! runs from NOAA's directory listings and rearranges GRIB2 composite files
//! into the record order the Tawhiri predictor expects.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - Retrying HTTP fetches, byte-range retrieval and the
//!   concurrent run synchronization pipeline
//! - [`source`] - Data sources, runs and datasets discovered from index pages
//! - [`inventory`] - wgrib2 "short" inventories and record selection
//! - [`tawhiri`] - The canonical Tawhiri record ordering
//! - [`grib`] - The external wgrib2 tool and local reorder/extract operations

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod grib;
pub mod inventory;
pub mod source;
pub mod tawhiri;

mod utils;

// Re-export commonly used types
pub use download::{
    ByteCount, DEFAULT_MAX_DOWNLOADS, DownloadError, DownloadLimiter, DownloadStats, FetchStrategy,
    HttpClient, RunSummary, SyncEngine, SyncError, TemporaryFileSet,
};
pub use grib::{
    GribError, GribInfo, GribTool, GridShape, Wgrib2, collate_info, extract_binary, load_inventory,
    reorder_composite,
};
pub use inventory::{Inventory, InventoryError, InventoryItem, RecordSelection, parse_inventory};
pub use source::{DataSource, Dataset, Run, SourceError, sort_newest_first};
pub use tawhiri::{TawhiriItem, TawhiriOptions, tawhiri_order};
