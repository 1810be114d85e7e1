//! Local GRIB2 files and the external wgrib2 tool.
//!
//! The crate never decodes GRIB2 records itself. Everything that needs to
//! look inside a file goes through a [`GribTool`]: a short inventory of the
//! file, the grid shape of chosen records, and expansion of chosen records
//! into a flat array of native floats. [`Wgrib2`] implements it by running
//! the `wgrib2` binary; tests substitute their own implementation.
//!
//! On top of the tool this module provides the local operations:
//! [`reorder_composite`], [`extract_binary`] and [`collate_info`].

mod error;
mod info;
mod reorder;
mod wgrib2;

use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

pub use error::GribError;
pub use info::{GribInfo, collate_info};
pub use reorder::{extract_binary, extract_temp_prefix, reorder_composite};
pub use wgrib2::{DEFAULT_WGRIB2_COMMAND, Wgrib2};

use crate::inventory::{Inventory, InventoryItem, parse_inventory};
use crate::utils::compile_static_regex;

static SHAPE_FIELD: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^\((\d+) x (\d+)\)$"));

/// Size of one record's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    /// Points along a latitude circle (NX).
    pub columns: u32,
    /// Points along a meridian (NY).
    pub rows: u32,
}

/// Black-box access to a GRIB2 toolkit.
///
/// Records are always passed to the tool as short-format inventory lines
/// (see [`InventoryItem::short_lines`]); their order fixes the order of
/// the tool's output.
#[async_trait]
pub trait GribTool: Send + Sync {
    /// Returns the short inventory of `path` as text.
    async fn short_inventory(&self, path: &Path) -> Result<String, GribError>;

    /// Returns one `-nxny` style line per record of `items` found in `input`.
    async fn grid_listing(&self, items: &[&InventoryItem], input: &Path) -> Result<String, GribError>;

    /// Writes the records `items` of `input` to `output` as headerless
    /// native floats, in the order given.
    async fn expand(&self, items: &[&InventoryItem], input: &Path, output: &Path) -> Result<(), GribError>;
}

/// Loads and parses the inventory of a local file.
///
/// # Errors
///
/// Returns [`GribError::Io`] if the file cannot be inspected, or the tool's
/// and parser's errors.
pub async fn load_inventory(tool: &dyn GribTool, path: &Path) -> Result<Inventory, GribError> {
    let total_length = tokio::fs::metadata(path)
        .await
        .map_err(|e| GribError::io(path, e))?
        .len();
    let text = tool.short_inventory(path).await?;
    Ok(parse_inventory(Cursor::new(text), total_length)?)
}

/// Asks the tool for the grid shape of each of `items`.
///
/// # Errors
///
/// Returns the tool's errors, or [`GribError::ShapeFormat`] for unexpected
/// output.
pub async fn grid_shapes(tool: &dyn GribTool, items: &[&InventoryItem], input: &Path) -> Result<Vec<GridShape>, GribError> {
    let listing = tool.grid_listing(items, input).await?;
    parse_grid_shapes(&listing)
}

/// Parses `-nxny` output: the third colon-separated field of each line must
/// read `(NX x NY)`.
///
/// # Errors
///
/// Returns [`GribError::ShapeFormat`] naming the first bad line.
pub fn parse_grid_shapes(listing: &str) -> Result<Vec<GridShape>, GribError> {
    listing
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let bad = || GribError::ShapeFormat { line: line.to_string() };
            let field = line.split(':').nth(2).ok_or_else(bad)?;
            let caps = SHAPE_FIELD.captures(field).ok_or_else(bad)?;
            let columns = caps[1].parse().map_err(|_| bad())?;
            let rows = caps[2].parse().map_err(|_| bad())?;
            Ok(GridShape { columns, rows })
        })
        .collect()
}
