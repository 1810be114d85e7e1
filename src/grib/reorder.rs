//! Splicing a local composite file into Tawhiri order.
//!
//! GRIB2 messages are independent and may be concatenated freely, so
//! reordering is a byte copy: seek to each wanted record and copy exactly
//! its extent.

use std::io::SeekFrom;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufWriter};
use tracing::{info, instrument, warn};

use super::{GribError, GribTool, load_inventory};
use crate::download::TemporaryFileSet;
use crate::inventory::{Inventory, InventoryItem};
use crate::tawhiri::{TawhiriOptions, tawhiri_order};

/// Writes the Tawhiri-valid records of `source` to `dest` in Tawhiri order.
///
/// Returns the inventory of `dest`: the copied records renumbered from 1 and
/// rebased to their new offsets.
///
/// # Errors
///
/// Returns [`GribError::ShortRecord`] if `source` is shorter than its
/// inventory claims, and the tool's or file system's errors.
#[instrument(skip(tool), fields(source = %source.display(), dest = %dest.display()))]
pub async fn reorder_composite(tool: &dyn GribTool, source: &Path, dest: &Path) -> Result<Inventory, GribError> {
    let inventory = load_inventory(tool, source).await?;
    let ordered = tawhiri_order(&inventory, TawhiriOptions::default());
    info!(records = ordered.len(), of = inventory.len(), "re-ordering records");

    let mut input = tokio::fs::File::open(source)
        .await
        .map_err(|e| GribError::io(source, e))?;
    let output = tokio::fs::File::create(dest)
        .await
        .map_err(|e| GribError::io(dest, e))?;
    let mut output = BufWriter::new(output);

    let mut rebased = Vec::with_capacity(ordered.len());
    let mut written = 0u64;

    for (idx, item) in ordered.into_iter().enumerate() {
        input
            .seek(SeekFrom::Start(item.offset))
            .await
            .map_err(|e| GribError::io(source, e))?;

        let mut record = (&mut input).take(item.extent);
        let copied = tokio::io::copy(&mut record, &mut output)
            .await
            .map_err(|e| GribError::io(dest, e))?;
        if copied != item.extent {
            return Err(GribError::ShortRecord {
                record: item.record_number,
                expected: item.extent,
                copied,
            });
        }

        rebased.push(InventoryItem {
            record_number: u32::try_from(idx + 1).unwrap_or(u32::MAX),
            offset: written,
            ..item.clone()
        });
        written += copied;
    }

    output.flush().await.map_err(|e| GribError::io(dest, e))?;
    Ok(rebased)
}

/// Prefix of the temporary composite [`extract_binary`] writes for `dest`.
#[must_use]
pub fn extract_temp_prefix(dest: &Path) -> String {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{name}.reordered.grib2.")
}

/// Reorders `source` into a temporary composite, then expands that into
/// `dest` as headerless native floats in Tawhiri order.
///
/// The temporary composite is created through `temp_files` and removed on
/// every exit path.
///
/// # Errors
///
/// Returns [`GribError::OutputExists`] if `dest` already exists, and the
/// errors of [`reorder_composite`] and the tool.
#[instrument(skip(tool, temp_files), fields(source = %source.display(), dest = %dest.display()))]
pub async fn extract_binary(
    tool: &dyn GribTool,
    source: &Path,
    dest: &Path,
    temp_files: &TemporaryFileSet,
) -> Result<(), GribError> {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        return Err(GribError::OutputExists {
            path: dest.to_path_buf(),
        });
    }

    let (file, tmp_path) = temp_files
        .create()
        .map_err(|e| GribError::io(temp_files.dir(), std::io::Error::other(e)))?;
    drop(file);

    let result = reorder_then_expand(tool, source, dest, &tmp_path).await;

    info!(path = %tmp_path.display(), "removing temporary composite");
    if let Err(e) = temp_files.remove(&tmp_path).await {
        warn!(error = %e, "could not remove temporary composite");
    }
    result
}

async fn reorder_then_expand(tool: &dyn GribTool, source: &Path, dest: &Path, tmp_path: &Path) -> Result<(), GribError> {
    info!(path = %tmp_path.display(), "re-ordering input to temporary composite");
    let rebased = reorder_composite(tool, source, tmp_path).await?;

    info!(path = %dest.display(), "expanding");
    let items: Vec<&InventoryItem> = rebased.iter().collect();
    tool.expand(&items, tmp_path, dest).await
}
