//! Shape summary of a Tawhiri-ordered GRIB2 file.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use super::{GribError, GribTool, grid_shapes, load_inventory};
use crate::tawhiri::{TawhiriItem, TawhiriOptions, tawhiri_order};

/// Dimensions of the data Tawhiri would read from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GribInfo {
    /// Grid columns (NX).
    pub width: u32,
    /// Grid rows (NY).
    pub height: u32,
    /// Parameter names, first-seen in Tawhiri order.
    pub parameters: Vec<String>,
    /// Distinct pressures in millibars, descending.
    pub pressures: Vec<u32>,
    /// Distinct forecast hours, ascending.
    pub forecast_hours: Vec<u32>,
    /// Reference time of the first record.
    pub run_time: DateTime<Utc>,
}

/// Scans the inventory of `path` and collates its Tawhiri dimensions.
///
/// The grid shape is read from the first record only; the run time is that
/// of the first record.
///
/// # Errors
///
/// Returns [`GribError::EmptyInventory`] if no record is Tawhiri-valid,
/// [`GribError::NoGrids`] if the tool reports no shape, and the tool's
/// errors.
#[instrument(skip(tool), fields(path = %path.display()))]
pub async fn collate_info(tool: &dyn GribTool, path: &Path) -> Result<GribInfo, GribError> {
    let inventory = load_inventory(tool, path).await?;
    let ordered = tawhiri_order(&inventory, TawhiriOptions::default());
    let Some(first) = ordered.first() else {
        return Err(GribError::EmptyInventory {
            path: path.to_path_buf(),
        });
    };
    let run_time = first.timestamp;

    let mut forecast_hours = BTreeSet::new();
    let mut pressures = BTreeSet::new();
    let mut parameters: Vec<String> = Vec::new();

    for tw in ordered.iter().copied().map(TawhiriItem::classify) {
        forecast_hours.insert(tw.forecast_hour);
        pressures.insert(tw.pressure);
        for param in &tw.item.parameters {
            if !parameters.contains(param) {
                parameters.push(param.clone());
            }
        }
    }

    let shapes = grid_shapes(tool, &ordered[..1], path).await?;
    let Some(shape) = shapes.first() else {
        return Err(GribError::NoGrids {
            path: path.to_path_buf(),
        });
    };

    Ok(GribInfo {
        width: shape.columns,
        height: shape.rows,
        parameters,
        pressures: pressures.into_iter().rev().collect(),
        forecast_hours: forecast_hours.into_iter().collect(),
        run_time,
    })
}

impl fmt::Display for GribInfo {
    /// `KEY=value` lines, one per dimension.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &[u32]| values.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");

        writeln!(f, "NX={}", self.width)?;
        writeln!(f, "NY={}", self.height)?;
        writeln!(f, "NPARAM={}", self.parameters.len())?;
        writeln!(f, "NPRESSURE={}", self.pressures.len())?;
        writeln!(f, "NFCSTHOUR={}", self.forecast_hours.len())?;
        writeln!(f, "PRESSURES={}", join(&self.pressures))?;
        writeln!(f, "FCSTHOURS={}", join(&self.forecast_hours))?;
        writeln!(f, "RUNTIME={}", self.run_time.format("%Y%m%d%H"))
    }
}
