//! The record ordering the Tawhiri predictor expects.
//!
//! Tawhiri reads wind data as a dense array indexed by forecast hour, then
//! pressure level, then parameter. A composite file is in "Tawhiri order"
//! when its records are sorted:
//!
//! 1. by forecast hour, ascending (`anl` counts as hour 0);
//! 2. by pressure, descending (1000 mb first);
//! 3. by parameter: `HGT`, `UGRD`, `VGRD`, then anything else.
//!
//! Records whose forecast hour or pressure cannot be derived are "invalid".
//! They sort after every valid record and are dropped when filtering.
//!
//! # Example
//!
//! ```
//! use aonui_core::{TawhiriOptions, parse_inventory, tawhiri_order};
//!
//! let text = "1:0:d=2014110100:UGRD:500 mb:6 hour fcst:\n\
//!             2:10:d=2014110100:HGT:surface:anl:\n\
//!             3:20:d=2014110100:HGT:500 mb:anl:\n";
//! let inventory = parse_inventory(text.as_bytes(), 30).unwrap();
//!
//! let ordered = tawhiri_order(&inventory, TawhiriOptions::default());
//! let records: Vec<u32> = ordered.iter().map(|i| i.record_number).collect();
//! assert_eq!(records, vec![3, 1]);
//! ```

use std::cmp::Ordering;

use crate::inventory::InventoryItem;

const FORECAST_SUFFIX: &str = " hour fcst";
const PRESSURE_SUFFIX: &str = " mb";
const ANALYSIS_TYPE: &str = "anl";

/// Parameter rank for anything that is not `HGT`, `UGRD` or `VGRD`.
pub const OTHER_PARAM_INDEX: u8 = 3;

/// A view of an [`InventoryItem`] with the fields Tawhiri ordering needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TawhiriItem<'a> {
    /// The classified record.
    pub item: &'a InventoryItem,
    /// Forecast hour; 0 for analyses and for unparseable types.
    pub forecast_hour: u32,
    /// Pressure in millibars; 0 when unparseable.
    pub pressure: u32,
    /// 0 for `HGT`, 1 for `UGRD`, 2 for `VGRD`, 3 otherwise.
    pub param_index: u8,
    /// True only if both forecast hour and pressure were derived.
    pub is_valid: bool,
}

impl<'a> TawhiriItem<'a> {
    /// Derives the ordering fields of `item`.
    #[must_use]
    pub fn classify(item: &'a InventoryItem) -> Self {
        let param_index = match item.parameters.first().map(String::as_str) {
            Some("HGT") => 0,
            Some("UGRD") => 1,
            Some("VGRD") => 2,
            _ => OTHER_PARAM_INDEX,
        };

        let forecast_hour = if item.type_name == ANALYSIS_TYPE {
            Some(0)
        } else {
            item.type_name
                .strip_suffix(FORECAST_SUFFIX)
                .and_then(|hours| hours.parse::<u32>().ok())
        };

        let pressure = item
            .layer_name
            .strip_suffix(PRESSURE_SUFFIX)
            .and_then(|mb| mb.parse::<u32>().ok());

        Self {
            item,
            forecast_hour: forecast_hour.unwrap_or(0),
            pressure: pressure.unwrap_or(0),
            param_index,
            is_valid: forecast_hour.is_some() && pressure.is_some(),
        }
    }

    /// Total order used by [`tawhiri_order`].
    ///
    /// Invalid items compare greater than valid ones and equal to each other,
    /// so a stable sort keeps them in their original relative order.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.is_valid, other.is_valid) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (true, true) => self
                .forecast_hour
                .cmp(&other.forecast_hour)
                .then_with(|| other.pressure.cmp(&self.pressure))
                .then_with(|| self.param_index.cmp(&other.param_index)),
        }
    }
}

/// Classifies every item, keeping inventory order.
#[must_use]
pub fn to_tawhiris(items: &[InventoryItem]) -> Vec<TawhiriItem<'_>> {
    items.iter().map(TawhiriItem::classify).collect()
}

/// Recovers the underlying items, keeping slice order.
#[must_use]
pub fn from_tawhiris<'a>(items: &[TawhiriItem<'a>]) -> Vec<&'a InventoryItem> {
    items.iter().map(|t| t.item).collect()
}

/// Which steps [`tawhiri_order`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TawhiriOptions {
    /// Stable-sort by [`TawhiriItem::compare`].
    pub sort: bool,
    /// Drop invalid items.
    pub filter: bool,
}

impl Default for TawhiriOptions {
    fn default() -> Self {
        Self {
            sort: true,
            filter: true,
        }
    }
}

/// Filters and/or stable-sorts `items` into Tawhiri order.
#[must_use]
pub fn tawhiri_order(items: &[InventoryItem], options: TawhiriOptions) -> Vec<&InventoryItem> {
    let mut tawhiris = to_tawhiris(items);
    if options.filter {
        tawhiris.retain(|t| t.is_valid);
    }
    if options.sort {
        tawhiris.sort_by(TawhiriItem::compare);
    }
    from_tawhiris(&tawhiris)
}
