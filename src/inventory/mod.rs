//! Byte-addressed record inventories of composite GRIB2 files.
//!
//! An inventory lists the records of a composite file in file order, each with
//! its absolute offset and computed extent. Inventories come from two places:
//! the `.idx` file NOAA publishes next to each dataset, and the `-s` output of
//! the local wgrib2 tool. Both use the same short format, parsed by
//! [`parse_inventory`] and rendered back by [`InventoryItem::short_lines`].
//!
//! # Example
//!
//! ```
//! use aonui_core::{RecordSelection, parse_inventory};
//!
//! let text = "1:0:d=2014110100:HGT:850 mb:anl:\n\
//!             2:200:d=2014110100:TMP:850 mb:anl:\n\
//!             3:400:d=2014110100:UGRD:10 m above ground:anl:\n";
//! let inventory = parse_inventory(text.as_bytes(), 600).unwrap();
//!
//! let wanted = RecordSelection::default().select(&inventory);
//! assert_eq!(wanted.len(), 1);
//! assert_eq!(wanted[0].parameters, vec!["HGT"]);
//! ```

mod error;
mod parser;
mod select;

use chrono::{DateTime, Utc};

pub use error::InventoryError;
pub use parser::parse_inventory;
pub use select::RecordSelection;

/// One record of a composite file, possibly carrying several coupled
/// parameters (e.g. `UGRD` and `VGRD` stored as one record pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    /// Record number as written in the inventory.
    pub record_number: u32,
    /// Absolute byte offset within the composite file.
    pub offset: u64,
    /// Length in bytes, up to the next record or end of file.
    pub extent: u64,
    /// Reference time of the record.
    pub timestamp: DateTime<Utc>,
    /// Parameter names, one per sub-record, in inventory order; never empty
    /// when produced by the parser.
    pub parameters: Vec<String>,
    /// Layer, e.g. `850 mb`.
    pub layer_name: String,
    /// Forecast type, e.g. `anl` or `6 hour fcst`.
    pub type_name: String,
    /// Field average count; 0 when absent.
    pub field_average_count: u32,
}

/// An ordered list of records.
pub type Inventory = Vec<InventoryItem>;

impl InventoryItem {
    /// Renders the item as short-format inventory lines, one per parameter.
    ///
    /// Items with more than one parameter are written as `N.1`, `N.2`, ...;
    /// an absent field average count is written as an empty field.
    ///
    /// ```
    /// use aonui_core::parse_inventory;
    ///
    /// let line = "4:1200:d=2014110106:HGT:500 mb:12 hour fcst:";
    /// let item = &parse_inventory(line.as_bytes(), 2000).unwrap()[0];
    /// assert_eq!(item.short_lines(), vec![line.to_string()]);
    /// ```
    #[must_use]
    pub fn short_lines(&self) -> Vec<String> {
        let date = self.timestamp.format("%Y%m%d%H");
        let fac = if self.field_average_count == 0 {
            String::new()
        } else {
            self.field_average_count.to_string()
        };
        let multi = self.parameters.len() > 1;

        self.parameters
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                let record = if multi {
                    format!("{}.{}", self.record_number, idx + 1)
                } else {
                    self.record_number.to_string()
                };
                format!(
                    "{record}:{}:d={date}:{param}:{}:{}:{fac}",
                    self.offset, self.layer_name, self.type_name
                )
            })
            .collect()
    }
}

/// Renders every item's short lines, in order.
#[must_use]
pub fn short_lines<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    items.into_iter().flat_map(InventoryItem::short_lines).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_lines_numbers_subrecords() {
        let text = "7.1:300:d=2014110100:UGRD:250 mb:anl:\n7.2:300:d=2014110100:VGRD:250 mb:anl:\n";
        let inv = parse_inventory(text.as_bytes(), 500).unwrap();

        assert_eq!(
            inv[0].short_lines(),
            vec![
                "7.1:300:d=2014110100:UGRD:250 mb:anl:".to_string(),
                "7.2:300:d=2014110100:VGRD:250 mb:anl:".to_string(),
            ]
        );
    }

    #[test]
    fn test_short_lines_writes_field_average_count() {
        let inv = parse_inventory("2:40:d=2014110112:PRATE:surface:0-6 hour ave fcst:4".as_bytes(), 90).unwrap();
        assert_eq!(
            inv[0].short_lines(),
            vec!["2:40:d=2014110112:PRATE:surface:0-6 hour ave fcst:4".to_string()]
        );
    }

    #[test]
    fn test_short_lines_over_items_flattens() {
        let text = "1:0:d=2014110100:HGT:850 mb:anl:\n\
                    2.1:10:d=2014110100:UGRD:850 mb:anl:\n\
                    2.2:10:d=2014110100:VGRD:850 mb:anl:\n";
        let inv = parse_inventory(text.as_bytes(), 30).unwrap();
        assert_eq!(short_lines(&inv).len(), 3);
    }
}
