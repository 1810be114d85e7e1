//! Which records of a remote dataset are worth fetching.

use super::InventoryItem;

/// Parameters kept by the default selection: geopotential height and the two
/// horizontal wind components.
pub const WIND_PARAMETERS: [&str; 3] = ["HGT", "UGRD", "VGRD"];

/// Layer suffix marking an isobaric (pressure-level) record.
pub const PRESSURE_LAYER_SUFFIX: &str = " mb";

/// Record selection policy applied to a dataset's inventory before fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSelection {
    parameters: Vec<String>,
    pressure_levels_only: bool,
}

impl Default for RecordSelection {
    /// `HGT`, `UGRD` and `VGRD` on pressure levels only.
    fn default() -> Self {
        Self::new(WIND_PARAMETERS, true)
    }
}

impl RecordSelection {
    /// Selects records carrying any of `parameters`, optionally restricted to
    /// layers ending in `" mb"`.
    pub fn new<I, S>(parameters: I, pressure_levels_only: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            pressure_levels_only,
        }
    }

    /// Whether `item` is wanted.
    #[must_use]
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let wanted_param = item.parameters.iter().any(|p| self.parameters.contains(p));
        let wanted_layer = !self.pressure_levels_only || item.layer_name.ends_with(PRESSURE_LAYER_SUFFIX);
        wanted_param && wanted_layer
    }

    /// Keeps the wanted, non-empty records of `inventory`, in inventory order.
    #[must_use]
    pub fn select<'a>(&self, inventory: &'a [InventoryItem]) -> Vec<&'a InventoryItem> {
        inventory
            .iter()
            .filter(|item| item.extent > 0 && self.matches(item))
            .collect()
    }
}
