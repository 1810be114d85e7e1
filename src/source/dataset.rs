//! Individual GRIB2 datasets within a run.

use std::io::Cursor;
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tracing::{debug, instrument};
use url::Url;

use super::error::SourceError;
use super::run::Run;
use crate::download::{ByteRange, DownloadError, HttpClient};
use crate::inventory::{Inventory, InventoryItem, parse_inventory};

/// Suffix appended to a dataset's path to locate its short inventory.
const INVENTORY_SUFFIX: &str = ".idx";

/// One file of a run, covering one forecast hour of one product.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// The run this dataset belongs to.
    pub run: Arc<Run>,
    /// File name, e.g. `gfs.t00z.pgrb2f06`.
    pub identifier: String,
    /// Absolute URL of the GRIB2 file.
    pub url: Url,
    /// Product type captured from the name, e.g. `pgrb2f` or `pgrb2b`.
    pub type_identifier: String,
    /// Forecast hour captured from the name.
    pub forecast_hour: u32,
}

impl Dataset {
    /// URL of the short inventory published next to the dataset.
    #[must_use]
    pub fn inventory_url(&self) -> Url {
        let mut url = self.url.clone();
        let path = format!("{}{INVENTORY_SUFFIX}", url.path());
        url.set_path(&path);
        url
    }

    /// Whether the source's forecast-hour limit lets this dataset through.
    #[must_use]
    pub fn within_forecast_limit(&self) -> bool {
        let max = self.run.source.max_forecast_hour();
        max == 0 || self.forecast_hour <= max
    }

    /// Fetches and parses the dataset's inventory.
    ///
    /// The dataset's total length comes from a `HEAD` request; it is needed
    /// for the extent of the final record.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Download`] for HTTP failures (including a
    /// missing Content-Length) and [`SourceError::Inventory`] for a malformed
    /// inventory.
    #[instrument(skip(self, client), fields(dataset = %self.identifier))]
    pub async fn fetch_inventory(&self, client: &HttpClient) -> Result<Inventory, SourceError> {
        let total_length = client.content_length(&self.url).await?;
        let text = client.get_text(&self.inventory_url()).await?;
        let inventory = parse_inventory(Cursor::new(text), total_length)?;
        debug!(records = inventory.len(), total_length, "parsed inventory");
        Ok(inventory)
    }

    /// Fetches `records` in one ranged request and streams them into `writer`,
    /// in the order given.
    ///
    /// The transfer is bounded by the source's fetch timeout. Zero-length
    /// records are skipped; with nothing left to fetch no request is made.
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the [`DownloadError`] of the ranged request.
    pub async fn fetch_records<W>(
        &self,
        client: &HttpClient,
        records: &[&InventoryItem],
        writer: &mut W,
    ) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let ranges: Vec<ByteRange> = records
            .iter()
            .filter_map(|item| ByteRange::from_extent(item.offset, item.extent))
            .collect();
        if ranges.is_empty() {
            return Ok(0);
        }

        let deadline = self.run.source.strategy().fetch_timeout();
        client.fetch_ranges(&self.url, &ranges, writer, deadline).await
    }
}
