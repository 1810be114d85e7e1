//! Individual GFS runs.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::dataset::Dataset;
use super::error::SourceError;
use super::index::anchor_targets;
use super::pattern::DatasetFields;
use super::DataSource;
use crate::download::HttpClient;

/// One publication cycle of a source.
#[derive(Debug, Clone)]
pub struct Run {
    /// The source this run was discovered from.
    pub source: Arc<DataSource>,
    /// Directory name without trailing slash, e.g. `gfs.2014110100`.
    pub identifier: String,
    /// Absolute URL of the run's index.
    pub url: Url,
    /// Run time, UTC, on the hour.
    pub timestamp: DateTime<Utc>,
}

impl Run {
    /// Lists the datasets in this run's index, in document order.
    ///
    /// A dataset whose run hour disagrees with the run's own hour is dropped
    /// with a warning. While a run is still being uploaded the list is a
    /// prefix of the full set.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Download`] if the index cannot be fetched.
    #[instrument(skip(self, client), fields(run = %self.identifier))]
    pub async fn discover_datasets(self: &Arc<Self>, client: &HttpClient) -> Result<Vec<Dataset>, SourceError> {
        let body = client.fetch_text(&self.url, self.source.strategy()).await?;
        let run_hour = self.timestamp.hour();

        let mut datasets = Vec::new();
        for href in anchor_targets(&body) {
            let identifier = href.trim_end_matches('/');
            let Some(fields) = DatasetFields::capture(self.source.dataset_pattern(), identifier) else {
                continue;
            };
            let Ok(url) = self.url.join(&href) else {
                debug!(href = %href, "skipping unresolvable dataset link");
                continue;
            };
            if fields.run_hour != run_hour {
                warn!(
                    dataset = identifier,
                    dataset_run_hour = fields.run_hour,
                    run_hour,
                    "dataset run hour does not match run, skipping"
                );
                continue;
            }

            datasets.push(Dataset {
                run: Arc::clone(self),
                identifier: identifier.to_string(),
                url,
                type_identifier: fields.type_id,
                forecast_hour: fields.forecast_hour,
            });
        }

        info!(count = datasets.len(), "discovered datasets");
        Ok(datasets)
    }

    /// Name of the assembled output file for this run.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.identifier)
    }
}

/// Sorts runs by timestamp, newest first.
pub fn sort_newest_first(runs: &mut [Run]) {
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run(identifier: &str, hour: u32, day: u32) -> Run {
        let source = Arc::new(DataSource::gfs_half_degree());
        Run {
            url: source.root().join(&format!("{identifier}/")).unwrap(),
            source,
            identifier: identifier.to_string(),
            timestamp: Utc.with_ymd_and_hms(2014, 11, day, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut runs = vec![
            run("gfs.2014110100", 0, 1),
            run("gfs.2014110206", 6, 2),
            run("gfs.2014110118", 18, 1),
        ];
        sort_newest_first(&mut runs);
        let ids: Vec<&str> = runs.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["gfs.2014110206", "gfs.2014110118", "gfs.2014110100"]);
    }

    #[test]
    fn test_file_name_uses_identifier() {
        assert_eq!(run("gfs.2014110100", 0, 1).file_name("grib2"), "gfs.2014110100.grib2");
    }
}
