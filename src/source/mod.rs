//! Data sources, and the runs and datasets discovered from them.
//!
//! NOAA publishes each GFS run as a directory under a root index page, and
//! each dataset (one forecast hour of one product) as a file inside it. Both
//! levels are discovered the same way: fetch the index with the source's
//! [`FetchStrategy`], walk every anchor, trim a trailing `/` from its target
//! and match the result against the source's pattern.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aonui_core::{DataSource, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let source = Arc::new(DataSource::gfs_half_degree());
//!
//! for run in source.discover_runs(&client).await? {
//!     println!("{} at {}", run.identifier, run.timestamp);
//! }
//! # Ok(())
//! # }
//! ```

mod dataset;
mod error;
mod index;
mod pattern;
mod run;

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use dataset::Dataset;
pub use error::SourceError;
pub use run::{Run, sort_newest_first};

use self::index::anchor_targets;
use self::pattern::RunFields;
use crate::download::{FetchStrategy, HttpClient};
use crate::utils::{compile_static_regex, parse_static_url};

/// Run directory pattern shared by the GFS presets.
pub const GFS_RUN_PATTERN: &str = r"^gfs\.(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})(?P<hour>\d{2})$";

/// Dataset pattern of the 0.5° GFS product.
pub const GFS_HALF_DEGREE_DATASET_PATTERN: &str = r"^gfs\.t(?P<runHour>\d{2})z.(?P<typeId>pgrb2b?f)(?P<fcstHour>\d+)$";

/// Dataset pattern of the 0.25° GFS product.
pub const GFS_QUARTER_DEGREE_DATASET_PATTERN: &str =
    r"^gfs\.t(?P<runHour>\d{2})z\.(?P<typeId>pgrb2b?)\.0p25\.f(?P<fcstHour>\d+)$";

/// Root index of the 0.5° GFS product.
pub const GFS_HALF_DEGREE_ROOT: &str = "http://www.ftp.ncep.noaa.gov/data/nccf/com/gfs/prod/";

/// Root index of the 0.25° GFS product.
pub const GFS_QUARTER_DEGREE_ROOT: &str = "http://www.ftp.ncep.noaa.gov/data/nccf/com/gfs/para/";

/// Where to find runs and datasets, and how to treat them.
#[derive(Debug, Clone)]
pub struct DataSource {
    root: Url,
    run_pattern: Regex,
    dataset_pattern: Regex,
    strategy: FetchStrategy,
    max_forecast_hour: u32,
    min_datasets: usize,
}

impl DataSource {
    /// Creates a source with the default fetch strategy, no forecast-hour
    /// limit and no minimum dataset count.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidRootUrl`] or [`SourceError::InvalidPattern`].
    pub fn new(root: &str, run_pattern: &str, dataset_pattern: &str) -> Result<Self, SourceError> {
        let root = Url::parse(root).map_err(|source| SourceError::InvalidRootUrl {
            url: root.to_string(),
            source,
        })?;
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| SourceError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        };

        Ok(Self {
            root,
            run_pattern: compile(run_pattern)?,
            dataset_pattern: compile(dataset_pattern)?,
            strategy: FetchStrategy::default(),
            max_forecast_hour: 0,
            min_datasets: 0,
        })
    }

    /// The 0.5° GFS product: forecast hours up to 200, at least 186 datasets.
    #[must_use]
    pub fn gfs_half_degree() -> Self {
        Self::preset(GFS_HALF_DEGREE_ROOT, GFS_HALF_DEGREE_DATASET_PATTERN)
            .with_max_forecast_hour(200)
            .with_min_datasets(186)
    }

    /// The 0.25° GFS product: all forecast hours, at least 146 datasets.
    #[must_use]
    pub fn gfs_quarter_degree() -> Self {
        Self::preset(GFS_QUARTER_DEGREE_ROOT, GFS_QUARTER_DEGREE_DATASET_PATTERN).with_min_datasets(146)
    }

    fn preset(root: &str, dataset_pattern: &str) -> Self {
        Self {
            root: parse_static_url(root),
            run_pattern: compile_static_regex(GFS_RUN_PATTERN),
            dataset_pattern: compile_static_regex(dataset_pattern),
            strategy: FetchStrategy::default(),
            max_forecast_hour: 0,
            min_datasets: 0,
        }
    }

    /// Returns a copy rooted at a different index URL.
    #[must_use]
    pub fn with_root(self, root: Url) -> Self {
        Self { root, ..self }
    }

    /// Returns a copy with a different fetch strategy.
    #[must_use]
    pub fn with_strategy(self, strategy: FetchStrategy) -> Self {
        Self { strategy, ..self }
    }

    /// Returns a copy with a different forecast-hour limit (0 = unlimited).
    #[must_use]
    pub fn with_max_forecast_hour(self, max_forecast_hour: u32) -> Self {
        Self {
            max_forecast_hour,
            ..self
        }
    }

    /// Returns a copy with a different minimum dataset count (0 = none).
    #[must_use]
    pub fn with_min_datasets(self, min_datasets: usize) -> Self {
        Self { min_datasets, ..self }
    }

    /// Root index URL.
    #[must_use]
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Pattern run directory names must match.
    #[must_use]
    pub fn run_pattern(&self) -> &Regex {
        &self.run_pattern
    }

    /// Pattern dataset file names must match.
    #[must_use]
    pub fn dataset_pattern(&self) -> &Regex {
        &self.dataset_pattern
    }

    /// Strategy for every network operation against this source.
    #[must_use]
    pub fn strategy(&self) -> &FetchStrategy {
        &self.strategy
    }

    /// Highest forecast hour worth fetching; 0 means no limit.
    #[must_use]
    pub fn max_forecast_hour(&self) -> u32 {
        self.max_forecast_hour
    }

    /// Fewest datasets a complete run has; 0 means no minimum.
    #[must_use]
    pub fn min_datasets(&self) -> usize {
        self.min_datasets
    }

    /// Lists the runs on the root index, in document order.
    ///
    /// Partial runs are returned too: check the dataset count against
    /// [`min_datasets`](Self::min_datasets) before trusting one.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Download`] if the index cannot be fetched.
    #[instrument(skip(self, client), fields(root = %self.root))]
    pub async fn discover_runs(self: &Arc<Self>, client: &HttpClient) -> Result<Vec<Run>, SourceError> {
        let body = client.fetch_text(&self.root, &self.strategy).await?;

        let mut runs = Vec::new();
        for href in anchor_targets(&body) {
            let identifier = href.trim_end_matches('/');
            let Some(fields) = RunFields::capture(&self.run_pattern, identifier) else {
                continue;
            };
            let Ok(url) = self.root.join(&href) else {
                debug!(href = %href, "skipping unresolvable run link");
                continue;
            };
            let Some(timestamp) = fields.timestamp() else {
                warn!(run = identifier, "run name does not form a valid date, skipping");
                continue;
            };

            runs.push(Run {
                source: Arc::clone(self),
                identifier: identifier.to_string(),
                url,
                timestamp,
            });
        }

        info!(count = runs.len(), "discovered runs");
        Ok(runs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_half_degree_preset() {
        let source = DataSource::gfs_half_degree();
        assert_eq!(source.root().as_str(), GFS_HALF_DEGREE_ROOT);
        assert_eq!(source.max_forecast_hour(), 200);
        assert_eq!(source.min_datasets(), 186);
        assert_eq!(source.strategy().max_retries(), 5);
        assert!(source.dataset_pattern().is_match("gfs.t00z.pgrb2f00"));
        assert!(source.dataset_pattern().is_match("gfs.t18z.pgrb2bf384"));
    }

    #[test]
    fn test_quarter_degree_preset() {
        let source = DataSource::gfs_quarter_degree();
        assert_eq!(source.root().as_str(), GFS_QUARTER_DEGREE_ROOT);
        assert_eq!(source.max_forecast_hour(), 0);
        assert_eq!(source.min_datasets(), 146);
        assert!(source.dataset_pattern().is_match("gfs.t06z.pgrb2b.0p25.f012"));
        assert!(!source.dataset_pattern().is_match("gfs.t06z.pgrb2f12"));
    }

    #[test]
    fn test_new_rejects_bad_inputs() {
        assert!(matches!(
            DataSource::new("not a url", GFS_RUN_PATTERN, GFS_HALF_DEGREE_DATASET_PATTERN),
            Err(SourceError::InvalidRootUrl { .. })
        ));
        assert!(matches!(
            DataSource::new(GFS_HALF_DEGREE_ROOT, "(unclosed", GFS_HALF_DEGREE_DATASET_PATTERN),
            Err(SourceError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_with_root_keeps_other_settings() {
        let root = Url::parse("http://127.0.0.1:9/gfs/prod/").unwrap();
        let source = DataSource::gfs_half_degree().with_root(root.clone());
        assert_eq!(source.root(), &root);
        assert_eq!(source.min_datasets(), 186);
    }
}
