//! Named-group extraction from run and dataset directory entries.
//!
//! Run patterns capture `year`, `month`, `day` and `hour`; dataset patterns
//! capture `runHour`, `typeId` and `fcstHour`. A group that is absent from
//! the pattern, or did not participate in the match, reads as zero (numbers)
//! or empty (strings).

use chrono::{DateTime, TimeZone, Utc};
use regex::{Captures, Regex};

/// Fields captured from a run directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct RunFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl RunFields {
    pub fn capture(pattern: &Regex, name: &str) -> Option<Self> {
        let caps = pattern.captures(name)?;
        Some(Self {
            year: named_number(&caps, "year"),
            month: named_number(&caps, "month"),
            day: named_number(&caps, "day"),
            hour: named_number(&caps, "hour"),
        })
    }

    /// The run's UTC timestamp, or `None` if the fields name no real hour.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, self.hour, 0, 0)
            .single()
    }
}

/// Fields captured from a dataset file name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct DatasetFields {
    pub run_hour: u32,
    pub type_id: String,
    pub forecast_hour: u32,
}

impl DatasetFields {
    pub fn capture(pattern: &Regex, name: &str) -> Option<Self> {
        let caps = pattern.captures(name)?;
        Some(Self {
            run_hour: named_number(&caps, "runHour"),
            type_id: caps
                .name("typeId")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            forecast_hour: named_number(&caps, "fcstHour"),
        })
    }
}

fn named_number<T: std::str::FromStr + Default>(caps: &Captures<'_>, name: &str) -> T {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::{GFS_HALF_DEGREE_DATASET_PATTERN, GFS_QUARTER_DEGREE_DATASET_PATTERN, GFS_RUN_PATTERN};

    #[test]
    fn test_run_fields_from_directory_name() {
        let re = Regex::new(GFS_RUN_PATTERN).unwrap();
        let fields = RunFields::capture(&re, "gfs.2014110118").unwrap();
        assert_eq!(
            fields,
            RunFields {
                year: 2014,
                month: 11,
                day: 1,
                hour: 18
            }
        );
        assert_eq!(
            fields.timestamp().unwrap(),
            Utc.with_ymd_and_hms(2014, 11, 1, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_run_fields_reject_non_matching_name() {
        let re = Regex::new(GFS_RUN_PATTERN).unwrap();
        assert!(RunFields::capture(&re, "gdas.2014110118").is_none());
        assert!(RunFields::capture(&re, "gfs.2014110118/").is_none());
    }

    #[test]
    fn test_run_fields_impossible_date_has_no_timestamp() {
        let re = Regex::new(GFS_RUN_PATTERN).unwrap();
        let fields = RunFields::capture(&re, "gfs.2014023000").unwrap();
        assert!(fields.timestamp().is_none());
    }

    #[test]
    fn test_missing_groups_default_to_zero() {
        let re = Regex::new(r"^run-(?P<year>\d{4})$").unwrap();
        let fields = RunFields::capture(&re, "run-2015").unwrap();
        assert_eq!(fields.year, 2015);
        assert_eq!((fields.month, fields.day, fields.hour), (0, 0, 0));
    }

    #[test]
    fn test_dataset_fields_half_degree() {
        let re = Regex::new(GFS_HALF_DEGREE_DATASET_PATTERN).unwrap();
        let fields = DatasetFields::capture(&re, "gfs.t06z.pgrb2bf108").unwrap();
        assert_eq!(fields.run_hour, 6);
        assert_eq!(fields.type_id, "pgrb2bf");
        assert_eq!(fields.forecast_hour, 108);
    }

    #[test]
    fn test_dataset_fields_quarter_degree() {
        let re = Regex::new(GFS_QUARTER_DEGREE_DATASET_PATTERN).unwrap();
        let fields = DatasetFields::capture(&re, "gfs.t12z.pgrb2.0p25.f003").unwrap();
        assert_eq!(fields.run_hour, 12);
        assert_eq!(fields.type_id, "pgrb2");
        assert_eq!(fields.forecast_hour, 3);
        assert!(DatasetFields::capture(&re, "gfs.t12z.pgrb2.0p25.f003.idx").is_none());
    }
}
