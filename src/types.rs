use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One satellite acquisition candidate returned by the scene search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Unique archive identifier, e.g. `S1A_IW_SLC__1SDV_..._DADE.zip`
    pub file_name: String,
    /// Acquisition start timestamp (UTC)
    pub start_time: DateTime<Utc>,
    /// Repeating ground-track identifier; `None` when the provider omits it
    pub relative_orbit: Option<u32>,
    /// Provider URL for the product archive
    pub download_url: String,
    /// Provider-reported archive size in MB (informational)
    pub size_mb: Option<f64>,
}

impl SceneRecord {
    /// Orbit value usable for track grouping: present and nonzero.
    pub fn usable_orbit(&self) -> Option<u32> {
        match self.relative_orbit {
            Some(0) | None => None,
            other => other,
        }
    }
}

impl std::fmt::Display for SceneRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.relative_orbit {
            Some(orbit) => write!(
                f,
                "{} ({}Z, orbit {})",
                self.file_name,
                self.start_time.format("%Y-%m-%d %H:%M:%S"),
                orbit
            ),
            None => write!(
                f,
                "{} ({}Z, orbit unknown)",
                self.file_name,
                self.start_time.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

/// Two distinct acquisitions from the same relative orbit, ordered for
/// interferometric processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenePair {
    /// Scene nearest the start target date
    pub reference: SceneRecord,
    /// Scene nearest the end target date
    pub secondary: SceneRecord,
}

impl ScenePair {
    /// Days between the two acquisitions (always >= 0).
    pub fn temporal_baseline_days(&self) -> i64 {
        (self.secondary.start_time - self.reference.start_time)
            .num_days()
            .abs()
    }
}

/// Spatial and temporal scope of a scene query.
///
/// Dates are calendar dates, inclusive on both ends.
#[derive(Debug, Clone)]
pub struct SearchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Search geometry in well-known-text form
    pub aoi_wkt: String,
}

impl SearchWindow {
    /// Build a window from `YYYYMMDD` date strings as passed on the
    /// command line.
    pub fn from_compact_dates(start: &str, end: &str, aoi_wkt: String) -> InsarResult<Self> {
        let start = parse_compact_date(start)?;
        let end = parse_compact_date(end)?;
        Ok(SearchWindow { start, end, aoi_wkt })
    }

    /// Pair-selection target for the start date (midnight UTC).
    pub fn start_target(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
    }

    /// Pair-selection target for the end date (midnight UTC).
    pub fn end_target(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end.and_time(NaiveTime::MIN))
    }

    /// Lower query bound sent to the provider.
    pub fn query_start(&self) -> String {
        format!("{}T00:00:00Z", self.start)
    }

    /// Upper query bound sent to the provider. Runs to the last second of
    /// the end date so that day's acquisitions are included.
    pub fn query_end(&self) -> String {
        format!("{}T23:59:59Z", self.end)
    }
}

/// Parse a compact `YYYYMMDD` date argument.
pub fn parse_compact_date(s: &str) -> InsarResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map_err(|e| InsarError::Configuration(format!("invalid date '{}' (want YYYYMMDD): {}", s, e)))
}

/// Error types for the pipeline stages
#[derive(Debug, thiserror::Error)]
pub enum InsarError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication rejected by provider: {0}")]
    Authentication(String),

    #[error("scene search failed: {0}")]
    Search(String),

    #[error("no usable relative-orbit value in any candidate scene")]
    NoOrbitData,

    #[error("insufficient scenes: {0}")]
    InsufficientScenes(String),

    #[error("cannot form a distinct pair: {0}")]
    DistinctPair(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("archive extraction failed: {0}")]
    Extraction(String),

    #[error("processing tool not found: {0}")]
    ToolNotFound(String),

    #[error("processing tool exited with code {0}")]
    Processing(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for pipeline operations
pub type InsarResult<T> = Result<T, InsarError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, time: &str, orbit: Option<u32>) -> SceneRecord {
        SceneRecord {
            file_name: name.to_string(),
            start_time: time.parse().expect("test timestamp"),
            relative_orbit: orbit,
            download_url: format!("https://example.com/{}", name),
            size_mb: None,
        }
    }

    #[test]
    fn test_compact_date_parsing() {
        let d = parse_compact_date("20200103").expect("valid date");
        assert_eq!(d, NaiveDate::from_ymd_opt(2020, 1, 3).expect("ymd"));

        assert!(parse_compact_date("2020-01-03").is_err());
        assert!(parse_compact_date("20201350").is_err());
        assert!(parse_compact_date("").is_err());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = SearchWindow::from_compact_dates("20200101", "20200110", "POINT (0 0)".into())
            .expect("window");
        assert_eq!(w.query_start(), "2020-01-01T00:00:00Z");
        assert_eq!(w.query_end(), "2020-01-10T23:59:59Z");
        assert_eq!(w.start_target().to_rfc3339(), "2020-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_usable_orbit_filters_null_and_zero() {
        assert_eq!(record("a", "2020-01-01T00:00:00Z", Some(117)).usable_orbit(), Some(117));
        assert_eq!(record("b", "2020-01-01T00:00:00Z", Some(0)).usable_orbit(), None);
        assert_eq!(record("c", "2020-01-01T00:00:00Z", None).usable_orbit(), None);
    }

    #[test]
    fn test_temporal_baseline() {
        let pair = ScenePair {
            reference: record("a", "2020-01-03T17:08:15Z", Some(117)),
            secondary: record("b", "2020-01-15T17:08:15Z", Some(117)),
        };
        assert_eq!(pair.temporal_baseline_days(), 12);
    }
}
