//! Scene search against the provider's parameter search endpoint.
//!
//! One blocking GET with spatial, temporal, and fixed product filters;
//! the `jsonlite` response body is converted into [`SceneRecord`]s.

use crate::config::Credentials;
use crate::types::{InsarError, InsarResult, SceneRecord, SearchWindow};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

/// Provider search endpoint.
const SEARCH_ENDPOINT: &str = "https://api.daac.asf.alaska.edu/services/search/param";

/// Fixed product filters: Sentinel-1 single-look complex scenes in
/// interferometric wide-swath mode.
const PLATFORM: &str = "Sentinel-1";
const PROCESSING_LEVEL: &str = "SLC";
const BEAM_MODE: &str = "IW";

/// Authenticated client for scene queries.
pub struct SearchClient {
    client: reqwest::blocking::Client,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchEntry>,
}

/// One `jsonlite` result entry. Numeric fields arrive as numbers or
/// strings depending on provider version, so they are coerced after
/// deserialization. `relativeOrbit` is also published under `path`.
#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(rename = "fileName")]
    file_name: String,
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "relativeOrbit", alias = "path", default)]
    relative_orbit: Option<serde_json::Value>,
    url: String,
    #[serde(rename = "sizeMB", default)]
    size_mb: Option<serde_json::Value>,
}

impl SearchClient {
    pub fn new(credentials: Credentials) -> InsarResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("sarpair/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InsarError::Search(format!("cannot build HTTP client: {}", e)))?;
        Ok(SearchClient {
            client,
            credentials,
        })
    }

    /// Query the provider for SLC scenes intersecting the window.
    pub fn search(&self, window: &SearchWindow) -> InsarResult<Vec<SceneRecord>> {
        log::info!(
            "Searching {} {} scenes, {} .. {}",
            PLATFORM,
            PROCESSING_LEVEL,
            window.query_start(),
            window.query_end()
        );

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .query(&[
                ("platform", PLATFORM),
                ("processingLevel", PROCESSING_LEVEL),
                ("beamMode", BEAM_MODE),
                ("intersectsWith", window.aoi_wkt.as_str()),
                ("start", window.query_start().as_str()),
                ("end", window.query_end().as_str()),
                ("output", "jsonlite"),
            ])
            .send()
            .map_err(|e| InsarError::Search(format!("search request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(InsarError::Authentication(format!(
                "provider returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(InsarError::Search(format!("provider returned {}", status)));
        }

        let body = response
            .text()
            .map_err(|e| InsarError::Search(format!("cannot read search response: {}", e)))?;
        parse_search_response(&body)
    }
}

/// Convert a `jsonlite` body into scene records. Entries with an
/// unparseable acquisition time are dropped with a warning rather than
/// failing the usable remainder.
fn parse_search_response(body: &str) -> InsarResult<Vec<SceneRecord>> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| InsarError::Search(format!("unexpected search response shape: {}", e)))?;

    let mut records = Vec::with_capacity(parsed.results.len());
    for entry in parsed.results {
        let start_time = match parse_scene_time(&entry.start_time) {
            Some(t) => t,
            None => {
                log::warn!(
                    "Skipping {}: unparseable startTime '{}'",
                    entry.file_name,
                    entry.start_time
                );
                continue;
            }
        };
        let relative_orbit = entry
            .relative_orbit
            .as_ref()
            .and_then(coerce_u32)
            .or_else(|| derive_relative_orbit(&entry.file_name));
        records.push(SceneRecord {
            file_name: entry.file_name,
            start_time,
            relative_orbit,
            download_url: entry.url,
            size_mb: entry.size_mb.as_ref().and_then(coerce_f64),
        });
    }
    Ok(records)
}

/// Tolerant acquisition-time parsing; the provider emits RFC 3339 or
/// naive `%Y-%m-%dT%H:%M:%S[.f]` forms depending on output format.
fn parse_scene_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn coerce_u32(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Derive the relative orbit from a Sentinel-1 product name when the
/// provider omits the field. The mission publishes the track mapping
/// from the absolute orbit number carried in the name:
/// S1A `(abs - 73) mod 175 + 1`, S1B `(abs - 27) mod 175 + 1`.
pub fn derive_relative_orbit(file_name: &str) -> Option<u32> {
    let pattern = Regex::new(r"^S1([AB])_.+_(\d{6})_[0-9A-F]{6}_[0-9A-F]{4}").ok()?;
    let captures = pattern.captures(file_name)?;
    let offset: u32 = match &captures[1] {
        "A" => 73,
        _ => 27,
    };
    let absolute: u32 = captures[2].parse().ok()?;
    Some((absolute + 175 - offset) % 175 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RESPONSE: &str = r#"{
        "results": [
            {
                "fileName": "S1A_IW_SLC__1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.zip",
                "startTime": "2020-01-03T17:08:15.000000",
                "relativeOrbit": 117,
                "url": "https://datapool.test/S1A_DADE.zip",
                "sizeMB": "4123.5"
            },
            {
                "fileName": "S1A_IW_SLC__1SDV_20200115T170814_20200115T170841_030814_0388D1_1A2B.zip",
                "startTime": "2020-01-15T17:08:14.000000",
                "path": "117",
                "url": "https://datapool.test/S1A_1A2B.zip"
            },
            {
                "fileName": "S1B_IW_SLC__1SDV_20200109T170745_20200109T170812_019743_025473_C3D4.zip",
                "startTime": "not-a-time",
                "relativeOrbit": 44,
                "url": "https://datapool.test/S1B_C3D4.zip"
            }
        ]
    }"#;

    #[test]
    fn test_parse_search_response() {
        let records = parse_search_response(RESPONSE).expect("parse");
        // third entry dropped: bad timestamp
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].relative_orbit, Some(117));
        assert_relative_eq!(records[0].size_mb.expect("size"), 4123.5);
        assert_eq!(
            records[0].start_time.to_rfc3339(),
            "2020-01-03T17:08:15+00:00"
        );

        // string-typed `path` alias coerces too
        assert_eq!(records[1].relative_orbit, Some(117));
        assert_eq!(records[1].size_mb, None);
    }

    #[test]
    fn test_empty_and_malformed_bodies() {
        assert!(parse_search_response(r#"{"results": []}"#)
            .expect("empty ok")
            .is_empty());
        assert!(parse_search_response("{}").expect("missing results ok").is_empty());
        assert!(parse_search_response("<html>oops</html>").is_err());
    }

    #[test]
    fn test_scene_time_formats() {
        for s in [
            "2020-01-03T17:08:15Z",
            "2020-01-03T17:08:15+00:00",
            "2020-01-03T17:08:15.000000",
            "2020-01-03T17:08:15",
        ] {
            let t = parse_scene_time(s).expect("parse time");
            assert_eq!(t.to_rfc3339(), "2020-01-03T17:08:15+00:00");
        }
        assert!(parse_scene_time("20200103").is_none());
    }

    #[test]
    fn test_derive_relative_orbit() {
        // S1A absolute orbit 030639 -> track (30639 - 73) % 175 + 1 = 117
        assert_eq!(
            derive_relative_orbit(
                "S1A_IW_SLC__1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.zip"
            ),
            Some(117)
        );
        // S1B absolute orbit 019959 -> track (19959 - 27) % 175 + 1 = 158
        assert_eq!(
            derive_relative_orbit(
                "S1B_IW_SLC__1SDV_20200612T053512_20200612T053539_019959_025BE7_07F9.zip"
            ),
            Some(158)
        );
        assert_eq!(derive_relative_orbit("not_a_product_name.zip"), None);
    }

    #[test]
    fn test_orbit_derivation_fills_missing_field() {
        let body = r#"{
            "results": [{
                "fileName": "S1A_IW_SLC__1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.zip",
                "startTime": "2020-01-03T17:08:15",
                "url": "https://datapool.test/a.zip"
            }]
        }"#;
        let records = parse_search_response(body).expect("parse");
        assert_eq!(records[0].relative_orbit, Some(117));
    }
}
