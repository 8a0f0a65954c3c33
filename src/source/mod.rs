pub mod http;
pub mod sqlite;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// --- Data model ---

/// Opaque location key. Stores may hand it over as an integer or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(String);

impl LocationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for LocationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for LocationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LocationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(wire::LocationIdVisitor)
    }
}

/// Latest sensor snapshot for one location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub location_id: LocationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(with = "wire::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "wire::lenient_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "wire::lenient_number")]
    pub co2: Option<f64>,
    #[serde(default, deserialize_with = "wire::lenient_number")]
    pub pm25: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Danger,
}

impl Severity {
    /// Anything other than "danger" is treated as a warning.
    pub fn parse(raw: &str) -> Self {
        if raw == "danger" {
            Severity::Danger
        } else {
            Severity::Warning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stores have been seen writing numeric severity codes; only the
        // string "danger" escalates.
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(Severity::parse).unwrap_or(Severity::Warning))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "wire::lenient_text")]
    pub alert_type: String,
    #[serde(default, deserialize_with = "wire::lenient_number")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "wire::lenient_text")]
    pub location_name: String,
    #[serde(with = "wire::timestamp")]
    pub timestamp: DateTime<Utc>,
}

fn default_severity() -> Severity {
    Severity::Warning
}

pub type ReadingMap = BTreeMap<LocationId, Reading>;

/// Keeps only the most recent reading per location. Ties keep the reading
/// inserted last.
pub fn insert_latest(readings: &mut ReadingMap, reading: Reading) {
    match readings.get(&reading.location_id) {
        Some(existing) if existing.timestamp > reading.timestamp => {}
        _ => {
            readings.insert(reading.location_id.clone(), reading);
        }
    }
}

/// Location list derived from readings alone, numeric ids in numeric order.
pub fn locations_from_readings(readings: &ReadingMap) -> Vec<Location> {
    let mut locations: Vec<Location> = readings
        .values()
        .map(|r| Location {
            id: r.location_id.clone(),
            name: r
                .location_name
                .clone()
                .unwrap_or_else(|| format!("Location {}", r.location_id)),
        })
        .collect();
    locations.sort_by(|a, b| {
        let key = |l: &Location| (l.id.as_str().parse::<i64>().ok(), l.id.clone());
        key(a).cmp(&key(b))
    });
    locations
}

/// Latest readings plus the bounded, most-recent-first alert feed. Built
/// wholesale by a fetch, never patched in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub readings: ReadingMap,
    pub alerts: Vec<Alert>,
}

// --- Errors ---

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database connection is poisoned")]
    Poisoned,

    #[error("refresh worker exited without a result")]
    WorkerGone,
}

// --- Data source contract ---

pub trait DataSource: Send + Sync {
    /// Short human-readable origin, shown in the header.
    fn describe(&self) -> String;

    fn locations(&self) -> Result<Vec<Location>, SourceError>;

    /// One reading per location, the one with the greatest timestamp.
    /// Locations without readings are absent.
    fn latest_readings(&self) -> Result<ReadingMap, SourceError>;

    /// The `limit` most recent alerts, newest first.
    fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, SourceError>;

    fn snapshot(&self, alert_limit: usize) -> Result<Snapshot, SourceError> {
        let readings = self.latest_readings()?;
        let mut alerts = self.recent_alerts(alert_limit)?;
        alerts.truncate(alert_limit);
        Ok(Snapshot { readings, alerts })
    }
}
