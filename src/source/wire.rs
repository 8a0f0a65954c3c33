//! JSON document exchanged between the dashboard endpoint and its pollers:
//! `{ "sensorData": { "<location_id>": Reading, .. }, "alerts": [Alert, ..] }`.
//!
//! Rows usually come straight out of a relational store, so numeric columns
//! may arrive as JSON numbers or as numeric strings, and timestamps as
//! `YYYY-MM-DD HH:MM:SS`, RFC 3339, or epoch seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::{insert_latest, Alert, LocationId, Reading, ReadingMap, Snapshot, SourceError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayload {
    #[serde(default)]
    pub sensor_data: BTreeMap<LocationId, Reading>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

impl WirePayload {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            sensor_data: snapshot.readings.clone(),
            alerts: snapshot.alerts.clone(),
        }
    }

    /// Converts to a snapshot. Map keys are re-derived from each row's own
    /// `location_id`, keeping the newest row if two keys collide.
    pub fn into_snapshot(self, alert_limit: usize) -> Snapshot {
        let mut readings = ReadingMap::new();
        for reading in self.sensor_data.into_values() {
            insert_latest(&mut readings, reading);
        }
        let mut alerts = self.alerts;
        alerts.truncate(alert_limit);
        Snapshot { readings, alerts }
    }
}

pub fn decode(body: &str) -> Result<WirePayload, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))
}

// --- Field helpers ---

pub(super) struct LocationIdVisitor;

impl<'de> Visitor<'de> for LocationIdVisitor {
    type Value = LocationId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a location id as a string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<LocationId, E> {
        Ok(LocationId::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<LocationId, E> {
        Ok(LocationId::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<LocationId, E> {
        Ok(LocationId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<LocationId, E> {
        Ok(LocationId::from(v.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Numbers and numeric strings become `Some`; null, blanks and anything
/// unparseable become `None` so one bad column never rejects the row.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match LooseNumber::deserialize(deserializer)? {
        LooseNumber::Number(n) => Some(n),
        LooseNumber::Text(text) => text.trim().parse::<f64>().ok(),
        LooseNumber::Other(_) => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// Text column that may be null (empty) or a bare number (its rendering).
pub fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Error)]
#[error("unrecognised timestamp `{0}`")]
pub struct TimestampError(pub String);

const STORE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses the timestamp shapes seen in practice. Zone-less values are taken
/// as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in [STORE_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(secs) = raw.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(secs, 0) {
            return Ok(dt);
        }
    }
    Err(TimestampError(raw.to_string()))
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(STORE_FORMAT).to_string()
}

pub mod timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Epoch(i64),
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Text(text) => parse_timestamp(&text).map_err(de::Error::custom),
            RawTimestamp::Epoch(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| de::Error::custom(format!("epoch {secs} out of range"))),
        }
    }
}
