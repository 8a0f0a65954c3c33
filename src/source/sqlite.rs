use rusqlite::types::{Type, ValueRef};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;
use std::sync::Mutex;

use super::wire::parse_timestamp;
use super::{insert_latest, Alert, DataSource, Location, LocationId, Reading, ReadingMap, Severity, SourceError};

// Name order; the first entry is the default selection.
const LOCATIONS_SQL: &str =
    "SELECT location_id, location_name FROM location ORDER BY location_name, location_id";

// Every location's reading(s) at its maximum timestamp.
const LATEST_READINGS_SQL: &str = "
    SELECT sr.location_id, l.location_name, sr.timestamp, sr.temperature, sr.co2, sr.pm25
    FROM sensorreadings sr
    JOIN location l ON sr.location_id = l.location_id
    WHERE sr.timestamp = (
        SELECT MAX(timestamp) FROM sensorreadings WHERE location_id = sr.location_id
    )
    ORDER BY sr.location_id, sr.reading_id";

const RECENT_ALERTS_SQL: &str = "
    SELECT a.severity, a.alert_type, a.value, l.location_name, sr.timestamp
    FROM alert a
    JOIN sensorreadings sr ON a.reading_id = sr.reading_id
    JOIN location l ON sr.location_id = l.location_id
    ORDER BY sr.timestamp DESC, a.alert_id DESC
    LIMIT ?1";

/// Read-only access to the monitoring store (`location`, `sensorreadings`,
/// `alert` tables).
pub struct SqliteSource {
    label: String,
    conn: Mutex<Connection>,
}

impl SqliteSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(path.display().to_string(), conn))
    }

    pub fn from_connection(label: impl Into<String>, conn: Connection) -> Self {
        Self {
            label: label.into(),
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        let conn = self.conn.lock().map_err(|_| SourceError::Poisoned)?;
        f(&conn)
    }
}

fn location_id(row: &Row, idx: usize) -> rusqlite::Result<LocationId> {
    match row.get_ref(idx)? {
        ValueRef::Integer(i) => Ok(LocationId::from(i)),
        ValueRef::Text(bytes) => Ok(LocationId::from(String::from_utf8_lossy(bytes).into_owned())),
        other => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "location_id".to_string(),
            other.data_type(),
        )),
    }
}

/// A metric cell that is not a number (blank text, junk, blob) reads as
/// absent rather than failing the whole query.
fn metric(row: &Row, idx: usize) -> rusqlite::Result<Option<f64>> {
    let value = match row.get_ref(idx)? {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.trim().parse::<f64>().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl DataSource for SqliteSource {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.label)
    }

    fn locations(&self) -> Result<Vec<Location>, SourceError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(LOCATIONS_SQL)?;
            let rows = stmt.query_map([], |row| {
                Ok(Location {
                    id: location_id(row, 0)?,
                    name: row.get(1)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn latest_readings(&self) -> Result<ReadingMap, SourceError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(LATEST_READINGS_SQL)?;
            let rows = stmt.query_map([], |row| {
                Ok(Reading {
                    location_id: location_id(row, 0)?,
                    location_name: row.get(1)?,
                    timestamp: timestamp(row, 2)?,
                    temperature: metric(row, 3)?,
                    co2: metric(row, 4)?,
                    pm25: metric(row, 5)?,
                })
            })?;

            let mut readings = ReadingMap::new();
            for reading in rows {
                insert_latest(&mut readings, reading?);
            }
            Ok(readings)
        })
    }

    fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, SourceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(RECENT_ALERTS_SQL)?;
            let rows = stmt.query_map(params![limit], |row| {
                let severity: Option<String> = row.get(0)?;
                Ok(Alert {
                    severity: severity
                        .as_deref()
                        .map(Severity::parse)
                        .unwrap_or(Severity::Warning),
                    alert_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    value: metric(row, 2)?,
                    location_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    timestamp: timestamp(row, 4)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SCHEMA: &str = "
        CREATE TABLE location (
            location_id INTEGER PRIMARY KEY,
            location_name TEXT NOT NULL
        );
        CREATE TABLE sensorreadings (
            reading_id INTEGER PRIMARY KEY,
            location_id INTEGER NOT NULL REFERENCES location(location_id),
            timestamp TEXT NOT NULL,
            temperature REAL,
            co2 REAL,
            pm25 REAL
        );
        CREATE TABLE alert (
            alert_id INTEGER PRIMARY KEY,
            reading_id INTEGER NOT NULL REFERENCES sensorreadings(reading_id),
            severity TEXT,
            alert_type TEXT,
            value REAL
        );";

    pub(crate) fn seeded() -> SqliteSource {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "
            INSERT INTO location VALUES (1, 'Level 1 North'), (2, 'Haulage Drift'), (3, 'Level 3 Sump');

            INSERT INTO sensorreadings VALUES
                (1, 1, '2024-05-01 08:00:00', 23.0, 800, 0.4),
                (2, 1, '2024-05-01 08:05:00', 24.5, 1200, NULL),
                (3, 2, '2024-05-01 08:03:00', 31.0, 640, 1.4),
                (4, 2, '2024-05-01 07:59:00', 29.0, 600, 1.0);

            INSERT INTO alert VALUES
                (1, 1, 'warning', 'gas', 800),
                (2, 2, 'danger', 'gas', 1200),
                (3, 3, 'warning', 'dust', 1.4),
                (4, 4, NULL, 'temperature', 29);
            ",
        )
        .unwrap();
        SqliteSource::from_connection("memory", conn)
    }

    #[test]
    fn locations_in_name_order() {
        let locations = seeded().locations().unwrap();
        let names: Vec<_> = locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Haulage Drift", "Level 1 North", "Level 3 Sump"]);
        assert_eq!(locations[0].id, LocationId::from(2));
    }

    #[test]
    fn default_selection_is_first_by_name() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch("INSERT INTO location VALUES (1, 'Shaft B'), (2, 'Adit A');")
            .unwrap();
        let source = std::sync::Arc::new(SqliteSource::from_connection("memory", conn));

        let dashboard =
            crate::dashboard::Dashboard::connect(source, Default::default()).unwrap();
        assert_eq!(dashboard.locations()[0].name, "Adit A");
        assert_eq!(dashboard.selected(), Some(&LocationId::from(2)));
    }

    #[test]
    fn latest_reading_per_location() {
        let readings = seeded().latest_readings().unwrap();
        assert_eq!(readings.len(), 2, "location without readings is absent");

        let level1 = &readings[&LocationId::from(1)];
        assert_eq!(level1.co2, Some(1200.0));
        assert_eq!(level1.pm25, None);
        assert_eq!(level1.location_name.as_deref(), Some("Level 1 North"));

        let drift = &readings[&LocationId::from(2)];
        assert_eq!(drift.temperature, Some(31.0));
    }

    #[test]
    fn alerts_newest_first_and_bounded() {
        let source = seeded();
        let alerts = source.recent_alerts(2).unwrap();
        let types: Vec<_> = alerts.iter().map(|a| (a.alert_type.as_str(), a.value)).collect();
        // 08:05 > 08:03 > 08:00 > 07:59
        assert_eq!(types, vec![("gas", Some(1200.0)), ("dust", Some(1.4))]);
        assert_eq!(alerts[0].severity, Severity::Danger);
        assert_eq!(alerts[0].location_name, "Level 1 North");

        let all = source.recent_alerts(10).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].severity, Severity::Warning);
    }

    #[test]
    fn snapshot_combines_both_queries() {
        let snapshot = seeded().snapshot(3).unwrap();
        assert_eq!(snapshot.readings.len(), 2);
        assert_eq!(snapshot.alerts.len(), 3);
    }

    #[test]
    fn junk_metric_cells_read_as_absent() {
        let source = seeded();
        source
            .with_conn(|conn| {
                conn.execute_batch(
                    "INSERT INTO sensorreadings VALUES (9, 3, '2024-05-01 09:00:00', 22.0, '', 0.5);
                     INSERT INTO sensorreadings VALUES (10, 2, '2024-05-01 09:00:00', 'n/a', ' 700 ', x'00');",
                )?;
                Ok(())
            })
            .unwrap();

        let readings = source.latest_readings().unwrap();
        assert_eq!(readings.len(), 3);

        let sump = &readings[&LocationId::from(3)];
        assert_eq!(sump.temperature, Some(22.0));
        assert_eq!(sump.co2, None);
        assert_eq!(sump.pm25, Some(0.5));

        let drift = &readings[&LocationId::from(2)];
        assert_eq!(drift.temperature, None);
        assert_eq!(drift.co2, Some(700.0));
        assert_eq!(drift.pm25, None);
    }

    #[test]
    fn tied_max_timestamps_keep_one_reading() {
        let source = seeded();
        source
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO sensorreadings VALUES (5, 2, '2024-05-01 08:03:00', 32.0, 700, 1.5)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        let readings = source.latest_readings().unwrap();
        assert_eq!(readings[&LocationId::from(2)].temperature, Some(32.0));
    }
}
