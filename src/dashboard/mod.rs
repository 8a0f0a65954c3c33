pub mod refresh;
pub mod trend;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::source::{
    locations_from_readings, Alert, DataSource, Location, LocationId, Reading, Severity, Snapshot,
    SourceError,
};
use crate::status::thresholds::Thresholds;
use crate::status::{self, Metric, MetricStatus, VentilationStatus};
use crate::util::{
    capitalize, format_air_quality, format_alert_time, format_dust, format_gas, format_haulage,
    format_number, format_temperature,
};
use refresh::{Outcome, Refresher};
pub use refresh::Tick;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub alert_limit: usize,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alert_limit: 3,
            thresholds: Thresholds::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// Nothing has been loaded yet.
    Loading,
    /// Loaded, but the selected location has no reading.
    NoData,
    Live,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricDisplay {
    pub metric: Metric,
    pub value: Option<f64>,
    pub text: String,
    pub status: MetricStatus,
    /// Gauge fill, 0..=100.
    pub fill: f64,
}

/// Display-ready view of the selected location.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayBundle {
    pub availability: Availability,
    pub location_id: Option<LocationId>,
    pub location_name: String,
    pub ventilation: Option<VentilationStatus>,
    pub metrics: Vec<MetricDisplay>,
    pub air_quality: Option<u8>,
    pub haulage: String,
    pub observed_at: Option<DateTime<Utc>>,
}

impl DisplayBundle {
    fn placeholder(
        availability: Availability,
        location_id: Option<LocationId>,
        location_name: String,
    ) -> Self {
        let filler = match availability {
            Availability::Loading => "Loading...",
            _ => "N/A",
        };
        let metrics = Metric::ALL
            .iter()
            .map(|&metric| MetricDisplay {
                metric,
                value: None,
                text: filler.to_string(),
                status: MetricStatus::Unavailable,
                fill: 0.0,
            })
            .collect();
        let haulage = match availability {
            Availability::Loading => "Gas: Loading | Dust: Loading".to_string(),
            _ => format_haulage(None, None),
        };

        Self {
            availability,
            location_id,
            location_name,
            ventilation: None,
            metrics,
            air_quality: None,
            haulage,
            observed_at: None,
        }
    }

    pub fn ventilation_text(&self) -> String {
        let status = match (self.availability, self.ventilation) {
            (Availability::Loading, _) => "Loading",
            (_, Some(v)) => v.label(),
            (_, None) => "Unavailable",
        };
        format!("Current ventilation status: {status}")
    }

    pub fn metric(&self, metric: Metric) -> Option<&MetricDisplay> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlertDisplay {
    pub severity: Severity,
    pub class: &'static str,
    pub message: String,
    pub time: String,
    pub action: &'static str,
}

impl AlertDisplay {
    pub fn from_alert(alert: &Alert) -> Self {
        let value = alert
            .value
            .map_or_else(|| "N/A".to_string(), format_number);
        let (class, action) = match alert.severity {
            Severity::Danger => ("alert-danger", "Emergency"),
            Severity::Warning => ("alert-warning", "Review"),
        };
        Self {
            severity: alert.severity,
            class,
            message: format!(
                "{} alert at {} (Value: {value})",
                capitalize(&alert.alert_type),
                alert.location_name
            ),
            time: format_alert_time(&alert.timestamp),
            action,
        }
    }
}

/// Owns the latest snapshot and the location selection. Snapshots are only
/// ever replaced whole; the selection changes only through `select*`.
pub struct Dashboard {
    source: Arc<dyn DataSource>,
    settings: Settings,
    phase: Phase,
    locations: Vec<Location>,
    snapshot: Arc<Snapshot>,
    selected: Option<LocationId>,
    refresher: Refresher,
    last_completed: u64,
    last_error: Option<String>,
    last_success: Option<Instant>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn DataSource>, settings: Settings) -> Self {
        Self {
            source,
            settings,
            phase: Phase::Uninitialized,
            locations: Vec::new(),
            snapshot: Arc::new(Snapshot::default()),
            selected: None,
            refresher: Refresher::new(),
            last_completed: 0,
            last_error: None,
            last_success: None,
        }
    }

    /// Loads locations and a first snapshot. Any failure here is returned to
    /// the caller; there is nothing sensible to show without them.
    pub fn connect(source: Arc<dyn DataSource>, settings: Settings) -> Result<Self, SourceError> {
        let locations = source.locations()?;
        let mut dashboard = Self::new(source, settings);
        dashboard.locations = locations;
        let snapshot = dashboard.refresh()?;
        info!(
            source = %dashboard.source.describe(),
            locations = dashboard.locations.len(),
            readings = snapshot.readings.len(),
            "connected to data source"
        );
        Ok(dashboard)
    }

    pub fn initialize(&mut self, locations: Vec<Location>, snapshot: Snapshot) {
        self.locations = locations;
        self.merge_locations(&snapshot);
        self.snapshot = Arc::new(snapshot);
        self.phase = Phase::Ready;
        self.last_success = Some(Instant::now());
        self.ensure_selection();
    }

    /// Fetches and applies a snapshot on the calling thread. A background
    /// fetch still in flight is waited for and applied first, so the store
    /// never sees two fetches at once.
    pub fn refresh(&mut self) -> Result<Arc<Snapshot>, SourceError> {
        if let Some((seq, outcome)) = self.refresher.wait(None) {
            // Failures are logged and recorded by apply.
            let _ = self.apply(seq, outcome);
        }
        let seq = self.refresher.next_sequence();
        let outcome = self.source.snapshot(self.settings.alert_limit);
        self.apply(seq, outcome)?;
        Ok(Arc::clone(&self.snapshot))
    }

    /// Starts a background fetch unless one is already outstanding.
    pub fn request_refresh(&mut self) -> Tick {
        let tick = self
            .refresher
            .start(Arc::clone(&self.source), self.settings.alert_limit);
        if let Tick::Started(seq) = tick {
            debug!(seq, "refresh started");
        }
        tick
    }

    /// Applies a finished background fetch, if any. Returns true when the
    /// stored snapshot was replaced.
    pub fn poll_refresh(&mut self) -> bool {
        match self.refresher.poll() {
            Some((seq, outcome)) => matches!(self.apply(seq, outcome), Ok(true)),
            None => false,
        }
    }

    #[cfg(test)]
    pub fn wait_for_refresh(&mut self, timeout: std::time::Duration) -> bool {
        match self.refresher.wait(Some(timeout)) {
            Some((seq, outcome)) => matches!(self.apply(seq, outcome), Ok(true)),
            None => false,
        }
    }

    fn apply(&mut self, seq: u64, outcome: Outcome) -> Result<bool, SourceError> {
        if seq <= self.last_completed {
            debug!(seq, latest = self.last_completed, "discarding stale refresh result");
            return Ok(false);
        }
        self.last_completed = seq;

        match outcome {
            Ok(snapshot) => {
                debug!(
                    seq,
                    readings = snapshot.readings.len(),
                    alerts = snapshot.alerts.len(),
                    "snapshot applied"
                );
                let locations = std::mem::take(&mut self.locations);
                self.initialize(locations, snapshot);
                self.last_error = None;
                Ok(true)
            }
            Err(err) => {
                warn!(seq, error = %err, "refresh failed, keeping previous snapshot");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    // Readings may name locations the reference list has not heard of yet.
    fn merge_locations(&mut self, snapshot: &Snapshot) {
        for location in locations_from_readings(&snapshot.readings) {
            if !self.locations.iter().any(|l| l.id == location.id) {
                self.locations.push(location);
            }
        }
    }

    fn ensure_selection(&mut self) {
        if self.selected.is_none() {
            self.selected = self.locations.first().map(|l| l.id.clone());
        }
    }

    // --- Selection ---

    /// Selects `id` if it is a known location. Unknown ids are ignored.
    pub fn select(&mut self, id: &LocationId) -> bool {
        let known = self.locations.iter().any(|l| &l.id == id)
            || self.snapshot.readings.contains_key(id);
        if !known {
            debug!(location = %id, "ignoring selection of unknown location");
            return false;
        }
        if self.selected.as_ref() != Some(id) {
            info!(location = %id, "location selected");
            self.selected = Some(id.clone());
        }
        true
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        match self.locations.get(index).map(|l| l.id.clone()) {
            Some(id) => self.select(&id),
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if self.locations.is_empty() {
            return;
        }
        let next = self
            .selected_index()
            .map_or(0, |i| (i + 1) % self.locations.len());
        self.select_index(next);
    }

    pub fn select_prev(&mut self) {
        if self.locations.is_empty() {
            return;
        }
        let prev = match self.selected_index() {
            Some(0) | None => self.locations.len() - 1,
            Some(i) => i - 1,
        };
        self.select_index(prev);
    }

    pub fn selected(&self) -> Option<&LocationId> {
        self.selected.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_ref()?;
        self.locations.iter().position(|l| &l.id == id)
    }

    pub fn selected_reading(&self) -> Option<&Reading> {
        self.selected
            .as_ref()
            .and_then(|id| self.snapshot.readings.get(id))
    }

    // --- Views ---

    pub fn current_display(&self) -> DisplayBundle {
        if self.phase == Phase::Uninitialized {
            return DisplayBundle::placeholder(Availability::Loading, None, "Loading...".into());
        }
        let Some(id) = self.selected.as_ref() else {
            return DisplayBundle::placeholder(
                Availability::NoData,
                None,
                "No location selected".into(),
            );
        };
        let Some(reading) = self.snapshot.readings.get(id) else {
            return DisplayBundle::placeholder(
                Availability::NoData,
                Some(id.clone()),
                self.location_name(id),
            );
        };

        let eval = status::evaluate(reading, &self.settings.thresholds);
        let metrics = eval
            .metrics
            .iter()
            .map(|m| MetricDisplay {
                metric: m.metric,
                value: m.value,
                text: match m.metric {
                    Metric::Temperature => format_temperature(m.value),
                    Metric::Gas => format_gas(m.value),
                    Metric::AirQuality => format_air_quality(eval.air_quality),
                    Metric::Dust => format_dust(m.value),
                },
                status: m.status,
                fill: m
                    .value
                    .map_or(0.0, |v| (v * 100.0 / m.metric.full_scale()).clamp(0.0, 100.0)),
            })
            .collect();

        DisplayBundle {
            availability: Availability::Live,
            location_id: Some(id.clone()),
            location_name: reading
                .location_name
                .clone()
                .unwrap_or_else(|| self.location_name(id)),
            ventilation: Some(eval.ventilation),
            metrics,
            air_quality: Some(eval.air_quality),
            haulage: format_haulage(reading.co2, reading.pm25),
            observed_at: Some(reading.timestamp),
        }
    }

    pub fn alerts_view(&self) -> Vec<AlertDisplay> {
        self.snapshot
            .alerts
            .iter()
            .map(AlertDisplay::from_alert)
            .collect()
    }

    fn location_name(&self, id: &LocationId) -> String {
        self.locations
            .iter()
            .find(|l| &l.id == id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| format!("Location {id}"))
    }

    // --- Accessors ---

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn source_label(&self) -> String {
        self.source.describe()
    }

    /// Last refresh error, cleared by the next successful refresh.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_busy()
    }

    pub fn coalesced_ticks(&self) -> u64 {
        self.refresher.coalesced
    }
}
