use std::time::Duration;
use tracing::debug;

use super::wire::{self, WirePayload};
use super::{locations_from_readings, Alert, DataSource, Location, ReadingMap, Snapshot, SourceError};

/// Polls a dashboard endpoint that serves the wire document on `?ajax=1`.
pub struct HttpSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(2000))
            .timeout_read(Duration::from_secs(4))
            .build();
        Self {
            url: url.into(),
            agent,
        }
    }

    fn fetch(&self) -> Result<WirePayload, SourceError> {
        debug!(url = %self.url, "fetching dashboard payload");
        let resp = self
            .agent
            .get(&self.url)
            .query("ajax", "1")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => SourceError::Status(code),
                ureq::Error::Transport(t) => SourceError::Transport(t.to_string()),
            })?;
        let body = resp
            .into_string()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        wire::decode(&body)
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn locations(&self) -> Result<Vec<Location>, SourceError> {
        let snapshot = self.fetch()?.into_snapshot(0);
        Ok(locations_from_readings(&snapshot.readings))
    }

    fn latest_readings(&self) -> Result<ReadingMap, SourceError> {
        Ok(self.fetch()?.into_snapshot(0).readings)
    }

    fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, SourceError> {
        Ok(self.fetch()?.into_snapshot(limit).alerts)
    }

    // One request carries both halves, so readings and alerts always match.
    fn snapshot(&self, alert_limit: usize) -> Result<Snapshot, SourceError> {
        Ok(self.fetch()?.into_snapshot(alert_limit))
    }
}
