use crate::payload::LogPayload;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Alert queue full")]
    QueueFull,

    #[error("Alert channel closed")]
    Closed,
}

/// Destination for critical incident alerts.
///
/// `critical` must not block the request path; sinks that talk to the
/// network hand the payload to a background task.
pub trait AlertSink: Send + Sync {
    /// Channel name used in logs.
    fn channel(&self) -> &str;

    fn critical(&self, message: &str, payload: &LogPayload) -> Result<(), SinkError>;
}

/// Writes alerts to the tracing subscriber. Used when no webhook is set.
#[derive(Debug, Clone)]
pub struct TracingSink {
    channel: String,
}

impl TracingSink {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl AlertSink for TracingSink {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn critical(&self, message: &str, payload: &LogPayload) -> Result<(), SinkError> {
        let body = serde_json::to_string(payload).unwrap_or_default();
        error!(
            target: "apiglue::alert",
            channel = %self.channel,
            severity = "critical",
            incident_id = %payload.incident_id,
            payload = %body,
            "{message}"
        );
        Ok(())
    }
}

/// Keeps alerts in memory. Handy for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    alerts: Arc<Mutex<Vec<(String, LogPayload)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts received so far, oldest first.
    pub fn alerts(&self) -> Vec<(String, LogPayload)> {
        self.alerts
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertSink for MemorySink {
    fn channel(&self) -> &str {
        "memory"
    }

    fn critical(&self, message: &str, payload: &LogPayload) -> Result<(), SinkError> {
        self.alerts
            .lock()
            .map_err(|_| SinkError::Closed)?
            .push((message.to_string(), payload.clone()));
        Ok(())
    }
}
