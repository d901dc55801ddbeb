use crate::payload::LogPayload;
use crate::sink::{AlertSink, SinkError};
use apiglue_core::config::AlertingConfig;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Duration;
use tracing::{debug, error, warn};

/// Slack incoming-webhook sink. A no-op when disabled.
///
/// `critical` only does a `try_send`; a background task owns the HTTP client
/// and posts one message per alert. No retries: a failed post is logged and
/// dropped.
pub struct SlackWebhookSink {
    channel: String,
    sender: Option<mpsc::Sender<Value>>,
}

impl SlackWebhookSink {
    /// Spawns the delivery task. Must be called inside a tokio runtime when
    /// alerting is enabled and a webhook URL is set.
    pub fn new(config: &AlertingConfig) -> Self {
        let endpoint = match (&config.webhook_url, config.enabled) {
            (Some(url), true) => url.clone(),
            _ => return Self::disabled(&config.channel),
        };

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        tokio::spawn(Self::delivery_loop(
            endpoint,
            Duration::from_secs(config.timeout_secs),
            rx,
        ));
        Self {
            channel: config.channel.clone(),
            sender: Some(tx),
        }
    }

    /// No-op constructor for disabled alerting.
    pub fn disabled(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            sender: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    async fn delivery_loop(endpoint: String, timeout: Duration, mut rx: mpsc::Receiver<Value>) {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Slack client build failed, alerts will be dropped");
                return;
            }
        };

        while let Some(message) = rx.recv().await {
            match client.post(&endpoint).json(&message).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("Delivered alert to Slack");
                }
                Ok(resp) => {
                    error!(status = %resp.status(), "Slack webhook rejected alert");
                }
                Err(e) => {
                    error!(error = %e, "Slack webhook connection error");
                }
            }
        }
        debug!("Slack alert queue closed");
    }
}

/// Webhook body: headline text plus the payload as a code block.
pub fn slack_message(message: &str, payload: &LogPayload) -> Value {
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
    json!({
        "text": message,
        "attachments": [{
            "color": "danger",
            "title": format!("Incident {}", payload.incident_id),
            "fields": [
                { "title": "URL", "value": payload.request.url, "short": false },
                { "title": "IP", "value": payload.request.from.ip, "short": true },
                {
                    "title": "Location",
                    "value": format!("{}:{}", payload.exception.file, payload.exception.line),
                    "short": true
                }
            ],
            "text": format!("```{pretty}```"),
            "ts": payload.occurred_at.timestamp(),
        }]
    })
}

impl AlertSink for SlackWebhookSink {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn critical(&self, message: &str, payload: &LogPayload) -> Result<(), SinkError> {
        let Some(ref sender) = self.sender else {
            return Ok(());
        };
        sender
            .try_send(slack_message(message, payload))
            .map_err(|e| match e {
                TrySendError::Full(_) => {
                    warn!(channel = %self.channel, "Slack alert queue full, dropping alert");
                    SinkError::QueueFull
                }
                TrySendError::Closed(_) => SinkError::Closed,
            })
    }
}
