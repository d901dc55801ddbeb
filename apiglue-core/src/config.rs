use crate::error::CoreError;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub alerting: AlertingConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Request bodies up to this size are buffered so their JSON input can be
    /// attached to incident payloads. Larger bodies stream through untouched.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Alert channel settings. Without a webhook URL alerts go to the tracing
/// subscriber instead of Slack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_message_prefix")]
    pub message_prefix: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Incident reporting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Incident codes that are never reported.
    #[serde(default)]
    pub dont_report_codes: Vec<i64>,
    /// Incident kinds that are never reported.
    #[serde(default)]
    pub dont_report_kinds: Vec<String>,
    /// Input field whose value marks the caller's access type.
    #[serde(default = "default_access_type_field")]
    pub access_type_field: String,
    /// Access-type value that unlocks principal info in payloads.
    #[serde(default = "default_internal_marker")]
    pub internal_marker: String,
    /// Input fields removed before the request data is logged.
    #[serde(default = "default_stripped_fields")]
    pub stripped_fields: Vec<String>,
    /// Principal fields never copied into payloads.
    #[serde(default = "default_redacted_principal_fields")]
    pub redacted_principal_fields: Vec<String>,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_addr() -> String { "0.0.0.0:8080".into() }
fn default_body_limit() -> usize { 1024 * 1024 }
fn default_true() -> bool { true }
fn default_channel() -> String { "slack".into() }
fn default_message_prefix() -> String { "*Back-end* : ".into() }
fn default_queue_capacity() -> usize { 1024 }
fn default_timeout() -> u64 { 5 }
fn default_access_type_field() -> String { "api_access_type".into() }
fn default_internal_marker() -> String { "internal".into() }
fn default_stripped_fields() -> Vec<String> {
    vec!["__tReqData".into(), "api_access_type".into()]
}
fn default_redacted_principal_fields() -> Vec<String> {
    vec!["random_string".into(), "token_created_on".into()]
}

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: default_channel(),
            webhook_url: None,
            message_prefix: default_message_prefix(),
            queue_capacity: default_queue_capacity(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            dont_report_codes: Vec::new(),
            dont_report_kinds: Vec::new(),
            access_type_field: default_access_type_field(),
            internal_marker: default_internal_marker(),
            stripped_fields: default_stripped_fields(),
            redacted_principal_fields: default_redacted_principal_fields(),
        }
    }
}

impl AppConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Env vars use the `APIGLUE_` prefix and `__` as the nesting separator,
    /// e.g. `APIGLUE_ALERTING__WEBHOOK_URL`.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let config: AppConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APIGLUE_").split("__"))
            .extract()?;
        Ok(config)
    }
}
