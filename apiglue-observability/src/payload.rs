//! Diagnostic payload attached to every incident alert.
//!
//! The JSON shape is consumed by the alert channel as-is:
//!
//! ```json
//! {
//!   "incidentId": "…", "occurredAt": "…",
//!   "loginInfo": { … },                      // internal callers only
//!   "request": {
//!     "from": { "userAgent": "…", "ip": "…" },
//!     "systemAccessType": "internal",
//!     "url": "https://host/path",
//!     "data": { … }                          // omitted for empty input
//!   },
//!   "exception": { "file": "…", "line": 42, "code": 0, "trace": "…" }
//! }
//! ```

use apiglue_core::config::ReportingConfig;
use apiglue_core::{Incident, RequestContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Which request fields drive payload assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadOptions {
    pub access_type_field: String,
    pub internal_marker: String,
    pub stripped_fields: Vec<String>,
    pub redacted_principal_fields: Vec<String>,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self::from(&ReportingConfig::default())
    }
}

impl From<&ReportingConfig> for PayloadOptions {
    fn from(cfg: &ReportingConfig) -> Self {
        Self {
            access_type_field: cfg.access_type_field.clone(),
            internal_marker: cfg.internal_marker.clone(),
            stripped_fields: cfg.stripped_fields.clone(),
            redacted_principal_fields: cfg.redacted_principal_fields.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    pub incident_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_info: Option<Map<String, Value>>,
    pub request: RequestInfo,
    pub exception: ExceptionInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub from: RequestOrigin,
    pub system_access_type: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOrigin {
    pub user_agent: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub file: String,
    pub line: u32,
    pub code: i64,
    pub trace: String,
}

impl LogPayload {
    pub fn build(ctx: &RequestContext, incident: &Incident, opts: &PayloadOptions) -> Self {
        let access_type = ctx.input_str(&opts.access_type_field);

        let login_info = if access_type.as_deref() == Some(opts.internal_marker.as_str()) {
            Some(
                ctx.principal
                    .as_ref()
                    .map(|p| p.redacted(&opts.redacted_principal_fields))
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        let data = (!ctx.input.is_empty()).then(|| {
            ctx.input
                .iter()
                .filter(|(key, _)| !opts.stripped_fields.iter().any(|f| f == *key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        });

        Self {
            incident_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            login_info,
            request: RequestInfo {
                from: RequestOrigin {
                    user_agent: ctx.user_agent.clone(),
                    ip: ctx.client_ip.clone(),
                },
                system_access_type: access_type,
                url: ctx.url.clone(),
                data,
            },
            exception: ExceptionInfo {
                file: incident.file.clone(),
                line: incident.line,
                code: incident.code,
                trace: incident.trace.clone(),
            },
        }
    }
}
