use crate::payload::{LogPayload, PayloadOptions};
use crate::sink::AlertSink;
use apiglue_core::config::{AlertingConfig, ReportingConfig};
use apiglue_core::{Incident, RequestContext};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

type Predicate = dyn Fn(&Incident) -> bool + Send + Sync;

/// Incidents that are neither logged nor alerted.
///
/// Matches on numeric code, on kind, or on any custom predicate. The default
/// filter matches nothing.
#[derive(Clone, Default)]
pub struct DontReport {
    codes: HashSet<i64>,
    kinds: HashSet<String>,
    predicates: Vec<Arc<Predicate>>,
}

impl DontReport {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ReportingConfig) -> Self {
        Self {
            codes: cfg.dont_report_codes.iter().copied().collect(),
            kinds: cfg.dont_report_kinds.iter().cloned().collect(),
            predicates: Vec::new(),
        }
    }

    pub fn code(mut self, code: i64) -> Self {
        self.codes.insert(code);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kinds.insert(kind.into());
        self
    }

    pub fn predicate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Incident) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(f));
        self
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        self.codes.contains(&incident.code)
            || self.kinds.contains(&incident.kind)
            || self.predicates.iter().any(|p| p(incident))
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.kinds.is_empty() && self.predicates.is_empty()
    }
}

impl fmt::Debug for DontReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DontReport")
            .field("codes", &self.codes)
            .field("kinds", &self.kinds)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

/// Central handler for unhandled errors.
///
/// For each incident: log it through tracing, build a [`LogPayload`] from the
/// request, and push that payload at critical severity to the alert sink.
/// Rendering the HTTP response is left to the caller.
#[derive(Clone)]
pub struct ExceptionHandler {
    sink: Arc<dyn AlertSink>,
    options: PayloadOptions,
    filter: DontReport,
    message_prefix: String,
}

impl ExceptionHandler {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            sink,
            options: PayloadOptions::default(),
            filter: DontReport::none(),
            message_prefix: AlertingConfig::default().message_prefix,
        }
    }

    pub fn from_config(
        sink: Arc<dyn AlertSink>,
        alerting: &AlertingConfig,
        reporting: &ReportingConfig,
    ) -> Self {
        Self {
            sink,
            options: PayloadOptions::from(reporting),
            filter: DontReport::from_config(reporting),
            message_prefix: alerting.message_prefix.clone(),
        }
    }

    pub fn with_filter(mut self, filter: DontReport) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_options(mut self, options: PayloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_message_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.message_prefix = prefix.into();
        self
    }

    pub fn should_report(&self, incident: &Incident) -> bool {
        !self.filter.matches(incident)
    }

    /// Standard reporting path: one tracing event per incident.
    pub fn report(&self, incident: &Incident) {
        if !self.should_report(incident) {
            return;
        }
        error!(
            kind = %incident.kind,
            code = incident.code,
            status = incident.status,
            file = %incident.file,
            line = incident.line,
            "{}",
            incident.message
        );
    }

    /// Build the payload and hand it to the alert sink. Returns the payload
    /// that was sent, or `None` when the incident is filtered out.
    ///
    /// Sink failures are logged and swallowed.
    pub fn render(&self, ctx: &RequestContext, incident: &Incident) -> Option<LogPayload> {
        if !self.should_report(incident) {
            return None;
        }
        let payload = LogPayload::build(ctx, incident, &self.options);
        let message = format!("{}{}", self.message_prefix, incident.message);
        if let Err(e) = self.sink.critical(&message, &payload) {
            warn!(
                channel = %self.sink.channel(),
                incident_id = %payload.incident_id,
                error = %e,
                "Failed to hand incident to alert sink"
            );
        }
        Some(payload)
    }

    /// [`report`](Self::report) then [`render`](Self::render).
    pub fn handle(&self, ctx: &RequestContext, incident: &Incident) -> Option<LogPayload> {
        self.report(incident);
        self.render(ctx, incident)
    }
}

impl fmt::Debug for ExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandler")
            .field("channel", &self.sink.channel())
            .field("options", &self.options)
            .field("filter", &self.filter)
            .field("message_prefix", &self.message_prefix)
            .finish()
    }
}
