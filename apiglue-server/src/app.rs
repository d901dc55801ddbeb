use crate::handlers;
use apiglue_core::AppConfig;
use apiglue_observability::{AlertSink, ExceptionHandler, SlackWebhookSink, TracingSink};
use apiglue_web::{ReportState, with_exception_reporting};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Slack when a webhook is configured and alerting is on, otherwise alerts
/// go to the log. Spawns the Slack delivery task, so call inside a runtime.
pub fn alert_sink(config: &AppConfig) -> Arc<dyn AlertSink> {
    let alerting = &config.alerting;
    if alerting.enabled && alerting.webhook_url.is_some() {
        info!(channel = %alerting.channel, "Alerts go to Slack webhook");
        Arc::new(SlackWebhookSink::new(alerting))
    } else {
        info!(channel = %alerting.channel, "No webhook configured, alerts go to the log");
        Arc::new(TracingSink::new(alerting.channel.clone()))
    }
}

/// Demo routes wrapped in exception reporting and request tracing.
pub fn build_app(config: &AppConfig, sink: Arc<dyn AlertSink>) -> Router {
    let handler = ExceptionHandler::from_config(sink, &config.alerting, &config.reporting);
    let state = ReportState::new(handler, config.server.body_limit_bytes);

    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/request-info", get(handlers::request_info))
        .route("/status/{code}", get(handlers::status))
        .route("/fail", post(handlers::fail))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed);

    with_exception_reporting(routes, state).layer(TraceLayer::new_for_http())
}
