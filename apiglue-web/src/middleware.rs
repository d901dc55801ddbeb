use crate::panic::{install_panic_hook, panic_response};
use apiglue_core::{Incident, RequestContext};
use apiglue_observability::ExceptionHandler;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Form, FromRequest, Request, State};
use axum::http::{self, HeaderMap, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::debug;

/// Shared state for [`report_exceptions`].
#[derive(Clone)]
pub struct ReportState {
    pub handler: Arc<ExceptionHandler>,
    /// Largest request body copied into the incident payload.
    pub body_limit: usize,
}

impl ReportState {
    pub fn new(handler: ExceptionHandler, body_limit: usize) -> Self {
        Self {
            handler: Arc::new(handler),
            body_limit,
        }
    }
}

/// Request bodies that are decoded into the incident input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let ct = headers
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .trim_start()
        .to_ascii_lowercase();
    if ct.starts_with("application/json") {
        Some(BodyKind::Json)
    } else if ct.starts_with("application/x-www-form-urlencoded") {
        Some(BodyKind::Form)
    } else {
        None
    }
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Buffer up to `limit` bytes of `body`.
///
/// Returns the full body when it fits. Otherwise, or when reading fails, no
/// snapshot is returned and the new body replays what was already read
/// followed by the rest of the stream (including the read error).
async fn buffer_body(body: Body, limit: usize) -> (Option<Bytes>, Body) {
    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                buf.extend_from_slice(&chunk);
                if buf.len() > limit {
                    debug!(limit, "Request body over snapshot limit, passing through");
                    let head = stream::iter([Ok::<_, axum::Error>(Bytes::from(buf))]);
                    return (None, Body::from_stream(head.chain(stream)));
                }
            }
            Err(e) => {
                debug!(error = %e, "Request body read failed, passing through without snapshot");
                let head = stream::iter([Ok(Bytes::from(buf)), Err(e)]);
                return (None, Body::from_stream(head.chain(stream)));
            }
        }
    }

    let bytes = Bytes::from(buf);
    (Some(bytes.clone()), Body::from(bytes))
}

/// Decode a buffered body into input fields. Anything that is not a JSON
/// object or a valid form yields `None`.
async fn decode_input(kind: BodyKind, bytes: Bytes) -> Option<Map<String, Value>> {
    match kind {
        BodyKind::Json => serde_json::from_slice(&bytes).ok(),
        BodyKind::Form => {
            let request = http::Request::builder()
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(bytes))
                .ok()?;
            Form::<Map<String, Value>>::from_request(request, &())
                .await
                .ok()
                .map(|Form(fields)| fields)
        }
    }
}

/// Middleware: snapshot the request, run the inner service, and hand any
/// [`Incident`] the response carries to the exception handler.
///
/// JSON object and urlencoded form bodies up to `body_limit` are buffered,
/// merged over the query parameters, and passed on unchanged. Bodies that
/// declare a larger length, or turn out larger while reading, are passed on
/// without a snapshot. Other content types are streamed through untouched.
pub async fn report_exceptions(
    State(state): State<ReportState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::from_http_parts(&parts);

    let declared_too_large =
        content_length(&parts.headers).is_some_and(|len| len > state.body_limit);

    let body = match body_kind(&parts.headers) {
        Some(kind) if !declared_too_large => {
            let (snapshot, body) = buffer_body(body, state.body_limit).await;
            if let Some(bytes) = snapshot {
                if let Some(fields) = decode_input(kind, bytes).await {
                    ctx = ctx.with_input(fields);
                }
            }
            body
        }
        _ => body,
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    if let Some(incident) = response.extensions().get::<Incident>() {
        state.handler.handle(&ctx, incident);
    }
    response
}

/// Wrap `router` with panic capture and exception reporting.
///
/// Panics become 500 envelopes carrying an incident; the reporter sits
/// outside the panic layer so both handler errors and panics reach it.
pub fn with_exception_reporting(router: Router, state: ReportState) -> Router {
    install_panic_hook();
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state, report_exceptions))
}
