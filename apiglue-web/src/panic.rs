//! Panic capture for handlers.
//!
//! `CatchPanicLayer` only sees the panic payload, so a process-wide hook
//! stashes the panic location and backtrace in a thread-local; the layer's
//! response builder runs on the same thread right after unwinding and picks
//! them up.

use apiglue_core::helpers::status_message;
use apiglue_core::{ApiResponse, Incident};
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::sync::Once;

struct PanicSite {
    file: String,
    line: u32,
    backtrace: String,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the location-recording panic hook. Idempotent; the previously
/// installed hook still runs.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                let site = PanicSite {
                    file: location.file().to_string(),
                    line: location.line(),
                    backtrace: Backtrace::force_capture().to_string(),
                };
                LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(site));
            }
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Incident for a caught panic. Uses the site recorded by the hook when one
/// is available on this thread.
pub fn panic_incident(payload: &(dyn Any + Send)) -> Incident {
    let message = panic_message(payload);
    let site = LAST_PANIC.with(|slot| slot.borrow_mut().take());
    let (file, line, backtrace) = match site {
        Some(site) => (site.file, site.line, site.backtrace),
        None => ("<unknown>".to_string(), 0, String::new()),
    };

    let mut trace = format!("#0 panicked: {message}");
    if !backtrace.is_empty() {
        trace.push('\n');
        trace.push_str(&backtrace);
    }

    Incident {
        message,
        kind: "panic".to_string(),
        file,
        line,
        code: 0,
        status: 500,
        trace,
    }
}

/// Response builder for `CatchPanicLayer::custom`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let incident = panic_incident(payload.as_ref());
    let mut response = ApiResponse::error(500, status_message(500)).into_response();
    response.extensions_mut().insert(incident);
    response
}
