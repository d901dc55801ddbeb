use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write;
use std::panic::Location;

/// One unhandled error, with the place it was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub message: String,
    /// Short classifier, e.g. `"internal"`, `"not_found"`, `"panic"`.
    pub kind: String,
    pub file: String,
    pub line: u32,
    /// Application-defined numeric code; `0` when the error carries none.
    pub code: i64,
    /// HTTP status the error was rendered with.
    pub status: u16,
    pub trace: String,
}

impl Incident {
    /// New incident located at the caller.
    #[track_caller]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::located(kind, message, Location::caller())
    }

    pub fn located(
        kind: impl Into<String>,
        message: impl Into<String>,
        location: &Location<'_>,
    ) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            file: location.file().to_string(),
            line: location.line(),
            code: 0,
            status: 500,
            trace: String::new(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }
}

/// Render an error's cause chain, followed by the backtrace when one was
/// captured.
pub fn render_trace(err: &(dyn Error + 'static), backtrace: &Backtrace) -> String {
    let mut out = String::new();
    let mut current: Option<&(dyn Error + 'static)> = Some(err);
    let mut depth = 0usize;
    while let Some(e) = current {
        if depth == 0 {
            let _ = writeln!(out, "#{depth} {e}");
        } else {
            let _ = writeln!(out, "#{depth} caused by: {e}");
        }
        depth += 1;
        current = e.source();
    }
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(out, "{backtrace}");
    }
    out.trim_end().to_string()
}
