use apiglue_core::helpers::status_message;
use apiglue_core::incident::render_trace;
use apiglue_core::{ApiResponse, Incident};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Unprocessable { message: String, data: Value },

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Request could not be extracted (bad path, query or body).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden(_) => StatusCode::FORBIDDEN,
            ErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorKind::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Status { status, .. } | ErrorKind::Rejected { status, .. } => *status,
            ErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short classifier used for incident filtering.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest(_) => "bad_request",
            ErrorKind::Unauthorized(_) => "unauthorized",
            ErrorKind::Forbidden(_) => "forbidden",
            ErrorKind::NotFound(_) => "not_found",
            ErrorKind::Unprocessable { .. } => "unprocessable",
            ErrorKind::Status { .. } => "status",
            ErrorKind::Rejected { .. } => "rejected",
            ErrorKind::Internal(_) => "internal",
        }
    }
}

/// Error returned from axum handlers.
///
/// Every constructor records the source location it was called from, and
/// `?` on any `Into<anyhow::Error>` does the same through the blanket `From`.
/// Rendering produces the `{success:false, ..}` envelope and attaches an
/// [`Incident`] to the response extensions for the reporting middleware.
pub struct AppError {
    kind: ErrorKind,
    code: i64,
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl AppError {
    #[track_caller]
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            code: 0,
            location: Location::caller(),
            backtrace: Backtrace::capture(),
        }
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest(message.into()))
    }

    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized(message.into()))
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden(message.into()))
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(message.into()))
    }

    #[track_caller]
    pub fn unprocessable(message: impl Into<String>, data: Value) -> Self {
        Self::new(ErrorKind::Unprocessable {
            message: message.into(),
            data,
        })
    }

    /// Arbitrary status. Invalid codes become 500.
    #[track_caller]
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Status {
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
        })
    }

    /// Extractor rejection, rendered with the rejection's own status.
    #[track_caller]
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected {
            status,
            message: message.into(),
        })
    }

    #[track_caller]
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorKind::Internal(err.into()))
    }

    /// Application-defined numeric code carried into the incident.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn incident(&self) -> Incident {
        let trace = match &self.kind {
            ErrorKind::Internal(err) => render_trace(&**err, &self.backtrace),
            other => render_trace(other, &self.backtrace),
        };
        Incident::located(self.kind.name(), self.kind.to_string(), self.location)
            .with_code(self.code)
            .with_status(self.status_code().as_u16())
            .with_trace(trace)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("location", &self.location)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    #[track_caller]
    fn from(err: E) -> Self {
        Self::new(ErrorKind::Internal(err.into()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let incident = self.incident();

        let body = match &self.kind {
            // Internal details stay in the incident, never in the body.
            ErrorKind::Internal(_) => {
                ApiResponse::error(status.as_u16(), status_message(status.as_u16()))
            }
            ErrorKind::Unprocessable { message, data } => {
                ApiResponse::error(status.as_u16(), message.clone()).with_data(data.clone())
            }
            other => ApiResponse::error(status.as_u16(), other.to_string()),
        };

        let mut response = body.into_response();
        response.extensions_mut().insert(incident);
        response
    }
}
