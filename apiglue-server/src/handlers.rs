use apiglue_core::helpers::{ExtraRequestData, status_message};
use apiglue_core::{ApiResponse, RequestContext};
use apiglue_web::AppError;
use apiglue_web::extract::Path;
use chrono::Local;
use serde_json::json;

pub async fn health() -> ApiResponse {
    ApiResponse::success("OK").with_data(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// Echoes the request snapshot a background job would receive.
pub async fn request_info(ctx: RequestContext) -> Result<ApiResponse, AppError> {
    let extra = ExtraRequestData::capture(&ctx, Local::now());
    Ok(ApiResponse::success("Request info").with_serialized(&extra)?)
}

/// Reason phrase for a status code, rendered with that code.
pub async fn status(Path(code): Path<u16>) -> ApiResponse {
    let message = status_message(code);
    if (200..300).contains(&code) {
        ApiResponse::success(message)
    } else {
        ApiResponse::error(code, message)
    }
}

/// Always fails; drives the reporting pipeline end to end.
pub async fn fail() -> Result<ApiResponse, AppError> {
    Err(AppError::internal(anyhow::anyhow!(
        "Deliberate failure requested via /fail"
    )))
}

pub async fn not_found() -> AppError {
    AppError::not_found(status_message(404))
}

pub async fn method_not_allowed() -> AppError {
    AppError::status(405, status_message(405))
}
