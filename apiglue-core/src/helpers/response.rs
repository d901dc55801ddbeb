use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON envelope returned by every API endpoint.
///
/// Serialises as `{"success": .., "message": .., "data": ..}`; `data` is left
/// out when it is empty (see [`is_empty_value`]).
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip)]
    status: StatusCode,
    #[serde(skip)]
    headers: HeaderMap,
}

impl ApiResponse {
    /// Successful envelope, always HTTP 200.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Failure envelope with the given status. Codes outside the valid HTTP
    /// range are sent as 500.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a payload. Empty payloads are dropped.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = (!is_empty_value(&data)).then_some(data);
        self
    }

    /// Serialise and attach a payload.
    pub fn with_serialized<T: Serialize>(self, data: &T) -> Result<Self, serde_json::Error> {
        Ok(self.with_data(serde_json::to_value(data)?))
    }

    /// Extra response headers, merged over any already set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ApiResponse {
    fn into_response(mut self) -> axum::response::Response {
        let status = self.status;
        let headers = std::mem::take(&mut self.headers);
        (status, headers, axum::Json(self)).into_response()
    }
}

/// Result record passed between internal calls (never sent over HTTP as-is).
///
/// `data` is serialised only when supplied, so "no data" and "empty data"
/// stay distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCallResult<T = Value> {
    pub status: bool,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> SubCallResult<T> {
    pub fn new(status: bool, message: Option<String>, data: Option<T>) -> Self {
        Self { status, message, data }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(true, Some(message.into()), Some(data))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(false, Some(message.into()), None)
    }
}

/// A user-safe message carried next to a developer-only detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionData {
    pub end_user: Value,
    pub dev: Value,
}

impl ExceptionData {
    pub fn new(for_user: impl Into<Value>, for_dev: impl Into<Value>) -> Self {
        Self {
            end_user: for_user.into(),
            dev: for_dev.into(),
        }
    }
}

impl Default for ExceptionData {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// `null`, `""`, `[]` and `{}` count as empty. `0` and `false` do not.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    #[test]
    fn success_without_data_omits_field() {
        let resp = ApiResponse::success("Saved");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&resp.to_json().unwrap()).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Saved"}));
    }

    #[test]
    fn empty_containers_are_dropped() {
        for empty in [json!(null), json!([]), json!({}), json!("")] {
            let resp = ApiResponse::success("ok").with_data(empty);
            assert!(resp.data.is_none());
        }
    }

    #[test]
    fn falsy_scalars_are_kept() {
        let resp = ApiResponse::success("ok").with_data(json!(0));
        assert_eq!(resp.data, Some(json!(0)));
        let resp = ApiResponse::error(400, "bad").with_data(json!(false));
        assert_eq!(resp.data, Some(json!(false)));
        let resp = ApiResponse::success("ok").with_data(json!("0"));
        assert_eq!(resp.data, Some(json!("0")));
    }

    #[test]
    fn error_carries_status_and_data() {
        let resp = ApiResponse::error(422, "Invalid input").with_data(json!({"field": "email"}));
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&resp.to_json().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Invalid input", "data": {"field": "email"}})
        );
    }

    #[test]
    fn error_with_out_of_range_code_falls_back_to_500() {
        let resp = ApiResponse::error(42, "weird");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn headers_are_kept_out_of_body() {
        let mut headers = HeaderMap::new();
        headers.insert("x-total-count", HeaderValue::from_static("3"));
        let resp = ApiResponse::success("ok").with_headers(headers);
        assert_eq!(resp.headers()["x-total-count"], "3");
        assert!(!resp.to_json().unwrap().contains("x-total-count"));
    }

    #[test]
    fn with_serialized_converts_structs() {
        #[derive(Serialize)]
        struct Row {
            id: u32,
        }
        let resp = ApiResponse::success("ok").with_serialized(&vec![Row { id: 1 }]).unwrap();
        assert_eq!(resp.data, Some(json!([{"id": 1}])));
    }

    #[test]
    fn sub_call_result_distinguishes_missing_and_empty_data() {
        let none: SubCallResult = SubCallResult::new(true, None, None);
        assert_eq!(
            serde_json::to_value(&none).unwrap(),
            json!({"status": true, "message": null})
        );

        let empty: SubCallResult = SubCallResult::new(true, Some("done".into()), Some(json!([])));
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({"status": true, "message": "done", "data": []})
        );
    }

    #[test]
    fn sub_call_result_shortcuts() {
        let ok = SubCallResult::ok("fetched", 5);
        assert!(ok.status);
        assert_eq!(ok.data, Some(5));
        let failed: SubCallResult<u8> = SubCallResult::failed("nope");
        assert!(!failed.status);
        assert!(failed.data.is_none());
    }

    #[test]
    fn exception_data_shape() {
        let data = ExceptionData::new("Something went wrong", "db timeout after 5s");
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"end_user": "Something went wrong", "dev": "db timeout after 5s"})
        );
        assert_eq!(
            serde_json::to_value(ExceptionData::default()).unwrap(),
            json!({"end_user": "", "dev": ""})
        );
    }
}
