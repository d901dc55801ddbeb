use crate::helpers::request::{client_ip, received_token, user_agent};
use http::{HeaderMap, Uri, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;

/// The authenticated actor behind a request.
///
/// Auth middleware inserts this into the request extensions; the exception
/// handler only copies it into incident payloads for internal callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub Map<String, Value>);

impl Principal {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Copy of the principal without the named fields.
    pub fn redacted(&self, excluded: &[String]) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(key, _)| !excluded.iter().any(|e| e == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Snapshot of everything the helpers and the exception handler read from an
/// inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub client_ip: String,
    pub user_agent: String,
    /// Scheme, host and path; no query string.
    pub url: String,
    pub auth_token: Option<String>,
    /// Query parameters merged with the JSON body (body wins).
    pub input: Map<String, Value>,
    pub principal: Option<Principal>,
}

impl RequestContext {
    pub fn from_parts(headers: &HeaderMap, uri: &Uri, remote: Option<SocketAddr>) -> Self {
        Self {
            client_ip: client_ip(headers, remote),
            user_agent: user_agent(headers),
            url: request_url(headers, uri),
            auth_token: received_token(headers),
            input: Map::new(),
            principal: None,
        }
    }

    /// Merge input fields; later values overwrite earlier ones.
    pub fn with_input(mut self, input: Map<String, Value>) -> Self {
        self.input.extend(input);
        self
    }

    pub fn with_principal(mut self, principal: Option<Principal>) -> Self {
        self.principal = principal;
        self
    }

    /// String value of an input field. Numbers and booleans are rendered.
    pub fn input_str(&self, key: &str) -> Option<String> {
        match self.input.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(feature = "axum")]
mod axum_support {
    use super::*;
    use axum::extract::{ConnectInfo, FromRequestParts, Query};
    use http::request::Parts;
    use std::convert::Infallible;

    impl RequestContext {
        /// Context from request parts: headers, URI, peer address, the
        /// principal extension and the query string. The body is not read.
        pub fn from_http_parts(parts: &Parts) -> Self {
            let remote = parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0);
            let principal = parts.extensions.get::<Principal>().cloned();
            let query = Query::<Map<String, Value>>::try_from_uri(&parts.uri)
                .map(|Query(q)| q)
                .unwrap_or_default();

            Self::from_parts(&parts.headers, &parts.uri, remote)
                .with_principal(principal)
                .with_input(query)
        }
    }

    impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
        type Rejection = Infallible;

        async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
            Ok(Self::from_http_parts(parts))
        }
    }
}

/// Absolute request URL without the query string.
fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = uri
        .scheme_str()
        .or_else(|| {
            headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("http");
    let host = uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });

    match host {
        Some(host) => format!("{scheme}://{host}{}", uri.path()),
        None => uri.path().to_string(),
    }
}
