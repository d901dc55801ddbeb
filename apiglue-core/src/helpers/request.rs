use crate::context::RequestContext;
use chrono::{DateTime, TimeZone};
use http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Returned by [`client_ip`] when no source yields an address.
pub const UNKNOWN_IP: &str = "UNKNOWN";

/// Header priority for client IP extraction (highest to lowest).
const IP_HEADERS: &[&str] = &[
    "client-ip",
    "x-forwarded-for",
    "x-forwarded",
    "forwarded-for",
    "forwarded",
];

/// Client address: the first non-empty proxy header, else the socket peer,
/// else [`UNKNOWN_IP`].
///
/// Header values are returned as received (trimmed), so a forwarded chain
/// stays a chain.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    for name in IP_HEADERS {
        let value = headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = value {
            return ip.to_string();
        }
    }

    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// `User-Agent` header, or an empty string.
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Token the caller authenticated with: a bearer `Authorization` value,
/// falling back to `x-auth-token`.
pub fn received_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer
        .or_else(|| {
            headers
                .get("x-auth-token")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .map(str::to_string)
}

/// Request snapshot attached to background jobs triggered from a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExtraRequestData {
    pub request_time: String,
    pub remote_addr: String,
    pub auth_token: Option<String>,
    pub user_agent: String,
}

impl ExtraRequestData {
    pub fn capture<Tz>(ctx: &RequestContext, now: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            request_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            remote_addr: ctx.client_ip.clone(),
            auth_token: ctx.auth_token.clone(),
            user_agent: ctx.user_agent.clone(),
        }
    }
}
