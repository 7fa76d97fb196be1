//! Access logging, panic recovery and timeout responses for the tower-http
//! stack.

use std::any::Any;
use std::time::Duration;

use axum::http::{HeaderMap, Request, Response, StatusCode};
use axum::response::IntoResponse;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{error, info, Span};

use crate::error::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span maker and completion logger for `TraceLayer`.
///
/// Each request gets a `request` span carrying its id, method, path and
/// client address; completion logs one `request completed` line inside it.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessLog;

impl<B> MakeSpan<B> for AccessLog {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let headers = request.headers();
        tracing::info_span!(
            "request",
            request_id = header_str(headers, REQUEST_ID_HEADER).unwrap_or_default(),
            method = %request.method(),
            path = request.uri().path(),
            client_ip = client_ip(headers).unwrap_or_default(),
        )
    }
}

impl<B> OnResponse<B> for AccessLog {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let length = header_str(response.headers(), "content-length")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        info!(
            status = response.status().as_u16(),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            length,
            "request completed"
        );
    }
}

/// Real client address from proxy headers, first hop wins.
pub fn client_ip(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `CatchPanicLayer` hook: log the payload, answer with the 500 envelope.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!(panic = detail, "handler panicked");
    ApiError::internal().into_response()
}

/// Replaces the empty body `TimeoutLayer` answers with the 504 envelope.
pub async fn timeout_envelope(response: axum::response::Response) -> axum::response::Response {
    if response.status() == StatusCode::GATEWAY_TIMEOUT {
        return ApiError::timeout().into_response();
    }
    response
}
