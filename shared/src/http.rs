//! HTTP helpers for Lambda functions.

use chrono::NaiveDate;
use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::{Error, Result};

/// Body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

fn builder(status: u16) -> lambda_http::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
}

fn build(builder: lambda_http::http::response::Builder, body: Body) -> Result<Response<Body>> {
    builder
        .body(body)
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    build(
        builder(status).header("content-type", "application/json"),
        Body::from(serde_json::to_string(data)?),
    )
}

/// 200 with no body.
pub fn empty_response() -> Result<Response<Body>> {
    build(builder(200), Body::Empty)
}

/// CORS preflight answer.
pub fn preflight_response(methods: &str) -> Result<Response<Body>> {
    build(
        builder(204)
            .header("Access-Control-Allow-Methods", methods)
            .header("Access-Control-Allow-Headers", "Content-Type, Authorization"),
        Body::Empty,
    )
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>> {
    json_response(
        status,
        &ErrorBody {
            success: false,
            error: message.into(),
        },
    )
}

/// Map a service error onto its status code, logging server-side failures.
pub fn error_into_response(err: &Error) -> Result<Response<Body>> {
    let status = err.status_code();
    if status >= 500 {
        error!("Request failed: {}", err);
        error_response(status, "Internal server error")
    } else {
        warn!("Request rejected: {}", err);
        error_response(status, err.to_string())
    }
}

/// Parse request body as JSON.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

/// Path segments with the `/api` stage prefix removed.
pub fn path_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }
    segments
}

/// Parse a numeric id taken from the path.
pub fn parse_id(raw: &str, what: &str) -> Result<i64> {
    parse_number(raw, what)
}

/// Parse a path value of any `FromStr` number type.
pub fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Validation(format!("Invalid {}: {}", what, raw)))
}

/// A required query string parameter.
pub fn query_param(event: &Request, name: &str) -> Result<String> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
        .map(String::from)
        .ok_or_else(|| Error::Validation(format!("Missing query parameter: {}", name)))
}

/// A required ISO-8601 (`YYYY-MM-DD`) date query parameter.
pub fn query_date(event: &Request, name: &str) -> Result<NaiveDate> {
    let raw = query_param(event, name)?;
    raw.parse()
        .map_err(|_| Error::Validation(format!("Invalid date for {}: {}", name, raw)))
}
