//! Response builders for the API routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{header, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::types::{IndexError, INTERNAL_SERVER_ERROR};

pub const NO_ACCESS_TOKEN: &str = "No access token.";
pub const NO_PATH_SPECIFIED: &str = "No path specified.";

/// JSON response with the given status
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(body).unwrap_or_else(|_| {
        json!({ "error": INTERNAL_SERVER_ERROR }).to_string().into_bytes()
    });

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message }))
}

/// Map an [`IndexError`] to its status and `{"error": …}` body
pub fn from_error(err: IndexError) -> Response<Full<Bytes>> {
    let (status, body) = err.into_status_code_and_body();
    json_response(status, &body)
}

/// 302 to `location`
pub fn redirect_response(location: &str) -> Response<Full<Bytes>> {
    match HeaderValue::from_str(location) {
        Ok(value) => Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, value)
            .body(Full::new(Bytes::new()))
            .unwrap(),
        Err(_) => {
            warn!("Refusing to redirect to a location that is not a valid header value");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
        }
    }
}

/// Headers the file routes attach to every answer past the auth check
pub fn file_headers(cache_control: &str) -> Vec<(HeaderName, String)> {
    vec![
        (header::CACHE_CONTROL, cache_control.to_string()),
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS".to_string()),
    ]
}

/// Set `headers` on `response`, replacing existing values. Values that are
/// not valid header text are skipped.
pub fn with_headers(
    mut response: Response<Full<Bytes>>,
    headers: &[(HeaderName, String)],
) -> Response<Full<Bytes>> {
    for (name, value) in headers {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                response.headers_mut().insert(name.clone(), value);
            }
            Err(_) => warn!(header = %name, "Skipping invalid header value"),
        }
    }
    response
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS")
        .header(header::ACCESS_CONTROL_MAX_AGE, "86400")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({ "error": "Not Found", "path": path }),
    )
}
