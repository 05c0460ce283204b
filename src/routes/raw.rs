//! `GET /api/raw?path=&odpt=&proxy=` and `GET /api/name/{name}?path=`
//!
//! Resolves a file to its pre-authenticated download URL and either
//! redirects there or, in proxy mode, fetches the bytes and serves them
//! itself. The `name` route only exists so a link can end with a filename.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderName};
use hyper::{HeaderMap, Response, StatusCode};
use tracing::debug;

use super::params::{od_protected_token, parse_bool, QueryParams};
use super::response::{
    error_response, file_headers, from_error, redirect_response, with_headers, NO_PATH_SPECIFIED,
};
use super::{authorize, cache_control, require_access_token};
use crate::graph::{is_missing_path, normalize_path, DriveItem, DOWNLOAD_SELECT};
use crate::server::AppState;

pub const NO_DOWNLOAD_URL: &str = "No download url found.";

pub async fn handle_raw(
    state: &AppState,
    params: &QueryParams,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let access_token = match require_access_token(state).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let path = match params.get("path", "/") {
        p if p.is_empty() => "/".to_string(),
        p => p,
    };
    let odpt = params.get("odpt", "");
    let proxy = parse_bool(&params.get("proxy", "false"));

    if is_missing_path(&path) {
        return error_response(StatusCode::BAD_REQUEST, NO_PATH_SPECIFIED);
    }

    let clean_path = normalize_path(&path);
    let od_token = od_protected_token(headers, &odpt);

    let check = match authorize(state, &access_token, &clean_path, &od_token).await {
        Ok(check) => check,
        Err(response) => return response,
    };

    let mut response_headers = file_headers(cache_control(state, &check));

    let response = match state
        .graph
        .item(&access_token, &clean_path, DOWNLOAD_SELECT)
        .await
    {
        Ok(item) => match item.download_url.as_deref() {
            Some(url) if proxy => proxy_download(state, &item, url, &mut response_headers).await,
            Some(url) => {
                debug!(path = %clean_path, "Redirecting to download URL");
                redirect_response(url)
            }
            None => error_response(StatusCode::NOT_FOUND, NO_DOWNLOAD_URL),
        },
        Err(err) => from_error(err),
    };

    with_headers(response, &response_headers)
}

/// Fetch the file and answer with its bytes
async fn proxy_download(
    state: &AppState,
    item: &DriveItem,
    url: &str,
    headers: &mut Vec<(HeaderName, String)>,
) -> Response<Full<Bytes>> {
    let download = match state.graph.download(url).await {
        Ok(download) => download,
        Err(err) => return from_error(err),
    };

    let content_type = download
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    headers.push((header::CONTENT_TYPE, content_type));

    let length = download.bytes.len() as u64;
    match item.size.filter(|size| *size > 0) {
        Some(size) if size == length => headers.push((header::CONTENT_LENGTH, size.to_string())),
        Some(size) => debug!(size, length, "Proxied body length differs from item size"),
        None => {}
    }

    debug!(length, "Proxying download");
    Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(download.bytes))
        .unwrap()
}
