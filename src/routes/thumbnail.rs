//! `GET /api/thumbnail?path=&size=&odpt=` - redirect to a rendered thumbnail

use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};

use super::params::{od_protected_token, QueryParams};
use super::response::{
    error_response, file_headers, from_error, redirect_response, with_headers, NO_PATH_SPECIFIED,
};
use super::{authorize, cache_control, require_access_token};
use crate::graph::{is_missing_path, normalize_path, ThumbnailSize};
use crate::server::AppState;

pub const INVALID_SIZE: &str = "Invalid size.";
pub const NO_THUMBNAIL: &str = "The item doesn't have a valid thumbnail.";

pub async fn handle_thumbnail(
    state: &AppState,
    params: &QueryParams,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let access_token = match require_access_token(state).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let path = params.get("path", "");
    let odpt = params.get("odpt", "");
    let Some(size) = ThumbnailSize::parse(&params.get("size", "medium")) else {
        return error_response(StatusCode::BAD_REQUEST, INVALID_SIZE);
    };

    if is_missing_path(&path) {
        return error_response(StatusCode::BAD_REQUEST, NO_PATH_SPECIFIED);
    }

    let clean_path = normalize_path(&path);
    let od_token = od_protected_token(headers, &odpt);

    let check = match authorize(state, &access_token, &clean_path, &od_token).await {
        Ok(check) => check,
        Err(response) => return response,
    };

    let response_headers = file_headers(cache_control(state, &check));

    let response = match state.graph.thumbnails(&access_token, &clean_path).await {
        Ok(sets) => match sets.first().and_then(|set| set.get(size)) {
            Some(thumbnail) => redirect_response(&thumbnail.url),
            None => error_response(StatusCode::BAD_REQUEST, NO_THUMBNAIL),
        },
        Err(err) => from_error(err),
    };

    with_headers(response, &response_headers)
}
