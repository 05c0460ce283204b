//! `GET /api/preview?path=&odpt=&name=` - viewer descriptor for a file

use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};

use super::params::{od_protected_token, QueryParams};
use super::response::{
    error_response, file_headers, from_error, json_response, with_headers, NO_PATH_SPECIFIED,
};
use super::{authorize, cache_control, require_access_token};
use crate::graph::{encode_path_segments, is_missing_path, normalize_path, parent_path, ITEM_SELECT};
use crate::preview::{self, base_url, video, PreviewKind, PreviewRequest, Theme};
use crate::server::AppState;

pub const FILES_ONLY: &str = "Preview is only available for files.";

pub async fn handle_preview(
    state: &AppState,
    params: &QueryParams,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    let access_token = match require_access_token(state).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let path = params.get("path", "/");
    if is_missing_path(&path) {
        return error_response(StatusCode::BAD_REQUEST, NO_PATH_SPECIFIED);
    }
    let clean_path = normalize_path(&path);
    let od_token = od_protected_token(headers, &params.get("odpt", ""));

    let check = match authorize(state, &access_token, &clean_path, &od_token).await {
        Ok(check) => check,
        Err(response) => return response,
    };
    let response_headers = file_headers(cache_control(state, &check));

    let item = match state.graph.item(&access_token, &clean_path, ITEM_SELECT).await {
        Ok(item) => item,
        Err(err) => return with_headers(from_error(err), &response_headers),
    };
    if item.is_folder() {
        return with_headers(
            error_response(StatusCode::BAD_REQUEST, FILES_ONLY),
            &response_headers,
        );
    }

    let base = base_url(state.args.public_url.as_deref(), headers);
    let name = params.get_opt("name");
    let request = PreviewRequest {
        path: &clean_path,
        base: &base,
        od_token: &od_token,
        name,
        theme: Theme::from_headers(headers, state.args.default_theme),
    };

    let mut descriptor = preview::describe(&request, &item);

    if descriptor.kind == PreviewKind::Video {
        let parent = parent_path(&clean_path);
        let subtitles = video::collect_subtitles(
            &state.graph,
            &access_token,
            parent,
            &encode_path_segments(parent),
            &descriptor.name,
            &od_token,
            state.args.max_items,
        )
        .await;
        if let Some(video) = descriptor.video.as_mut() {
            video.subtitles = subtitles;
        }
    }

    with_headers(json_response(StatusCode::OK, &descriptor), &response_headers)
}
