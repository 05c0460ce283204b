//! `GET /api?path=&next=&sort=` - folder listing or file metadata
//!
//! Folders answer `{"folder": <children page>, "next": <skip token>}` with
//! `next` only present when Graph has more pages; files answer
//! `{"file": <item>}`. `raw=true` behaves like `/api/raw`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::params::{od_protected_token, parse_bool, QueryParams};
use super::response::{
    error_response, file_headers, from_error, json_response, with_headers, NO_PATH_SPECIFIED,
};
use super::{authorize, cache_control, raw, require_access_token};
use crate::graph::{is_missing_path, normalize_path, skip_token_from_next_link, ITEM_SELECT};
use crate::server::AppState;
use crate::types::Result;

pub async fn handle_index(
    state: &AppState,
    params: &QueryParams,
    headers: &HeaderMap,
) -> Response<Full<Bytes>> {
    if parse_bool(&params.get("raw", "false")) {
        return raw::handle_raw(state, params, headers).await;
    }

    let path = params.get("path", "/");
    if is_missing_path(&path) {
        return error_response(StatusCode::BAD_REQUEST, NO_PATH_SPECIFIED);
    }
    let clean_path = normalize_path(&path);

    let access_token = match require_access_token(state).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let od_token = od_protected_token(headers, &params.get("odpt", ""));
    let check = match authorize(state, &access_token, &clean_path, &od_token).await {
        Ok(check) => check,
        Err(response) => return response,
    };

    let next = params.get("next", "");
    let sort = params.get("sort", "");

    let response = match list(state, &access_token, &clean_path, &next, &sort).await {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(err) => from_error(err),
    };

    with_headers(response, &file_headers(cache_control(state, &check)))
}

async fn list(
    state: &AppState,
    access_token: &str,
    path: &str,
    next: &str,
    sort: &str,
) -> Result<Value> {
    let identity = state.graph.item_json(access_token, path, ITEM_SELECT).await?;

    if identity.get("folder").is_none() {
        return Ok(json!({ "file": identity }));
    }

    let folder = state
        .graph
        .children_json(
            access_token,
            path,
            state.args.max_items,
            Some(next),
            Some(sort),
        )
        .await?;

    let next_page = folder
        .get("@odata.nextLink")
        .and_then(Value::as_str)
        .and_then(skip_token_from_next_link);

    debug!(path, has_next = next_page.is_some(), "Listed folder");
    Ok(match next_page {
        Some(next) => json!({ "folder": folder, "next": next }),
        None => json!({ "folder": folder }),
    })
}
