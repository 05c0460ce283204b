//! `GET /api/item?id=` - look up an item's name and location by drive item id

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::params::QueryParams;
use super::response::{error_response, from_error, json_response};
use super::require_access_token;
use crate::server::AppState;

pub const INVALID_ITEM_ID: &str = "Invalid driveItem ID.";

static ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("item id pattern is valid"));

/// Drive item ids are plain alphanumerics; anything else never reaches Graph
pub fn is_valid_item_id(id: &str) -> bool {
    ITEM_ID.is_match(id)
}

pub async fn handle_item(state: &AppState, params: &QueryParams) -> Response<Full<Bytes>> {
    let id = params.get("id", "");
    if !is_valid_item_id(&id) {
        return error_response(StatusCode::BAD_REQUEST, INVALID_ITEM_ID);
    }

    let access_token = match require_access_token(state).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    debug!(id = %id, "Item lookup");
    match state.graph.item_by_id(&access_token, &id).await {
        Ok(item) => json_response(StatusCode::OK, &item),
        Err(err) => from_error(err),
    }
}
