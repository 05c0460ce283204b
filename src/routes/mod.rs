//! HTTP routes for odindex

pub mod health;
pub mod index;
pub mod item;
pub mod params;
pub mod preview;
pub mod raw;
pub mod response;
pub mod search;
pub mod thumbnail;

pub use health::{health_check, version_info};
pub use index::handle_index;
pub use item::handle_item;
pub use params::{od_protected_token, parse_bool, QueryParams};
pub use preview::handle_preview;
pub use raw::handle_raw;
pub use response::{not_found_response, preflight_response};
pub use search::{handle_search, sanitize_query};
pub use thumbnail::handle_thumbnail;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::error;

use crate::auth::{check_auth_route, AuthCheck};
use crate::server::AppState;
use crate::types::INTERNAL_SERVER_ERROR;
use response::{error_response, NO_ACCESS_TOKEN};

/// Access token for Graph, or the response to send when there is none
async fn require_access_token(state: &AppState) -> Result<String, Response<Full<Bytes>>> {
    match state.tokens.access_token().await {
        Ok(Some(token)) => Ok(token),
        Ok(None) => Err(error_response(StatusCode::FORBIDDEN, NO_ACCESS_TOKEN)),
        Err(err) => {
            error!(error = %err, "Failed to obtain access token");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

/// Run the protected-route check; a failing check becomes the response
async fn authorize(
    state: &AppState,
    access_token: &str,
    path: &str,
    od_token: &str,
) -> Result<AuthCheck, Response<Full<Bytes>>> {
    let check = check_auth_route(
        &state.graph,
        access_token,
        path,
        od_token,
        &state.protected_routes,
    )
    .await;

    if check.is_ok() {
        Ok(check)
    } else {
        let status = StatusCode::from_u16(check.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Err(error_response(status, check.message))
    }
}

/// Cache-Control for a checked path: protected routes are never shared
fn cache_control<'a>(state: &'a AppState, check: &AuthCheck) -> &'a str {
    if check.is_protected() {
        "no-cache"
    } else {
        &state.args.cache_control_header
    }
}
