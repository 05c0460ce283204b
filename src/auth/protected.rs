//! Password-protected folders
//!
//! A protected folder holds a `.password` file. Clients prove access by
//! sending the hex SHA-256 of that file's trimmed content, either in the
//! `od-protected-token` header or as the `odpt` query parameter.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::graph::GraphClient;
use crate::types::INTERNAL_SERVER_ERROR;

pub const PASSWORD_REQUIRED: &str = "Password required.";
pub const PASSWORD_NOT_SET: &str = "You didn't set a password.";
pub const AUTHENTICATED: &str = "Authenticated.";

/// Outcome of a protected-route check.
///
/// `code` is the HTTP status to answer with when it is not 200. A non-empty
/// `message` on success means the route is protected and must not be cached
/// by shared caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCheck {
    pub code: u16,
    pub message: &'static str,
}

impl AuthCheck {
    fn new(code: u16, message: &'static str) -> Self {
        Self { code, message }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }

    /// Protected routes answer with `Cache-Control: no-cache`
    pub fn is_protected(&self) -> bool {
        !self.message.is_empty()
    }
}

/// Path of the `.password` file guarding `path`, or `""` when unprotected.
///
/// Matching is case-insensitive on whole segments: `/Private` guards
/// `/private/a.txt` but not `/PrivateNotes`. A `/` route guards the whole drive.
pub fn auth_token_path(path: &str, protected_routes: &[String]) -> String {
    let path = format!("{}/", path.to_lowercase().trim_end_matches('/'));
    for route in protected_routes {
        if route.trim().is_empty() {
            continue;
        }
        let route = format!("{}/", route.to_lowercase().trim_end_matches('/'));
        if path.starts_with(&route) {
            return format!("{}.password", route);
        }
    }
    String::new()
}

/// Hex SHA-256 of a `.password` file's trimmed content
pub fn hash_token(content: &str) -> String {
    hex::encode(Sha256::digest(content.trim().as_bytes()))
}

/// True when `od_token` is the hash of the stored password
pub fn compare_hashed_token(od_token: &str, dot_password: &str) -> bool {
    hash_token(dot_password) == od_token
}

/// Decide whether the caller may read `path`
pub async fn check_auth_route(
    graph: &GraphClient,
    access_token: &str,
    path: &str,
    od_token: &str,
    protected_routes: &[String],
) -> AuthCheck {
    let token_path = auth_token_path(path, protected_routes);
    if token_path.is_empty() {
        return AuthCheck::new(200, "");
    }

    debug!(token_path = %token_path, "Checking protected route");

    let item = match graph
        .item_json(access_token, &token_path, "@microsoft.graph.downloadUrl,file")
        .await
    {
        Ok(item) => item,
        Err(err) if err.is_upstream_not_found() => {
            return AuthCheck::new(404, PASSWORD_NOT_SET);
        }
        Err(err) => {
            warn!(error = %err, "Protected route lookup failed");
            return AuthCheck::new(500, INTERNAL_SERVER_ERROR);
        }
    };

    let Some(download_url) = item.get("@microsoft.graph.downloadUrl").and_then(Value::as_str)
    else {
        warn!(token_path = %token_path, ".password item has no download URL");
        return AuthCheck::new(500, INTERNAL_SERVER_ERROR);
    };

    match graph.download_text(download_url).await {
        Ok(content) if compare_hashed_token(od_token, &content) => AuthCheck::new(200, AUTHENTICATED),
        Ok(_) => AuthCheck::new(401, PASSWORD_REQUIRED),
        Err(err) if err.is_upstream_not_found() => AuthCheck::new(404, PASSWORD_NOT_SET),
        Err(err) => {
            warn!(error = %err, "Reading .password failed");
            AuthCheck::new(500, INTERNAL_SERVER_ERROR)
        }
    }
}
