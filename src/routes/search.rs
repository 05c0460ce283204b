//! `GET /api/search?q=` - full-text search under the base directory

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::debug;

use super::params::QueryParams;
use super::response::{from_error, json_response};
use super::require_access_token;
use crate::graph::encode_uri_component;
use crate::server::AppState;

/// Make a user query safe inside Graph's `search(q='…')` literal.
///
/// Single quotes are doubled for OData. Only the first `<`, `>`, `?` and `/`
/// are rewritten, matching what existing clients already send.
pub fn sanitize_query(query: &str) -> String {
    let sanitized = query
        .replace('\'', "''")
        .replacen('<', " &lt; ", 1)
        .replacen('>', " &gt; ", 1)
        .replacen('?', " ", 1)
        .replacen('/', " ", 1);
    encode_uri_component(&sanitized)
}

pub async fn handle_search(state: &AppState, params: &QueryParams) -> Response<Full<Bytes>> {
    let access_token = match require_access_token(state).await {
        Ok(token) => token,
        Err(response) => return response,
    };

    let query = params.get("q", "");
    debug!(query = %query, "Search");

    match state
        .graph
        .search(&access_token, &sanitize_query(&query), state.args.max_items)
        .await
    {
        Ok(hits) => json_response(StatusCode::OK, &hits),
        Err(err) => from_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_doubles_quotes() {
        assert_eq!(sanitize_query("it's"), "it''s");
    }

    #[test]
    fn test_sanitize_rewrites_first_occurrence_only() {
        assert_eq!(sanitize_query("a<b<c"), "a%20%26lt%3B%20b%3Cc");
        assert_eq!(sanitize_query("a/b/c"), "a%20b%2Fc");
        assert_eq!(sanitize_query("why?no?"), "why%20no%3F");
        assert_eq!(sanitize_query("x>y"), "x%20%26gt%3B%20y");
    }

    #[test]
    fn test_sanitize_encodes_unicode() {
        assert_eq!(sanitize_query("报告 2024"), "%E6%8A%A5%E5%91%8A%202024");
    }
}
