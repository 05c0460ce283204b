//! Query string and header helpers shared by the API routes

use hyper::HeaderMap;

/// Header carrying the hashed password for a protected folder
pub const OD_PROTECTED_TOKEN: &str = "od-protected-token";

/// Parsed query string. Repeated keys keep every value; lookups return the
/// first one.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a form-urlencoded query string. Malformed input yields no
    /// parameters rather than an error.
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();
        Self { pairs }
    }

    /// First value for `key`
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, or `default` when absent
    pub fn get(&self, key: &str, default: &str) -> String {
        self.get_opt(key).unwrap_or(default).to_string()
    }
}

/// `1`, `true`, `yes` and `on` (any case, surrounding space ignored) are true
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Protected-route token: the header wins over the `odpt` query value
pub fn od_protected_token(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(OD_PROTECTED_TOKEN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback)
        .to_string()
}
