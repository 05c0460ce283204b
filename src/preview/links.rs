//! Shareable links for a file
//!
//! Builds the four direct-link variants offered when customising a link:
//! the raw route with a readable or fully encoded path, and the `name` route
//! that lets the URL end with a chosen filename.

use hyper::HeaderMap;
use serde::Serialize;

use crate::graph::encode_uri_component;

/// Base URL for absolute links.
///
/// A configured public URL wins; otherwise the scheme comes from
/// `X-Forwarded-Proto` (default `http`) and the host from `X-Forwarded-Host`
/// or `Host`. Without any host the links stay relative.
pub fn base_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = public_url.filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    match header("x-forwarded-host").or_else(|| header("host")) {
        Some(host) => {
            let proto = header("x-forwarded-proto").unwrap_or("http");
            format!("{}://{}", proto, host)
        }
        None => String::new(),
    }
}

/// `&odpt={token}` when a protected-route token is in play
pub fn odpt_suffix(od_token: &str) -> String {
    if od_token.is_empty() {
        String::new()
    } else {
        format!("&odpt={}", encode_uri_component(od_token))
    }
}

/// Characters left as-is in a readable path
fn is_safe_char(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphanumeric() || "-._~*:@,!".contains(c)
    } else {
        !(c.is_whitespace() || c.is_control())
    }
}

/// Turn an encoded path into one that is still a valid URL but keeps
/// non-ASCII names legible: each segment is decoded, then only unsafe
/// characters are re-encoded.
pub fn readable_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            decoded
                .chars()
                .map(|c| {
                    if is_safe_char(c) {
                        c.to_string()
                    } else {
                        encode_uri_component(c.encode_utf8(&mut [0; 4]))
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Last segment of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbedLinks {
    /// Filename used by the customised variants
    pub name: String,
    pub default: String,
    #[serde(rename = "urlEncoded")]
    pub url_encoded: String,
    pub customised: String,
    #[serde(rename = "customisedEncoded")]
    pub customised_encoded: String,
}

impl EmbedLinks {
    /// Build the link set for `as_path` (segment-encoded clean path).
    /// `name` overrides the filename of the customised variants.
    pub fn build(base: &str, as_path: &str, od_token: &str, name: Option<&str>) -> Self {
        let readable = readable_path(as_path);
        let name = name
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_name(&readable).to_string());
        let odpt = odpt_suffix(od_token);
        let readable_enc = encode_uri_component(&readable);
        let path_enc = encode_uri_component(as_path);
        let name_enc = encode_uri_component(&name);

        Self {
            default: format!("{base}/api/raw?path={readable_enc}{odpt}"),
            url_encoded: format!("{base}/api/raw?path={path_enc}{odpt}"),
            customised: format!("{base}/api/name/{name_enc}?path={readable_enc}{odpt}"),
            customised_encoded: format!("{base}/api/name/{name_enc}?path={path_enc}{odpt}"),
            name,
        }
    }
}
