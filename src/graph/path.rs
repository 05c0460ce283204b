//! Path normalization and encoding for Graph item addressing
//!
//! Graph addresses items by path as `/root:{encoded}:`; the helpers here turn
//! a user-supplied path into that form, always resolved under the configured
//! base directory.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Placeholder some clients send when the catch-all path was never filled in.
pub const MISSING_PATH_PLACEHOLDER: &str = "[...path]";

/// True when the client sent the unfilled catch-all placeholder.
pub fn is_missing_path(path: &str) -> bool {
    path == MISSING_PATH_PLACEHOLDER
}

/// Resolve `path` against `/` the way POSIX `path.resolve` does.
///
/// Duplicate slashes and `.` segments vanish, `..` pops a segment but never
/// climbs above root, and the trailing slash is dropped. An empty result is `/`.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Characters `encodeURIComponent` leaves alone besides ASCII alphanumerics
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*');

/// JavaScript `encodeURIComponent`.
///
/// Everything except `A-Z a-z 0-9 - _ . ~ ! ' ( ) *` is percent-encoded as UTF-8.
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Encode a path for Graph's `/root{path}` addressing.
///
/// The path is joined onto `base_directory` first. The drive root encodes to
/// an empty string; anything else becomes `:{encodeURIComponent(path)}`.
/// `path` is resolved on its own before joining so `..` cannot leave the base.
pub fn encode_path(base_directory: &str, path: &str) -> String {
    let path = normalize_path(path);
    let joined = normalize_path(&format!("{}/{}", base_directory, path));
    if joined == "/" {
        return String::new();
    }
    format!(":{}", encode_uri_component(&joined))
}

/// URL-encode each segment of an already clean path, keeping the slashes.
pub fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(encode_uri_component)
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent of a clean path (`/a/b.mp4` → `/a`, `/b.mp4` → ``).
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}
