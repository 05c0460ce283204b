//! Color scheme selection from the `Sec-CH-Prefers-Color-Scheme` client hint

use clap::ValueEnum;
use hyper::HeaderMap;
use serde::Serialize;

/// Client hint carrying the user agent's preferred color scheme
pub const PREFERS_COLOR_SCHEME: &str = "sec-ch-prefers-color-scheme";

#[derive(ValueEnum, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Parse a hint value; browsers send it quoted (`"dark"`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Theme requested by the client, or `default` without a usable hint
    pub fn from_headers(headers: &HeaderMap, default: Theme) -> Self {
        headers
            .get(PREFERS_COLOR_SCHEME)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or(default)
    }
}
