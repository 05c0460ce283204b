//! Video preview descriptor
//!
//! Besides the stream and poster URLs, a video preview carries the WebVTT
//! subtitle tracks found next to the file and deep links into native players.

use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, warn};

use super::links::odpt_suffix;
use crate::graph::{encode_uri_component, skip_token_from_next_link, DriveItem, GraphClient};

/// Upper bound on folder pages scanned for subtitles
pub const MAX_SUBTITLE_PAGES: usize = 50;

/// Label given to a track with no language suffix (`movie.vtt`)
pub const DEFAULT_LABEL: &str = "Default";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub kind: &'static str,
    pub label: String,
    pub srclang: String,
    pub src: String,
    pub default: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerLinks {
    pub iina: String,
    pub vlc: String,
    pub potplayer: String,
    pub nplayer: String,
    #[serde(rename = "mpvAndroid")]
    pub mpv_android: String,
}

impl PlayerLinks {
    /// Deep links for `video_url` served from `base`
    pub fn build(base: &str, video_url: &str) -> Self {
        Self {
            iina: format!("iina://weblink?url={base}{video_url}"),
            vlc: format!("vlc://{base}{video_url}"),
            potplayer: format!("potplayer://{base}{video_url}"),
            nplayer: format!("nplayer-http://{}{video_url}", hostname(base)),
            mpv_android: format!(
                "intent://{base}{video_url}#Intent;type=video/any;package=is.xyz.mpv;scheme=https;end;"
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoPreview {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
    pub thumbnail: String,
    pub ratio: String,
    #[serde(rename = "isFlv")]
    pub is_flv: bool,
    pub subtitles: Vec<SubtitleTrack>,
    pub players: PlayerLinks,
    #[serde(rename = "directLink")]
    pub direct_link: String,
}

/// Host part of a base URL, without scheme, userinfo or port.
///
/// A relative base (no `PUBLIC_URL` and no `Host` header) yields `""`.
fn hostname(base: &str) -> String {
    Url::parse(base)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Aspect ratio `w:h` for the player, `16:9` parts when metadata is unusable
pub fn valid_ratio(width: Option<f64>, height: Option<f64>) -> String {
    let side = |v: Option<f64>, fallback: u64| match v {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => fallback,
    };
    format!("{}:{}", side(width, 16), side(height, 9))
}

/// Matcher for `{video base name}[.{label}].vtt`, case-insensitive
pub fn subtitle_pattern(video_name: &str) -> Option<Regex> {
    let base = video_name
        .rsplit_once('.')
        .map_or(video_name, |(stem, _)| stem);
    Regex::new(&format!(r"(?i)^{}(?:\.([^.]+))?\.vtt$", regex::escape(base))).ok()
}

/// Match sibling names against `pattern`, producing tracks in listing order.
///
/// `parent_as_path` is the segment-encoded folder path used in the track URL.
pub fn match_subtitles<'a>(
    pattern: &Regex,
    names: impl IntoIterator<Item = &'a str>,
    parent_as_path: &str,
    od_token: &str,
) -> Vec<(String, String)> {
    let odpt = odpt_suffix(od_token);
    names
        .into_iter()
        .filter_map(|name| {
            let caps = pattern.captures(name)?;
            let label = caps
                .get(1)
                .map_or(DEFAULT_LABEL.to_string(), |m| m.as_str().to_string());
            let src = format!(
                "/api/raw?path={}/{}{}&proxy=true",
                parent_as_path,
                encode_uri_component(name),
                odpt
            );
            Some((label, src))
        })
        .collect()
}

/// Attach language and default flags; the first track is always default
pub fn into_tracks(found: Vec<(String, String)>) -> Vec<SubtitleTrack> {
    found
        .into_iter()
        .enumerate()
        .map(|(index, (label, src))| SubtitleTrack {
            kind: "captions",
            srclang: if label == DEFAULT_LABEL {
                "und".to_string()
            } else {
                label.to_lowercase()
            },
            default: label.eq_ignore_ascii_case("default") || index == 0,
            label,
            src,
        })
        .collect()
}

/// Walk every page of the parent folder collecting subtitle tracks.
///
/// A failing page ends the walk; tracks gathered so far are kept.
pub async fn collect_subtitles(
    graph: &GraphClient,
    access_token: &str,
    parent_path: &str,
    parent_as_path: &str,
    video_name: &str,
    od_token: &str,
    page_size: u32,
) -> Vec<SubtitleTrack> {
    let Some(pattern) = subtitle_pattern(video_name) else {
        return Vec::new();
    };

    let folder = if parent_path.is_empty() { "/" } else { parent_path };
    let mut found = Vec::new();
    let mut skip_token: Option<String> = None;

    for page_number in 0..MAX_SUBTITLE_PAGES {
        let page = match graph
            .children(access_token, folder, page_size, skip_token.as_deref())
            .await
        {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, page = page_number, "Subtitle scan stopped");
                break;
            }
        };

        let names = page.value.iter().filter_map(|item| item.name.as_deref());
        found.extend(match_subtitles(&pattern, names, parent_as_path, od_token));

        skip_token = page
            .next_link
            .as_deref()
            .and_then(skip_token_from_next_link);
        if skip_token.is_none() {
            break;
        }
    }

    debug!(count = found.len(), video = video_name, "Collected subtitles");
    into_tracks(found)
}

/// Build the descriptor minus subtitles, which need a Graph walk
pub fn build(base: &str, as_path: &str, item: &DriveItem, od_token: &str) -> VideoPreview {
    let odpt = odpt_suffix(od_token);
    let video_url = format!("/api/raw?path={as_path}{odpt}");
    let name = item.name.as_deref().unwrap_or_default();
    let (width, height) = item
        .video
        .as_ref()
        .map_or((None, None), |v| (v.width, v.height));

    VideoPreview {
        thumbnail: format!("/api/thumbnail?path={as_path}&size=large{odpt}"),
        ratio: valid_ratio(width, height),
        is_flv: super::extension(name) == "flv",
        subtitles: Vec::new(),
        players: PlayerLinks::build(base, &video_url),
        direct_link: format!("{base}{video_url}"),
        video_url,
    }
}
