//! Preview descriptors
//!
//! A descriptor tells a front-end how to show one file: which viewer to use
//! and the URLs to hand it. Every URL points back at this server's `/api`
//! routes so protected-folder tokens keep working.
//!
//! - [`video`]: stream, poster, subtitles and native player links
//! - [`links`]: the customisable direct links
//! - [`theme`]: light/dark selection from the client hint

pub mod links;
pub mod theme;
pub mod video;

pub use links::{base_url, readable_path, EmbedLinks};
pub use theme::Theme;
pub use video::{SubtitleTrack, VideoPreview};

use serde::Serialize;

use crate::graph::{encode_path_segments, DriveItem};
use links::odpt_suffix;

/// Viewer selected for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Video,
    Epub,
    Office,
    Pdf,
    Download,
}

impl PreviewKind {
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_str() {
            "mp4" | "webm" | "mkv" | "flv" | "avi" | "mov" | "m4v" | "ogv" => Self::Video,
            "epub" => Self::Epub,
            "doc" | "docx" | "ppt" | "pptx" | "xls" | "xlsx" => Self::Office,
            "pdf" => Self::Pdf,
            _ => Self::Download,
        }
    }
}

/// Lower-cased extension, empty when the name has none
pub fn extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Document handed to the office/PDF viewer
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Document {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EpubOptions {
    pub flow: &'static str,
    #[serde(rename = "allowPopups")]
    pub allow_popups: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EpubPreview {
    pub url: String,
    #[serde(rename = "openAs")]
    pub open_as: &'static str,
    pub options: EpubOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewDescriptor {
    pub kind: PreviewKind,
    pub name: String,
    pub path: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    pub links: EmbedLinks,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epub: Option<EpubPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
}

/// Inputs shared by every viewer
pub struct PreviewRequest<'a> {
    /// Clean path of the file
    pub path: &'a str,
    /// Absolute base for links, possibly empty
    pub base: &'a str,
    pub od_token: &'a str,
    /// Filename override for the customised links
    pub name: Option<&'a str>,
    pub theme: Theme,
}

impl PreviewRequest<'_> {
    /// Clean path with each segment URL-encoded
    pub fn as_path(&self) -> String {
        encode_path_segments(self.path)
    }
}

/// Describe how to preview `item`. Video subtitles are filled in by the
/// caller, which owns the Graph client and token.
pub fn describe(request: &PreviewRequest<'_>, item: &DriveItem) -> PreviewDescriptor {
    let name = item.name.clone().unwrap_or_else(|| {
        links::file_name(request.path).to_string()
    });
    let kind = PreviewKind::from_name(&name);
    let as_path = request.as_path();
    let raw = format!("/api/raw?path={}{}", as_path, odpt_suffix(request.od_token));

    let mut descriptor = PreviewDescriptor {
        kind,
        name,
        path: request.path.to_string(),
        download_url: raw.clone(),
        links: EmbedLinks::build(request.base, &as_path, request.od_token, request.name),
        theme: request.theme,
        video: None,
        epub: None,
        documents: None,
    };

    match kind {
        PreviewKind::Video => {
            descriptor.video = Some(video::build(request.base, &as_path, item, request.od_token));
        }
        PreviewKind::Epub => {
            descriptor.epub = Some(EpubPreview {
                url: raw,
                open_as: "epub",
                options: EpubOptions {
                    flow: "scrolled",
                    allow_popups: true,
                },
            });
        }
        PreviewKind::Office | PreviewKind::Pdf => {
            descriptor.documents = Some(vec![Document {
                uri: format!("{}{}", request.base, raw),
            }]);
        }
        PreviewKind::Download => {}
    }

    descriptor
}
