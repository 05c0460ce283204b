//! Microsoft Graph response shapes
//!
//! Only the fields odindex reads are modelled; everything else passes through
//! as raw JSON where the route forwards Graph's payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File or folder item from OneDrive
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "lastModifiedDateTime", default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default)]
    pub folder: Option<Value>,
    #[serde(default)]
    pub file: Option<FileFacet>,
    #[serde(default)]
    pub video: Option<VideoFacet>,
    #[serde(default)]
    pub image: Option<ImageFacet>,
    #[serde(rename = "parentReference", default)]
    pub parent_reference: Option<ItemReference>,
    #[serde(rename = "@microsoft.graph.downloadUrl", default)]
    pub download_url: Option<String>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileFacet {
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
}

/// Video metadata Graph attaches to media files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoFacet {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageFacet {
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "driveId", default)]
    pub drive_id: Option<String>,
}

/// One page of a folder's children
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// A single rendered thumbnail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
}

/// The three standard renditions Graph returns per thumbnail set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThumbnailSet {
    #[serde(default)]
    pub small: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub large: Option<Thumbnail>,
}

/// Requested thumbnail rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSize {
    Small,
    Medium,
    Large,
}

impl ThumbnailSize {
    /// Parse the `size` query value; only the three Graph renditions are valid
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }
}

impl ThumbnailSet {
    pub fn get(&self, size: ThumbnailSize) -> Option<&Thumbnail> {
        match size {
            ThumbnailSize::Small => self.small.as_ref(),
            ThumbnailSize::Medium => self.medium.as_ref(),
            ThumbnailSize::Large => self.large.as_ref(),
        }
    }
}
