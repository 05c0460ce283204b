//! Microsoft Graph client
//!
//! Thin wrapper over `reqwest` for the handful of drive endpoints odindex
//! calls. Non-success answers become [`IndexError::Upstream`] carrying Graph's
//! status and payload so routes can forward them untouched.

pub mod path;
pub mod types;

pub use path::{
    encode_path, encode_path_segments, encode_uri_component, is_missing_path, normalize_path,
    parent_path,
};
pub use types::{DriveItem, FolderPage, Thumbnail, ThumbnailSet, ThumbnailSize};

use bytes::Bytes;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::types::{IndexError, Result};

/// Fields requested when resolving a path to an item for listing/preview
pub const ITEM_SELECT: &str = "name,size,id,lastModifiedDateTime,folder,file,video,image";

/// Fields requested when looking up an item by id
pub const ITEM_BY_ID_SELECT: &str = "id,name,parentReference";

/// Fields requested for raw downloads. Some tenants reject a select that
/// names only the download URL, so id and size ride along.
pub const DOWNLOAD_SELECT: &str = "id,size,@microsoft.graph.downloadUrl";

/// Fields requested for search hits
pub const SEARCH_SELECT: &str = "id,name,file,folder,parentReference";

static SKIP_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&\$skiptoken=(.+)").expect("skip token pattern is valid")
});

/// Extract the `$skiptoken` value from a children page's `@odata.nextLink`
pub fn skip_token_from_next_link(next_link: &str) -> Option<String> {
    SKIP_TOKEN
        .captures(next_link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Body fetched from a download URL
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Client for the configured drive
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    drive_api: String,
    base_directory: String,
}

impl GraphClient {
    /// Create a client for `drive_api` serving items under `base_directory`
    pub fn new(drive_api: &str, base_directory: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("odindex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            drive_api: drive_api.trim_end_matches('/').to_string(),
            base_directory: base_directory.to_string(),
        })
    }

    pub fn base_directory(&self) -> &str {
        &self.base_directory
    }

    /// `{drive}/root{:encoded}` for a clean path
    pub fn item_url(&self, path: &str) -> String {
        format!("{}/root{}", self.drive_api, encode_path(&self.base_directory, path))
    }

    /// `{drive}/root{:encoded:}/{action}`; the root takes no trailing colon
    fn item_action_url(&self, path: &str, action: &str) -> String {
        let encoded = encode_path(&self.base_directory, path);
        let separator = if encoded.is_empty() { "" } else { ":" };
        format!("{}/root{}{}/{}", self.drive_api, encoded, separator, action)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(url = %url, "Graph request");
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;
        let response = error_for_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Look up an item by its drive item id
    pub async fn item_by_id(&self, access_token: &str, id: &str) -> Result<Value> {
        let url = format!("{}/items/{}", self.drive_api, id);
        self.get(&url, access_token, &[("select", ITEM_BY_ID_SELECT.to_string())])
            .await
    }

    /// Resolve a clean path to its item, as raw JSON
    pub async fn item_json(&self, access_token: &str, path: &str, select: &str) -> Result<Value> {
        self.get(&self.item_url(path), access_token, &[("select", select.to_string())])
            .await
    }

    /// Resolve a clean path to its item
    pub async fn item(&self, access_token: &str, path: &str, select: &str) -> Result<DriveItem> {
        self.get(&self.item_url(path), access_token, &[("select", select.to_string())])
            .await
    }

    /// One page of a folder's children, as raw JSON
    pub async fn children_json(
        &self,
        access_token: &str,
        path: &str,
        top: u32,
        skip_token: Option<&str>,
        order_by: Option<&str>,
    ) -> Result<Value> {
        let mut query = vec![
            ("select", ITEM_SELECT.to_string()),
            ("$top", top.to_string()),
        ];
        if let Some(token) = skip_token.filter(|t| !t.is_empty()) {
            query.push(("$skipToken", token.to_string()));
        }
        if let Some(order) = order_by.filter(|o| !o.is_empty()) {
            query.push(("$orderby", order.to_string()));
        }

        self.get(&self.item_action_url(path, "children"), access_token, &query)
            .await
    }

    /// One page of a folder's children
    pub async fn children(
        &self,
        access_token: &str,
        path: &str,
        top: u32,
        skip_token: Option<&str>,
    ) -> Result<FolderPage> {
        let page = self
            .children_json(access_token, path, top, skip_token, None)
            .await?;
        Ok(serde_json::from_value(page)?)
    }

    /// Search under the base directory. `sanitized_query` must already be
    /// escaped for the OData string literal and URL-encoded.
    pub async fn search(
        &self,
        access_token: &str,
        sanitized_query: &str,
        top: u32,
    ) -> Result<Value> {
        let url = self.item_action_url("/", &format!("search(q='{}')", sanitized_query));
        let data: Value = self
            .get(
                &url,
                access_token,
                &[("select", SEARCH_SELECT.to_string()), ("top", top.to_string())],
            )
            .await?;
        Ok(data.get("value").cloned().unwrap_or_else(|| Value::Array(Vec::new())))
    }

    /// Thumbnail sets for the item at a clean path
    pub async fn thumbnails(&self, access_token: &str, path: &str) -> Result<Vec<ThumbnailSet>> {
        #[derive(serde::Deserialize)]
        struct Thumbnails {
            #[serde(default)]
            value: Vec<ThumbnailSet>,
        }

        let data: Thumbnails = self
            .get(&self.item_action_url(path, "thumbnails"), access_token, &[])
            .await?;
        Ok(data.value)
    }

    /// Fetch the bytes behind a pre-authenticated download URL
    pub async fn download(&self, url: &str) -> Result<Download> {
        debug!("Fetching download URL");
        let response = error_for_status(self.http.get(url).send().await?).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?;
        Ok(Download { content_type, bytes })
    }

    /// Fetch a download URL as text
    pub async fn download_text(&self, url: &str) -> Result<String> {
        let download = self.download(url).await?;
        Ok(String::from_utf8_lossy(&download.bytes).into_owned())
    }
}

/// Turn a non-success response into [`IndexError::Upstream`]
pub async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Err(IndexError::Upstream {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GraphClient {
        GraphClient::new("https://graph.example/v1.0/me/drive/", base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_item_urls() {
        let graph = client("/");
        assert_eq!(graph.item_url("/"), "https://graph.example/v1.0/me/drive/root");
        assert_eq!(
            graph.item_url("/Docs/a.pdf"),
            "https://graph.example/v1.0/me/drive/root:%2FDocs%2Fa.pdf"
        );
        assert_eq!(
            graph.item_action_url("/", "children"),
            "https://graph.example/v1.0/me/drive/root/children"
        );
        assert_eq!(
            graph.item_action_url("/Docs", "thumbnails"),
            "https://graph.example/v1.0/me/drive/root:%2FDocs:/thumbnails"
        );
    }

    #[test]
    fn test_search_scoped_to_base_directory() {
        let graph = client("/Public");
        assert_eq!(
            graph.item_action_url("/", "search(q='cats')"),
            "https://graph.example/v1.0/me/drive/root:%2FPublic:/search(q='cats')"
        );
    }

    #[test]
    fn test_skip_token_from_next_link() {
        let link = "https://graph.microsoft.com/v1.0/me/drive/root/children?$top=100&$skiptoken=aGVsbG8";
        assert_eq!(skip_token_from_next_link(link).as_deref(), Some("aGVsbG8"));

        let upper = "https://graph/children?$top=1&$SkipToken=abc";
        assert_eq!(skip_token_from_next_link(upper).as_deref(), Some("abc"));

        assert_eq!(skip_token_from_next_link("https://graph/children?$top=1"), None);
    }
}
