//! Cloudflare Workers KV namespace over the REST API
//!
//! `GET/PUT {api}/accounts/{account}/storage/kv/namespaces/{namespace}/values/{key}`
//! with a bearer API token. Missing keys answer 404.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use super::KvNamespace;
use crate::config::StoreArgs;
use crate::graph::encode_uri_component;
use crate::types::{IndexError, Result};

/// Workers KV rejects expirations shorter than a minute
pub const MIN_EXPIRATION_TTL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CloudflareKvConfig {
    pub api_base: String,
    pub account_id: String,
    pub namespace_id: String,
    pub api_token: String,
}

impl CloudflareKvConfig {
    /// `None` when any credential is missing
    pub fn from_args(args: &StoreArgs) -> Option<Self> {
        Some(Self {
            api_base: args.cf_api_base.trim_end_matches('/').to_string(),
            account_id: args.cf_account_id.clone().filter(|s| !s.is_empty())?,
            namespace_id: args.cf_namespace_id.clone().filter(|s| !s.is_empty())?,
            api_token: args.cf_api_token.clone().filter(|s| !s.is_empty())?,
        })
    }
}

pub struct CloudflareKv {
    http: reqwest::Client,
    config: CloudflareKvConfig,
}

impl CloudflareKv {
    pub fn new(config: CloudflareKvConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    fn value_url(&self, key: &str) -> String {
        format!(
            "{}/accounts/{}/storage/kv/namespaces/{}/values/{}",
            self.config.api_base,
            self.config.account_id,
            self.config.namespace_id,
            encode_uri_component(key)
        )
    }
}

#[async_trait]
impl KvNamespace for CloudflareKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.value_url(key))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                warn!(key, status = status.as_u16(), "Cloudflare KV read failed");
                Err(IndexError::Store(format!(
                    "KV read of {} failed with {}: {}",
                    key, status, body
                )))
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut request = self
            .http
            .put(self.value_url(key))
            .bearer_auth(&self.config.api_token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(value.to_string());

        if let Some(ttl) = ttl {
            let secs = ttl.as_secs().max(MIN_EXPIRATION_TTL_SECS);
            request = request.query(&[("expiration_ttl", secs)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(key, status = status.as_u16(), "Cloudflare KV write failed");
            return Err(IndexError::Store(format!(
                "KV write of {} failed with {}: {}",
                key, status, body
            )));
        }

        debug!(key, "Cloudflare KV write");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "cloudflare"
    }
}
