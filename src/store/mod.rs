//! Token storage
//!
//! The OAuth token pair lives in a key-value namespace behind the
//! [`KvNamespace`] trait so deployments can pick where it is kept:
//!
//! - [`MemoryKv`]: process-wide map, tokens vanish on restart
//! - [`EnvKv`]: seeded from environment variables, writes shadow them in memory
//! - [`CloudflareKv`]: a Workers KV namespace over the Cloudflare REST API
//!
//! Handlers never reach a global; they get the store through `AppState`.

pub mod cloudflare;
pub mod env;
pub mod memory;

pub use cloudflare::{CloudflareKv, CloudflareKvConfig};
pub use env::EnvKv;
pub use memory::MemoryKv;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{StoreArgs, TokenStoreBackend};
use crate::types::{IndexError, Result};

/// Key holding the short-lived access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// A string key-value namespace with optional per-key expiry
#[async_trait]
pub trait KvNamespace: Send + Sync {
    /// Read a value; expired or absent keys yield `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, optionally expiring after `ttl`
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Short backend name for logs and /health
    fn backend(&self) -> &'static str;
}

/// The token pair as read from the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OdAuthTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Reads and writes the OAuth token pair
#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KvNamespace>,
}

impl TokenStore {
    pub fn new(kv: Arc<dyn KvNamespace>) -> Self {
        Self { kv }
    }

    /// Build the store selected in configuration
    pub fn from_args(args: &StoreArgs, timeout: Duration) -> Result<Self> {
        let kv: Arc<dyn KvNamespace> = match args.token_store {
            TokenStoreBackend::Memory => Arc::new(MemoryKv::new()),
            TokenStoreBackend::Env => Arc::new(EnvKv::new(&args.token_env_prefix)),
            TokenStoreBackend::Cloudflare => {
                let config = CloudflareKvConfig::from_args(args).ok_or_else(|| {
                    IndexError::Config("Cloudflare token store is missing credentials".into())
                })?;
                Arc::new(CloudflareKv::new(config, timeout)?)
            }
        };
        Ok(Self::new(kv))
    }

    pub fn backend(&self) -> &'static str {
        self.kv.backend()
    }

    /// Read both tokens
    pub async fn get_tokens(&self) -> Result<OdAuthTokens> {
        let access_token = self.kv.get(ACCESS_TOKEN_KEY).await?;
        let refresh_token = self.kv.get(REFRESH_TOKEN_KEY).await?;
        Ok(OdAuthTokens {
            access_token,
            refresh_token,
        })
    }

    /// Store a freshly issued pair. The access token expires with the
    /// grant; the refresh token is kept until replaced.
    pub async fn store_tokens(
        &self,
        access_token: &str,
        access_token_expiry_secs: u64,
        refresh_token: &str,
    ) -> Result<()> {
        self.kv
            .put(
                ACCESS_TOKEN_KEY,
                access_token,
                Some(Duration::from_secs(access_token_expiry_secs)),
            )
            .await?;
        self.kv.put(REFRESH_TOKEN_KEY, refresh_token, None).await?;
        debug!(
            backend = self.kv.backend(),
            expires_in = access_token_expiry_secs,
            "Stored OneDrive tokens"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_has_no_tokens() {
        let store = TokenStore::new(Arc::new(MemoryKv::new()));
        assert_eq!(store.get_tokens().await.unwrap(), OdAuthTokens::default());
    }

    #[tokio::test]
    async fn test_store_and_read_pair() {
        let store = TokenStore::new(Arc::new(MemoryKv::new()));
        store.store_tokens("access", 3600, "refresh").await.unwrap();

        let tokens = store.get_tokens().await.unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("access"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_zero_expiry_drops_access_token_only() {
        let store = TokenStore::new(Arc::new(MemoryKv::new()));
        store.store_tokens("access", 0, "refresh").await.unwrap();

        let tokens = store.get_tokens().await.unwrap();
        assert_eq!(tokens.access_token, None);
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh"));
    }
}
