//! Environment-variable backed namespace
//!
//! Reads `{prefix}{KEY}` (upper-cased) from the process environment. Writes
//! land in an in-memory overlay that shadows the environment from then on,
//! so a refreshed token replaces the one the process was started with.

use async_trait::async_trait;
use std::time::Duration;

use super::{KvNamespace, MemoryKv};
use crate::types::Result;

#[derive(Debug)]
pub struct EnvKv {
    prefix: String,
    overlay: MemoryKv,
}

impl EnvKv {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            overlay: MemoryKv::new(),
        }
    }

    /// Environment variable name for a key: `access_token` → `OD_ACCESS_TOKEN`
    pub fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_ascii_uppercase())
    }
}

#[async_trait]
impl KvNamespace for EnvKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.overlay.get_sync(key) {
            return Ok(Some(value));
        }
        Ok(std::env::var(self.var_name(key))
            .ok()
            .filter(|v| !v.trim().is_empty()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.overlay.put_sync(key, value, ttl);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "env"
    }
}
