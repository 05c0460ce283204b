//! In-process key-value namespace with TTL expiry

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::KvNamespace;
use crate::types::Result;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| Instant::now() >= at)
            .unwrap_or(false)
    }
}

/// Process-wide map; expired entries are dropped on read
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, Entry>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get_sync(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
            // Release the reference before removing; a fresh value written in
            // between must survive
            drop(entry);
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        None
    }

    pub(crate) fn put_sync(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
    }
}

#[async_trait]
impl KvNamespace for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_sync(key))
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.put_sync(key, value, ttl);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
