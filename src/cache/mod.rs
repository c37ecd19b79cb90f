//! Cache module for rendered pages
//!
//! The server keeps each rendered page for `revalidate_secs`. A request
//! after that re-renders it from the store and replaces the entry, so
//! content changes show up without restarting the server.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A rendered page and when it was rendered
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub html: String,
    pub rendered_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.rendered_at) < ttl
    }
}

/// Rendered pages keyed by request path
#[derive(Debug)]
pub struct RenderCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl RenderCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache configured with a revalidation period in seconds
    pub fn from_secs(revalidate_secs: u64) -> Self {
        Self::new(Duration::from_secs(revalidate_secs))
    }

    /// A cached page that is still within its revalidation period
    pub async fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now()).await
    }

    async fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.is_fresh(self.ttl, now) {
            Some(entry.html.clone())
        } else {
            tracing::debug!("Cache entry for {} is stale", key);
            None
        }
    }

    pub async fn insert(&self, key: &str, html: String) {
        self.insert_at(key, html, Instant::now()).await;
    }

    async fn insert_at(&self, key: &str, html: String, rendered_at: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry { html, rendered_at });
    }

    /// Return the cached page, or render and cache it
    ///
    /// Render failures are returned and nothing is cached.
    pub async fn get_or_render<F, Fut, E>(&self, key: &str, render: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, E>>,
    {
        if let Some(html) = self.get(key).await {
            return Ok(html);
        }
        let html = render().await?;
        self.insert(key, html.clone()).await;
        Ok(html)
    }

    /// Drop entries past their revalidation period
    pub async fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now()).await
    }

    async fn purge_stale_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
        before - entries.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
