//! Webhook delivery deduplication.
//!
//! Twilio retries a webhook when it does not get a timely 200, so the same
//! `MessageSid` can arrive more than once. Processing a retry would double
//! every side effect (duplicate reminders, duplicate replies). This cache
//! remembers recently seen message ids with automatic TTL expiry.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cache of recently processed Twilio message SIDs
#[derive(Clone)]
pub struct DedupCache {
    cache: Cache<String, ()>,
    /// Counter for suppressed duplicate deliveries
    duplicate_count: Arc<AtomicU64>,
}

impl DedupCache {
    /// Creates a new `DedupCache`.
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - How long a message id is remembered
    /// * `max_capacity` - Maximum number of remembered ids
    #[must_use]
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(std::time::Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            duplicate_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a message id; returns `true` the first time it is seen.
    ///
    /// Empty ids (missing `MessageSid`) are never deduplicated.
    pub async fn first_delivery(&self, message_sid: &str) -> bool {
        if message_sid.is_empty() {
            return true;
        }

        if self.cache.get(message_sid).await.is_some() {
            let count = self.duplicate_count.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                "Duplicate webhook delivery suppressed ({} total): {}",
                count, message_sid
            );
            return false;
        }

        self.cache.insert(message_sid.to_string(), ()).await;
        true
    }

    /// Total duplicate deliveries suppressed
    #[must_use]
    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count.load(Ordering::Relaxed)
    }

    /// Current number of remembered message ids
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
