use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use twitter_client::{CacheStore, Response};

/// Keeps everything in memory and records the time to live of each write.
#[derive(Clone, Default)]
pub struct MemoryCache {
    items: Arc<Mutex<HashMap<String, (Response, Option<Duration>)>>>,
}

impl MemoryCache {
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn expiry(&self, key: &str) -> Option<Option<Duration>> {
        self.items.lock().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Response> {
        self.items.lock().get(key).map(|(response, _)| response.clone())
    }

    async fn set(&self, key: &str, response: Response, expires_after: Option<Duration>) {
        self.items
            .lock()
            .insert(key.to_string(), (response, expires_after));
    }
}
