use crate::client::Parameters;
use crate::response::Response;
use http::Method;
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Storage for responses, keyed by [`cache_key`].
///
/// No store ships with this crate: plug in whatever your application already uses. Stores
/// decide for themselves what to do with a `None` time to live.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Option<Response>;

    async fn set(&self, key: &str, response: Response, expires_after: Option<Duration>);
}

/// Hex encoded SHA-256 of the method, the URL and the request parameters.
///
/// Headers are part of the key, so requests sent with different bearer tokens never share
/// entries.
pub fn cache_key(method: &Method, url: &Url, parameters: &Parameters) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str());
    hasher.update(b"\n");
    hasher.update(url.as_str());
    hasher.update(b"\n");

    for (name, value) in &parameters.query {
        hasher.update(name);
        hasher.update(b"=");
        hasher.update(value);
        hasher.update(b"&");
    }
    hasher.update(b"\n");

    let mut headers: Vec<_> = parameters
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_bytes()))
        .collect();
    headers.sort();
    for (name, value) in headers {
        hasher.update(name);
        hasher.update(b": ");
        hasher.update(value);
        hasher.update(b"\n");
    }
    hasher.update(b"\n");

    if let Some(body) = &parameters.body {
        hasher.update(body);
    }

    hex::encode(hasher.finalize())
}
