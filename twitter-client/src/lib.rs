//! A client for the Twitter REST API.
//!
//! [`TwitterClient::request`] sends a request through a retrying middleware chain (see
//! [`twitter_retry`]), buffers the response and resolves its body into an entity (see
//! [`twitter_entity`]). Successful `GET` responses can be kept in a [`CacheStore`] of your
//! choosing.

mod cache;
mod client;
mod error;
mod response;

pub use cache::{cache_key, CacheStore};
pub use client::{
    Parameters, RequestOptions, TwitterClient, TwitterClientBuilder, DEFAULT_TIMEOUT,
};
pub use error::{Error, Result};
pub use response::Response;

pub use twitter_entity;
pub use twitter_retry;
