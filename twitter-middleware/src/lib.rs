//! Middleware chains over [`reqwest`] for talking to the Twitter REST API.
//!
//! A [`ClientWithMiddleware`] sends every request through the [`Middleware`] attached with
//! [`ClientBuilder::with`], in order, before it reaches the transport. Per-request options
//! travel in the request's [`http::Extensions`], set with [`RequestBuilder::with_extension`].
//!
//! ```
//! use reqwest::{Client, Request, Response};
//! use twitter_middleware::{ClientBuilder, Middleware, Next, Result};
//! use http::Extensions;
//!
//! struct LogRequests;
//!
//! #[async_trait::async_trait]
//! impl Middleware for LogRequests {
//!     async fn handle(
//!         &self,
//!         req: Request,
//!         extensions: &mut Extensions,
//!         next: Next<'_>,
//!     ) -> Result<Response> {
//!         println!("{} {}", req.method(), req.url());
//!         next.run(req, extensions).await
//!     }
//! }
//!
//! async fn run() -> Result<()> {
//!     let client = ClientBuilder::new(Client::new()).with(LogRequests).build();
//!     let user = client
//!         .get("https://api.twitter.com/1.1/users/show.json?screen_name=twitterdev")
//!         .bearer_auth("AAAA")
//!         .send()
//!         .await?;
//!     println!("{}", user.text().await?);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod middleware;
mod req_init;

pub use client::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
pub use error::{Error, MalformedResponse, Result};
pub use middleware::{BoxFuture, Middleware, Next};
pub use req_init::{Extension, RequestInitialiser};
