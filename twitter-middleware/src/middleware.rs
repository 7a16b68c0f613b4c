use http::Extensions;
use reqwest::{Client, Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A step in the request pipeline of a [`ClientWithMiddleware`], attached with [`with`].
///
/// A middleware may change the request, short-circuit with its own response, or call
/// `next.run` (once or several times, as retries do) to hand the request down the chain.
///
/// ```
/// use reqwest::{Request, Response};
/// use twitter_middleware::{Middleware, Next, Result};
/// use http::Extensions;
///
/// struct RateLimitHeaders;
///
/// #[async_trait::async_trait]
/// impl Middleware for RateLimitHeaders {
///     async fn handle(
///         &self,
///         req: Request,
///         extensions: &mut Extensions,
///         next: Next<'_>,
///     ) -> Result<Response> {
///         let response = next.run(req, extensions).await?;
///         if let Some(remaining) = response.headers().get("x-rate-limit-remaining") {
///             println!("{:?} requests left in this window", remaining);
///         }
///         Ok(response)
///     }
/// }
/// ```
///
/// [`ClientWithMiddleware`]: crate::ClientWithMiddleware
/// [`with`]: crate::ClientBuilder::with
#[async_trait::async_trait]
pub trait Middleware: 'static + Send + Sync {
    /// Handle `req`. Values stored in `extensions` are visible to the rest of the chain.
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response>;
}

/// The part of the chain after the current middleware, ending with the transport.
#[derive(Clone)]
pub struct Next<'a> {
    transport: &'a Client,
    remaining: &'a [Arc<dyn Middleware>],
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl<'a> Next<'a> {
    pub(crate) fn new(transport: &'a Client, chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self {
            transport,
            remaining: chain,
        }
    }

    /// Hand `req` to the next middleware, or to the transport once the chain is exhausted.
    ///
    /// `Next` is `Clone`, so a middleware can run the rest of the chain more than once.
    pub fn run(self, req: Request, extensions: &'a mut Extensions) -> BoxFuture<'a, Result<Response>> {
        match self.remaining.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    transport: self.transport,
                    remaining: rest,
                };
                Box::pin(middleware.handle(req, extensions, next))
            }
            None => {
                let transport = self.transport;
                Box::pin(async move { transport.execute(req).await.map_err(Error::from) })
            }
        }
    }
}
