//! `RetryTransientMiddleware` implements retrying requests on transient errors.

use crate::classification::Classification;
use crate::policy::RetryPolicy;
use crate::state::RetryState;
use anyhow::anyhow;
use http::{Extensions, StatusCode};
use reqwest::{Request, Response, ResponseBuilderExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use twitter_middleware::{Error, MalformedResponse, Middleware, Next, Result};

/// Request extension disabling the "`200 OK` must carry a JSON body" check.
///
/// ```
/// # async fn run(client: twitter_middleware::ClientWithMiddleware) {
/// use twitter_retry::SkipJsonValidation;
///
/// let banner = client
///     .get("https://pbs.twimg.com/profile_banners/783214/1646075315/1500x500")
///     .with_extension(SkipJsonValidation)
///     .send()
///     .await;
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipJsonValidation;

/// `RetryTransientMiddleware` offers retry logic for requests sent to the Twitter API, which
/// fails in a transient manner more often than one would like.
///
/// Every attempt is classified: error statuses (`>= 400`) by their status code, transport
/// failures matching one of the [`RetryPolicy`]'s unexpected transport error patterns as
/// [`Classification::UnexpectedTransport`]. A classified attempt is retried, after a
/// randomized backoff, until its classification runs out of attempts. Once that happens the
/// last response is returned as is, even if it is an error status, or the last transport
/// error is propagated.
///
/// Callers never observe individual attempts.
///
/// `200 OK` responses must carry a JSON body, otherwise [`Error::MalformedResponse`] is
/// raised immediately. Insert [`SkipJsonValidation`] in the request extensions to opt out.
///
/// Insert a [`CancellationToken`] in the request extensions to be able to interrupt both the
/// transport wait and the backoff sleeps; the request then fails with [`Error::Cancelled`].
///
///```rust
///     use twitter_middleware::ClientBuilder;
///     use twitter_retry::{RetryPolicy, RetryTransientMiddleware};
///     use reqwest::Client;
///
///     let retry_policy = RetryPolicy::builder()
///         .default_max_attempts(5)
///         .avoid_rate_limit(true)
///         .build();
///
///     let retry_transient_middleware = RetryTransientMiddleware::new_with_policy(retry_policy);
///     let client = ClientBuilder::new(Client::new()).with(retry_transient_middleware).build();
///```
#[derive(Debug, Default)]
pub struct RetryTransientMiddleware {
    retry_policy: RetryPolicy,
}

impl RetryTransientMiddleware {
    /// Construct `RetryTransientMiddleware` with a [retry_policy][RetryPolicy].
    pub fn new_with_policy(retry_policy: RetryPolicy) -> Self {
        Self { retry_policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

#[async_trait::async_trait]
impl Middleware for RetryTransientMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        self.execute_with_retry(req, next, extensions).await
    }
}

impl RetryTransientMiddleware {
    async fn execute_with_retry<'a>(
        &'a self,
        req: Request,
        next: Next<'a>,
        ext: &'a mut Extensions,
    ) -> Result<Response> {
        let cancellation = ext.get::<CancellationToken>().cloned();
        let validate_json = ext.get::<SkipJsonValidation>().is_none();
        let mut state = RetryState::new();

        if self.retry_policy.avoid_rate_limit() {
            let pacing = self.retry_policy.pacing_delay();
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Sleeping {:?} to avoid the Twitter request rate limit.",
                pacing
            );
            or_cancel(tokio::time::sleep(pacing), cancellation.as_ref()).await?;
        }

        loop {
            // Every attempt sends a copy, the original is kept for the next one.
            // `Bytes` bodies are reference counted so this does not copy the payload.
            let duplicate_request = req.try_clone().ok_or_else(|| {
                Error::Middleware(anyhow!(
                    "Request object is not clonable. Are you passing a streaming body?".to_string()
                ))
            })?;

            let result =
                or_cancel(next.clone().run(duplicate_request, ext), cancellation.as_ref()).await?;

            let result = match result {
                Ok(response) if validate_json && response.status() == StatusCode::OK => {
                    or_cancel(ensure_json_body(response), cancellation.as_ref()).await?
                }
                other => other,
            };

            let classification = match &result {
                Ok(response) => Classification::from_status(response.status()),
                Err(error) => self.retry_policy.classify_error(error),
            };

            let classification = match classification {
                Some(classification) => classification,
                None => return result,
            };

            let attempts = state.record(classification);
            if !self.retry_policy.should_retry(classification, attempts) {
                return result;
            }

            let delay = self.retry_policy.delay_for(classification);
            #[cfg(feature = "tracing")]
            tracing::warn!(
                classification = %classification,
                attempt = attempts,
                allowed_attempts = self.retry_policy.allowed_attempts(classification),
                "Got a \"{}\" error while performing a request to Twitter. Sleeping {:?} before trying again.",
                classification,
                delay
            );
            or_cancel(tokio::time::sleep(delay), cancellation.as_ref()).await?;
        }
    }
}

/// Race `future` against the cancellation token, if there is one.
async fn or_cancel<F: Future>(future: F, token: Option<&CancellationToken>) -> Result<F::Output> {
    match token {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}

/// Buffer the body of a `200 OK` and make sure it decodes as JSON.
///
/// The buffered body is put back into an equivalent response, so callers can still read it.
/// Failing to read the body is reported as the transport error it is, which lets it go through
/// transport error classification.
async fn ensure_json_body(response: Response) -> Result<Response> {
    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();
    let url = response.url().clone();
    let body = response.bytes().await?;

    if let Err(source) = serde_json::from_slice::<serde_json::Value>(&body) {
        return Err(MalformedResponse {
            url,
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
            source,
        }
        .into());
    }

    let mut rebuilt = http::Response::builder()
        .status(status)
        .version(version)
        .url(url)
        .body(body)
        .map_err(Error::middleware)?;
    *rebuilt.headers_mut() = headers;
    Ok(Response::from(rebuilt))
}
