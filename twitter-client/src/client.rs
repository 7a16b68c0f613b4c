use crate::cache::{cache_key, CacheStore};
use crate::error::Result;
use crate::response::Response;
use http::header::{IntoHeaderName, AUTHORIZATION};
use http::{HeaderMap, HeaderValue, Method};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use twitter_entity::BearerTokenEntity;
use twitter_middleware::{ClientBuilder, ClientWithMiddleware};
use twitter_retry::{CancellationToken, RetryPolicy, RetryTransientMiddleware, SkipJsonValidation};

/// Transport timeout applied to every request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// What to send along with a request.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Per request knobs.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Go through the cache even for methods other than `GET`.
    pub force_cache: bool,
    /// Time to live handed to the cache store.
    pub expires_after: Option<Duration>,
    /// Accept `200 OK` responses whose body is not JSON.
    pub skip_json_validation: bool,
    /// Abort the request, including any pending backoff, when cancelled.
    pub cancellation: Option<CancellationToken>,
}

/// A client for the Twitter REST API.
///
/// Requests go through [`RetryTransientMiddleware`], so transient failures are retried
/// transparently and error responses only surface once their retry budget is spent.
///
/// ```no_run
/// # async fn run() -> twitter_client::Result<()> {
/// use twitter_client::{Parameters, RequestOptions, TwitterClient};
///
/// let client = TwitterClient::builder().build()?;
/// let response = client
///     .request(
///         http::Method::GET,
///         "https://api.twitter.com/1.1/users/show.json".parse().unwrap(),
///         Parameters::new().query("screen_name", "twitterapi"),
///         RequestOptions::default(),
///         None,
///     )
///     .await?;
///
/// if let Ok(user) = response.entity_user() {
///     println!("{:?} has {:?} followers", user.name(), user.followers_count());
/// }
/// # Ok(())
/// # }
/// ```
pub struct TwitterClient {
    http: ClientWithMiddleware,
    timeout: Duration,
    cache: Option<Arc<dyn CacheStore>>,
    default_bearer_token: Option<String>,
}

impl TwitterClient {
    pub fn builder() -> TwitterClientBuilder {
        TwitterClientBuilder::default()
    }

    /// Bearer token used for requests that do not bring their own.
    pub fn set_default_bearer_token(&mut self, token: &BearerTokenEntity<'_>) -> &mut Self {
        self.default_bearer_token = Some(token.to_string());
        self
    }

    /// Send a request to the API.
    ///
    /// `bearer_token`, or else the default bearer token, is sent as the `Authorization` header
    /// unless `parameters` already carry one. `GET` requests (and any request with
    /// [`RequestOptions::force_cache`]) are looked up in the cache store first, and their
    /// response is stored there unless it reports an error.
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        mut parameters: Parameters,
        options: RequestOptions,
        bearer_token: Option<&BearerTokenEntity<'_>>,
    ) -> Result<Response> {
        let bearer_token = bearer_token
            .map(ToString::to_string)
            .or_else(|| self.default_bearer_token.clone());
        if let Some(token) = bearer_token {
            if !parameters.headers.contains_key(AUTHORIZATION) {
                parameters
                    .headers
                    .insert(AUTHORIZATION, HeaderValue::from_str(&token)?);
            }
        }

        let cache = match &self.cache {
            Some(cache) if method == Method::GET || options.force_cache => {
                Some((cache, cache_key(&method, &url, &parameters)))
            }
            _ => None,
        };

        if let Some((cache, key)) = &cache {
            if let Some(response) = cache.get(key).await {
                tracing::debug!(%method, %url, key = %key, "Serving response from cache.");
                return Ok(response);
            }
        }

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .headers(parameters.headers)
            .timeout(self.timeout);
        if !parameters.query.is_empty() {
            request = request.query(&parameters.query);
        }
        if let Some(body) = parameters.body {
            request = request.body(body);
        }
        if options.skip_json_validation {
            request = request.with_extension(SkipJsonValidation);
        }
        if let Some(token) = options.cancellation {
            request = request.with_extension(token);
        }

        let response = Response::from_http(request.send().await?).await?;

        if let Some((cache, key)) = cache {
            if !response.has_error() {
                tracing::debug!(%method, %url, key = %key, "Storing response in cache.");
                cache.set(&key, response.clone(), options.expires_after).await;
            }
        }

        Ok(response)
    }
}

impl fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterClient")
            .field("http", &self.http)
            .field("timeout", &self.timeout)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

/// Builder for [`TwitterClient`].
pub struct TwitterClientBuilder {
    client: Option<reqwest::Client>,
    timeout: Duration,
    retry_policy: RetryPolicy,
    cache: Option<Arc<dyn CacheStore>>,
    default_bearer_token: Option<String>,
}

impl Default for TwitterClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            cache: None,
            default_bearer_token: None,
        }
    }
}

impl TwitterClientBuilder {
    /// Send requests through an already configured transport.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn cache_store<C: CacheStore>(self, cache: C) -> Self {
        self.cache_store_arc(Arc::new(cache))
    }

    pub fn cache_store_arc(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn default_bearer_token(mut self, token: &BearerTokenEntity<'_>) -> Self {
        self.default_bearer_token = Some(token.to_string());
        self
    }

    pub fn build(self) -> Result<TwitterClient> {
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .build()
                .map_err(twitter_middleware::Error::from)?,
        };

        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(self.retry_policy))
            .build();

        Ok(TwitterClient {
            http,
            timeout: self.timeout,
            cache: self.cache,
            default_bearer_token: self.default_bearer_token,
        })
    }
}
