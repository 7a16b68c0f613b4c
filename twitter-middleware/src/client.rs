use http::Extensions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client, IntoUrl, Method, Request, Response};
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(any(feature = "query", feature = "json"))]
use serde::Serialize;

use crate::error::Result;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::RequestInitialiser;

/// Assembles a [`ClientWithMiddleware`] from a transport, middleware and request initialisers.
///
/// Middleware runs in the order it is attached, so attach the retry middleware last if other
/// middleware should only see the request once.
pub struct ClientBuilder {
    client: Client,
    middleware: Vec<Arc<dyn Middleware>>,
    initialisers: Vec<Arc<dyn RequestInitialiser>>,
}

impl ClientBuilder {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            middleware: Vec::new(),
            initialisers: Vec::new(),
        }
    }

    pub fn with<M: Middleware>(self, middleware: M) -> Self {
        self.with_arc(Arc::new(middleware))
    }

    /// Attach middleware you keep a handle to.
    pub fn with_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Attach a [`RequestInitialiser`], run on every request builder the client hands out.
    pub fn with_init<I: RequestInitialiser>(mut self, initialiser: I) -> Self {
        self.initialisers.push(Arc::new(initialiser));
        self
    }

    pub fn build(self) -> ClientWithMiddleware {
        ClientWithMiddleware {
            client: self.client,
            middleware: self.middleware.into(),
            initialisers: self.initialisers.into(),
        }
    }
}

/// A [`reqwest::Client`] whose requests go through a middleware chain.
///
/// Cloning is cheap: the transport and the chain are shared.
#[derive(Clone)]
pub struct ClientWithMiddleware {
    client: Client,
    middleware: Arc<[Arc<dyn Middleware>]>,
    initialisers: Arc<[Arc<dyn RequestInitialiser>]>,
}

impl ClientWithMiddleware {
    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a request. Attached initialisers have already run on the returned
    /// builder.
    ///
    /// An invalid `url` is only reported when the request is sent.
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        let builder = RequestBuilder {
            client: self.clone(),
            inner: self.client.request(method, url),
            extensions: Extensions::new(),
        };
        self.initialisers
            .iter()
            .fold(builder, |builder, initialiser| initialiser.init(builder))
    }

    /// Send `req` through the chain with empty extensions.
    pub async fn execute(&self, req: Request) -> Result<Response> {
        self.execute_with_extensions(req, &mut Extensions::new())
            .await
    }

    /// Send `req` through the chain. Middleware reads its per-request options, such as a
    /// cancellation token, from `extensions`.
    pub async fn execute_with_extensions(
        &self,
        req: Request,
        extensions: &mut Extensions,
    ) -> Result<Response> {
        Next::new(&self.client, &self.middleware)
            .run(req, extensions)
            .await
    }

    /// The transport at the end of the chain.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// A client without middleware: requests go straight to the transport.
impl From<Client> for ClientWithMiddleware {
    fn from(client: Client) -> Self {
        ClientBuilder::new(client).build()
    }
}

impl fmt::Debug for ClientWithMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientWithMiddleware")
            .field("client", &self.client)
            .field("middleware", &self.middleware.len())
            .field("initialisers", &self.initialisers.len())
            .finish()
    }
}

/// Lets the whole chain be used wherever a `tower` service is expected.
impl tower_service::Service<Request> for ClientWithMiddleware {
    type Response = Response;
    type Error = crate::Error;
    type Future = BoxFuture<'static, Result<Response>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<()>> {
        tower_service::Service::<Request>::poll_ready(&mut self.client, cx)
            .map_err(crate::Error::Reqwest)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

/// Wraps [`reqwest::RequestBuilder`], carrying the request's [`Extensions`] along.
#[must_use = "RequestBuilder does nothing until you 'send' it"]
pub struct RequestBuilder {
    client: ClientWithMiddleware,
    inner: reqwest::RequestBuilder,
    extensions: Extensions,
}

impl RequestBuilder {
    fn map(self, f: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder) -> Self {
        Self {
            inner: f(self.inner),
            ..self
        }
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.map(|inner| inner.header(key, value))
    }

    /// Merge `headers` into the ones already set.
    pub fn headers(self, headers: HeaderMap) -> Self {
        self.map(|inner| inner.headers(headers))
    }

    pub fn bearer_auth<T: fmt::Display>(self, token: T) -> Self {
        self.map(|inner| inner.bearer_auth(token))
    }

    pub fn body<T: Into<Body>>(self, body: T) -> Self {
        self.map(|inner| inner.body(body))
    }

    /// Total time allowed for this request, from connecting to the end of the response body.
    /// Every retry gets the full timeout again.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|inner| inner.timeout(timeout))
    }

    /// Append query parameters to the URL.
    #[cfg(feature = "query")]
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|inner| inner.query(query))
    }

    #[cfg(feature = "json")]
    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> Self {
        self.map(|inner| inner.json(json))
    }

    /// Insert a value into the request's extensions, for middleware to pick up.
    pub fn with_extension<T: Send + Sync + Clone + 'static>(mut self, extension: T) -> Self {
        self.extensions.insert(extension);
        self
    }

    pub fn extensions(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Build the request without sending it. Extensions are dropped.
    pub fn build(self) -> reqwest::Result<Request> {
        self.inner.build()
    }

    pub async fn send(self) -> Result<Response> {
        let Self {
            client,
            inner,
            mut extensions,
        } = self;
        let req = inner.build()?;
        client.execute_with_extensions(req, &mut extensions).await
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
