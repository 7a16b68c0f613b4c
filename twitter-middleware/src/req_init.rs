use crate::RequestBuilder;

/// Prepares every request builder handed out by a [`ClientWithMiddleware`], before the caller
/// gets to touch it. Attach with [`with_init`].
///
/// ```
/// use twitter_middleware::{RequestBuilder, RequestInitialiser};
///
/// struct AppOnlyAuth(String);
///
/// impl RequestInitialiser for AppOnlyAuth {
///     fn init(&self, req: RequestBuilder) -> RequestBuilder {
///         req.bearer_auth(&self.0)
///     }
/// }
/// ```
///
/// [`ClientWithMiddleware`]: crate::ClientWithMiddleware
/// [`with_init`]: crate::ClientBuilder::with_init
pub trait RequestInitialiser: 'static + Send + Sync {
    fn init(&self, req: RequestBuilder) -> RequestBuilder;
}

impl<F> RequestInitialiser for F
where
    F: Send + Sync + 'static + Fn(RequestBuilder) -> RequestBuilder,
{
    fn init(&self, req: RequestBuilder) -> RequestBuilder {
        (self)(req)
    }
}

/// Inserts a clone of the value into the [`Extensions`](http::Extensions) of every request, e.g.
/// a `SkipJsonValidation` marker on a client that only downloads media.
///
/// ```
/// use twitter_middleware::{ClientBuilder, Extension};
///
/// #[derive(Clone)]
/// struct LogName(&'static str);
///
/// let client = ClientBuilder::new(reqwest::Client::new())
///     .with_init(Extension(LogName("timeline-crawler")))
///     .build();
/// ```
pub struct Extension<T>(pub T);

impl<T: Send + Sync + Clone + 'static> RequestInitialiser for Extension<T> {
    fn init(&self, mut req: RequestBuilder) -> RequestBuilder {
        req.extensions().insert(self.0.clone());
        req
    }
}
