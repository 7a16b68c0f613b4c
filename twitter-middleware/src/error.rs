use reqwest::{StatusCode, Url};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// There was an error running some middleware
    #[error("Middleware error: {0}")]
    Middleware(#[from] anyhow::Error),
    /// Error from the underlying reqwest client
    #[error("Request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// A nominally successful response carried a body that is not JSON
    #[error(transparent)]
    MalformedResponse(#[from] MalformedResponse),
    /// The request was cancelled while waiting on the transport or a backoff
    #[error("Request cancelled")]
    Cancelled,
}

/// An HTTP `200 OK` whose body could not be decoded as JSON.
///
/// Raised immediately by the retry middleware, it is never retried.
#[derive(Error, Debug)]
#[error(
    "Could not convert this response to JSON. Request URL: \"{url}\". Response Code: \"{}\". Response content: \"{body}\".",
    status.as_u16()
)]
pub struct MalformedResponse {
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
    #[source]
    pub source: serde_json::Error,
}

impl Error {
    pub fn middleware<E>(err: E) -> Self
    where
        E: 'static + Send + Sync + std::error::Error,
    {
        Error::Middleware(err.into())
    }

    /// Returns a possible URL related to this error.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Error::Middleware(_) | Error::Cancelled => None,
            Error::Reqwest(e) => e.url(),
            Error::MalformedResponse(e) => Some(&e.url),
        }
    }

    /// Strip the related url from this error (if, for example, it contains
    /// sensitive information such as an access token in the query)
    pub fn without_url(self) -> Self {
        match self {
            Error::Reqwest(e) => e.without_url().into(),
            _ => self,
        }
    }

    /// Returns true if the error is related to a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Reqwest(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the error is related to connect
    pub fn is_connect(&self) -> bool {
        match self {
            Error::Reqwest(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Returns true if a 200 response could not be decoded as JSON.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Error::MalformedResponse(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns the status code, if the error was generated from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Reqwest(e) => e.status(),
            Error::MalformedResponse(e) => Some(e.status),
            _ => None,
        }
    }

    /// Renders this error followed by every error in its `source()` chain,
    /// separated by `": "`.
    ///
    /// Transport failures keep the interesting part (`connection reset`,
    /// `operation timed out`, ...) several levels down the chain, so this is
    /// what transport error patterns are matched against.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}
