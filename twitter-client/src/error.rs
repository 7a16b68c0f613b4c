use thiserror::Error;
use twitter_entity::EntityKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The request failed on its way through the middleware chain or the transport.
    #[error(transparent)]
    Http(#[from] twitter_middleware::Error),
    /// The response body is not a JSON object or array.
    #[error("Could not interpret the response body as a JSON object or array. Body received: {body}")]
    InvalidJson {
        body: String,
        #[source]
        source: Option<serde_json::Error>,
    },
    /// The response decoded fine but describes another kind of entity.
    #[error("Could not convert data to \"{expected}\", it looks more like a \"{found}\". Response body: \"{body}\"")]
    EntityShapeMismatch {
        expected: EntityKind,
        found: EntityKind,
        body: String,
    },
    /// A bearer token or header that cannot be sent as an HTTP header value.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl Error {
    /// The underlying transport or middleware error, if the request itself failed.
    pub fn http(&self) -> Option<&twitter_middleware::Error> {
        match self {
            Error::Http(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_entity_shape_mismatch(&self) -> bool {
        matches!(self, Error::EntityShapeMismatch { .. })
    }

    pub fn is_invalid_json(&self) -> bool {
        matches!(self, Error::InvalidJson { .. })
    }
}
