use http::StatusCode;
use std::fmt;

/// Key under which failed attempts are counted and retry budgets are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The server answered with an error status (`>= 400`).
    Status(StatusCode),
    /// The transport failed with an error matching one of the policy's
    /// unexpected transport error patterns.
    UnexpectedTransport,
}

impl Classification {
    /// Classify a response status.
    ///
    /// Returns `None` for anything below `400`: those responses are handed back to the caller
    /// as they are.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.as_u16() > 399 {
            Some(Classification::Status(status))
        } else {
            None
        }
    }

    /// Whether this classification is the server telling us to slow down (`429`).
    pub fn is_rate_limited(&self) -> bool {
        *self == Classification::Status(StatusCode::TOO_MANY_REQUESTS)
    }
}

impl From<StatusCode> for Classification {
    fn from(status: StatusCode) -> Self {
        Classification::Status(status)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Status(status) if *status == StatusCode::TOO_MANY_REQUESTS => {
                write!(f, "{}-TOO MANY REQUESTS", status.as_u16())
            }
            Classification::Status(status) => write!(
                f,
                "{}-{}",
                status.as_u16(),
                status
                    .canonical_reason()
                    .unwrap_or("UNKNOWN")
                    .to_uppercase()
            ),
            Classification::UnexpectedTransport => f.write_str("unexpected transport error"),
        }
    }
}
