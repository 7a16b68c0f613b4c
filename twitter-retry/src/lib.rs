//! Retry middleware for the Twitter REST API client.
//!
//! [`RetryTransientMiddleware`] resubmits requests failing with an error status or with a
//! transient transport error, counting attempts per [`Classification`] and backing off
//! according to a [`RetryPolicy`].
mod classification;
mod middleware;
mod policy;
mod state;

pub use classification::Classification;
pub use middleware::{RetryTransientMiddleware, SkipJsonValidation};
pub use policy::{
    DelayWindow, RetryPolicy, RetryPolicyBuilder, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_UNEXPECTED_TRANSPORT_PATTERNS,
};
pub use state::RetryState;
pub use tokio_util::sync::CancellationToken;
