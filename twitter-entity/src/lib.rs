//! Entities for decoded Twitter API payloads.
//!
//! The API does not say what a payload is, so the kind is guessed from its shape: an object with
//! an `errors` key is an error report, an object with `id`, `name` and `description` is a user,
//! and so on (see [`detect`]). Whatever the kind, attributes are read lazily and coerced on first
//! access: nested objects become entities themselves, timestamps become datetimes and links
//! become URLs.
//!
//! ```
//! use serde_json::json;
//! use twitter_entity::{resolve, EntityKind};
//!
//! let payload = resolve(json!({
//!     "created_at": "Wed Oct 10 20:19:24 +0000 2018",
//!     "text": "just setting up my twttr",
//!     "entities": { "user_mentions": [] },
//!     "in_reply_to_status_id": null,
//!     "retweet_count": 0
//! }));
//!
//! assert_eq!(payload.kind(), EntityKind::Tweet);
//! assert!(payload.get("createdAt").as_datetime().is_some());
//! assert_eq!(payload.as_tweet().and_then(|tweet| tweet.text()), Some("just setting up my twttr"));
//! ```

mod attribute;
mod entity;
mod naming;
mod resolver;
mod views;

pub use attribute::{parse_twitter_datetime, parse_uri, Attribute, TWITTER_DATETIME_FORMAT};
pub use entity::{Entity, EntityKind};
pub use naming::{accessor_attribute, to_snake_case};
pub use resolver::{detect, is_array_of_entities, resolve};
pub use views::{
    BearerTokenEntity, ErrorEntity, ErrorsEntity, TweetEntity, TweetsEntity, UserEntity,
};
