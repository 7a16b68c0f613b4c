//! Typed views over resolved entities.
//!
//! A view borrows an [`Entity`] of the matching kind and exposes the attributes Twitter
//! documents for it. Scalars are read straight from the payload, links, timestamps and nested
//! objects go through the entity's coercion cache. Anything not covered by a view is still
//! reachable through [`Entity::get`].

use crate::attribute::Attribute;
use crate::entity::{Entity, EntityKind};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

macro_rules! view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            entity: &'a Entity,
        }

        impl<'a> $name<'a> {
            pub(crate) fn new(entity: &'a Entity) -> Self {
                Self { entity }
            }

            /// The underlying entity.
            pub fn entity(&self) -> &'a Entity {
                self.entity
            }
        }
    };
}

macro_rules! fields {
    ($($method:ident: $read:ident($key:literal) -> $ty:ty;)*) => {
        $(
            pub fn $method(&self) -> Option<$ty> {
                $read(self.entity, $key)
            }
        )*
    };
}

fn str_field<'a>(entity: &'a Entity, key: &str) -> Option<&'a str> {
    entity.get_raw(key).and_then(Value::as_str)
}

fn i64_field(entity: &Entity, key: &str) -> Option<i64> {
    entity.get_raw(key).and_then(Value::as_i64)
}

fn u64_field(entity: &Entity, key: &str) -> Option<u64> {
    entity.get_raw(key).and_then(Value::as_u64)
}

fn bool_field(entity: &Entity, key: &str) -> Option<bool> {
    entity.get_raw(key).and_then(Value::as_bool)
}

fn datetime_field(entity: &Entity, key: &str) -> Option<DateTime<FixedOffset>> {
    entity.get(key).as_datetime().copied()
}

fn uri_field(entity: &Entity, key: &str) -> Option<Url> {
    entity.get(key).as_uri().cloned()
}

fn entity_field(entity: &Entity, key: &str) -> Option<Arc<Entity>> {
    entity.get(key).as_entity().cloned()
}

view! {
    /// An API error payload: `{"errors": [{"code": ..., "message": ...}, ...]}`.
    ErrorsEntity
}

impl<'a> ErrorsEntity<'a> {
    /// The listed errors, in payload order. An empty list yields none.
    pub fn errors(&self) -> Vec<Arc<Entity>> {
        match &*self.entity.get("errors") {
            Attribute::Entities(errors) => errors.clone(),
            Attribute::Entity(error) if error.kind() == EntityKind::Error => {
                vec![Arc::clone(error)]
            }
            _ => Vec::new(),
        }
    }

    /// The first error carrying `code`.
    pub fn error_by_code(&self, code: i64) -> Option<Arc<Entity>> {
        self.errors()
            .into_iter()
            .find(|error| i64_field(error, "code") == Some(code))
    }

    pub fn has_error_code(&self, code: i64) -> bool {
        self.error_by_code(code).is_some()
    }
}

view! {
    /// A single `{"code", "message", "label"}` error.
    ErrorEntity
}

impl<'a> ErrorEntity<'a> {
    fields! {
        code: i64_field("code") -> i64;
        message: str_field("message") -> &'a str;
        label: str_field("label") -> &'a str;
    }
}

view! {
    /// An application-only bearer token, as returned by `oauth2/token`.
    BearerTokenEntity
}

impl<'a> BearerTokenEntity<'a> {
    fields! {
        token_type: str_field("token_type") -> &'a str;
        access_token: str_field("access_token") -> &'a str;
    }
}

/// Renders `"<token_type> <access_token>"`, ready for an `Authorization` header.
impl fmt::Display for BearerTokenEntity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.token_type().unwrap_or_default(),
            self.access_token().unwrap_or_default()
        )
    }
}

view! {
    UserEntity
}

impl<'a> UserEntity<'a> {
    fields! {
        id: u64_field("id") -> u64;
        id_str: str_field("id_str") -> &'a str;
        name: str_field("name") -> &'a str;
        screen_name: str_field("screen_name") -> &'a str;
        location: str_field("location") -> &'a str;
        description: str_field("description") -> &'a str;
        url: uri_field("url") -> Url;
        is_protected: bool_field("protected") -> bool;
        is_verified: bool_field("verified") -> bool;
        followers_count: u64_field("followers_count") -> u64;
        friends_count: u64_field("friends_count") -> u64;
        listed_count: u64_field("listed_count") -> u64;
        favourites_count: u64_field("favourites_count") -> u64;
        statuses_count: u64_field("statuses_count") -> u64;
        created_at: datetime_field("created_at") -> DateTime<FixedOffset>;
        lang: str_field("lang") -> &'a str;
        entities: entity_field("entities") -> Arc<Entity>;
        profile_image_url: uri_field("profile_image_url") -> Url;
        profile_image_url_https: uri_field("profile_image_url_https") -> Url;
        profile_banner_url: uri_field("profile_banner_url") -> Url;
    }
}

view! {
    TweetEntity
}

impl<'a> TweetEntity<'a> {
    fields! {
        id: u64_field("id") -> u64;
        id_str: str_field("id_str") -> &'a str;
        text: str_field("text") -> &'a str;
        created_at: datetime_field("created_at") -> DateTime<FixedOffset>;
        is_truncated: bool_field("truncated") -> bool;
        in_reply_to_status_id: u64_field("in_reply_to_status_id") -> u64;
        in_reply_to_status_id_str: str_field("in_reply_to_status_id_str") -> &'a str;
        in_reply_to_user_id: u64_field("in_reply_to_user_id") -> u64;
        in_reply_to_screen_name: str_field("in_reply_to_screen_name") -> &'a str;
        retweet_count: u64_field("retweet_count") -> u64;
        favorite_count: u64_field("favorite_count") -> u64;
        is_favorited: bool_field("favorited") -> bool;
        is_retweeted: bool_field("retweeted") -> bool;
        lang: str_field("lang") -> &'a str;
        entities: entity_field("entities") -> Arc<Entity>;
        user: entity_field("user") -> Arc<Entity>;
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to_status_id().is_some()
    }
}

view! {
    /// A timeline: a list of tweets.
    TweetsEntity
}

impl<'a> TweetsEntity<'a> {
    /// Every element wrapped as a tweet, in payload order.
    ///
    /// Only the first element decided the shape of the list, the others are taken to be tweets
    /// without being checked.
    pub fn tweets(&self) -> Vec<Entity> {
        match self.entity.raw_data() {
            Value::Array(items) => items
                .iter()
                .map(|item| Entity::new(EntityKind::Tweet, item.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entity.raw_data().as_array().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
