use crate::entity::Entity;
use crate::resolver::{is_array_of_entities, resolve};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Layout of the timestamps found in Twitter payloads, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub const TWITTER_DATETIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Every timestamp rendered with [`TWITTER_DATETIME_FORMAT`] is exactly this long.
const TWITTER_DATETIME_LEN: usize = 30;

/// The value of an entity attribute after coercion.
///
/// Nested objects and arrays come back as entities, Twitter timestamps as datetimes and
/// absolute `http(s)` links as URLs. Everything else, including missing attributes (as
/// `null`), is passed through untouched.
#[derive(Debug)]
pub enum Attribute {
    /// A nested object or array, resolved by shape.
    Entity(Arc<Entity>),
    /// A non-empty array of objects or arrays, each element resolved by shape.
    Entities(Vec<Arc<Entity>>),
    DateTime(DateTime<FixedOffset>),
    Uri(Url),
    Value(Value),
}

impl Attribute {
    pub(crate) fn coerce(raw: Option<&Value>) -> Self {
        let raw = match raw {
            Some(raw) => raw,
            None => return Attribute::Value(Value::Null),
        };

        match raw {
            Value::Array(items) if is_array_of_entities(raw) => Attribute::Entities(
                items
                    .iter()
                    .map(|item| Arc::new(resolve(item.clone())))
                    .collect(),
            ),
            Value::Array(_) | Value::Object(_) => Attribute::Entity(Arc::new(resolve(raw.clone()))),
            Value::String(s) => parse_twitter_datetime(s)
                .map(Attribute::DateTime)
                .or_else(|| parse_uri(s).map(Attribute::Uri))
                .unwrap_or_else(|| Attribute::Value(raw.clone())),
            other => Attribute::Value(other.clone()),
        }
    }

    pub fn as_entity(&self) -> Option<&Arc<Entity>> {
        match self {
            Attribute::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_entities(&self) -> Option<&[Arc<Entity>]> {
        match self {
            Attribute::Entities(entities) => Some(entities),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Attribute::DateTime(datetime) => Some(datetime),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&Url> {
        match self {
            Attribute::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    /// The raw value, for attributes that were not coerced.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_value().and_then(Value::as_u64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// `true` for explicit nulls and missing attributes alike.
    pub fn is_null(&self) -> bool {
        matches!(self, Attribute::Value(Value::Null))
    }
}

/// Parse a Twitter timestamp. Strings of any other length are never considered.
pub fn parse_twitter_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.len() != TWITTER_DATETIME_LEN {
        return None;
    }
    DateTime::parse_from_str(s, TWITTER_DATETIME_FORMAT).ok()
}

/// Parse an absolute `http://` or `https://` link with something after the scheme. The
/// character right after the scheme must not be a line break.
pub fn parse_uri(s: &str) -> Option<Url> {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))?;
    if rest.is_empty() || rest.starts_with('\n') {
        return None;
    }
    Url::parse(s).ok()
}
