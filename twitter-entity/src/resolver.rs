//! Shape-based detection of the entity kind of a decoded payload.

use crate::entity::{Entity, EntityKind};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// Object shapes, checked in order. The first matching rule wins.
const OBJECT_RULES: &[(EntityKind, fn(&Object) -> bool)] = &[
    (EntityKind::Errors, is_errors),
    (EntityKind::Error, is_error),
    (EntityKind::BearerToken, is_bearer_token),
    (EntityKind::User, is_user),
    (EntityKind::Tweet, is_tweet),
];

/// Pick the entity kind for a decoded payload.
///
/// Objects are matched against the object shapes first. A non-empty array whose elements are
/// all objects or arrays is a list of tweets if its first element is a tweet. Anything else is
/// [`EntityKind::Base`].
pub fn detect(raw: &Value) -> EntityKind {
    match raw {
        Value::Object(object) => OBJECT_RULES
            .iter()
            .find(|(_, matches)| matches(object))
            .map(|(kind, _)| *kind)
            .unwrap_or(EntityKind::Base),
        Value::Array(items) if is_array_of_entities(raw) => match items.first().map(detect) {
            Some(EntityKind::Tweet) => EntityKind::Tweets,
            _ => EntityKind::Base,
        },
        _ => EntityKind::Base,
    }
}

/// Wrap a decoded payload into the entity its shape describes.
pub fn resolve(raw: Value) -> Entity {
    let kind = detect(&raw);
    if kind == EntityKind::Base {
        tracing::trace!("No entity shape matched, falling back to a base entity.");
    }
    Entity::new(kind, raw)
}

/// `true` for a non-empty array whose elements are all arrays or objects.
pub fn is_array_of_entities(raw: &Value) -> bool {
    match raw {
        Value::Array(items) => {
            !items.is_empty() && items.iter().all(|item| item.is_object() || item.is_array())
        }
        _ => false,
    }
}

/// Present with a non-null value.
fn is_set(object: &Object, key: &str) -> bool {
    object.get(key).map_or(false, |value| !value.is_null())
}

fn is_errors(object: &Object) -> bool {
    is_set(object, "errors")
}

fn is_error(object: &Object) -> bool {
    object.len() == 3
        && is_set(object, "code")
        && is_set(object, "message")
        && is_set(object, "label")
}

fn is_bearer_token(object: &Object) -> bool {
    object.len() == 2
        && object.get("token_type").and_then(Value::as_str) == Some("bearer")
}

fn is_user(object: &Object) -> bool {
    is_set(object, "id") && is_set(object, "name") && is_set(object, "description")
}

fn is_tweet(object: &Object) -> bool {
    // The reply fields are usually null, only their presence is checked.
    let has_user_mentions = object
        .get("entities")
        .and_then(Value::as_object)
        .map_or(false, |entities| is_set(entities, "user_mentions"));

    has_user_mentions
        && object.contains_key("in_reply_to_status_id")
        && object.contains_key("retweet_count")
}
