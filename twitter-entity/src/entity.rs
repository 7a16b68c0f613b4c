use crate::attribute::Attribute;
use crate::naming::{accessor_attribute, to_snake_case};
use crate::resolver::resolve;
use crate::views::{BearerTokenEntity, ErrorEntity, ErrorsEntity, TweetEntity, TweetsEntity, UserEntity};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The entity kinds a payload can be resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Base,
    Errors,
    Error,
    BearerToken,
    User,
    Tweet,
    Tweets,
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Base => "BaseEntity",
            EntityKind::Errors => "ErrorsEntity",
            EntityKind::Error => "ErrorEntity",
            EntityKind::BearerToken => "BearerTokenEntity",
            EntityKind::User => "UserEntity",
            EntityKind::Tweet => "TweetEntity",
            EntityKind::Tweets => "TweetsEntity",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded Twitter payload with lazy, cached attribute access.
///
/// Attributes are looked up by name, camelCase or snake_case, and coerced on first access (see
/// [`Attribute`]). The coerced value is cached on the entity, so reading the same attribute
/// twice hands out the same [`Arc`].
pub struct Entity {
    kind: EntityKind,
    data: Value,
    cache: Mutex<HashMap<(EntityKind, String), Arc<Attribute>>>,
}

impl Entity {
    pub(crate) fn new(kind: EntityKind, data: Value) -> Self {
        Self {
            kind,
            data,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `data` by shape. Same as [`resolve`].
    pub fn from_raw(data: Value) -> Self {
        resolve(data)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn raw_data(&self) -> &Value {
        &self.data
    }

    pub fn into_raw_data(self) -> Value {
        self.data
    }

    /// Read an attribute, coercing it on first access.
    ///
    /// Missing attributes read as `null`.
    pub fn get(&self, name: &str) -> Arc<Attribute> {
        let key = (self.kind, to_snake_case(name));

        let mut cache = self.cache.lock();
        if let Some(attribute) = cache.get(&key) {
            return Arc::clone(attribute);
        }

        let attribute = Arc::new(Attribute::coerce(self.field(&key.1)));
        cache.insert(key, Arc::clone(&attribute));
        attribute
    }

    /// Read an attribute as it appears in the payload, without coercion or caching.
    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.field(&to_snake_case(name))
    }

    /// Accessor-style lookup: `invoke("getCreatedAt")` reads `created_at`.
    pub fn invoke(&self, method: &str) -> Arc<Attribute> {
        self.get(accessor_attribute(method))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get_raw(name).is_some()
    }

    fn field(&self, key: &str) -> Option<&Value> {
        match &self.data {
            Value::Object(object) => object.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        }
    }

    pub fn as_errors(&self) -> Option<ErrorsEntity<'_>> {
        self.is(EntityKind::Errors).then(|| ErrorsEntity::new(self))
    }

    pub fn as_error(&self) -> Option<ErrorEntity<'_>> {
        self.is(EntityKind::Error).then(|| ErrorEntity::new(self))
    }

    pub fn as_bearer_token(&self) -> Option<BearerTokenEntity<'_>> {
        self.is(EntityKind::BearerToken)
            .then(|| BearerTokenEntity::new(self))
    }

    pub fn as_user(&self) -> Option<UserEntity<'_>> {
        self.is(EntityKind::User).then(|| UserEntity::new(self))
    }

    pub fn as_tweet(&self) -> Option<TweetEntity<'_>> {
        self.is(EntityKind::Tweet).then(|| TweetEntity::new(self))
    }

    pub fn as_tweets(&self) -> Option<TweetsEntity<'_>> {
        self.is(EntityKind::Tweets).then(|| TweetsEntity::new(self))
    }

    fn is(&self, kind: EntityKind) -> bool {
        self.kind == kind
    }
}

impl From<Value> for Entity {
    fn from(data: Value) -> Self {
        resolve(data)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind)
            .field("data", &self.data)
            .finish()
    }
}
