use crate::error::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use twitter_entity::{
    resolve, BearerTokenEntity, Entity, EntityKind, ErrorsEntity, TweetsEntity, UserEntity,
};

/// A completed, fully buffered response from the Twitter API.
///
/// The body is resolved into an [`Entity`] once, when the response is created. Cloning is
/// cheap and clones share that entity, which is what makes responses suitable for caching.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    entity: Option<Arc<Entity>>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let entity = match serde_json::from_slice::<Value>(&body) {
            Ok(raw @ Value::Object(_)) | Ok(raw @ Value::Array(_)) => Some(Arc::new(resolve(raw))),
            _ => None,
        };

        Self {
            status,
            headers,
            body,
            entity,
        }
    }

    /// Buffer the body of a transport response.
    pub async fn from_http(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(twitter_middleware::Error::from)?;
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The entity the body resolves to. Every call returns the same entity.
    pub fn entity(&self) -> Result<&Arc<Entity>> {
        match &self.entity {
            Some(entity) => Ok(entity),
            None => Err(Error::InvalidJson {
                body: self.text().into_owned(),
                source: serde_json::from_slice::<Value>(&self.body).err(),
            }),
        }
    }

    pub fn entity_errors(&self) -> Result<ErrorsEntity<'_>> {
        self.view(EntityKind::Errors, Entity::as_errors)
    }

    pub fn entity_bearer_token(&self) -> Result<BearerTokenEntity<'_>> {
        self.view(EntityKind::BearerToken, Entity::as_bearer_token)
    }

    pub fn entity_user(&self) -> Result<UserEntity<'_>> {
        self.view(EntityKind::User, Entity::as_user)
    }

    pub fn entity_tweets(&self) -> Result<TweetsEntity<'_>> {
        self.view(EntityKind::Tweets, Entity::as_tweets)
    }

    /// `true` when the body is not an entity at all or is an error report.
    ///
    /// The status code plays no part: Twitter reports most failures in the body.
    pub fn has_error(&self) -> bool {
        self.entity
            .as_ref()
            .map_or(true, |entity| entity.kind() == EntityKind::Errors)
    }

    fn view<'a, V>(
        &'a self,
        expected: EntityKind,
        view: fn(&'a Entity) -> Option<V>,
    ) -> Result<V> {
        let entity = self.entity()?;
        view(entity).ok_or_else(|| Error::EntityShapeMismatch {
            expected,
            found: entity.kind(),
            body: self.text().into_owned(),
        })
    }
}
