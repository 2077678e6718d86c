// Entity lifecycle module
// Subscribers that stamp authored entities with their author and publication
// date when they are created through the API.

pub mod author;
pub mod published;

use axum::http::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use utoipa::ToSchema;

use crate::auth::{Principal, UserResponse};
use crate::content::models::{Comment, Post};

pub use author::AuthoredEntitySubscriber;
pub use published::PublishedDateEntitySubscriber;

/// Reference to the user who authored an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Author {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "testuser")]
    pub username: String,
}

impl From<&Principal> for Author {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.user_id,
            username: principal.username.clone(),
        }
    }
}

/// Entities that record who created them
pub trait AuthoredEntity {
    fn set_author(&mut self, author: Author);
}

/// Entities that record when they were published
pub trait PublishedDateEntity {
    fn set_published(&mut self, published: DateTime<Utc>);
}

/// The entity a handler is about to return
///
/// Capabilities are resolved by matching on the variant; entities without
/// the capability simply yield `None`.
#[derive(Debug)]
pub enum ViewResult<'a> {
    Post(&'a mut Post),
    Comment(&'a mut Comment),
    User(&'a UserResponse),
    None,
}

impl ViewResult<'_> {
    pub fn authored(&mut self) -> Option<&mut dyn AuthoredEntity> {
        match self {
            ViewResult::Post(post) => Some(&mut **post),
            ViewResult::Comment(comment) => Some(&mut **comment),
            ViewResult::User(_) | ViewResult::None => None,
        }
    }

    pub fn dated(&mut self) -> Option<&mut dyn PublishedDateEntity> {
        match self {
            ViewResult::Post(post) => Some(&mut **post),
            ViewResult::Comment(comment) => Some(&mut **comment),
            ViewResult::User(_) | ViewResult::None => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ViewResult::Post(_) => "post",
            ViewResult::Comment(_) => "comment",
            ViewResult::User(_) => "user",
            ViewResult::None => "none",
        }
    }
}

/// Emitted after a handler produced its result and before it is persisted
/// or serialized
#[derive(Debug)]
pub struct ViewEvent<'a> {
    pub method: Method,
    pub principal: Option<&'a Principal>,
    pub result: ViewResult<'a>,
}

impl<'a> ViewEvent<'a> {
    pub fn new(method: Method, principal: Option<&'a Principal>, result: ViewResult<'a>) -> Self {
        Self {
            method,
            principal,
            result,
        }
    }
}

/// Reacts to view events; must never fail for entities it does not handle
pub trait ViewSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_view(&self, event: &mut ViewEvent<'_>);
}

/// Registry of view subscribers
pub struct LifecycleHooks {
    subscribers: Vec<Box<dyn ViewSubscriber>>,
}

impl LifecycleHooks {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn register(mut self, subscriber: impl ViewSubscriber + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Run every subscriber against the event
    pub fn dispatch(&self, event: &mut ViewEvent<'_>) {
        debug!(
            "Dispatching {} {} event to {} subscribers",
            event.method,
            event.result.kind(),
            self.subscribers.len()
        );
        for subscriber in &self.subscribers {
            trace!("Running subscriber {}", subscriber.name());
            subscriber.on_view(event);
        }
    }
}

impl Default for LifecycleHooks {
    /// Registers the author and published-date subscribers
    fn default() -> Self {
        Self::new()
            .register(AuthoredEntitySubscriber)
            .register(PublishedDateEntitySubscriber)
    }
}
