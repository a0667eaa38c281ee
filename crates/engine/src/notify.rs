//! User lifecycle events and the queue they are pushed to.
//!
//! Every committed user mutation emits one event. Publishing happens after
//! the commit, exactly once per mutation: a failed push never rolls the
//! database back, it comes back to the caller as
//! [`EngineError::Publish`](crate::EngineError::Publish) instead.

use async_trait::async_trait;
use fred::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, User};

const DEFAULT_QUEUE_NAME: &str = "bolletta:user:events";

/// A user mutation the rest of the platform gets told about.
///
/// `payload` is the row as persisted by the mutation, `user` is the account
/// that performed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UserEvent {
    CreatedUser { payload: User, user: User },
    UpdatedUser { payload: User, user: User },
    DeletedUser { payload: User, user: User },
    RestoredUser { payload: User, user: User },
}

impl UserEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatedUser { .. } => "created_user",
            Self::UpdatedUser { .. } => "updated_user",
            Self::DeletedUser { .. } => "deleted_user",
            Self::RestoredUser { .. } => "restored_user",
        }
    }
}

/// Outbound side of the engine: something that takes committed events.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand one event over. Must not retry on its own.
    async fn publish(&self, event: &UserEvent) -> ResultEngine<()>;
}

/// [`Notifier`] backed by a Redis list, pushed with `RPUSH`.
pub struct RedisNotifier {
    pool: Pool,
    queue_name: String,
}

impl RedisNotifier {
    /// Connects a pooled Redis client for the given URL.
    pub async fn connect(url: &str) -> ResultEngine<Self> {
        let config = Config::from_url(url).map_err(publish_err)?;
        let pool = Pool::new(config, None, None, None, 6).map_err(publish_err)?;

        pool.connect();
        pool.wait_for_connect().await.map_err(publish_err)?;

        Ok(Self {
            pool,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
        })
    }

    /// Override the queue events are pushed to.
    #[must_use]
    pub fn queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn publish(&self, event: &UserEvent) -> ResultEngine<()> {
        let body = serde_json::to_string(event).map_err(|err| {
            EngineError::Publish(format!("could not serialize {}: {err}", event.name()))
        })?;

        let queued: i64 = self
            .pool
            .rpush(self.queue_name.as_str(), body)
            .await
            .map_err(publish_err)?;
        tracing::debug!(
            queue = %self.queue_name,
            event = event.name(),
            queued,
            "published user event"
        );

        Ok(())
    }
}

fn publish_err(err: Error) -> EngineError {
    EngineError::Publish(err.to_string())
}
