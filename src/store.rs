use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Message, NewMessage};

/// Message history. Written by the HTTP routes only; the live relay never
/// touches it.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// Every message the user sent or received, oldest first.
    async fn messages_for_user(&self, user_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Messages exchanged between two users, ordered by `created_at`.
    async fn conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>, StoreError>;

    /// Returns `false` if no message has that id.
    async fn mark_read(&self, message_id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct Inner {
    messages: Vec<Message>,
    index: HashMap<Uuid, usize>,
}

/// Process-local store. Append only; insertion order breaks timestamp ties.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Message>
    where
        F: Fn(&Message) -> bool,
    {
        let inner = self.inner.read().await;
        let mut found: Vec<Message> = inner.messages.iter().filter(|&m| keep(m)).cloned().collect();
        found.sort_by_key(|m| m.created_at);
        found
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        message.validate()?;
        let message = message.into_message(Utc::now());

        let mut inner = self.inner.write().await;
        let position = inner.messages.len();
        inner.index.insert(message.id, position);
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_for_user(&self, user_id: &str) -> Result<Vec<Message>, StoreError> {
        Ok(self.filtered(|m| m.involves(user_id)).await)
    }

    async fn conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>, StoreError> {
        Ok(self.filtered(|m| m.between(user_a, user_b)).await)
    }

    async fn mark_read(&self, message_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(&position) = inner.index.get(&message_id) else {
            return Ok(false);
        };
        match inner.messages.get_mut(position) {
            Some(message) => {
                message.read = true;
                Ok(true)
            }
            None => Err(StoreError::Backend(format!(
                "index points past end for {message_id}"
            ))),
        }
    }
}
