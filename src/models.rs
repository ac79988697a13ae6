use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub content: String,
    /// Produce listing the conversation is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_listing_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn involves(&self, user_id: &str) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    pub fn between(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Insert shape for [`Message`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub content: String,
    #[serde(default)]
    pub related_listing_id: Option<String>,
}

impl NewMessage {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.sender_id.trim().is_empty() {
            return Err(StoreError::Invalid("senderId is empty"));
        }
        if self.receiver_id.trim().is_empty() {
            return Err(StoreError::Invalid("receiverId is empty"));
        }
        Ok(())
    }

    pub fn into_message(self, created_at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            receiver_id: self.receiver_id,
            receiver_name: self.receiver_name,
            content: self.content,
            related_listing_id: self.related_listing_id,
            read: false,
            created_at,
        }
    }
}
