use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Frames accepted from a client on `/ws`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "register", rename_all = "camelCase")]
    Register {
        user_id: String,
    },
    #[serde(rename = "chat_message", rename_all = "camelCase")]
    ChatMessage {
        receiver_id: String,
        content: String,
        sender_name: String,
    },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(FrameError::from)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Success,
}

/// Frames pushed to a client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Local receipt of a chat frame. Says nothing about remote delivery.
    #[serde(rename = "message_sent")]
    MessageSent {
        status: SendStatus,
    },
    #[serde(rename = "chat_message", rename_all = "camelCase")]
    ChatMessage {
        message: String,
        sender_id: Option<String>,
        sender_name: String,
        timestamp: String,
    },
}

impl ServerMessage {
    pub fn sent() -> Self {
        ServerMessage::MessageSent {
            status: SendStatus::Success,
        }
    }

    pub fn chat(
        content: String,
        sender_id: Option<String>,
        sender_name: String,
        at: DateTime<Utc>,
    ) -> Self {
        ServerMessage::ChatMessage {
            message: content,
            sender_id,
            sender_name,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_json(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parses_register_frame() {
        let frame = ClientMessage::parse(r#"{"type":"register","userId":"farmer-1"}"#).unwrap();
        assert_eq!(
            frame,
            ClientMessage::Register {
                user_id: "farmer-1".to_string()
            }
        );
    }

    #[test]
    fn parses_chat_frame_with_extra_fields() {
        let frame = ClientMessage::parse(
            r#"{"type":"chat_message","receiverId":"buyer-1","content":"50 quintals?","senderName":"Rajesh","extra":1}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            ClientMessage::ChatMessage {
                receiver_id: "buyer-1".to_string(),
                content: "50 quintals?".to_string(),
                sender_name: "Rajesh".to_string(),
            }
        );
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(ClientMessage::parse("not json").is_err());
        assert!(ClientMessage::parse(r#"{"userId":"u1"}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type":"typing","userId":"u1"}"#).is_err());
        assert!(ClientMessage::parse(r#"{"type":"chat_message","content":"hi"}"#).is_err());
    }

    #[test]
    fn ack_wire_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&ServerMessage::sent().to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "message_sent", "status": "success"}));
    }

    #[test]
    fn forwarded_chat_wire_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let frame = ServerMessage::chat("hello".into(), Some("u1".into()), "A".into(), at);
        let value: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "chat_message",
                "message": "hello",
                "senderId": "u1",
                "senderName": "A",
                "timestamp": "2024-03-01T09:30:00.000Z"
            })
        );
    }

    #[test]
    fn unregistered_sender_serializes_as_null() {
        let frame = ServerMessage::chat("hi".into(), None, "A".into(), Utc::now());
        let value: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert!(value["senderId"].is_null());
    }
}
