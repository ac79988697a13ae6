//! Conversation list derived from message history. There is no stored
//! conversation entity; a conversation is the set of messages between two
//! participants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Message;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub participant_id: String,
    pub participant_name: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread: usize,
}

/// Groups `messages` by the other participant. Newest conversation first.
/// Messages not involving `user_id` are ignored.
pub fn summarize(user_id: &str, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut by_partner: HashMap<&str, ConversationSummary> = HashMap::new();

    for message in messages.iter().filter(|m| m.involves(user_id)) {
        let incoming = message.receiver_id == user_id;
        let (partner_id, partner_name) = if incoming {
            (message.sender_id.as_str(), &message.sender_name)
        } else {
            (message.receiver_id.as_str(), &message.receiver_name)
        };

        let summary = by_partner
            .entry(partner_id)
            .or_insert_with(|| ConversationSummary {
                participant_id: partner_id.to_string(),
                participant_name: partner_name.clone(),
                last_message: message.content.clone(),
                last_message_at: message.created_at,
                unread: 0,
            });

        if message.created_at >= summary.last_message_at {
            summary.last_message.clone_from(&message.content);
            summary.last_message_at = message.created_at;
            summary.participant_name.clone_from(partner_name);
        }
        if incoming && !message.read {
            summary.unread += 1;
        }
    }

    let mut summaries: Vec<ConversationSummary> = by_partner.into_values().collect();
    summaries.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn message(from: &str, to: &str, content: &str, minute: i64, read: bool) -> Message {
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        Message {
            id: Uuid::new_v4(),
            sender_id: from.to_string(),
            sender_name: format!("{from} name"),
            receiver_id: to.to_string(),
            receiver_name: format!("{to} name"),
            content: content.to_string(),
            related_listing_id: None,
            read,
            created_at: base + Duration::minutes(minute),
        }
    }

    #[test]
    fn groups_by_partner_newest_first() {
        let messages = vec![
            message("buyer-1", "farmer-1", "wheat price?", 0, true),
            message("farmer-1", "buyer-1", "2850 per quintal", 5, false),
            message("buyer-2", "farmer-1", "deliver when?", 3, false),
            message("buyer-2", "farmer-1", "tomorrow ok?", 8, false),
        ];

        let summaries = summarize("farmer-1", &messages);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].participant_id, "buyer-2");
        assert_eq!(summaries[0].participant_name, "buyer-2 name");
        assert_eq!(summaries[0].last_message, "tomorrow ok?");
        assert_eq!(summaries[0].unread, 2);

        assert_eq!(summaries[1].participant_id, "buyer-1");
        assert_eq!(summaries[1].last_message, "2850 per quintal");
        // Outgoing unread messages are the partner's to read.
        assert_eq!(summaries[1].unread, 0);
    }

    #[test]
    fn ignores_unrelated_messages() {
        let messages = vec![message("a", "b", "x", 0, false)];
        assert!(summarize("c", &messages).is_empty());
    }
}
