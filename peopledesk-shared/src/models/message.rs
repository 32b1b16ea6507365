use serde::{Deserialize, Serialize};

use super::Timestamp;

/// A single message exchanged between two users.
///
/// History endpoints and the realtime channel deliver the same shape; the
/// persisted `id` is only present once the backend has stored the message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Persisted identifier, absent on frames pushed before storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// ID of the user who sent the message.
    pub sender_id: i64,

    /// ID of the user the message was addressed to.
    pub receiver_id: i64,

    /// The message content.
    pub content: String,

    /// When the message was sent. History rows carry this as `createdAt`.
    #[serde(alias = "createdAt")]
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Whether `other` carries the same (sender, receiver, content,
    /// timestamp) tuple. This is the de-duplication identity; the persisted
    /// id is excluded because a realtime push and a history row for the same
    /// message may disagree on it.
    #[must_use]
    pub fn same_payload(&self, other: &Self) -> bool {
        self.sender_id == other.sender_id
            && self.receiver_id == other.receiver_id
            && self.content == other.content
            && self.timestamp == other.timestamp
    }

    /// The conversation the message belongs to, seen from `local_user`:
    /// the participant that is not the local user.
    #[must_use]
    pub fn counterpart(&self, local_user: i64) -> i64 {
        if self.sender_id == local_user {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json;

    fn message(sender: i64, receiver: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id: None,
            sender_id: sender,
            receiver_id: receiver,
            content: content.to_string(),
            timestamp: Timestamp(Utc.with_ymd_and_hms(2026, 1, 12, 9, 15, 0).unwrap()),
        }
    }

    #[test]
    fn test_message_wire_names_are_camel_case() {
        let msg = message(7, 12, "Hello");
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("\"senderId\":7"));
        assert!(json.contains("\"receiverId\":12"));
        assert!(json.contains("\"timestamp\""));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_message_accepts_created_at_alias() {
        let json = r#"{
            "id": 41,
            "senderId": 7,
            "receiverId": 12,
            "content": "Hello",
            "createdAt": "2026-01-12T09:15:00Z"
        }"#;

        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, Some(41));
        assert_eq!(msg.timestamp.0, Utc.with_ymd_and_hms(2026, 1, 12, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_same_payload_ignores_persisted_id() {
        let mut a = message(7, 12, "Hello");
        let mut b = message(7, 12, "Hello");
        a.id = Some(1);
        b.id = Some(2);

        assert!(a.same_payload(&b));
    }

    #[test]
    fn test_same_payload_distinguishes_content() {
        let a = message(7, 12, "Hello");
        let b = message(7, 12, "Hello again");

        assert!(!a.same_payload(&b));
    }

    #[test]
    fn test_counterpart_for_both_directions() {
        let outbound = message(7, 12, "Hi");
        let inbound = message(12, 7, "Hi yourself");

        assert_eq!(outbound.counterpart(7), 12);
        assert_eq!(inbound.counterpart(7), 12);
    }
}
