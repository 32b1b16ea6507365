use serde::{Deserialize, Serialize};

use super::{Timestamp, UserRole};

/// One row of the messaging sidebar: the local user's view of a 1:1
/// conversation with a counterpart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// The counterpart's user id; conversations are keyed by this.
    pub other_user_id: i64,

    /// The counterpart's display name.
    pub other_user_name: String,

    /// Avatar reference for the counterpart, when one is set.
    #[serde(default)]
    pub other_user_avatar: Option<String>,

    /// Preview of the most recent message.
    #[serde(default)]
    pub last_message: Option<String>,

    /// When the most recent message was sent.
    #[serde(default)]
    pub last_message_time: Option<Timestamp>,

    /// Messages from the counterpart not yet marked read.
    pub unread_count: u32,

    /// Whether the counterpart currently has a realtime connection.
    pub online: bool,

    /// The counterpart's role.
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidebar_row_deserialization() {
        let json = r#"{
            "otherUserId": 12,
            "otherUserName": "Priya Nair",
            "otherUserAvatar": "/avatars/12.png",
            "lastMessage": "See you at standup",
            "lastMessageTime": "2026-01-12T09:15:00Z",
            "unreadCount": 2,
            "online": true,
            "role": "employee"
        }"#;

        let summary: ConversationSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.other_user_id, 12);
        assert_eq!(summary.unread_count, 2);
        assert!(summary.online);
        assert_eq!(summary.role, UserRole::Employee);
    }

    #[test]
    fn test_sidebar_row_optional_fields_default() {
        let json = r#"{
            "otherUserId": 12,
            "otherUserName": "Priya Nair",
            "unreadCount": 0,
            "online": false,
            "role": "employee"
        }"#;

        let summary: ConversationSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.other_user_avatar, None);
        assert_eq!(summary.last_message, None);
        assert_eq!(summary.last_message_time, None);
    }
}
