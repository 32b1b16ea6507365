use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The fixed set of notification categories the backend counts unread
/// items for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Messages,
    Courses,
    Evaluations,
    Announcements,
}

impl NotificationCategory {
    /// All categories, in sidebar display order.
    pub const ALL: [Self; 4] = [
        Self::Messages,
        Self::Courses,
        Self::Evaluations,
        Self::Announcements,
    ];

    /// Return the canonical string representation used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Courses => "courses",
            Self::Evaluations => "evaluations",
            Self::Announcements => "announcements",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "messages" => Ok(Self::Messages),
            "courses" => Ok(Self::Courses),
            "evaluations" => Ok(Self::Evaluations),
            "announcements" => Ok(Self::Announcements),
            _ => Err("unknown notification category"),
        }
    }
}

/// Unread counts per category, as returned by the fetch-all-counts
/// endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationCounts {
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub courses: u64,
    #[serde(default)]
    pub evaluations: u64,
    #[serde(default)]
    pub announcements: u64,
}

impl NotificationCounts {
    /// The unread count for one category.
    #[must_use]
    pub fn get(&self, category: NotificationCategory) -> u64 {
        match category {
            NotificationCategory::Messages => self.messages,
            NotificationCategory::Courses => self.courses,
            NotificationCategory::Evaluations => self.evaluations,
            NotificationCategory::Announcements => self.announcements,
        }
    }

    /// Unread items across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        NotificationCategory::ALL
            .iter()
            .map(|category| self.get(*category))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in NotificationCategory::ALL {
            assert_eq!(
                NotificationCategory::from_str(category.as_str()).unwrap(),
                category
            );
            assert_eq!(category.to_string(), category.as_str());
        }
    }

    #[test]
    fn test_category_invalid() {
        assert!(NotificationCategory::from_str("payroll").is_err());
    }

    #[test]
    fn test_counts_deserialization_with_missing_fields() {
        let counts: NotificationCounts =
            serde_json::from_str(r#"{"messages": 4, "courses": 1}"#).unwrap();

        assert_eq!(counts.messages, 4);
        assert_eq!(counts.evaluations, 0);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_counts_get() {
        let counts = NotificationCounts {
            messages: 2,
            courses: 0,
            evaluations: 7,
            announcements: 1,
        };

        assert_eq!(counts.get(NotificationCategory::Evaluations), 7);
        assert_eq!(counts.total(), 10);
    }
}
