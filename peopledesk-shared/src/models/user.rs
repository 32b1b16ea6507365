use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Role assignments for a PeopleDesk account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Employee,
}

impl UserRole {
    /// Return the canonical string representation used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "employee" => Ok(Self::Employee),
            _ => Err("unknown user role"),
        }
    }
}

/// The locally authenticated user, as returned by the login endpoint and
/// cached beside the credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    /// Unique identifier for the user.
    pub id: i64,

    /// The user's login name.
    pub username: String,

    /// The user's email address.
    pub email: String,

    /// The user's role.
    pub role: UserRole,
}

/// Request body for the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// The user's email address.
    pub email: String,

    /// The user's password.
    pub password: String,
}

/// Response body from the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// The bearer token for the new session.
    pub token: String,

    /// The authenticated user's profile.
    pub user: AuthenticatedUser,
}

/// Response from the mark-conversation-read endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkReadResponse {
    /// Number of messages whose unread flag was cleared.
    pub updated: u64,
}
