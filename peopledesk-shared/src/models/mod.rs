pub mod conversation;
pub mod errors;
pub mod message;
pub mod notifications;
pub mod timestamp;
pub mod user;

pub use conversation::ConversationSummary;
pub use errors::ErrorResponse;
pub use message::ChatMessage;
pub use notifications::{NotificationCategory, NotificationCounts};
pub use timestamp::Timestamp;
pub use user::{AuthenticatedUser, LoginRequest, LoginResponse, MarkReadResponse, UserRole};
