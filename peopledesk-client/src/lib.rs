#![cfg_attr(not(test), forbid(unsafe_code))]

//! PeopleDesk client core: the authenticated HTTP transport, the session
//! monitor, the realtime chat channel, and the process-wide stores the UI
//! reads through.
//!
//! Everything here is injected rather than ambient: construct a
//! [`CredentialStore`], hand it to an [`ApiClient`], and wire the
//! [`RealtimeChannel`] into the [`ChatStore`] once it is open. Page/view
//! code stays a consumer of these pieces and never the other way around.

pub mod api;
pub mod credentials;
pub mod error;
pub mod monitor;
pub mod realtime;
pub mod store;
pub mod transport;

pub use credentials::{AuthEvent, CredentialStore, Session};
pub use error::ApiError;
pub use monitor::{MonitorOptions, SessionMonitor};
pub use realtime::{ChannelError, ChannelOptions, ChannelState, RealtimeChannel};
pub use store::chat::{ChatSendError, ChatStore};
pub use store::notifications::NotificationStore;
pub use transport::{ApiClient, CallOptions, Payload};
