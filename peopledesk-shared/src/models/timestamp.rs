use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 3339 timestamp as delivered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);
