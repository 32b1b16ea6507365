use thiserror::Error;

/// Failures surfaced by [`crate::ApiClient`] calls.
///
/// The variants mirror the ways a request can go wrong: the network failed
/// before a response arrived, the backend said no, the session died, or a
/// successful payload did not match the expected shape. "No content" is not
/// an error; see [`crate::Payload::Empty`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure before a response was obtained. Propagated from the
    /// transport unchanged; retrying is the caller's decision.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the request with a non-2xx status.
    #[error("{message} (status {status})")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// Human-readable message, extracted from the body when possible.
        message: String,
        /// The raw response body.
        body: String,
    },

    /// A 401 cleared the credential and forced logout; the request was not
    /// retried.
    #[error("session expired")]
    SessionExpired,

    /// A successful payload did not decode into the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// A path could not be joined onto the configured base URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The HTTP status attached to this error, when one exists.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Whether the backend answered 401 for this request.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_carries_message_and_status() {
        let error = ApiError::Http {
            status: 400,
            message: "Invalid input".to_string(),
            body: r#"{"message":"Invalid input"}"#.to_string(),
        };

        assert_eq!(error.to_string(), "Invalid input (status 400)");
        assert_eq!(error.status(), Some(400));
        assert!(!error.is_unauthorized());
    }

    #[test]
    fn test_session_expired_is_unauthorized() {
        assert!(ApiError::SessionExpired.is_unauthorized());
    }
}
