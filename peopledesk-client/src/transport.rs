use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::config::Config;
use shared::models::ErrorResponse;
use url::Url;

use crate::credentials::{AuthEvent, CredentialStore};
use crate::error::ApiError;

/// Decoded body of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 2xx with an empty body.
    Empty,
    /// 2xx with a JSON content type and a parseable body.
    Json(Value),
    /// 2xx with a non-JSON content type, or a JSON body that failed to
    /// parse (tolerated, never an error).
    Text(String),
}

impl Payload {
    /// Decode the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            Self::Text(text) => Ok(serde_json::from_str(&text)?),
            Self::Empty => {
                use serde::de::Error as _;
                Err(ApiError::Decode(serde_json::Error::custom(
                    "response body was empty",
                )))
            }
        }
    }
}

/// Per-call knobs for [`ApiClient::call`].
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Extra headers, merged over the JSON defaults.
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<Value>,
    /// Leave the `Authorization` header off even when a credential is
    /// stored.
    pub skip_auth_header: bool,
    /// Run the global forced-logout side effect when the backend answers
    /// 401. Callers that own the decision themselves (the session monitor)
    /// turn this off and receive the 401 as an ordinary HTTP error.
    pub handle_unauthorized: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            body: None,
            skip_auth_header: false,
            handle_unauthorized: true,
        }
    }
}

impl CallOptions {
    /// The default policy: inject the credential, handle 401 globally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver 401 to the caller instead of forcing logout.
    #[must_use]
    pub fn handle_unauthorized_locally() -> Self {
        Self {
            handle_unauthorized: false,
            ..Self::default()
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Authenticated HTTP client for the PeopleDesk backend.
///
/// Cheap to clone; clones share the connection pool and the credential
/// store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    logout_url: Url,
    credentials: CredentialStore,
}

impl ApiClient {
    /// Build a client from configuration. The transport keeps reqwest's
    /// no-timeout default unless the configuration opts into one.
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(concat!(
            "peopledesk-client/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;
        let logout_url = config.logout_url()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            logout_url,
            credentials,
        })
    }

    /// The credential store this client injects from and clears into.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Resolve an endpoint path against the configured base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// The configured logout endpoint, exempt from forced logout on 401.
    #[must_use]
    pub fn logout_endpoint(&self) -> &Url {
        &self.logout_url
    }

    /// Issue a request and decode the response.
    ///
    /// Defaults: JSON content-type/accept headers, bearer injection when a
    /// credential is stored, and the global 401 side effect (credential
    /// cleared once, [`AuthEvent::ForcedLogout`] published) for every URL
    /// except the logout endpoint. Failures are logged before they are
    /// returned; they are never swallowed.
    pub async fn call(
        &self,
        method: Method,
        url: Url,
        options: CallOptions,
    ) -> Result<Payload, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &options.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => {
                    tracing::warn!(header = %name, "skipping malformed request header");
                }
            }
        }

        let mut request = self.http.request(method, url.clone()).headers(headers);
        if !options.skip_auth_header {
            if let Some(token) = self.credentials.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(url = %url, error = %err, "request failed before a response was obtained");
                return Err(ApiError::Transport(err));
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED
            && options.handle_unauthorized
            && url != self.logout_url
        {
            // Only the caller that actually takes the session out publishes
            // the event, so a burst of racing 401s forces logout once.
            if self.credentials.clear().is_some() {
                self.credentials.publish(AuthEvent::ForcedLogout);
            }
            tracing::error!(url = %url, "session rejected with 401; credential cleared");
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|parsed| parsed.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::error!(url = %url, status = %status, message = %message, "request rejected");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
                body,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(url = %url, error = %err, "failed to read response body");
                return Err(ApiError::Transport(err));
            }
        };

        if text.is_empty() {
            return Ok(Payload::Empty);
        }
        if content_type.starts_with("application/json") {
            // Unparseable JSON on a 2xx degrades to text; success is never
            // turned into a failure by the decoder.
            return Ok(serde_json::from_str(&text)
                .map(Payload::Json)
                .unwrap_or(Payload::Text(text)));
        }
        Ok(Payload::Text(text))
    }
}
