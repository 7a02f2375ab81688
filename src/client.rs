//! Thin HTTP send path for the FCM v1 API.
//!
//! Deliberately small and swappable: validate, wrap the encoded message in
//! the outer `{"message": ...}` object, POST once, interpret the status and
//! the `{"name": ...}` response. Token acquisition, retries and pooling are
//! out of scope; callers supply a ready OAuth2 access token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ClientError;
use crate::message::Message;
use crate::validate::validate;

pub const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/v1";

/// Configuration for [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub project_id: String,
    /// Base API endpoint; [`DEFAULT_ENDPOINT`] when empty.
    pub endpoint: String,
    /// A ready OAuth2 bearer token for the Firebase scopes.
    pub access_token: String,
}

/// Send seam for callers that want to mock delivery in tests.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Validates and sends one message, returning the server-assigned
    /// message name on success.
    async fn send(&self, message: &Message) -> Result<String, ClientError>;
}

/// Client for the Firebase Cloud Messaging v1 send endpoint.
pub struct Client {
    http: reqwest::Client,
    send_url: String,
    access_token: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a Message,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.project_id.is_empty() {
            return Err(ClientError::MissingProjectId);
        }
        if config.access_token.is_empty() {
            return Err(ClientError::MissingAccessToken);
        }

        let endpoint = if config.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            config.endpoint.trim_end_matches('/')
        };

        Ok(Client {
            http: reqwest::Client::new(),
            send_url: format!("{endpoint}/projects/{}/messages:send", config.project_id),
            access_token: config.access_token,
        })
    }
}

#[async_trait]
impl PushSender for Client {
    async fn send(&self, message: &Message) -> Result<String, ClientError> {
        validate(message)?;

        tracing::debug!(url = %self.send_url, "sending FCM message");
        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(&self.access_token)
            .json(&SendRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let detail = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => format!("{} {}", envelope.error.status, envelope.error.message),
                Err(_) => body,
            };
            tracing::error!(status = status.as_u16(), %detail, "FCM send failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: detail,
            });
        }

        let parsed: SendResponse =
            serde_json::from_str(&body).map_err(ClientError::ResponseParse)?;
        tracing::debug!(name = %parsed.name, "FCM send succeeded");
        Ok(parsed.name)
    }
}
