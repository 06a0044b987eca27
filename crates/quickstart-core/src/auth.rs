use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::errors::QuickstartError;
use crate::passcode::Passcode;

/// Body of the token endpoint request.
///
/// `create_room` is set only when a room name is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    pub passcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    pub create_room: bool,
}

impl TokenRequest {
    pub fn new(passcode: &Passcode, identity: Option<&str>, room_name: Option<&str>) -> Self {
        Self {
            passcode: passcode.as_str().to_string(),
            user_identity: identity.map(str::to_string),
            room_name: room_name.map(str::to_string),
            create_room: room_name.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Access token plus the request parameters it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// JWT access token
    pub token: String,
    /// Identity sent as `user_identity`, if any.
    pub identity: Option<String>,
    /// Room the token was requested for, if any.
    pub room_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidPasscode,
    Transport,
    Status(u16),
    Decode,
    MissingToken,
}

impl From<&QuickstartError> for FailureKind {
    fn from(e: &QuickstartError) -> Self {
        match e {
            QuickstartError::InvalidPasscode(_) => Self::InvalidPasscode,
            QuickstartError::Status { code, .. } => Self::Status(*code),
            QuickstartError::Decode(_) => Self::Decode,
            QuickstartError::MissingToken => Self::MissingToken,
            QuickstartError::Http(_)
            | QuickstartError::InvalidUrl(_)
            | QuickstartError::Connector(_) => Self::Transport,
        }
    }
}

/// Result of a token fetch. Failures never masquerade as tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Token(TokenInfo),
    Failure { kind: FailureKind, detail: String },
}

impl TokenOutcome {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token(info) => Some(&info.token),
            Self::Failure { .. } => None,
        }
    }
}

impl From<Result<TokenInfo, QuickstartError>> for TokenOutcome {
    fn from(result: Result<TokenInfo, QuickstartError>) -> Self {
        match result {
            Ok(info) => Self::Token(info),
            Err(e) => Self::Failure {
                kind: FailureKind::from(&e),
                detail: e.to_string(),
            },
        }
    }
}

/// Random identity for callers that do not supply one.
pub fn random_identity() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fetches access tokens from the passcode-addressed token endpoint.
#[derive(Debug, Clone)]
pub struct TokenService {
    client: reqwest::Client,
    config: NetworkConfig,
}

impl TokenService {
    pub fn new(config: NetworkConfig) -> Result<Self, QuickstartError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// POST the token request once. No retry.
    ///
    /// `passcode` selects the endpoint (see [`Passcode::token_url`]) and is
    /// sent in the body. `identity` and `room_name` are omitted from the body
    /// when `None`; supplying a room name asks the server to create it.
    pub async fn request_token(
        &self,
        identity: Option<&str>,
        room_name: Option<&str>,
        passcode: &str,
    ) -> Result<TokenInfo, QuickstartError> {
        let passcode = Passcode::parse(passcode)?;
        let url = passcode.token_url(&self.config);
        let body = TokenRequest::new(&passcode, identity, room_name);

        tracing::info!(
            "requesting token: url={url} room={room_name:?} create_room={}",
            body.create_room
        );

        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!("token endpoint returned {status}: {message}");
            return Err(QuickstartError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let data: TokenResponse = resp
            .json()
            .await
            .map_err(|e| QuickstartError::Decode(e.to_string()))?;

        let token = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or(QuickstartError::MissingToken)?;

        tracing::debug!("token received ({} bytes)", token.len());

        Ok(TokenInfo {
            token,
            identity: body.user_identity,
            room_name: body.room_name,
        })
    }

    /// Like [`request_token`](Self::request_token) but never fails.
    pub async fn fetch_token(
        &self,
        identity: Option<&str>,
        room_name: Option<&str>,
        passcode: &str,
    ) -> TokenOutcome {
        let result = self.request_token(identity, room_name, passcode).await;
        if let Err(e) = &result {
            tracing::error!("token fetch failed: {e}");
        }
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn service_for(server: &MockServer) -> TokenService {
        let config = NetworkConfig {
            url_prefix: server.url("/video-app-"),
            url_suffix: "/token".to_string(),
            ..NetworkConfig::default()
        };
        TokenService::new(config).unwrap()
    }

    #[test]
    fn request_with_room_name_creates_room() {
        let passcode = Passcode::parse("21269871406554").unwrap();
        let req = TokenRequest::new(&passcode, Some("jain"), Some("Wed10Jan"));
        assert!(req.create_room);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "passcode": "21269871406554",
                "user_identity": "jain",
                "room_name": "Wed10Jan",
                "create_room": true,
            })
        );
    }

    #[test]
    fn request_without_room_name_omits_it() {
        let passcode = Passcode::parse("21269871406554").unwrap();
        let req = TokenRequest::new(&passcode, None, None);
        assert!(!req.create_room);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "passcode": "21269871406554", "create_room": false })
        );
    }

    #[test]
    fn random_identities_differ() {
        assert_ne!(random_identity(), random_identity());
    }

    #[tokio::test]
    async fn fetches_token_from_derived_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/video-app-8714-06554/token")
                    .json_body(json!({
                        "passcode": "21269871406554",
                        "user_identity": "jain",
                        "room_name": "Wed10Jan",
                        "create_room": true,
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "token": "jwt-abc" }));
            })
            .await;

        let service = service_for(&server);
        let info = service
            .request_token(Some("jain"), Some("Wed10Jan"), "21269871406554")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(info.token, "jwt-abc");
        assert_eq!(info.identity.as_deref(), Some("jain"));
        assert_eq!(info.room_name.as_deref(), Some("Wed10Jan"));
    }

    #[tokio::test]
    async fn legacy_passcode_hits_app_only_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/video-app-8714/token");
                then.status(200).json_body(json!({ "token": "legacy" }));
            })
            .await;

        let outcome = service_for(&server)
            .fetch_token(None, None, "2126987140")
            .await;

        mock.assert_async().await;
        assert_eq!(outcome.token(), Some("legacy"));
    }

    #[tokio::test]
    async fn http_error_becomes_failure_not_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(401).body("passcode incorrect");
            })
            .await;

        let outcome = service_for(&server)
            .fetch_token(Some("jain"), None, "21269871406554")
            .await;

        match outcome {
            TokenOutcome::Failure { kind, detail } => {
                assert_eq!(kind, FailureKind::Status(401));
                assert!(detail.contains("passcode incorrect"));
            }
            TokenOutcome::Token(_) => panic!("error text must not be returned as a token"),
        }
    }

    #[tokio::test]
    async fn null_token_is_missing_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({ "token": null }));
            })
            .await;

        let outcome = service_for(&server)
            .fetch_token(None, None, "21269871406554")
            .await;

        assert!(matches!(
            outcome,
            TokenOutcome::Failure { kind: FailureKind::MissingToken, .. }
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let outcome = service_for(&server)
            .fetch_token(None, None, "21269871406554")
            .await;

        assert!(matches!(
            outcome,
            TokenOutcome::Failure { kind: FailureKind::Decode, .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_failure() {
        let config = NetworkConfig {
            url_prefix: "http://127.0.0.1:1/video-app-".to_string(),
            url_suffix: "/token".to_string(),
            ..NetworkConfig::default()
        };
        let outcome = TokenService::new(config)
            .unwrap()
            .fetch_token(None, None, "21269871406554")
            .await;

        assert!(matches!(
            outcome,
            TokenOutcome::Failure { kind: FailureKind::Transport, .. }
        ));
    }

    #[tokio::test]
    async fn short_passcode_fails_before_any_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({ "token": "x" }));
            })
            .await;

        let outcome = service_for(&server).fetch_token(None, None, "12345").await;

        assert_eq!(mock.hits_async().await, 0);
        assert!(matches!(
            outcome,
            TokenOutcome::Failure { kind: FailureKind::InvalidPasscode, .. }
        ));
    }
}
