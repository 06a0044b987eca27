use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::NetworkConfig;
use crate::errors::QuickstartError;

/// Response from the auto-connect endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoConnectResponse {
    /// Full guest link, e.g. `https://portal.example.com/join/K3y`.
    pub room_url: String,
    pub pin: String,
    pub extension: String,
    pub invite_content: String,
}

/// Connection parameters for a guest join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomInfo {
    /// Authority of `room_url` as written, e.g. `Portal.example.com:443`.
    pub portal: String,
    /// Display name the room was requested under.
    pub name: String,
    /// Last path segment of `room_url`, percent-decoded.
    pub room_key: String,
    pub room_pin: String,
    pub room_url: String,
    pub extension: String,
    pub invite_content: String,
}

impl RoomInfo {
    /// Split `room_url` into portal (authority) and room key (last path segment).
    pub fn from_response(resp: AutoConnectResponse, room_name: &str) -> Self {
        let (portal, room_key) = match Url::parse(&resp.room_url) {
            Ok(url) => (authority(&resp.room_url), last_path_segment(&url)),
            Err(e) => {
                tracing::warn!("unparsable room url '{}': {e}", resp.room_url);
                (String::new(), String::new())
            }
        };

        Self {
            portal,
            name: room_name.to_string(),
            room_key,
            room_pin: resp.pin,
            room_url: resp.room_url,
            extension: resp.extension,
            invite_content: resp.invite_content,
        }
    }
}

// Taken from the raw text: `Url` lowercases the host and drops default ports.
fn authority(raw: &str) -> String {
    let Some((_, rest)) = raw.split_once("://") else {
        return String::new();
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    decode(&rest[..end])
}

fn last_path_segment(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(decode)
        .unwrap_or_default()
}

fn decode(component: &str) -> String {
    match urlencoding::decode(component) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(component.as_bytes())).into_owned(),
    }
}

/// Fetches the auto-connect room descriptor from the fixed endpoint.
#[derive(Debug, Clone)]
pub struct AutoConnectService {
    client: reqwest::Client,
    url: String,
}

impl AutoConnectService {
    pub fn new(config: &NetworkConfig) -> Result<Self, QuickstartError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.auto_connect_url.clone(),
        })
    }

    /// POST once to the auto-connect endpoint and attach `room_name`.
    pub async fn fetch_room_info(&self, room_name: &str) -> Result<RoomInfo, QuickstartError> {
        tracing::info!("requesting room info: url={} room={room_name}", self.url);

        let resp = self.client.post(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(QuickstartError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let data: AutoConnectResponse = resp
            .json()
            .await
            .map_err(|e| QuickstartError::Decode(e.to_string()))?;
        tracing::debug!("room info response: {data:?}");

        Ok(RoomInfo::from_response(data, room_name))
    }

    /// `None` on any failure.
    pub async fn fetch_room_info_opt(&self, room_name: &str) -> Option<RoomInfo> {
        match self.fetch_room_info(room_name).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::error!("room info fetch failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn response(room_url: &str) -> AutoConnectResponse {
        AutoConnectResponse {
            room_url: room_url.to_string(),
            pin: "1234".to_string(),
            extension: "99".to_string(),
            invite_content: "join me".to_string(),
        }
    }

    #[test]
    fn maps_portal_and_key() {
        let info = RoomInfo::from_response(response("https://host.example.com/abc123"), "demo");
        assert_eq!(info.portal, "host.example.com");
        assert_eq!(info.room_key, "abc123");
        assert_eq!(info.name, "demo");
        assert_eq!(info.room_pin, "1234");
        assert_eq!(info.extension, "99");
        assert_eq!(info.invite_content, "join me");
        assert_eq!(info.room_url, "https://host.example.com/abc123");
    }

    #[test]
    fn explicit_port_is_part_of_portal() {
        let info = RoomInfo::from_response(response("https://host.example.com:8443/join/xyz/"), "r");
        assert_eq!(info.portal, "host.example.com:8443");
        assert_eq!(info.room_key, "xyz");
    }

    #[test]
    fn portal_keeps_host_case_and_default_port() {
        let info = RoomInfo::from_response(response("https://Host.Example.com:443/join/room%20K3y"), "r");
        assert_eq!(info.portal, "Host.Example.com:443");
        assert_eq!(info.room_key, "room K3y");
    }

    #[test]
    fn portal_keeps_userinfo_and_ignores_query() {
        let info = RoomInfo::from_response(response("https://guest@portal.example.com/r/K%C3%A9y?pin=1#top"), "r");
        assert_eq!(info.portal, "guest@portal.example.com");
        assert_eq!(info.room_key, "Kéy");
    }

    #[test]
    fn unparsable_url_gives_empty_fields() {
        let info = RoomInfo::from_response(response("not a url"), "r");
        assert_eq!(info.portal, "");
        assert_eq!(info.room_key, "");
        assert_eq!(info.room_url, "not a url");
    }

    #[test]
    fn response_fields_default_when_missing() {
        let resp: AutoConnectResponse =
            serde_json::from_value(json!({ "roomUrl": "https://h/k" })).unwrap();
        assert_eq!(resp.room_url, "https://h/k");
        assert_eq!(resp.pin, "");
        assert_eq!(resp.invite_content, "");
    }

    fn service_for(server: &MockServer) -> AutoConnectService {
        let config = NetworkConfig {
            auto_connect_url: server.url("/autoconnect"),
            ..NetworkConfig::default()
        };
        AutoConnectService::new(&config).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_maps_room_info() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/autoconnect")
                    .body("")
                    .header_missing("content-type");
                then.status(200).json_body(json!({
                    "roomUrl": "https://vidyo.example.com/room/K3y",
                    "pin": "4321",
                    "extension": "7",
                    "inviteContent": "invite",
                }));
            })
            .await;

        let info = service_for(&server).fetch_room_info("standup").await.unwrap();

        mock.assert_async().await;
        assert_eq!(info.portal, "vidyo.example.com");
        assert_eq!(info.room_key, "K3y");
        assert_eq!(info.room_pin, "4321");
        assert_eq!(info.name, "standup");
    }

    #[tokio::test]
    async fn http_error_yields_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/autoconnect");
                then.status(503).body("down");
            })
            .await;

        let service = service_for(&server);
        assert!(service.fetch_room_info_opt("standup").await.is_none());
        assert!(matches!(
            service.fetch_room_info("standup").await,
            Err(QuickstartError::Status { code: 503, .. })
        ));
    }
}
