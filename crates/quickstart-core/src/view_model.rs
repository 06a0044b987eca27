use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::{TokenOutcome, TokenService};
use crate::config::NetworkConfig;
use crate::errors::QuickstartError;
use crate::events::{EventEmitter, QuickstartEvent};
use crate::room_info::{AutoConnectService, RoomInfo};

/// Runs backend fetches off the caller's thread and publishes the latest
/// result to watchers and listeners.
///
/// Each fetch is a single request. Dropping the view model aborts any fetch
/// still in flight.
pub struct VideoViewModel {
    tokens: TokenService,
    rooms: AutoConnectService,
    emitter: EventEmitter,
    token_tx: Arc<watch::Sender<Option<TokenOutcome>>>,
    room_info_tx: Arc<watch::Sender<Option<RoomInfo>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl VideoViewModel {
    pub fn new(config: NetworkConfig, emitter: EventEmitter) -> Result<Self, QuickstartError> {
        let rooms = AutoConnectService::new(&config)?;
        let tokens = TokenService::new(config)?;
        let (token_tx, _) = watch::channel(None);
        let (room_info_tx, _) = watch::channel(None);
        Ok(Self {
            tokens,
            rooms,
            emitter,
            token_tx: Arc::new(token_tx),
            room_info_tx: Arc::new(room_info_tx),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Token client used by [`get_token`](Self::get_token), for callers that
    /// need a blocking fetch.
    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }

    pub fn auto_connect_service(&self) -> &AutoConnectService {
        &self.rooms
    }

    pub fn tokens(&self) -> watch::Receiver<Option<TokenOutcome>> {
        self.token_tx.subscribe()
    }

    /// A failed fetch publishes `None`.
    pub fn room_info(&self) -> watch::Receiver<Option<RoomInfo>> {
        self.room_info_tx.subscribe()
    }

    pub fn get_token(&self, identity: Option<String>, room_name: Option<String>, passcode: String) {
        tracing::debug!("get_token identity={identity:?} room={room_name:?}");
        let tokens = self.tokens.clone();
        let emitter = self.emitter.clone();
        let tx = self.token_tx.clone();

        self.track(tokio::spawn(async move {
            let outcome = tokens
                .fetch_token(identity.as_deref(), room_name.as_deref(), &passcode)
                .await;
            let event = match &outcome {
                TokenOutcome::Token(info) => QuickstartEvent::TokenReceived(info.clone()),
                TokenOutcome::Failure { kind, detail } => QuickstartEvent::TokenFailed {
                    kind: *kind,
                    detail: detail.clone(),
                },
            };
            emitter.emit(event);
            tx.send_replace(Some(outcome));
        }));
    }

    pub fn get_auto_connect_room_info(&self, room_name: String) {
        tracing::debug!("get_auto_connect_room_info room={room_name}");
        let rooms = self.rooms.clone();
        let emitter = self.emitter.clone();
        let tx = self.room_info_tx.clone();

        self.track(tokio::spawn(async move {
            match rooms.fetch_room_info(&room_name).await {
                Ok(info) => {
                    emitter.emit(QuickstartEvent::RoomInfoReceived(info.clone()));
                    tx.send_replace(Some(info));
                }
                Err(e) => {
                    tracing::error!("room info fetch failed: {e}");
                    emitter.emit(QuickstartEvent::RoomInfoFailed(e.to_string()));
                    tx.send_replace(None);
                }
            }
        }));
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }
}

impl Drop for VideoViewModel {
    fn drop(&mut self) {
        let tasks = match self.tasks.get_mut() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FailureKind;
    use crate::events::tests::EventCapture;
    use httpmock::prelude::*;
    use serde_json::json;

    fn view_model_for(server: &MockServer) -> (VideoViewModel, Arc<EventCapture>) {
        let config = NetworkConfig {
            url_prefix: server.url("/video-app-"),
            url_suffix: "/token".to_string(),
            auto_connect_url: server.url("/autoconnect"),
            ..NetworkConfig::default()
        };
        let emitter = EventEmitter::new();
        let capture = Arc::new(EventCapture::default());
        emitter.add_listener(capture.clone());
        (VideoViewModel::new(config, emitter).unwrap(), capture)
    }

    #[tokio::test]
    async fn token_is_published_to_watchers_and_listeners() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/video-app-8714-06554/token");
                then.status(200).json_body(json!({ "token": "jwt-abc" }));
            })
            .await;

        let (vm, capture) = view_model_for(&server);
        let mut tokens = vm.tokens();
        vm.get_token(Some("jain".into()), Some("Wed10Jan".into()), "21269871406554".into());

        tokens.changed().await.unwrap();
        let outcome = tokens.borrow_and_update().clone().unwrap();
        assert_eq!(outcome.token(), Some("jwt-abc"));

        let events = capture.events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(e, QuickstartEvent::TokenReceived(info) if info.token == "jwt-abc")));
    }

    #[tokio::test]
    async fn token_failure_is_a_failure_event() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500).body("boom");
            })
            .await;

        let (vm, capture) = view_model_for(&server);
        let mut tokens = vm.tokens();
        vm.get_token(None, None, "21269871406554".into());

        tokens.changed().await.unwrap();
        assert!(tokens.borrow().as_ref().unwrap().token().is_none());

        let events = capture.events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            QuickstartEvent::TokenFailed { kind: FailureKind::Status(500), .. }
        )));
    }

    #[tokio::test]
    async fn room_info_is_published() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/autoconnect");
                then.status(200).json_body(json!({
                    "roomUrl": "https://host.example.com/abc123",
                    "pin": "",
                    "extension": "",
                    "inviteContent": "",
                }));
            })
            .await;

        let (vm, _) = view_model_for(&server);
        let mut rooms = vm.room_info();
        vm.get_auto_connect_room_info("standup".into());

        rooms.changed().await.unwrap();
        let info = rooms.borrow().clone().unwrap();
        assert_eq!(info.portal, "host.example.com");
        assert_eq!(info.room_key, "abc123");
        assert_eq!(info.name, "standup");
    }

    #[tokio::test]
    async fn room_info_failure_publishes_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/autoconnect");
                then.status(404);
            })
            .await;

        let (vm, capture) = view_model_for(&server);
        let mut rooms = vm.room_info();
        vm.get_auto_connect_room_info("standup".into());

        rooms.changed().await.unwrap();
        assert!(rooms.borrow().is_none());
        assert!(capture
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, QuickstartEvent::RoomInfoFailed(_))));
    }
}
