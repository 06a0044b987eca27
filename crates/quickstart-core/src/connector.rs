use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::config::{CONNECTOR_LOG_LEVELS, REMOTE_PARTICIPANTS};
use crate::errors::QuickstartError;
use crate::events::{EventEmitter, RoomEvent, RoomEventSender, SdkError, room_event_channel};
use crate::room_info::RoomInfo;
use crate::session::{RoomSession, ViewState};
use crate::settings::ConnectOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewStyle {
    #[default]
    Default,
    Tiles,
}

/// Parameters used once when the vendor connector is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub view_style: ViewStyle,
    pub remote_participants: u32,
    pub log_levels: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            view_style: ViewStyle::Default,
            remote_participants: REMOTE_PARTICIPANTS,
            log_levels: CONNECTOR_LOG_LEVELS.to_string(),
        }
    }
}

/// How to join a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// Token-authenticated join.
    Token {
        access_token: String,
        options: ConnectOptions,
    },
    /// Guest join with a room descriptor.
    Room(RoomInfo),
}

impl ConnectTarget {
    pub fn room_name(&self) -> &str {
        match self {
            Self::Token { options, .. } => &options.room_name,
            Self::Room(info) => &info.name,
        }
    }
}

/// Seam to the vendor video SDK.
///
/// Implementations forward every SDK callback into `events` as a
/// [`RoomEvent`]. `connect` returns once the join has been started, not
/// when it completes.
pub trait VideoConnector: Send + Sync {
    fn init(&self, config: &ConnectorConfig) -> Result<(), QuickstartError>;
    fn connect(&self, target: ConnectTarget, events: RoomEventSender) -> Result<(), QuickstartError>;
    fn disconnect(&self);
    fn set_microphone_enabled(&self, enabled: bool) -> Result<(), QuickstartError>;
    fn set_camera_enabled(&self, enabled: bool) -> Result<(), QuickstartError>;
    fn shutdown(&self);
}

/// Terminal callbacks of a guest join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Success,
    Failure(String),
    Disconnected(String),
}

impl ConnectOutcome {
    pub fn into_room_event(self, room_name: &str) -> RoomEvent {
        let room_name = room_name.to_string();
        match self {
            Self::Success => RoomEvent::Connected {
                room_name,
                participants: Vec::new(),
            },
            Self::Failure(reason) => RoomEvent::ConnectFailure {
                room_name,
                error: SdkError { code: 0, message: reason },
            },
            Self::Disconnected(reason) => RoomEvent::Disconnected {
                room_name,
                error: Some(SdkError { code: 0, message: reason }),
            },
        }
    }
}

/// Owns an initialized connector and the session loop fed by it.
///
/// Created with [`ConnectorHandle::init`] and torn down with
/// [`ConnectorHandle::shutdown`]. Must be created inside a tokio runtime.
pub struct ConnectorHandle {
    connector: Arc<dyn VideoConnector>,
    session: Arc<Mutex<RoomSession>>,
    view: watch::Receiver<ViewState>,
    events: RoomEventSender,
    loop_task: JoinHandle<()>,
    active: AtomicBool,
}

impl ConnectorHandle {
    pub fn init(
        connector: Arc<dyn VideoConnector>,
        config: &ConnectorConfig,
        emitter: EventEmitter,
    ) -> Result<Self, QuickstartError> {
        tracing::info!(
            "initializing connector: style={:?} remote_participants={} log_levels='{}'",
            config.view_style,
            config.remote_participants,
            config.log_levels
        );
        connector.init(config)?;

        let session = RoomSession::new(emitter);
        let view = session.watch_state();
        let session = Arc::new(Mutex::new(session));
        let (events, receiver) = room_event_channel();
        let loop_task = RoomSession::spawn(session.clone(), receiver);

        Ok(Self {
            connector,
            session,
            view,
            events,
            loop_task,
            active: AtomicBool::new(true),
        })
    }

    /// Sender for SDK callbacks that arrive outside of `connect`.
    pub fn event_sender(&self) -> RoomEventSender {
        self.events.clone()
    }

    /// Snapshot of the presentation state. Never waits on the session, so
    /// listeners may call it from inside a callback.
    pub fn view_state(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn watch_view_state(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Join with an access token from the token endpoint.
    ///
    /// Returns once the connector has started the join; progress arrives as
    /// room events.
    pub async fn connect_with_token(
        &self,
        access_token: &str,
        options: ConnectOptions,
    ) -> Result<(), QuickstartError> {
        self.connect(ConnectTarget::Token {
            access_token: access_token.to_string(),
            options,
        })
        .await
    }

    /// Guest join using an auto-connect room descriptor.
    pub async fn connect_to_room(&self, room: RoomInfo) -> Result<(), QuickstartError> {
        self.connect(ConnectTarget::Room(room)).await
    }

    async fn connect(&self, target: ConnectTarget) -> Result<(), QuickstartError> {
        self.ensure_active()?;
        let room_name = target.room_name().to_string();
        tracing::info!("connecting to room {room_name}");

        RoomSession::apply(&self.session, |s| s.begin_connect(&room_name)).await;

        if let Err(e) = self.connector.connect(target, self.events.clone()) {
            tracing::error!("connector refused to connect to {room_name}: {e}");
            let failure = RoomEvent::ConnectFailure {
                room_name,
                error: SdkError { code: -1, message: e.to_string() },
            };
            RoomSession::apply(&self.session, |s| s.handle_event(failure)).await;
            return Err(e);
        }
        Ok(())
    }

    /// Leave the room. The SDK reports completion with a `Disconnected` event.
    pub fn disconnect(&self) {
        if self.is_active() {
            self.connector.disconnect();
        }
    }

    pub async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), QuickstartError> {
        self.ensure_active()?;
        self.connector.set_microphone_enabled(enabled)?;
        RoomSession::apply(&self.session, |s| s.set_microphone_enabled(enabled)).await;
        Ok(())
    }

    pub async fn set_camera_enabled(&self, enabled: bool) -> Result<(), QuickstartError> {
        self.ensure_active()?;
        self.connector.set_camera_enabled(enabled)?;
        RoomSession::apply(&self.session, |s| s.set_camera_enabled(enabled)).await;
        Ok(())
    }

    /// Disconnect and release the SDK. Safe to call more than once.
    pub async fn shutdown(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("shutting down connector");
        RoomSession::apply(&self.session, |s| s.set_tearing_down(true)).await;
        self.connector.disconnect();
        self.connector.shutdown();
    }

    fn ensure_active(&self) -> Result<(), QuickstartError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(QuickstartError::Connector("connector has been shut down".to_string()))
        }
    }
}

impl Drop for ConnectorHandle {
    fn drop(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.connector.disconnect();
            self.connector.shutdown();
        }
        self.loop_task.abort();
    }
}
