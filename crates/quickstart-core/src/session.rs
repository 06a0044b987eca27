use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::events::{
    EventEmitter, QuickstartEvent, RemoteParticipant, RoomEvent, RoomEventReceiver, TrackKind,
    TrackPublication,
};
use crate::participants::ParticipantRoster;

pub const MULTIPLE_PARTICIPANTS_NOTICE: &str =
    "Multiple participants are not currently supported in this UI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

/// What the primary video view is rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VideoSlot {
    #[default]
    Local,
    Remote {
        participant_identity: String,
        track_sid: String,
    },
    Empty,
}

/// Everything the native UI needs to draw the call screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub connection: ConnectionState,
    /// Room being joined or joined; cleared on failure and disconnect.
    pub room_name: Option<String>,
    /// Toolbar title, set once connected.
    pub title: Option<String>,
    /// Last status line (e.g. "Connected to lobby").
    pub status_text: String,
    /// Reconnecting progress indicator.
    pub reconnecting: bool,
    pub primary: VideoSlot,
    /// Local video moved to the thumbnail view.
    pub thumbnail_visible: bool,
    /// Identity of the one remote participant the view renders.
    pub featured_participant: Option<String>,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Idle,
            room_name: None,
            title: None,
            status_text: String::new(),
            reconnecting: false,
            primary: VideoSlot::Local,
            thumbnail_visible: false,
            featured_participant: None,
            microphone_enabled: true,
            camera_enabled: true,
        }
    }
}

/// Applies SDK events to the view state.
///
/// Only one remote participant is featured at a time; the rest are kept in
/// the roster but not rendered.
///
/// Mutations queue their `QuickstartEvent`s instead of emitting them, so
/// listeners never run while the session is borrowed. A session shared
/// behind a lock is driven through [`RoomSession::apply`], which delivers
/// the queue after releasing the lock.
pub struct RoomSession {
    state: ViewState,
    roster: ParticipantRoster,
    emitter: EventEmitter,
    pending: Vec<QuickstartEvent>,
    published: watch::Sender<ViewState>,
    tearing_down: bool,
}

impl RoomSession {
    pub fn new(emitter: EventEmitter) -> Self {
        let (published, _) = watch::channel(ViewState::default());
        Self {
            state: ViewState::default(),
            roster: ParticipantRoster::new(),
            emitter,
            pending: Vec::new(),
            published,
            tearing_down: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Latest view state, readable without taking the session lock.
    pub fn watch_state(&self) -> watch::Receiver<ViewState> {
        self.published.subscribe()
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    /// Events queued since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<QuickstartEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Run `f` on the locked session, then emit what it queued with the
    /// lock released.
    pub async fn apply<R>(session: &Mutex<RoomSession>, f: impl FnOnce(&mut RoomSession) -> R) -> R {
        let (result, events, emitter) = {
            let mut guard = session.lock().await;
            let result = f(&mut guard);
            (result, guard.take_events(), guard.emitter.clone())
        };
        for event in events {
            emitter.emit(event);
        }
        result
    }

    pub fn roster(&self) -> &ParticipantRoster {
        &self.roster
    }

    /// Disconnects seen after this keep the current layout.
    pub fn set_tearing_down(&mut self, tearing_down: bool) {
        self.tearing_down = tearing_down;
    }

    pub fn begin_connect(&mut self, room_name: &str) {
        self.update(|s| {
            s.connection = ConnectionState::Connecting;
            s.room_name = Some(room_name.to_string());
            s.status_text = format!("Connecting to {room_name}");
        });
        self.tearing_down = false;
    }

    pub fn set_microphone_enabled(&mut self, enabled: bool) {
        self.update(|s| s.microphone_enabled = enabled);
    }

    pub fn set_camera_enabled(&mut self, enabled: bool) {
        self.update(|s| s.camera_enabled = enabled);
    }

    pub fn handle_event(&mut self, event: RoomEvent) {
        let before = self.state.clone();

        match event {
            RoomEvent::Connected { room_name, participants } => {
                tracing::info!("connected to {room_name} with {} participants", participants.len());
                self.state.connection = ConnectionState::Connected;
                self.state.status_text = format!("Connected to {room_name}");
                self.state.title = Some(room_name.clone());
                self.state.room_name = Some(room_name);
                self.state.reconnecting = false;
                let first = participants.first().cloned();
                for participant in participants {
                    self.roster.add_participant(participant);
                }
                if let Some(first) = first {
                    self.add_remote_participant(&first);
                }
            }

            RoomEvent::Reconnecting { room_name, error } => {
                tracing::warn!("reconnecting to {room_name}: {} ({})", error.message, error.code);
                self.state.connection = ConnectionState::Reconnecting;
                self.state.status_text = format!("Reconnecting to {room_name}");
                self.state.reconnecting = true;
            }

            RoomEvent::Reconnected { room_name } => {
                self.state.connection = ConnectionState::Connected;
                self.state.status_text = format!("Connected to {room_name}");
                self.state.reconnecting = false;
            }

            RoomEvent::ConnectFailure { room_name, error } => {
                tracing::error!("failed to connect to {room_name}: {} ({})", error.message, error.code);
                self.state.connection = ConnectionState::Disconnected;
                self.state.status_text = "Failed to connect".to_string();
                self.state.room_name = None;
                self.state.reconnecting = false;
                self.roster.clear();
                self.state.featured_participant = None;
            }

            RoomEvent::Disconnected { room_name, error } => {
                match error {
                    Some(e) => tracing::warn!("disconnected from {room_name}: {} ({})", e.message, e.code),
                    None => tracing::info!("disconnected from {room_name}"),
                }
                self.state.connection = ConnectionState::Disconnected;
                self.state.status_text = format!("Disconnected from {room_name}");
                self.state.room_name = None;
                self.state.reconnecting = false;
                self.roster.clear();
                self.state.featured_participant = None;
                if !self.tearing_down {
                    self.move_local_video_to_primary();
                }
            }

            RoomEvent::ParticipantConnected(participant) => {
                self.roster.add_participant(participant.clone());
                self.add_remote_participant(&participant);
            }

            RoomEvent::ParticipantDisconnected(participant) => {
                self.remove_remote_participant(&participant);
            }

            RoomEvent::RecordingStarted => tracing::info!("recording started"),
            RoomEvent::RecordingStopped => tracing::info!("recording stopped"),

            RoomEvent::TrackPublished { participant_identity, track } => {
                self.roster.update_track(&participant_identity, &track);
                self.track_status(&participant_identity, &track, "published");
            }

            RoomEvent::TrackUnpublished { participant_identity, track } => {
                self.roster.remove_track(&participant_identity, &track.sid);
                self.track_status(&participant_identity, &track, "unpublished");
            }

            RoomEvent::TrackSubscribed { participant_identity, track } => {
                let track = TrackPublication { subscribed: true, ..track };
                self.roster.update_track(&participant_identity, &track);
                self.track_status(&participant_identity, &track, "subscribed");
                if track.kind == TrackKind::Video && self.roster.is_featured(&participant_identity) {
                    self.add_remote_video(&participant_identity, &track);
                }
            }

            RoomEvent::TrackUnsubscribed { participant_identity, track } => {
                let track = TrackPublication { subscribed: false, ..track };
                self.roster.update_track(&participant_identity, &track);
                self.track_status(&participant_identity, &track, "unsubscribed");
                if track.kind == TrackKind::Video {
                    self.remove_remote_video(&track.sid);
                }
            }

            RoomEvent::TrackSubscriptionFailed { participant_identity, track, error } => {
                tracing::warn!(
                    "subscription to {} track {} of {participant_identity} failed: {} ({})",
                    track.kind.label(),
                    track.sid,
                    error.message,
                    error.code
                );
                self.track_status(&participant_identity, &track, "subscription failed");
                if track.kind == TrackKind::Video && self.roster.is_featured(&participant_identity) {
                    self.pending.push(QuickstartEvent::Notice(format!(
                        "Failed to subscribe to {participant_identity}"
                    )));
                }
            }

            RoomEvent::TrackEnabled { participant_identity, track } => {
                tracing::debug!("{} track {} of {participant_identity} enabled", track.kind.label(), track.sid);
            }

            RoomEvent::TrackDisabled { participant_identity, track } => {
                tracing::debug!("{} track {} of {participant_identity} disabled", track.kind.label(), track.sid);
            }
        }

        if self.state != before {
            self.state_changed();
        }
    }

    /// Consume SDK events until every sender is dropped.
    pub async fn run(session: Arc<Mutex<RoomSession>>, mut events: RoomEventReceiver) {
        while let Some(event) = events.recv().await {
            tracing::debug!("room event: {event:?}");
            Self::apply(&session, |s| s.handle_event(event)).await;
        }
        tracing::info!("room event loop ended");
    }

    pub fn spawn(session: Arc<Mutex<RoomSession>>, events: RoomEventReceiver) -> JoinHandle<()> {
        tokio::spawn(Self::run(session, events))
    }

    fn update(&mut self, f: impl FnOnce(&mut ViewState)) {
        let before = self.state.clone();
        f(&mut self.state);
        if self.state != before {
            self.state_changed();
        }
    }

    fn state_changed(&mut self) {
        self.published.send_replace(self.state.clone());
        self.pending.push(QuickstartEvent::ViewStateChanged(self.state.clone()));
    }

    fn add_remote_participant(&mut self, participant: &RemoteParticipant) {
        if self.roster.featured().is_some() {
            self.pending.push(QuickstartEvent::Notice(MULTIPLE_PARTICIPANTS_NOTICE.to_string()));
            return;
        }
        self.roster.set_featured(Some(participant.identity.clone()));
        self.state.featured_participant = Some(participant.identity.clone());
        self.state.status_text = format!("Participant {} joined", participant.identity);

        if let Some(track) = participant.first_subscribed_video() {
            self.add_remote_video(&participant.identity, track);
        }
    }

    fn remove_remote_participant(&mut self, participant: &RemoteParticipant) {
        self.state.status_text = format!("Participant {} left.", participant.identity);
        let was_featured = self.roster.is_featured(&participant.identity);
        self.roster.remove_participant(&participant.identity);
        if !was_featured {
            return;
        }
        self.state.featured_participant = None;
        if let VideoSlot::Remote { participant_identity, .. } = &self.state.primary {
            if participant_identity == &participant.identity {
                self.state.primary = VideoSlot::Empty;
            }
        }
        self.move_local_video_to_primary();
    }

    fn add_remote_video(&mut self, identity: &str, track: &TrackPublication) {
        self.state.thumbnail_visible = true;
        self.state.primary = VideoSlot::Remote {
            participant_identity: identity.to_string(),
            track_sid: track.sid.clone(),
        };
    }

    fn remove_remote_video(&mut self, track_sid: &str) {
        if let VideoSlot::Remote { track_sid: shown, .. } = &self.state.primary {
            if shown == track_sid {
                self.state.primary = VideoSlot::Empty;
            }
        }
    }

    fn move_local_video_to_primary(&mut self) {
        if self.state.thumbnail_visible {
            self.state.thumbnail_visible = false;
            self.state.primary = VideoSlot::Local;
        }
    }

    fn track_status(&mut self, identity: &str, track: &TrackPublication, what: &str) {
        tracing::info!("{} track {} ({}) of {identity} {what}", track.kind.label(), track.sid, track.name);
        if self.roster.is_featured(identity) {
            self.state.status_text = format!("{} track {what}", track.kind.label());
        }
    }
}
