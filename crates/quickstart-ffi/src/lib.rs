//! UniFFI bindings for quickstart-core.
//!
//! Provides a QuickstartClient object that wraps the backend clients, the
//! connector handle and the settings store into a single FFI-safe interface.
//! The Android shell implements `VideoConnector` on top of the vendor SDK and
//! feeds SDK callbacks back through `on_room_event`.

use std::sync::Arc;

uniffi::include_scaffolding!("quickstart");

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before using QuickstartClient.
/// On Android, stderr goes to logcat for debuggable builds.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quickstart_core=debug,quickstart_ffi=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .try_init();
    });
}

fn random_identity() -> String {
    quickstart_core::random_identity()
}

// ── FFI-safe type conversions ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

impl From<quickstart_core::ConnectionState> for ConnectionState {
    fn from(s: quickstart_core::ConnectionState) -> Self {
        match s {
            quickstart_core::ConnectionState::Idle => Self::Idle,
            quickstart_core::ConnectionState::Connecting => Self::Connecting,
            quickstart_core::ConnectionState::Connected => Self::Connected,
            quickstart_core::ConnectionState::Reconnecting => Self::Reconnecting,
            quickstart_core::ConnectionState::Disconnected => Self::Disconnected,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TrackKind {
    Audio,
    Video,
    Data,
}

impl From<TrackKind> for quickstart_core::TrackKind {
    fn from(k: TrackKind) -> Self {
        match k {
            TrackKind::Audio => Self::Audio,
            TrackKind::Video => Self::Video,
            TrackKind::Data => Self::Data,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum AudioCodec {
    Isac,
    Opus,
    Pcma,
    Pcmu,
    G722,
}

impl From<quickstart_core::AudioCodec> for AudioCodec {
    fn from(c: quickstart_core::AudioCodec) -> Self {
        match c {
            quickstart_core::AudioCodec::Isac => Self::Isac,
            quickstart_core::AudioCodec::Opus => Self::Opus,
            quickstart_core::AudioCodec::Pcma => Self::Pcma,
            quickstart_core::AudioCodec::Pcmu => Self::Pcmu,
            quickstart_core::AudioCodec::G722 => Self::G722,
        }
    }
}

impl From<AudioCodec> for quickstart_core::AudioCodec {
    fn from(c: AudioCodec) -> Self {
        match c {
            AudioCodec::Isac => Self::Isac,
            AudioCodec::Opus => Self::Opus,
            AudioCodec::Pcma => Self::Pcma,
            AudioCodec::Pcmu => Self::Pcmu,
            AudioCodec::G722 => Self::G722,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VideoCodec {
    Vp8,
    H264,
    Vp9,
}

impl From<quickstart_core::VideoCodec> for VideoCodec {
    fn from(c: quickstart_core::VideoCodec) -> Self {
        match c {
            quickstart_core::VideoCodec::Vp8 => Self::Vp8,
            quickstart_core::VideoCodec::H264 => Self::H264,
            quickstart_core::VideoCodec::Vp9 => Self::Vp9,
        }
    }
}

impl From<VideoCodec> for quickstart_core::VideoCodec {
    fn from(c: VideoCodec) -> Self {
        match c {
            VideoCodec::Vp8 => Self::Vp8,
            VideoCodec::H264 => Self::H264,
            VideoCodec::Vp9 => Self::Vp9,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ViewStyle {
    Default,
    Tiles,
}

impl From<quickstart_core::ViewStyle> for ViewStyle {
    fn from(s: quickstart_core::ViewStyle) -> Self {
        match s {
            quickstart_core::ViewStyle::Default => Self::Default,
            quickstart_core::ViewStyle::Tiles => Self::Tiles,
        }
    }
}

#[derive(Debug, Clone)]
pub enum VideoSlot {
    Local,
    Remote { participant_identity: String, track_sid: String },
    Empty,
}

impl From<quickstart_core::VideoSlot> for VideoSlot {
    fn from(s: quickstart_core::VideoSlot) -> Self {
        match s {
            quickstart_core::VideoSlot::Local => Self::Local,
            quickstart_core::VideoSlot::Remote { participant_identity, track_sid } => {
                Self::Remote { participant_identity, track_sid }
            }
            quickstart_core::VideoSlot::Empty => Self::Empty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub connection: ConnectionState,
    pub room_name: Option<String>,
    pub title: Option<String>,
    pub status_text: String,
    pub reconnecting: bool,
    pub primary: VideoSlot,
    pub thumbnail_visible: bool,
    pub featured_participant: Option<String>,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
}

impl From<quickstart_core::ViewState> for ViewState {
    fn from(s: quickstart_core::ViewState) -> Self {
        Self {
            connection: s.connection.into(),
            room_name: s.room_name,
            title: s.title,
            status_text: s.status_text,
            reconnecting: s.reconnecting,
            primary: s.primary.into(),
            thumbnail_visible: s.thumbnail_visible,
            featured_participant: s.featured_participant,
            microphone_enabled: s.microphone_enabled,
            camera_enabled: s.camera_enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub portal: String,
    pub name: String,
    pub room_key: String,
    pub room_pin: String,
    pub room_url: String,
    pub extension: String,
    pub invite_content: String,
}

impl From<quickstart_core::RoomInfo> for RoomInfo {
    fn from(r: quickstart_core::RoomInfo) -> Self {
        Self {
            portal: r.portal,
            name: r.name,
            room_key: r.room_key,
            room_pin: r.room_pin,
            room_url: r.room_url,
            extension: r.extension,
            invite_content: r.invite_content,
        }
    }
}

impl From<RoomInfo> for quickstart_core::RoomInfo {
    fn from(r: RoomInfo) -> Self {
        Self {
            portal: r.portal,
            name: r.name,
            room_key: r.room_key,
            room_pin: r.room_pin,
            room_url: r.room_url,
            extension: r.extension,
            invite_content: r.invite_content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackPublication {
    pub sid: String,
    pub name: String,
    pub kind: TrackKind,
    pub subscribed: bool,
}

impl From<TrackPublication> for quickstart_core::TrackPublication {
    fn from(t: TrackPublication) -> Self {
        Self {
            sid: t.sid,
            name: t.name,
            kind: t.kind.into(),
            subscribed: t.subscribed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    pub identity: String,
    pub sid: String,
    pub tracks: Vec<TrackPublication>,
}

impl From<RemoteParticipant> for quickstart_core::RemoteParticipant {
    fn from(p: RemoteParticipant) -> Self {
        Self {
            identity: p.identity,
            sid: p.sid,
            tracks: p.tracks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SdkError {
    pub code: i32,
    pub message: String,
}

impl From<SdkError> for quickstart_core::SdkError {
    fn from(e: SdkError) -> Self {
        Self { code: e.code, message: e.message }
    }
}

#[derive(Debug, Clone)]
pub enum RoomEvent {
    Connected { room_name: String, participants: Vec<RemoteParticipant> },
    ConnectFailure { room_name: String, error: SdkError },
    Reconnecting { room_name: String, error: SdkError },
    Reconnected { room_name: String },
    Disconnected { room_name: String, error: Option<SdkError> },
    ParticipantConnected { participant: RemoteParticipant },
    ParticipantDisconnected { participant: RemoteParticipant },
    RecordingStarted,
    RecordingStopped,
    TrackPublished { participant_identity: String, track: TrackPublication },
    TrackUnpublished { participant_identity: String, track: TrackPublication },
    TrackSubscribed { participant_identity: String, track: TrackPublication },
    TrackUnsubscribed { participant_identity: String, track: TrackPublication },
    TrackSubscriptionFailed { participant_identity: String, track: TrackPublication, error: SdkError },
    TrackEnabled { participant_identity: String, track: TrackPublication },
    TrackDisabled { participant_identity: String, track: TrackPublication },
}

impl From<RoomEvent> for quickstart_core::RoomEvent {
    fn from(e: RoomEvent) -> Self {
        match e {
            RoomEvent::Connected { room_name, participants } => Self::Connected {
                room_name,
                participants: participants.into_iter().map(Into::into).collect(),
            },
            RoomEvent::ConnectFailure { room_name, error } => {
                Self::ConnectFailure { room_name, error: error.into() }
            }
            RoomEvent::Reconnecting { room_name, error } => {
                Self::Reconnecting { room_name, error: error.into() }
            }
            RoomEvent::Reconnected { room_name } => Self::Reconnected { room_name },
            RoomEvent::Disconnected { room_name, error } => {
                Self::Disconnected { room_name, error: error.map(Into::into) }
            }
            RoomEvent::ParticipantConnected { participant } => {
                Self::ParticipantConnected(participant.into())
            }
            RoomEvent::ParticipantDisconnected { participant } => {
                Self::ParticipantDisconnected(participant.into())
            }
            RoomEvent::RecordingStarted => Self::RecordingStarted,
            RoomEvent::RecordingStopped => Self::RecordingStopped,
            RoomEvent::TrackPublished { participant_identity, track } => {
                Self::TrackPublished { participant_identity, track: track.into() }
            }
            RoomEvent::TrackUnpublished { participant_identity, track } => {
                Self::TrackUnpublished { participant_identity, track: track.into() }
            }
            RoomEvent::TrackSubscribed { participant_identity, track } => {
                Self::TrackSubscribed { participant_identity, track: track.into() }
            }
            RoomEvent::TrackUnsubscribed { participant_identity, track } => {
                Self::TrackUnsubscribed { participant_identity, track: track.into() }
            }
            RoomEvent::TrackSubscriptionFailed { participant_identity, track, error } => {
                Self::TrackSubscriptionFailed {
                    participant_identity,
                    track: track.into(),
                    error: error.into(),
                }
            }
            RoomEvent::TrackEnabled { participant_identity, track } => {
                Self::TrackEnabled { participant_identity, track: track.into() }
            }
            RoomEvent::TrackDisabled { participant_identity, track } => {
                Self::TrackDisabled { participant_identity, track: track.into() }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ConnectOutcome {
    Success,
    Failure,
    Disconnected,
}

impl ConnectOutcome {
    fn into_core(self, reason: String) -> quickstart_core::ConnectOutcome {
        match self {
            Self::Success => quickstart_core::ConnectOutcome::Success,
            Self::Failure => quickstart_core::ConnectOutcome::Failure(reason),
            Self::Disconnected => quickstart_core::ConnectOutcome::Disconnected(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FailureKind {
    InvalidPasscode,
    Transport,
    Status { code: u16 },
    Decode,
    MissingToken,
}

impl From<quickstart_core::FailureKind> for FailureKind {
    fn from(k: quickstart_core::FailureKind) -> Self {
        match k {
            quickstart_core::FailureKind::InvalidPasscode => Self::InvalidPasscode,
            quickstart_core::FailureKind::Transport => Self::Transport,
            quickstart_core::FailureKind::Status(code) => Self::Status { code },
            quickstart_core::FailureKind::Decode => Self::Decode,
            quickstart_core::FailureKind::MissingToken => Self::MissingToken,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TokenResult {
    Token { token: String, identity: Option<String>, room_name: Option<String> },
    Failure { kind: FailureKind, detail: String },
}

impl From<quickstart_core::TokenOutcome> for TokenResult {
    fn from(o: quickstart_core::TokenOutcome) -> Self {
        match o {
            quickstart_core::TokenOutcome::Token(info) => Self::Token {
                token: info.token,
                identity: info.identity,
                room_name: info.room_name,
            },
            quickstart_core::TokenOutcome::Failure { kind, detail } => {
                Self::Failure { kind: kind.into(), detail }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum QuickstartEvent {
    TokenReceived { token: String, identity: Option<String>, room_name: Option<String> },
    TokenFailed { kind: FailureKind, detail: String },
    RoomInfoReceived { info: RoomInfo },
    RoomInfoFailed { detail: String },
    ViewStateChanged { state: ViewState },
    Notice { message: String },
}

impl From<quickstart_core::QuickstartEvent> for QuickstartEvent {
    fn from(e: quickstart_core::QuickstartEvent) -> Self {
        match e {
            quickstart_core::QuickstartEvent::TokenReceived(info) => Self::TokenReceived {
                token: info.token,
                identity: info.identity,
                room_name: info.room_name,
            },
            quickstart_core::QuickstartEvent::TokenFailed { kind, detail } => {
                Self::TokenFailed { kind: kind.into(), detail }
            }
            quickstart_core::QuickstartEvent::RoomInfoReceived(info) => {
                Self::RoomInfoReceived { info: info.into() }
            }
            quickstart_core::QuickstartEvent::RoomInfoFailed(detail) => Self::RoomInfoFailed { detail },
            quickstart_core::QuickstartEvent::ViewStateChanged(state) => {
                Self::ViewStateChanged { state: state.into() }
            }
            quickstart_core::QuickstartEvent::Notice(message) => Self::Notice { message },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub room_name: String,
    pub preferred_audio_codecs: Vec<AudioCodec>,
    pub preferred_video_codecs: Vec<VideoCodec>,
    pub vp8_simulcast: bool,
    pub max_audio_bitrate: u32,
    pub max_video_bitrate: u32,
    pub automatic_subscription: bool,
}

impl From<quickstart_core::ConnectOptions> for ConnectOptions {
    fn from(o: quickstart_core::ConnectOptions) -> Self {
        Self {
            room_name: o.room_name,
            preferred_audio_codecs: o.preferred_audio_codecs.into_iter().map(Into::into).collect(),
            preferred_video_codecs: o.preferred_video_codecs.into_iter().map(Into::into).collect(),
            vp8_simulcast: o.vp8_simulcast,
            max_audio_bitrate: o.encoding.max_audio_bitrate,
            max_video_bitrate: o.encoding.max_video_bitrate,
            automatic_subscription: o.automatic_subscription,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConnectTarget {
    Token { access_token: String, options: ConnectOptions },
    Room { info: RoomInfo },
}

impl From<quickstart_core::ConnectTarget> for ConnectTarget {
    fn from(t: quickstart_core::ConnectTarget) -> Self {
        match t {
            quickstart_core::ConnectTarget::Token { access_token, options } => {
                Self::Token { access_token, options: options.into() }
            }
            quickstart_core::ConnectTarget::Room(info) => Self::Room { info: info.into() },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub view_style: ViewStyle,
    pub remote_participants: u32,
    pub log_levels: String,
}

impl From<&quickstart_core::ConnectorConfig> for ConnectorConfig {
    fn from(c: &quickstart_core::ConnectorConfig) -> Self {
        Self {
            view_style: c.view_style.into(),
            remote_participants: c.remote_participants,
            log_levels: c.log_levels.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub identity: Option<String>,
    pub audio_codec: AudioCodec,
    pub video_codec: VideoCodec,
    pub vp8_simulcast: bool,
    pub enable_automatic_subscription: bool,
    pub max_audio_bitrate: u32,
    pub max_video_bitrate: u32,
}

impl From<quickstart_core::Settings> for Settings {
    fn from(s: quickstart_core::Settings) -> Self {
        Self {
            identity: s.identity,
            audio_codec: s.audio_codec.into(),
            video_codec: s.video_codec.into(),
            vp8_simulcast: s.vp8_simulcast,
            enable_automatic_subscription: s.enable_automatic_subscription,
            max_audio_bitrate: s.max_audio_bitrate,
            max_video_bitrate: s.max_video_bitrate,
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum QuickstartError {
    #[error("HTTP error: {msg}")]
    Http { msg: String },
    #[error("Status {code}: {msg}")]
    Status { code: u16, msg: String },
    #[error("Decode error: {msg}")]
    Decode { msg: String },
    #[error("Token missing from response")]
    MissingToken,
    #[error("Invalid passcode: {msg}")]
    InvalidPasscode { msg: String },
    #[error("Invalid URL: {msg}")]
    InvalidUrl { msg: String },
    #[error("Connector error: {msg}")]
    Connector { msg: String },
}

impl From<quickstart_core::QuickstartError> for QuickstartError {
    fn from(e: quickstart_core::QuickstartError) -> Self {
        tracing::error!("QuickstartError: {e}");
        match e {
            quickstart_core::QuickstartError::Http(msg) => Self::Http { msg },
            quickstart_core::QuickstartError::Status { code, message } => Self::Status { code, msg: message },
            quickstart_core::QuickstartError::Decode(msg) => Self::Decode { msg },
            quickstart_core::QuickstartError::MissingToken => Self::MissingToken,
            quickstart_core::QuickstartError::InvalidPasscode(msg) => Self::InvalidPasscode { msg },
            quickstart_core::QuickstartError::InvalidUrl(msg) => Self::InvalidUrl { msg },
            quickstart_core::QuickstartError::Connector(msg) => Self::Connector { msg },
        }
    }
}

impl From<QuickstartError> for quickstart_core::QuickstartError {
    fn from(e: QuickstartError) -> Self {
        match e {
            QuickstartError::Http { msg } => Self::Http(msg),
            QuickstartError::Status { code, msg } => Self::Status { code, message: msg },
            QuickstartError::Decode { msg } => Self::Decode(msg),
            QuickstartError::MissingToken => Self::MissingToken,
            QuickstartError::InvalidPasscode { msg } => Self::InvalidPasscode(msg),
            QuickstartError::InvalidUrl { msg } => Self::InvalidUrl(msg),
            QuickstartError::Connector { msg } => Self::Connector(msg),
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for QuickstartError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Connector { msg: e.reason }
    }
}

// ── Callback interfaces ────────────────────────────────────────────────

pub trait QuickstartEventListener: Send + Sync {
    fn on_event(&self, event: QuickstartEvent);
}

/// Implemented by the native shell on top of the vendor video SDK.
pub trait VideoConnector: Send + Sync {
    fn init(&self, config: ConnectorConfig) -> Result<(), QuickstartError>;
    fn connect(&self, target: ConnectTarget) -> Result<(), QuickstartError>;
    fn disconnect(&self);
    fn set_microphone_enabled(&self, enabled: bool) -> Result<(), QuickstartError>;
    fn set_camera_enabled(&self, enabled: bool) -> Result<(), QuickstartError>;
    fn shutdown(&self);
}

// ── Bridges: FFI callbacks → core traits ───────────────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn QuickstartEventListener>,
}

impl quickstart_core::QuickstartEventListener for BridgeListener {
    fn on_event(&self, event: quickstart_core::QuickstartEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

/// SDK callbacks come back through `QuickstartClient::on_room_event`, so the
/// core's event sender is not handed across the boundary.
struct BridgeConnector {
    ffi_connector: Box<dyn VideoConnector>,
}

impl quickstart_core::VideoConnector for BridgeConnector {
    fn init(&self, config: &quickstart_core::ConnectorConfig) -> Result<(), quickstart_core::QuickstartError> {
        self.ffi_connector.init(config.into()).map_err(Into::into)
    }

    fn connect(
        &self,
        target: quickstart_core::ConnectTarget,
        _events: quickstart_core::RoomEventSender,
    ) -> Result<(), quickstart_core::QuickstartError> {
        self.ffi_connector.connect(target.into()).map_err(Into::into)
    }

    fn disconnect(&self) {
        self.ffi_connector.disconnect();
    }

    fn set_microphone_enabled(&self, enabled: bool) -> Result<(), quickstart_core::QuickstartError> {
        self.ffi_connector.set_microphone_enabled(enabled).map_err(Into::into)
    }

    fn set_camera_enabled(&self, enabled: bool) -> Result<(), quickstart_core::QuickstartError> {
        self.ffi_connector.set_camera_enabled(enabled).map_err(Into::into)
    }

    fn shutdown(&self) {
        self.ffi_connector.shutdown();
    }
}

// ── QuickstartClient: main FFI object ──────────────────────────────────

pub struct QuickstartClient {
    emitter: quickstart_core::EventEmitter,
    view_model: quickstart_core::VideoViewModel,
    connector: quickstart_core::ConnectorHandle,
    settings: quickstart_core::SettingsStore,
    // Dropped last: the handle and view model abort tasks on this runtime.
    rt: tokio::runtime::Runtime,
}

impl QuickstartClient {
    pub fn new(data_dir: String, connector: Box<dyn VideoConnector>) -> Result<Self, QuickstartError> {
        Self::with_config(data_dir, connector, quickstart_core::NetworkConfig::default())
    }

    fn with_config(
        data_dir: String,
        connector: Box<dyn VideoConnector>,
        config: quickstart_core::NetworkConfig,
    ) -> Result<Self, QuickstartError> {
        tracing::info!("QuickstartClient::new data_dir={data_dir}");
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| QuickstartError::Connector { msg: format!("failed to create tokio runtime: {e}") })?;
        let (emitter, view_model, connector) = {
            let _guard = rt.enter();
            let emitter = quickstart_core::EventEmitter::new();
            let view_model = quickstart_core::VideoViewModel::new(config, emitter.clone())?;
            let connector = quickstart_core::ConnectorHandle::init(
                Arc::new(BridgeConnector { ffi_connector: connector }),
                &quickstart_core::ConnectorConfig::default(),
                emitter.clone(),
            )?;
            (emitter, view_model, connector)
        };
        let settings = quickstart_core::SettingsStore::new(&data_dir);

        Ok(Self {
            emitter,
            view_model,
            connector,
            settings,
            rt,
        })
    }

    /// Blocking token fetch. Falls back to the stored identity, then a random one.
    pub fn fetch_token(&self, identity: Option<String>, room_name: Option<String>, passcode: String) -> TokenResult {
        let identity = self.resolve_identity(identity);
        self.block_on(self.view_model.token_service().fetch_token(
            Some(identity.as_str()),
            room_name.as_deref(),
            &passcode,
        ))
        .into()
    }

    pub fn fetch_room_info(&self, room_name: String) -> Result<RoomInfo, QuickstartError> {
        self.block_on(self.view_model.auto_connect_service().fetch_room_info(&room_name))
            .map(RoomInfo::from)
            .map_err(QuickstartError::from)
    }

    /// Non-blocking token fetch; the result arrives as a listener event.
    pub fn request_token(&self, identity: Option<String>, room_name: Option<String>, passcode: String) {
        let identity = self.resolve_identity(identity);
        let _guard = self.rt.enter();
        self.view_model.get_token(Some(identity), room_name, passcode);
    }

    pub fn request_room_info(&self, room_name: String) {
        let _guard = self.rt.enter();
        self.view_model.get_auto_connect_room_info(room_name);
    }

    pub fn connect_with_token(&self, access_token: String, room_name: String) -> Result<(), QuickstartError> {
        let options = quickstart_core::ConnectOptions::from_settings(&room_name, &self.settings.get());
        self.guard_panics("connect_with_token", || {
            self.block_on(self.connector.connect_with_token(&access_token, options))
                .map_err(QuickstartError::from)
        })
    }

    pub fn connect_to_room(&self, room: RoomInfo) -> Result<(), QuickstartError> {
        self.guard_panics("connect_to_room", || {
            self.block_on(self.connector.connect_to_room(room.into()))
                .map_err(QuickstartError::from)
        })
    }

    /// Forward one SDK callback into the session loop.
    pub fn on_room_event(&self, event: RoomEvent) {
        if self.connector.event_sender().send(event.into()).is_err() {
            tracing::warn!("room event dropped: session loop has ended");
        }
    }

    /// Forward a guest-join terminal callback into the session loop.
    pub fn on_connect_outcome(&self, room_name: String, outcome: ConnectOutcome, reason: String) {
        let event = outcome.into_core(reason).into_room_event(&room_name);
        if self.connector.event_sender().send(event).is_err() {
            tracing::warn!("connect outcome dropped: session loop has ended");
        }
    }

    pub fn disconnect(&self) {
        self.connector.disconnect();
    }

    pub fn shutdown(&self) {
        self.block_on(self.connector.shutdown());
    }

    pub fn set_microphone_enabled(&self, enabled: bool) -> Result<(), QuickstartError> {
        self.block_on(self.connector.set_microphone_enabled(enabled))
            .map_err(QuickstartError::from)
    }

    pub fn set_camera_enabled(&self, enabled: bool) -> Result<(), QuickstartError> {
        self.block_on(self.connector.set_camera_enabled(enabled))
            .map_err(QuickstartError::from)
    }

    pub fn view_state(&self) -> ViewState {
        self.connector.view_state().into()
    }

    pub fn add_listener(&self, listener: Box<dyn QuickstartEventListener>) {
        let bridge = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });
        self.emitter.add_listener(bridge);
    }

    pub fn get_settings(&self) -> Settings {
        self.settings.get().into()
    }

    pub fn set_identity(&self, identity: Option<String>) {
        self.settings.set_identity(identity);
    }

    pub fn set_audio_codec(&self, codec: AudioCodec) {
        self.settings.set_audio_codec(codec.into());
    }

    pub fn set_video_codec(&self, codec: VideoCodec) {
        self.settings.set_video_codec(codec.into());
    }

    pub fn set_vp8_simulcast(&self, enabled: bool) {
        self.settings.set_vp8_simulcast(enabled);
    }

    pub fn set_enable_automatic_subscription(&self, enabled: bool) {
        self.settings.set_enable_automatic_subscription(enabled);
    }

    pub fn set_encoding_parameters(&self, max_audio_bitrate: u32, max_video_bitrate: u32) {
        self.settings.set_encoding_parameters(quickstart_core::EncodingParameters {
            max_audio_bitrate,
            max_video_bitrate,
        });
    }

    fn resolve_identity(&self, identity: Option<String>) -> String {
        identity
            .or_else(|| self.settings.get().identity)
            .unwrap_or_else(quickstart_core::random_identity)
    }

    /// Listeners run on runtime threads, so a listener calling back into
    /// the client must leave the runtime context before blocking.
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::task::block_in_place(|| self.rt.handle().block_on(future))
        } else {
            self.rt.block_on(future)
        }
    }

    /// Keep panics from unwinding across the FFI boundary.
    fn guard_panics(
        &self,
        what: &str,
        f: impl FnOnce() -> Result<(), QuickstartError>,
    ) -> Result<(), QuickstartError> {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(panic_info) => {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!("{what} panicked: {msg}");
                Err(QuickstartError::Connector { msg: format!("panic in {what}: {msg}") })
            }
        }
    }
}
