//! Video quickstart core logic.
//!
//! Pure Rust crate with no platform dependencies.
//! Consumed by the Android shell via UniFFI bindings; the vendor video SDK
//! stays on the native side behind [`VideoConnector`].

pub mod auth;
pub mod config;
pub mod connector;
pub mod errors;
pub mod events;
pub mod participants;
pub mod passcode;
pub mod room_info;
pub mod session;
pub mod settings;
pub mod view_model;

pub use auth::{FailureKind, TokenInfo, TokenOutcome, TokenRequest, TokenService, random_identity};
pub use config::NetworkConfig;
pub use connector::{
    ConnectOutcome, ConnectTarget, ConnectorConfig, ConnectorHandle, VideoConnector, ViewStyle,
};
pub use errors::QuickstartError;
pub use events::{
    EventEmitter, QuickstartEvent, QuickstartEventListener, RemoteParticipant, RoomEvent,
    RoomEventSender, SdkError, TrackKind, TrackPublication,
};
pub use passcode::Passcode;
pub use room_info::{AutoConnectResponse, AutoConnectService, RoomInfo};
pub use session::{ConnectionState, RoomSession, VideoSlot, ViewState};
pub use settings::{
    AudioCodec, ConnectOptions, EncodingParameters, Settings, SettingsStore, VideoCodec,
};
pub use view_model::VideoViewModel;
