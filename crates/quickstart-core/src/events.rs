use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use crate::auth::{FailureKind, TokenInfo};
use crate::room_info::RoomInfo;
use crate::session::ViewState;

/// Events fired by the video SDK, one variant per listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Connected { room_name: String, participants: Vec<RemoteParticipant> },
    ConnectFailure { room_name: String, error: SdkError },
    Reconnecting { room_name: String, error: SdkError },
    Reconnected { room_name: String },
    Disconnected { room_name: String, error: Option<SdkError> },
    ParticipantConnected(RemoteParticipant),
    ParticipantDisconnected(RemoteParticipant),
    RecordingStarted,
    RecordingStopped,
    TrackPublished { participant_identity: String, track: TrackPublication },
    TrackUnpublished { participant_identity: String, track: TrackPublication },
    TrackSubscribed { participant_identity: String, track: TrackPublication },
    TrackUnsubscribed { participant_identity: String, track: TrackPublication },
    TrackSubscriptionFailed {
        participant_identity: String,
        track: TrackPublication,
        error: SdkError,
    },
    TrackEnabled { participant_identity: String, track: TrackPublication },
    TrackDisabled { participant_identity: String, track: TrackPublication },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
    Data,
}

impl TrackKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Data => "Data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPublication {
    pub sid: String,
    pub name: String,
    pub kind: TrackKind,
    pub subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParticipant {
    pub identity: String,
    pub sid: String,
    pub tracks: Vec<TrackPublication>,
}

impl RemoteParticipant {
    /// First video track the local participant is subscribed to.
    pub fn first_subscribed_video(&self) -> Option<&TrackPublication> {
        self.tracks
            .iter()
            .find(|t| t.kind == TrackKind::Video)
            .filter(|t| t.subscribed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkError {
    pub code: i32,
    pub message: String,
}

/// Sending half of the SDK event stream.
pub type RoomEventSender = mpsc::UnboundedSender<RoomEvent>;
pub type RoomEventReceiver = mpsc::UnboundedReceiver<RoomEvent>;

pub fn room_event_channel() -> (RoomEventSender, RoomEventReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted by the core to native UI listeners.
#[derive(Debug, Clone)]
pub enum QuickstartEvent {
    TokenReceived(TokenInfo),
    TokenFailed { kind: FailureKind, detail: String },
    RoomInfoReceived(RoomInfo),
    RoomInfoFailed(String),
    ViewStateChanged(ViewState),
    /// Transient message for the user (snackbar).
    Notice(String),
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait QuickstartEventListener: Send + Sync {
    fn on_event(&self, event: QuickstartEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Vec<Arc<dyn QuickstartEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn QuickstartEventListener>) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    /// Deliver `event` to every listener. A panicking listener is logged and
    /// skipped; the others still receive the event.
    pub fn emit(&self, event: QuickstartEvent) {
        let listeners: Vec<_> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in listeners {
            let event = event.clone();
            let delivered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
            if delivered.is_err() {
                tracing::error!("event listener panicked; event dropped for that listener");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: Arc<AtomicUsize>,
    }

    impl QuickstartEventListener for CountingListener {
        fn on_event(&self, _event: QuickstartEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Records every event it receives.
    #[derive(Default)]
    pub(crate) struct EventCapture {
        pub events: Mutex<Vec<QuickstartEvent>>,
    }

    impl EventCapture {
        pub fn notices(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    QuickstartEvent::Notice(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl QuickstartEventListener for EventCapture {
        fn on_event(&self, event: QuickstartEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn emitter_dispatches_to_multiple_listeners() {
        let emitter = EventEmitter::new();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        emitter.add_listener(Arc::new(CountingListener { count: count1.clone() }));
        emitter.add_listener(Arc::new(CountingListener { count: count2.clone() }));

        emitter.emit(QuickstartEvent::Notice("hello".to_string()));

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn emitter_delivers_correct_events() {
        let emitter = EventEmitter::new();
        let capture = Arc::new(EventCapture::default());

        emitter.add_listener(capture.clone());
        emitter.emit(QuickstartEvent::RoomInfoFailed("boom".to_string()));

        let captured = capture.events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        match &captured[0] {
            QuickstartEvent::RoomInfoFailed(detail) => assert_eq!(detail, "boom"),
            _ => panic!("expected RoomInfoFailed"),
        }
    }

    struct PanickingListener;

    impl QuickstartEventListener for PanickingListener {
        fn on_event(&self, _event: QuickstartEvent) {
            panic!("listener failure");
        }
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let emitter = EventEmitter::new();
        let count = Arc::new(AtomicUsize::new(0));
        emitter.add_listener(Arc::new(PanickingListener));
        emitter.add_listener(Arc::new(CountingListener { count: count.clone() }));

        emitter.emit(QuickstartEvent::Notice("one".to_string()));
        emitter.emit(QuickstartEvent::Notice("two".to_string()));

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn first_subscribed_video_ignores_audio_and_unsubscribed() {
        let participant = RemoteParticipant {
            identity: "bob".to_string(),
            sid: "PA1".to_string(),
            tracks: vec![
                TrackPublication {
                    sid: "MT1".to_string(),
                    name: "mic".to_string(),
                    kind: TrackKind::Audio,
                    subscribed: true,
                },
                TrackPublication {
                    sid: "MT2".to_string(),
                    name: "camera".to_string(),
                    kind: TrackKind::Video,
                    subscribed: false,
                },
            ],
        };
        assert!(participant.first_subscribed_video().is_none());
    }
}
