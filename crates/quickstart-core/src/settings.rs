use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum AudioCodec {
    Isac,
    #[default]
    Opus,
    Pcma,
    Pcmu,
    G722,
}

impl AudioCodec {
    pub fn name(self) -> &'static str {
        match self {
            Self::Isac => "isac",
            Self::Opus => "opus",
            Self::Pcma => "PCMA",
            Self::Pcmu => "PCMU",
            Self::G722 => "G722",
        }
    }
}

// Unknown names fall back to the default codec.
impl From<String> for AudioCodec {
    fn from(name: String) -> Self {
        match name.as_str() {
            "isac" => Self::Isac,
            "PCMA" => Self::Pcma,
            "PCMU" => Self::Pcmu,
            "G722" => Self::G722,
            _ => Self::Opus,
        }
    }
}

impl From<AudioCodec> for String {
    fn from(codec: AudioCodec) -> Self {
        codec.name().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum VideoCodec {
    #[default]
    Vp8,
    H264,
    Vp9,
}

impl VideoCodec {
    pub fn name(self) -> &'static str {
        match self {
            Self::Vp8 => "VP8",
            Self::H264 => "H264",
            Self::Vp9 => "VP9",
        }
    }
}

impl From<String> for VideoCodec {
    fn from(name: String) -> Self {
        match name.as_str() {
            "H264" => Self::H264,
            "VP9" => Self::Vp9,
            _ => Self::Vp8,
        }
    }
}

impl From<VideoCodec> for String {
    fn from(codec: VideoCodec) -> Self {
        codec.name().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Identity sent with token requests; random when unset.
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub audio_codec: AudioCodec,
    #[serde(default)]
    pub video_codec: VideoCodec,
    /// Only honoured when the video codec is VP8.
    #[serde(default)]
    pub vp8_simulcast: bool,
    #[serde(default = "default_true")]
    pub enable_automatic_subscription: bool,
    /// kbps, 0 leaves the bitrate unconstrained.
    #[serde(default)]
    pub max_audio_bitrate: u32,
    #[serde(default)]
    pub max_video_bitrate: u32,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity: None,
            audio_codec: AudioCodec::default(),
            video_codec: VideoCodec::default(),
            vp8_simulcast: false,
            enable_automatic_subscription: true,
            max_audio_bitrate: 0,
            max_video_bitrate: 0,
        }
    }
}

/// Sender-side bandwidth constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EncodingParameters {
    pub max_audio_bitrate: u32,
    pub max_video_bitrate: u32,
}

/// Options handed to the SDK when joining with an access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    pub room_name: String,
    /// Single-entry preference lists built from the stored codecs.
    pub preferred_audio_codecs: Vec<AudioCodec>,
    pub preferred_video_codecs: Vec<VideoCodec>,
    pub vp8_simulcast: bool,
    pub encoding: EncodingParameters,
    pub automatic_subscription: bool,
}

impl ConnectOptions {
    pub fn from_settings(room_name: &str, settings: &Settings) -> Self {
        Self {
            room_name: room_name.to_string(),
            preferred_audio_codecs: vec![settings.audio_codec],
            preferred_video_codecs: vec![settings.video_codec],
            vp8_simulcast: settings.video_codec == VideoCodec::Vp8 && settings.vp8_simulcast,
            encoding: EncodingParameters {
                max_audio_bitrate: settings.max_audio_bitrate,
                max_video_bitrate: settings.max_video_bitrate,
            },
            automatic_subscription: settings.enable_automatic_subscription,
        }
    }
}

/// Settings persisted as `settings.json` in the app data directory.
///
/// A missing or corrupt file yields defaults. Every setter saves.
pub struct SettingsStore {
    settings: Mutex<Settings>,
    file_path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join("settings.json");
        let settings = Self::load(&file_path);
        Self {
            settings: Mutex::new(settings),
            file_path,
        }
    }

    pub fn get(&self) -> Settings {
        self.lock().clone()
    }

    pub fn set_identity(&self, identity: Option<String>) {
        self.lock().identity = identity;
        self.save();
    }

    pub fn set_audio_codec(&self, codec: AudioCodec) {
        self.lock().audio_codec = codec;
        self.save();
    }

    pub fn set_video_codec(&self, codec: VideoCodec) {
        self.lock().video_codec = codec;
        self.save();
    }

    pub fn set_vp8_simulcast(&self, enabled: bool) {
        self.lock().vp8_simulcast = enabled;
        self.save();
    }

    pub fn set_enable_automatic_subscription(&self, enabled: bool) {
        self.lock().enable_automatic_subscription = enabled;
        self.save();
    }

    pub fn set_encoding_parameters(&self, encoding: EncodingParameters) {
        {
            let mut settings = self.lock();
            settings.max_audio_bitrate = encoding.max_audio_bitrate;
            settings.max_video_bitrate = encoding.max_video_bitrate;
        }
        self.save();
    }

    fn lock(&self) -> MutexGuard<'_, Settings> {
        match self.settings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn save(&self) {
        let settings = self.get();
        if let Some(parent) = self.file_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&settings) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.file_path, json) {
                    tracing::warn!("failed to write settings to {}: {e}", self.file_path.display());
                }
            }
            Err(e) => tracing::warn!("failed to serialize settings: {e}"),
        }
    }

    fn load(path: &Path) -> Settings {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("corrupt settings file {}: {e}", path.display());
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }
}
