use std::time::Duration;

/// Length of a full passcode (application id + serverless id).
pub const PASSCODE_SIZE: usize = 14;
/// Length of a legacy passcode (application id only).
pub const LEGACY_PASSCODE_SIZE: usize = 10;

pub const URL_PREFIX: &str = "https://video-app-";
pub const URL_SUFFIX: &str = "-dev.twil.io/token";

/// Fixed connect timeout for every backend call.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote participant tiles requested from the Vidyo connector.
pub const REMOTE_PARTICIPANTS: u32 = 15;
pub const CONNECTOR_LOG_LEVELS: &str = "warning all@VidyoConnector info@VidyoClient";

const DEFAULT_BASE_URL: &str = "https://placeholder.com/";
const DEFAULT_AUTO_CONNECT_PATH: &str = "autoconnect";

/// Base URL baked in at build time (`QUICKSTART_BASE_URL`).
pub fn base_url() -> &'static str {
    option_env!("QUICKSTART_BASE_URL").unwrap_or(DEFAULT_BASE_URL)
}

fn auto_connect_url() -> String {
    match option_env!("QUICKSTART_AUTO_CONNECT_URL") {
        Some(url) => url.to_string(),
        None => format!("{}{DEFAULT_AUTO_CONNECT_PATH}", base_url()),
    }
}

/// Endpoints and timeouts used by the backend clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Token URL up to the application id (`https://video-app-`).
    pub url_prefix: String,
    /// Token URL after the serverless id (`-dev.twil.io/token`).
    pub url_suffix: String,
    /// Fixed endpoint returning the guest room descriptor.
    pub auto_connect_url: String,
    pub connect_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            url_prefix: URL_PREFIX.to_string(),
            url_suffix: URL_SUFFIX.to_string(),
            auto_connect_url: auto_connect_url(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}
