use std::fmt;

use crate::config::{LEGACY_PASSCODE_SIZE, NetworkConfig, PASSCODE_SIZE};
use crate::errors::QuickstartError;

const APP_ID_START: usize = 6;
const APP_ID_END: usize = 10;

/// A video app passcode.
///
/// Characters 6..10 carry the application id. Full-length passcodes
/// (14 characters) also carry a serverless id in characters 10..; legacy
/// passcodes (10 characters) do not.
#[derive(Clone, PartialEq, Eq)]
pub struct Passcode(String);

impl Passcode {
    pub fn parse(input: &str) -> Result<Self, QuickstartError> {
        let input = input.trim();
        if !input.is_ascii() {
            return Err(QuickstartError::InvalidPasscode(
                "passcode must be ASCII".to_string(),
            ));
        }
        if input.len() < LEGACY_PASSCODE_SIZE {
            return Err(QuickstartError::InvalidPasscode(format!(
                "expected at least {LEGACY_PASSCODE_SIZE} characters, got {}",
                input.len()
            )));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_legacy(&self) -> bool {
        self.0.len() != PASSCODE_SIZE
    }

    pub fn app_id(&self) -> &str {
        &self.0[APP_ID_START..APP_ID_END]
    }

    pub fn serverless_id(&self) -> Option<&str> {
        if self.is_legacy() {
            None
        } else {
            Some(&self.0[APP_ID_END..])
        }
    }

    /// Token endpoint this passcode points at.
    pub fn token_url(&self, config: &NetworkConfig) -> String {
        match self.serverless_id() {
            Some(serverless_id) => format!(
                "{}{}-{}{}",
                config.url_prefix,
                self.app_id(),
                serverless_id,
                config.url_suffix
            ),
            None => format!("{}{}{}", config.url_prefix, self.app_id(), config.url_suffix),
        }
    }
}

// Passcodes are credentials; keep them out of debug logs.
impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passcode(app_id={})", self.app_id())
    }
}
