use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickstartError {
    #[error("http request failed: {0}")]
    Http(String),
    #[error("server returned status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("token missing from response")]
    MissingToken,
    #[error("invalid passcode: {0}")]
    InvalidPasscode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("connector error: {0}")]
    Connector(String),
}

impl From<reqwest::Error> for QuickstartError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::Status {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            };
        }
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }
        Self::Http(e.to_string())
    }
}
