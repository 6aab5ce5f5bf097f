//! REST error types.
//!
//! Messages never carry the API secret; transport errors are stripped of
//! their request URL before formatting.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RestError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The request may have been delivered before the deadline hit.
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Exchange rejected request (HTTP {status}, code {code}): {msg}")]
    Api { status: u16, code: i64, msg: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid signing key")]
    InvalidKey,
}

impl RestError {
    /// The request never produced an exchange answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::HttpClient(_))
    }

    /// The exchange answered with a code/msg refusal.
    ///
    /// Gateway pages and other bodies without an exchange code are not
    /// refusals; they say nothing about the request itself.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// The request may have taken effect but its answer is unusable.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Decode(_))
    }
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        let connect = e.is_connect();
        let timeout = e.is_timeout();
        let body = e.is_body() || e.is_decode();
        let msg = e.without_url().to_string();
        if connect {
            Self::Transport(msg)
        } else if timeout {
            Self::Timeout(msg)
        } else if body {
            Self::Decode(msg)
        } else {
            Self::Transport(msg)
        }
    }
}

pub type RestResult<T> = Result<T, RestError>;
