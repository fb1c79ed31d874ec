// ── Core error types ──
//
// Every failure the controller can meet while handling an event. None of
// them is fatal: the controller logs the error and waits for the next tick.
// The `From<simplisafe_api::Error>` impl folds wire errors into this taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or partial credentials. No request is attempted.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The vendor rejected the credentials outright.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The vendor answered 401 to a session request.
    #[error("Session expired -- logging in again")]
    SessionExpired,

    /// Malformed body, missing field, unexpected status or code.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Request construction or network failure.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The runtime task has stopped.
    #[error("Controller runtime is not running")]
    Disconnected,
}

impl CoreError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<simplisafe_api::Error> for CoreError {
    fn from(err: simplisafe_api::Error) -> Self {
        match err {
            simplisafe_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            simplisafe_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid URL: {e}"),
            },
            simplisafe_api::Error::Tls(msg) => CoreError::Transport {
                message: format!("TLS error: {msg}"),
            },
            simplisafe_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
        }
    }
}
