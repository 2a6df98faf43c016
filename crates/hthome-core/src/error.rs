// ── Core error types ──
//
// User-facing errors from hthome-core. Callers never match on HTTP plumbing
// directly; the `From<hthome_api::Error>` impl folds transport-layer errors
// into domain variants while keeping the message.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach HT Home Service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Request to HT Home Service timed out")]
    Timeout,

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    /// The vendor answered with a payload that breaks the protocol contract.
    #[error("Protocol violation: {message}")]
    Protocol { message: String },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The session layer was built from an invalid configuration.
    #[error("HT Home Service is not configured properly: {reason}")]
    Disabled { reason: String },
}

impl CoreError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hthome_api::Error> for CoreError {
    fn from(err: hthome_api::Error) -> Self {
        use hthome_api::{Error, TransportError};

        match err {
            Error::Auth(_) | Error::Refresh(_) => CoreError::AuthenticationFailed {
                message: err.to_string(),
            },
            Error::Transport(ref e) if e.is_timeout() => CoreError::Timeout,
            Error::Transport(TransportError::Network(ref e)) if e.is_connect() => {
                CoreError::ConnectionFailed {
                    reason: e.to_string(),
                }
            }
            Error::Transport(_) => CoreError::Api {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            },
            Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            Error::Decode(_) | Error::MalformedDeviceDetail { .. } | Error::UnexpectedStatus { .. } => {
                CoreError::Protocol {
                    message: err.to_string(),
                }
            }
        }
    }
}
