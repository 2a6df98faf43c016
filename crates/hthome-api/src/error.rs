use reqwest::StatusCode;
use thiserror::Error;

/// Number of failed logins after which the vendor locks the account.
pub const LOGIN_LOCKOUT_ATTEMPTS: u32 = 5;

/// Top-level error type for the `hthome-api` crate.
///
/// Every fallible call in this crate returns one of these. `hthome-core`
/// maps them into `CoreError` at its boundary.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    // ── Transport ───────────────────────────────────────────────────
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// URL construction failed (bad base URL or path).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A device detail arrived without any status entry.
    #[error("Device {device_id} reported no status entries")]
    MalformedDeviceDetail { device_id: String },

    /// A status entry carried a value the device kind does not understand.
    #[error("Device {device_id} reported unexpected {command} value {value:?}")]
    UnexpectedStatus {
        device_id: String,
        command: String,
        value: String,
    },
}

impl Error {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(TransportError::Status { status, .. })
            | Self::Auth(AuthError::AuthorizationRejected { status }) => Some(*status),
            Self::Transport(TransportError::Network(e)) => e.status(),
            _ => None,
        }
    }

    /// Returns `true` for protocol-contract violations (shape mismatches).
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::MalformedDeviceDetail { .. } | Self::UnexpectedStatus { .. }
        )
    }
}

// ── AuthError ───────────────────────────────────────────────────────

/// Failure of one step of the login → household → authorization sequence.
///
/// All variants are terminal for the current refresh attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Vendor error code 104.
    #[error("Incorrect ID or password.{}", lockout_hint(.fail_count))]
    InvalidCredentials { fail_count: Option<u32> },

    /// Vendor error code 107.
    #[error("Access denied. You are not authorized to log in with these credentials.")]
    AccessDenied,

    /// Vendor error code 108.
    #[error("Unusual login activity detected. Please wait 5 minutes before trying again.")]
    TemporarilyLocked,

    /// Any other vendor error code.
    #[error("Failed to login due to an unexpected error. (code {code}: {message})")]
    UnexpectedLogin { code: i64, message: String },

    /// Login succeeded but no `Set-Cookie` header carried a token.
    #[error("There is no access token in the response header")]
    MissingToken,

    /// The account has no residence flagged as approved.
    #[error("No approved household found")]
    NoApprovedHousehold,

    /// The household-scoped authorization upgrade was refused.
    #[error("Failed to update access token (HTTP {status})")]
    AuthorizationRejected { status: StatusCode },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[allow(clippy::ref_option)]
fn lockout_hint(fail_count: &Option<u32>) -> String {
    fail_count.map_or_else(String::new, |count| {
        format!(
            " Login will be temporarily locked for 5 minutes after {LOGIN_LOCKOUT_ATTEMPTS} failed attempts. ({count}/{LOGIN_LOCKOUT_ATTEMPTS})"
        )
    })
}

impl AuthError {
    /// Translate a vendor login error payload into a typed cause.
    pub fn from_login_code(code: i64, message: String, fail_count: Option<u32>) -> Self {
        match code {
            104 => Self::InvalidCredentials { fail_count },
            107 => Self::AccessDenied,
            108 => Self::TemporarilyLocked,
            _ => Self::UnexpectedLogin { code, message },
        }
    }
}

/// A session refresh failed; `cause` is the step that broke.
#[derive(Debug, Error)]
#[error("Failed to refresh access token: {cause}")]
pub struct RefreshError {
    #[source]
    pub cause: AuthError,
}

impl From<AuthError> for RefreshError {
    fn from(cause: AuthError) -> Self {
        Self { cause }
    }
}

// ── TransportError ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    /// The vendor answered with a non-success status.
    #[error("Failed to {action}: HTTP {status}")]
    Status { action: String, status: StatusCode },

    /// Connection refused, DNS failure, timeout, body read failure...
    #[error("HTTP transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// The underlying `reqwest::Client` could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    pub fn unexpected_status(action: impl Into<String>, status: StatusCode) -> Self {
        Self::Status {
            action: action.into(),
            status,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}

// ── DecodeError ─────────────────────────────────────────────────────

/// Response body did not match the expected JSON shape.
#[derive(Debug, Error)]
#[error("Failed to decode {what}: {message} (body preview: {preview:?})")]
pub struct DecodeError {
    pub what: &'static str,
    pub message: String,
    pub preview: String,
}

impl DecodeError {
    const PREVIEW_LEN: usize = 200;

    pub fn new(what: &'static str, err: &serde_json::Error, body: &str) -> Self {
        let preview: String = body.chars().take(Self::PREVIEW_LEN).collect();
        Self {
            what,
            message: err.to_string(),
            preview,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_mentions_fail_count() {
        let err = AuthError::from_login_code(104, String::new(), Some(3));
        let msg = err.to_string();
        assert!(msg.contains("Incorrect ID or password"), "{msg}");
        assert!(msg.contains("3/5"), "{msg}");
    }

    #[test]
    fn invalid_credentials_without_count_has_no_hint() {
        let msg = AuthError::from_login_code(104, String::new(), None).to_string();
        assert_eq!(msg, "Incorrect ID or password.");
    }

    #[test]
    fn known_codes_map_to_causes() {
        assert!(matches!(
            AuthError::from_login_code(107, String::new(), None),
            AuthError::AccessDenied
        ));
        assert!(matches!(
            AuthError::from_login_code(108, String::new(), None),
            AuthError::TemporarilyLocked
        ));
        assert!(matches!(
            AuthError::from_login_code(999, "boom".into(), None),
            AuthError::UnexpectedLogin { code: 999, .. }
        ));
    }

    #[test]
    fn refresh_error_keeps_cause() {
        let err = RefreshError::from(AuthError::NoApprovedHousehold);
        assert_eq!(
            err.to_string(),
            "Failed to refresh access token: No approved household found"
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "No approved household found");
    }

    #[test]
    fn decode_error_truncates_preview() {
        let body = "x".repeat(500);
        let json_err = serde_json::from_str::<serde_json::Value>(&body).unwrap_err();
        let err = DecodeError::new("device list", &json_err, &body);
        assert_eq!(err.preview.len(), 200);
    }
}
