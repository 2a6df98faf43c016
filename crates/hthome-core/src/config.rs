// ── Runtime session configuration ──
//
// Describes *how* to talk to HT Home Service: credentials, polling cadence
// and transport tuning. Never touches disk; hthome-config (or any other
// host) builds one and hands it to `Platform`.

use std::time::Duration;

use hthome_api::{Credentials, TransportConfig};
use secrecy::ExposeSecret;

use crate::error::CoreError;

/// Validated configuration for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub credentials: Credentials,
    /// Interval between two state polls of the same device.
    pub poll_interval: Duration,
    pub transport: TransportConfig,
    /// Publish the commanded state right after a successful command instead
    /// of waiting for the next poll.
    pub optimistic_updates: bool,
}

impl SessionConfig {
    /// Validate the required fields.
    ///
    /// The identifier and secret must be non-empty and the poll interval
    /// strictly positive.
    pub fn new(credentials: Credentials, poll_interval: Duration) -> Result<Self, CoreError> {
        if credentials.id().trim().is_empty() {
            return Err(CoreError::Config {
                message: "id must not be empty".into(),
            });
        }
        if credentials.password().expose_secret().is_empty() {
            return Err(CoreError::Config {
                message: "password must not be empty".into(),
            });
        }
        if poll_interval.is_zero() {
            return Err(CoreError::Config {
                message: "device state refresh interval must be greater than zero".into(),
            });
        }

        Ok(Self {
            credentials,
            poll_interval,
            transport: TransportConfig::default(),
            optimistic_updates: false,
        })
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_optimistic_updates(mut self, enabled: bool) -> Self {
        self.optimistic_updates = enabled;
        self
    }
}
