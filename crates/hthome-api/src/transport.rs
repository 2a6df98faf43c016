// Shared transport configuration for building reqwest::Client instances.
//
// The session manager and the resilient client share one `reqwest::Client`
// so they reuse the same connection pool and timeout policy.

use std::time::Duration;

use url::Url;

use crate::error::TransportError;

/// Fixed vendor origin. The trailing slash matters: every endpoint path
/// is joined relative to it.
pub const DEFAULT_BASE_URL: &str = "https://www2.hthomeservice.com/";

const USER_AGENT: &str = concat!("hthome/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    /// Per-request deadline. Applies to the replayed request separately.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Config pointing at an alternative origin (tests, staging).
    ///
    /// A missing trailing slash is added so relative joins keep the path.
    pub fn with_base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// No cookie store is installed: the session token is attached
    /// explicitly per request so a refresh swaps it atomically.
    pub fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))
    }
}

fn default_base_url() -> Url {
    match Url::parse(DEFAULT_BASE_URL) {
        Ok(url) => url,
        Err(e) => unreachable!("DEFAULT_BASE_URL is a valid URL: {e}"),
    }
}
