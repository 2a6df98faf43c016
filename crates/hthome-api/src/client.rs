// Resilient HTTP client
//
// Wraps `reqwest::Client` with session-token injection and the one-shot
// refresh-and-replay on HTTP 401. Endpoint modules (devices, etc.) are
// implemented as inherent methods in separate files so this module stays
// focused on transport mechanics.

use std::sync::Arc;

use reqwest::header::COOKIE;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};
use url::Url;

use crate::credential::Credentials;
use crate::error::{DecodeError, Error, TransportError};
use crate::session::{SessionManager, Token};
use crate::transport::TransportConfig;

/// HTTP client for the HT Home Service API.
///
/// Cheap to share behind an `Arc`. Every request carries the session token
/// current at dispatch time. A 401 triggers at most one session refresh and
/// one replay per logical call.
pub struct HtClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<SessionManager>,
}

impl HtClient {
    /// Build a client and its session manager from a transport config.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let session = Arc::new(SessionManager::new(
            http.clone(),
            transport.base_url.clone(),
            credentials,
        ));
        Ok(Self {
            http,
            base_url: transport.base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Verbs ────────────────────────────────────────────────────────

    /// `GET {base}/{path}`; non-401 statuses pass through untouched.
    pub async fn get(&self, path: &str) -> Result<Response, Error> {
        self.execute(Method::GET, path, None).await
    }

    /// `POST {base}/{path}` with a JSON body.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> Result<Response, Error> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// `PUT {base}/{path}` with a JSON body.
    pub async fn put(&self, path: &str, body: &serde_json::Value) -> Result<Response, Error> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, Error> {
        let url = self.base_url.join(path)?;
        debug!("{method} {url}");

        let observed = self.session.token();
        let resp = self
            .send_once(method.clone(), url.clone(), body, observed.as_ref())
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        info!("access token expired, refreshing");
        if let Err(e) = self.session.refresh_if_stale(observed.as_ref()).await {
            error!(error = %e, "{method} {url}: session refresh failed");
            return Ok(resp);
        }

        debug!("{method} {url} (replay)");
        let replay_token = self.session.token();
        self.send_once(method, url, body, replay_token.as_ref())
            .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        token: Option<&Token>,
    ) -> Result<Response, Error> {
        let mut builder = self.http.request(method, url);
        if let Some(token) = token {
            builder = builder.header(COOKIE, token.as_str());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await.map_err(TransportError::Network)?)
    }
}

// ── Response helpers ─────────────────────────────────────────────────

/// Turn a non-2xx response into `TransportError::Status`.
pub fn ensure_success(resp: Response, action: &str) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(TransportError::unexpected_status(action, status).into())
    }
}

/// Read the body and decode it as `T`, keeping a preview on mismatch.
pub async fn decode_json<T: DeserializeOwned>(
    resp: Response,
    what: &'static str,
) -> Result<T, Error> {
    let body = resp.text().await.map_err(TransportError::Network)?;
    serde_json::from_str(&body).map_err(|e| DecodeError::new(what, &e, &body).into())
}
