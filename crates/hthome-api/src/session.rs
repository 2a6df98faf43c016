// Session management
//
// Owns the session token and reproduces the vendor's three-hop
// authorization: login (cookie token) → household lookup → household-scoped
// token upgrade. The token is only installed once all three hops succeed,
// so callers never observe a half-authorized session.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{COOKIE, SET_COOKIE};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use url::Url;

use crate::credential::{CredentialCodec, Credentials};
use crate::error::{AuthError, DecodeError, RefreshError, TransportError};
use crate::models::{
    AuthorizeRequest, HouseholdContext, HouseholdResponse, LoginErrorBody, LoginRequest,
};

pub(crate) const LOGIN_PATH: &str = "login";
pub(crate) const HOUSEHOLD_PATH: &str = "proxy/bearer/api/v1/user/danji/household";
pub(crate) const AUTHORIZE_PATH: &str = "getctoctoken";
const CLIENT_ID: &str = "HT-WEB";

/// Opaque session token: the first `Set-Cookie` pair of the login response.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(Arc<str>);

impl Token {
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    /// Value for the `Cookie` request header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(****)")
    }
}

/// Coarse session state visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Fine-grained refresh progress, published for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    AwaitingHousehold,
    AwaitingAuthorization,
    Authenticated,
}

/// Single owner of the process's session token.
///
/// Shared behind an `Arc` by the resilient client and every device
/// controller. The token lives in an `ArcSwapOption` so readers never block
/// and a refresh replaces it in one store.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    codec: CredentialCodec,
    token: ArcSwapOption<Token>,
    phase: watch::Sender<SessionPhase>,
    /// Serialises refreshes; see [`refresh_if_stale`](Self::refresh_if_stale).
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Unauthenticated);
        Self {
            http,
            base_url,
            credentials,
            codec: CredentialCodec,
            token: ArcSwapOption::empty(),
            phase,
            refresh_lock: Mutex::new(()),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The currently installed token, if any.
    pub fn token(&self) -> Option<Token> {
        self.token.load_full().map(|t| Token::clone(&t))
    }

    pub fn state(&self) -> SessionState {
        if self.token.load().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Protocol steps ───────────────────────────────────────────────

    /// `POST login` with encrypted credentials.
    ///
    /// Returns the token carried by the first `Set-Cookie` header. The token
    /// is *not* installed; [`refresh`](Self::refresh) does that.
    pub async fn login(&self) -> Result<Token, AuthError> {
        let url = self.base_url.join(LOGIN_PATH)?;
        let (id, password) = self.codec.encrypt_credentials(&self.credentials);

        info!("logging in to get access token");
        let resp = self
            .http
            .post(url)
            .json(&LoginRequest {
                id: &id,
                password: &password,
                remember_me: false,
            })
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = resp.status();
        if status.is_success() {
            return extract_token(resp.headers()).ok_or(AuthError::MissingToken);
        }

        let body = resp.text().await.map_err(TransportError::Network)?;
        let failure: LoginErrorBody = serde_json::from_str(&body)
            .map_err(|e| DecodeError::new("login error payload", &e, &body))?;
        debug!(code = failure.error_code, %status, "login rejected");

        Err(AuthError::from_login_code(
            failure.error_code,
            failure.error_message,
            failure.result_data.map(|d| d.login_fail_count),
        ))
    }

    /// Fetch the account's residences and pick the first approved one.
    pub async fn resolve_household(&self, token: &Token) -> Result<HouseholdContext, AuthError> {
        let url = self.base_url.join(HOUSEHOLD_PATH)?;
        debug!("fetching household information");

        let resp = self
            .http
            .get(url)
            .header(COOKIE, token.as_str())
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(
                TransportError::unexpected_status("fetch household information", status).into(),
            );
        }

        let body = resp.text().await.map_err(TransportError::Network)?;
        let household: HouseholdResponse = serde_json::from_str(&body)
            .map_err(|e| DecodeError::new("household list", &e, &body))?;

        household
            .result_data
            .danji_list
            .into_iter()
            .find(|d| d.is_approved)
            .map(HouseholdContext::from)
            .ok_or(AuthError::NoApprovedHousehold)
    }

    /// Upgrade `token` to household-scoped authorization.
    pub async fn authorize(&self, token: &Token, ctx: &HouseholdContext) -> Result<(), AuthError> {
        let url = self.base_url.join(AUTHORIZE_PATH)?;
        debug!(site_id = %ctx.site_id, "requesting household authorization");

        let resp = self
            .http
            .post(url)
            .header(COOKIE, token.as_str())
            .json(&AuthorizeRequest {
                household: ctx,
                client_id: CLIENT_ID,
            })
            .send()
            .await
            .map_err(TransportError::Network)?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AuthError::AuthorizationRejected { status })
        }
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Run login → household → authorization and install the new token.
    ///
    /// On any failure the session drops back to unauthenticated and the
    /// failing step is returned as the cause.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh unless another caller already replaced `observed`.
    ///
    /// `observed` is the token a request was sent with before it got a 401.
    /// If a concurrent refresh has installed a different token in the
    /// meantime, this returns without hitting the login endpoint again.
    pub async fn refresh_if_stale(&self, observed: Option<&Token>) -> Result<(), RefreshError> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.token();
        if current.is_some() && current.as_ref() != observed {
            debug!("session already refreshed by a concurrent request");
            return Ok(());
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<(), RefreshError> {
        match self.run_refresh().await {
            Ok(token) => {
                self.token.store(Some(Arc::new(token)));
                self.phase.send_replace(SessionPhase::Authenticated);
                info!("finished refreshing access token");
                Ok(())
            }
            Err(cause) => {
                self.token.store(None);
                self.phase.send_replace(SessionPhase::Unauthenticated);
                warn!(error = %cause, "access token refresh failed");
                Err(RefreshError::from(cause))
            }
        }
    }

    async fn run_refresh(&self) -> Result<Token, AuthError> {
        let token = self.login().await?;

        self.phase.send_replace(SessionPhase::AwaitingHousehold);
        let household = self.resolve_household(&token).await?;

        self.phase.send_replace(SessionPhase::AwaitingAuthorization);
        self.authorize(&token, &household).await?;

        Ok(token)
    }
}

/// First `Set-Cookie` value, cut at the first `;`.
fn extract_token(headers: &reqwest::header::HeaderMap) -> Option<Token> {
    let first = headers.get_all(SET_COOKIE).iter().next()?;
    let raw = first.to_str().ok()?;
    let pair = raw.split(';').next().unwrap_or(raw).trim();
    if pair.is_empty() {
        None
    } else {
        Some(Token::new(pair))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue};

    use super::*;

    #[test]
    fn token_is_first_cookie_pair() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("SESSION=abc123; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("OTHER=zzz; Path=/"));
        assert_eq!(extract_token(&headers).unwrap().as_str(), "SESSION=abc123");
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert!(extract_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn cookie_without_attributes() {
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, HeaderValue::from_static("SESSION=plain"));
        assert_eq!(extract_token(&headers).unwrap().as_str(), "SESSION=plain");
    }

    #[test]
    fn token_debug_is_redacted() {
        assert_eq!(format!("{:?}", Token::new("SESSION=secret")), "Token(****)");
    }
}
