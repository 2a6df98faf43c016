// hthome-api: Async Rust client for the HT Home Service smart-home cloud

pub mod client;
pub mod credential;
mod devices;
pub mod error;
pub mod kind;
pub mod models;
pub mod session;
pub mod transport;

pub use client::{HtClient, decode_json, ensure_success};
pub use credential::{CredentialCodec, Credentials};
pub use error::{AuthError, DecodeError, Error, RefreshError, TransportError};
pub use kind::{DeviceKind, Light, Power};
pub use models::{DeviceCategory, DeviceDetail, DeviceRecord, HouseholdContext, StatusEntry};
pub use session::{SessionManager, SessionPhase, SessionState, Token};
pub use transport::{DEFAULT_BASE_URL, TransportConfig};

pub use reqwest::StatusCode;
