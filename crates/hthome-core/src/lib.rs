// hthome-core: Device reconciliation and polling between hthome-api and a host.

pub mod config;
pub mod device;
pub mod error;
pub mod identity;
pub mod platform;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SessionConfig;
pub use device::{ControllerOptions, DeviceController, DeviceState, ErrorSink, TracingSink};
pub use error::CoreError;
pub use identity::AccessoryId;
pub use platform::{
    Accessory, AccessoryInfo, AccessoryRegistry, DiscoverySummary, Platform, supported_categories,
};
pub use reconcile::{Decision, reconcile};

// Wire-level types consumers routinely need alongside the core API.
pub use hthome_api::{DeviceCategory, DeviceKind, DeviceRecord, Light, Power};
