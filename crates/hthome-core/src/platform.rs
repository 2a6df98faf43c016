// ── Host-facing platform ──
//
// Owns the shared client, the Known Device Set and one controller per
// supported device. Hosts drive it with `discover_devices()` at startup and
// whenever they are ready, and learn about accessory changes through an
// `AccessoryRegistry`.

use std::sync::Arc;

use hthome_api::{DeviceCategory, DeviceKind, DeviceRecord, HtClient, Light};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::device::{ControllerOptions, DeviceController, ErrorSink};
use crate::error::CoreError;
use crate::identity::AccessoryId;
use crate::reconcile::{Decision, reconcile};

/// Categories this platform creates accessories for, one per device kind
/// it can drive.
pub fn supported_categories() -> Vec<DeviceCategory> {
    vec![Light::category()]
}

const MANUFACTURER: &str = "Hyundai HT";

// ── Accessory ────────────────────────────────────────────────────

/// What a host persists for one accessory between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    pub id: AccessoryId,
    pub device: DeviceRecord,
}

impl AccessoryInfo {
    pub fn new(device: DeviceRecord) -> Self {
        Self {
            id: AccessoryId::for_device(&device.id),
            device,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.device.display_name
    }

    pub fn manufacturer(&self) -> &'static str {
        MANUFACTURER
    }

    pub fn model(&self) -> &str {
        &self.device.display_name
    }

    pub fn serial_number(&self) -> &str {
        &self.device.id
    }
}

/// A known accessory and, once discovery confirmed it, its controller.
#[derive(Debug, Clone)]
pub struct Accessory {
    pub info: AccessoryInfo,
    controller: Option<DeviceController<Light>>,
}

impl Accessory {
    pub fn controller(&self) -> Option<&DeviceController<Light>> {
        self.controller.as_ref()
    }
}

/// Host registry notified of accessory lifecycle changes.
pub trait AccessoryRegistry: Send + Sync {
    /// A device was discovered for the first time.
    fn register(&self, accessory: &AccessoryInfo);
    /// A cached accessory was confirmed by discovery.
    fn restore(&self, accessory: &AccessoryInfo);
    /// A cached accessory is gone from the account.
    fn unregister(&self, accessory: &AccessoryInfo);
}

/// Counts of one applied discovery cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscoverySummary {
    pub added: usize,
    pub kept: usize,
    pub removed: usize,
}

// ── Platform ─────────────────────────────────────────────────────

/// Orchestrates discovery, reconciliation and device controllers.
///
/// Built from a configuration result: an invalid configuration yields a
/// *disabled* platform whose operations log and return without touching
/// the network.
pub struct Platform {
    session: Result<Session, String>,
    registry: Arc<dyn AccessoryRegistry>,
    sink: Arc<dyn ErrorSink>,
    known: Mutex<IndexMap<AccessoryId, Accessory>>,
}

struct Session {
    client: Arc<HtClient>,
    options: ControllerOptions,
}

impl Platform {
    pub fn new(
        config: Result<SessionConfig, CoreError>,
        registry: Arc<dyn AccessoryRegistry>,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        let session = config.and_then(Session::from_config).map_err(|e| {
            error!("Cannot start HT Home Service session: {e}");
            e.to_string()
        });
        if session.is_ok() {
            debug!("finished initializing platform");
        }

        Self {
            session,
            registry,
            sink,
            known: Mutex::new(IndexMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_ok()
    }

    /// The shared client, unless the platform is disabled.
    pub fn client(&self) -> Result<&Arc<HtClient>, CoreError> {
        self.session().map(|s| &s.client)
    }

    fn session(&self) -> Result<&Session, CoreError> {
        self.session.as_ref().map_err(|reason| CoreError::Disabled {
            reason: reason.clone(),
        })
    }

    // ── Host cache ───────────────────────────────────────────────

    /// Seed the Known Device Set with an accessory restored from the host's
    /// cache. Its controller starts once discovery confirms the device.
    pub async fn configure_cached_accessory(&self, info: AccessoryInfo) {
        info!("Loading accessory from cache: {}", info.display_name());
        self.known.lock().await.insert(
            info.id,
            Accessory {
                info,
                controller: None,
            },
        );
    }

    /// Snapshot of the Known Device Set.
    pub async fn known_accessories(&self) -> Vec<AccessoryInfo> {
        self.known
            .lock()
            .await
            .values()
            .map(|a| a.info.clone())
            .collect()
    }

    /// Controller of the light with vendor id `device_id`.
    pub async fn light(&self, device_id: &str) -> Result<DeviceController<Light>, CoreError> {
        self.session()?;
        self.known
            .lock()
            .await
            .get(&AccessoryId::for_device(device_id))
            .and_then(|a| a.controller.clone())
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: device_id.to_owned(),
            })
    }

    // ── Discovery ────────────────────────────────────────────────

    /// Discover devices and reconcile the Known Device Set against them.
    ///
    /// A failed discovery leaves the set untouched.
    pub async fn discover_devices(&self) -> Result<DiscoverySummary, CoreError> {
        let session = self.session().inspect_err(|_| {
            error!("Cannot discover devices: The platform is not configured properly.");
        })?;

        let devices = session.client.discover().await.map_err(|e| {
            error!("{e}");
            CoreError::from(e)
        })?;

        let mut known = self.known.lock().await;
        let decisions = reconcile(&known, devices, &supported_categories());
        let mut summary = DiscoverySummary::default();

        for decision in decisions {
            match decision {
                Decision::Add { id, record } => {
                    let info = AccessoryInfo::new(record);
                    info!("Registering accessory for device: {}", info.display_name());
                    let controller = self.start_controller(session, &info);
                    self.registry.register(&info);
                    known.insert(
                        id,
                        Accessory {
                            info,
                            controller: Some(controller),
                        },
                    );
                    summary.added += 1;
                }
                Decision::Keep { id, record, .. } => {
                    let Some(accessory) = known.get_mut(&id) else {
                        continue;
                    };
                    accessory.info.device = record;
                    info!(
                        "Restoring existing accessory from cache: {}",
                        accessory.info.display_name()
                    );
                    if accessory.controller.is_none() {
                        accessory.controller =
                            Some(self.start_controller(session, &accessory.info));
                    }
                    self.registry.restore(&accessory.info);
                    summary.kept += 1;
                }
                Decision::Remove { id, handle } => {
                    info!(
                        "Removing existing accessory from cache: {}",
                        handle.info.display_name()
                    );
                    if let Some(controller) = &handle.controller {
                        controller.shutdown().await;
                    }
                    self.registry.unregister(&handle.info);
                    known.shift_remove(&id);
                    summary.removed += 1;
                }
            }
        }

        debug!(?summary, "discovery applied");
        Ok(summary)
    }

    /// Stop every controller. The Known Device Set is kept.
    pub async fn shutdown(&self) {
        let mut known = self.known.lock().await;
        for accessory in known.values_mut() {
            if let Some(controller) = accessory.controller.take() {
                controller.shutdown().await;
            }
        }
        debug!("platform shut down");
    }

    fn start_controller(&self, session: &Session, info: &AccessoryInfo) -> DeviceController<Light> {
        DeviceController::spawn(
            info.device.clone(),
            Arc::clone(&session.client),
            session.options,
            Arc::clone(&self.sink),
        )
    }
}

impl Session {
    fn from_config(config: SessionConfig) -> Result<Self, CoreError> {
        let client = HtClient::new(config.credentials, &config.transport)?;
        Ok(Self {
            client: Arc::new(client),
            options: ControllerOptions {
                poll_interval: config.poll_interval,
                optimistic: config.optimistic_updates,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_categories_follow_device_kinds() {
        let supported = supported_categories();
        assert_eq!(supported, vec![Light::category()]);
        assert!(supported.contains(&DeviceCategory::Light));
        assert!(!supported.contains(&DeviceCategory::Gas));
    }

    #[test]
    fn accessory_info_mirrors_device() {
        let info = AccessoryInfo::new(DeviceRecord {
            id: "L-1".into(),
            display_name: "Hall light".into(),
            category: DeviceCategory::Light,
            location: "Hall".into(),
        });
        assert_eq!(info.id, AccessoryId::for_device("L-1"));
        assert_eq!(info.model(), "Hall light");
        assert_eq!(info.serial_number(), "L-1");
        assert_eq!(info.manufacturer(), "Hyundai HT");
    }
}
