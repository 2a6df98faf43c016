//! Command handlers.

pub mod config_cmd;
pub mod devices;
pub mod light;
pub mod watch;

use std::sync::Arc;

use hthome_core::{AccessoryInfo, AccessoryRegistry, ErrorSink, Platform, TracingSink};
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::config;

/// Registry for one-shot commands: nothing is persisted, changes are only
/// traced.
pub struct LogRegistry;

impl AccessoryRegistry for LogRegistry {
    fn register(&self, accessory: &AccessoryInfo) {
        debug!(id = %accessory.id, name = accessory.display_name(), "register");
    }

    fn restore(&self, accessory: &AccessoryInfo) {
        debug!(id = %accessory.id, name = accessory.display_name(), "restore");
    }

    fn unregister(&self, accessory: &AccessoryInfo) {
        debug!(id = %accessory.id, name = accessory.display_name(), "unregister");
    }
}

/// Build the platform from config + flags. An invalid configuration
/// yields a disabled platform.
pub fn platform(
    global: &GlobalOpts,
    registry: Arc<dyn AccessoryRegistry>,
    sink: Arc<dyn ErrorSink>,
) -> Platform {
    Platform::new(config::session_config(global), registry, sink)
}

/// Platform with the log-only registry and the tracing error sink.
pub fn one_shot_platform(global: &GlobalOpts) -> Platform {
    platform(global, Arc::new(LogRegistry), Arc::new(TracingSink))
}
