//! CLI-aware wrappers around `hthome-config`: apply global flag overrides
//! before translating into `hthome_core::SessionConfig`.

use hthome_config::Config;
use hthome_core::{CoreError, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use hthome_config::{config_path, load_config, save_config, store_password};

/// Load the config file + environment, then apply CLI flags on top.
pub fn load_with_overrides(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref id) = global.id {
        cfg.id = Some(id.clone());
    }
    if let Some(interval) = global.refresh_interval {
        cfg.device_state_refresh_interval = Some(interval);
    }
    if let Some(ref base_url) = global.base_url {
        cfg.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
}

/// Build the session configuration for commands that talk to the cloud.
///
/// Errors are returned as `CoreError` so they can be handed to
/// `Platform::new`, which turns them into a disabled platform.
pub fn session_config(global: &GlobalOpts) -> Result<SessionConfig, CoreError> {
    let cfg = load_config()
        .map(|mut cfg| {
            apply_overrides(&mut cfg, global);
            cfg
        })
        .map_err(CoreError::from)?;
    Ok(hthome_config::to_session_config(&cfg)?)
}
