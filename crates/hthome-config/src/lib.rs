//! Configuration for the hthome host.
//!
//! TOML file + `HTHOME_*` environment, credential resolution
//! (env + keyring + plaintext), and translation to
//! `hthome_core::SessionConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hthome_api::{Credentials, TransportConfig};
use hthome_core::{CoreError, SessionConfig};

/// Keyring service name; entries are keyed by account id.
pub const KEYRING_SERVICE: &str = "hthome";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "HTHOME_CONFIG";

const ENV_PREFIX: &str = "HTHOME_";
const PASSWORD_ENV: &str = "HTHOME_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing required setting '{field}'")]
    Missing { field: &'static str },

    #[error("no password configured for '{id}'")]
    NoPassword { id: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Config {
            message: err.to_string(),
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// On-disk configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Account identifier.
    pub id: Option<String>,

    /// Plaintext password. The keyring and `HTHOME_PASSWORD` take precedence.
    pub password: Option<String>,

    /// Seconds between two state polls of one device.
    pub device_state_refresh_interval: Option<u64>,

    /// Alternative API origin.
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Publish commanded state before the next poll confirms it.
    #[serde(default)]
    pub optimistic_updates: bool,
}

fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `HTHOME_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("com", "hthome", "hthome").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("hthome");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file is not an
/// error; environment variables alone can configure everything.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config {
            timeout: default_timeout(),
            ..Config::default()
        }))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["password", "config"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the account password.
///
/// Order: `HTHOME_PASSWORD`, system keyring entry for `id`, plaintext in
/// the config file.
pub fn resolve_password(cfg: &Config, id: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, id) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = cfg.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoPassword { id: id.into() })
}

/// Store `password` in the system keyring under `id`.
pub fn store_password(id: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, id)
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to SessionConfig ────────────────────────────────────

/// Build a validated `SessionConfig`.
pub fn to_session_config(cfg: &Config) -> Result<SessionConfig, ConfigError> {
    let id = cfg
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(ConfigError::Missing { field: "id" })?;
    let password = resolve_password(cfg, id)?;

    let interval = cfg
        .device_state_refresh_interval
        .ok_or(ConfigError::Missing {
            field: "device_state_refresh_interval",
        })?;
    if interval == 0 {
        return Err(ConfigError::Validation {
            field: "device_state_refresh_interval".into(),
            reason: "must be greater than zero".into(),
        });
    }
    if cfg.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let mut transport = TransportConfig::default().with_timeout(Duration::from_secs(cfg.timeout));
    if let Some(ref raw) = cfg.base_url {
        let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
        transport = transport.with_base_url(url);
    }

    let session = SessionConfig::new(
        Credentials::new(id, password),
        Duration::from_secs(interval),
    )
    .map_err(|e| ConfigError::Validation {
        field: "credentials".into(),
        reason: e.to_string(),
    })?;

    Ok(session
        .with_transport(transport)
        .with_optimistic_updates(cfg.optimistic_updates))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;

    use super::*;

    fn complete() -> Config {
        Config {
            id: Some("someone".into()),
            password: Some("pw".into()),
            device_state_refresh_interval: Some(10),
            base_url: None,
            timeout: 30,
            optimistic_updates: false,
        }
    }

    #[test]
    fn file_and_env_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    id = "from-file"
                    device_state_refresh_interval = 5
                "#,
            )?;
            jail.set_env("HTHOME_DEVICE_STATE_REFRESH_INTERVAL", "15");
            jail.set_env("HTHOME_TIMEOUT", "7");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.id.as_deref(), Some("from-file"));
            assert_eq!(cfg.device_state_refresh_interval, Some(15));
            assert_eq!(cfg.timeout, 7);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("nope.toml")).unwrap();
            assert_eq!(cfg.id, None);
            assert_eq!(cfg.timeout, 30);
            Ok(())
        });
    }

    #[test]
    fn password_env_is_not_read_into_the_file_field() {
        Jail::expect_with(|jail| {
            jail.set_env("HTHOME_PASSWORD", "from-env");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.password, None);
            Ok(())
        });
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        save_config_to(&path, &complete()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("device_state_refresh_interval = 10"), "{text}");
    }

    #[test]
    fn complete_config_translates() {
        let mut cfg = complete();
        cfg.base_url = Some("http://127.0.0.1:9999".into());
        cfg.optimistic_updates = true;

        let session = to_session_config(&cfg).unwrap();
        assert_eq!(session.credentials.id(), "someone");
        assert_eq!(session.poll_interval, Duration::from_secs(10));
        assert_eq!(session.transport.base_url.as_str(), "http://127.0.0.1:9999/");
        assert!(session.optimistic_updates);
    }

    #[test]
    fn missing_interval_is_rejected() {
        let mut cfg = complete();
        cfg.device_state_refresh_interval = None;
        assert!(matches!(
            to_session_config(&cfg),
            Err(ConfigError::Missing {
                field: "device_state_refresh_interval"
            })
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut cfg = complete();
        cfg.device_state_refresh_interval = Some(0);
        assert!(matches!(
            to_session_config(&cfg),
            Err(ConfigError::Validation { ref field, .. }) if field == "device_state_refresh_interval"
        ));
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut cfg = complete();
        cfg.id = Some("  ".into());
        assert!(matches!(
            to_session_config(&cfg),
            Err(ConfigError::Missing { field: "id" })
        ));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let mut cfg = complete();
        cfg.base_url = Some("not a url".into());
        assert!(matches!(
            to_session_config(&cfg),
            Err(ConfigError::Validation { ref field, .. }) if field == "base_url"
        ));
    }

    #[test]
    fn config_errors_become_core_config_errors() {
        let core: CoreError = ConfigError::Missing { field: "id" }.into();
        assert!(matches!(core, CoreError::Config { .. }));
    }
}
