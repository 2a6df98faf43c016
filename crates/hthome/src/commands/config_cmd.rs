//! Config subcommand handlers.

use hthome_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

fn redacted(cfg: &Config) -> Config {
    Config {
        password: cfg.password.as_ref().map(|_| MASK.into()),
        ..cfg.clone()
    }
}

/// Format config for display. Expects an already redacted config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref id) = cfg.id {
        let _ = writeln!(out, "id = \"{id}\"");
    }
    if let Some(ref pw) = cfg.password {
        let _ = writeln!(out, "password = \"{pw}\"");
    }
    if let Some(interval) = cfg.device_state_refresh_interval {
        let _ = writeln!(out, "device_state_refresh_interval = {interval}");
    }
    if let Some(ref url) = cfg.base_url {
        let _ = writeln!(out, "base_url = \"{url}\"");
    }
    let _ = writeln!(out, "timeout = {}", cfg.timeout);
    let _ = write!(out, "optimistic_updates = {}", cfg.optimistic_updates);

    out
}

fn parse_number(field: &str, value: &str) -> Result<u64, CliError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CliError::Validation {
            field: field.into(),
            reason: "must be a positive number (seconds)".into(),
        }),
    }
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_with_overrides(global)?);
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;

            match key.as_str() {
                "id" => {
                    if value.trim().is_empty() {
                        return Err(CliError::Validation {
                            field: "id".into(),
                            reason: "must not be empty".into(),
                        });
                    }
                    cfg.id = Some(value);
                }
                "device_state_refresh_interval" | "refresh-interval" => {
                    cfg.device_state_refresh_interval =
                        Some(parse_number("device_state_refresh_interval", &value)?);
                }
                "base_url" | "base-url" => {
                    if value.parse::<url::Url>().is_err() {
                        return Err(CliError::Validation {
                            field: "base_url".into(),
                            reason: format!("invalid URL: {value}"),
                        });
                    }
                    cfg.base_url = Some(value);
                }
                "timeout" => cfg.timeout = parse_number("timeout", &value)?,
                "optimistic_updates" | "optimistic-updates" => {
                    cfg.optimistic_updates =
                        value.parse().map_err(|_| CliError::Validation {
                            field: "optimistic_updates".into(),
                            reason: "must be 'true' or 'false'".into(),
                        })?;
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: id, \
                             device_state_refresh_interval, base_url, timeout, optimistic_updates"
                        ),
                    });
                }
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} in {}", path.display());
            }
            Ok(())
        }

        // ── Set password ────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_with_overrides(global)?;
            let id = cfg.id.ok_or_else(|| CliError::Validation {
                field: "id".into(),
                reason: "set the account first: hthome config set id <ID>".into(),
            })?;

            let password = rpassword::prompt_password(format!("Password for {id}: "))
                .map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }

            config::store_password(&id, &password)?;
            if !global.quiet {
                eprintln!("✓ Password for {id} stored in system keyring");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_only_the_password() {
        let cfg = Config {
            id: Some("someone".into()),
            password: Some("hunter2".into()),
            device_state_refresh_interval: Some(10),
            base_url: None,
            timeout: 30,
            optimistic_updates: false,
        };
        let shown = format_config(&redacted(&cfg));
        assert!(shown.contains("password = \"****\""), "{shown}");
        assert!(!shown.contains("hunter2"), "{shown}");
        assert!(shown.contains("id = \"someone\""), "{shown}");
    }

    #[test]
    fn numbers_must_be_positive() {
        assert_eq!(parse_number("timeout", "5").ok(), Some(5));
        assert!(parse_number("timeout", "0").is_err());
        assert!(parse_number("timeout", "soon").is_err());
    }
}
