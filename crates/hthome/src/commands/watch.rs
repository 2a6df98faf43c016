//! `watch`: discovery + per-device polling until Ctrl-C.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use owo_colors::OwoColorize;
use serde_json::json;
use tokio::task::JoinSet;
use tokio::time::Interval;
use tracing::{info, warn};

use hthome_core::{
    AccessoryId, AccessoryInfo, AccessoryRegistry, CoreError, DeviceRecord, ErrorSink, Platform,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

// ── Host seams ──────────────────────────────────────────────────────

struct ConsoleRegistry {
    color: bool,
    quiet: bool,
}

impl ConsoleRegistry {
    fn announce(&self, marker: &str, verb: &str, accessory: &AccessoryInfo) {
        if self.quiet {
            return;
        }
        let name = accessory.display_name();
        if self.color {
            eprintln!("{} {verb} {} ({})", marker.cyan(), name.bold(), accessory.serial_number());
        } else {
            eprintln!("{marker} {verb} {name} ({})", accessory.serial_number());
        }
    }
}

impl AccessoryRegistry for ConsoleRegistry {
    fn register(&self, accessory: &AccessoryInfo) {
        self.announce("+", "found", accessory);
    }

    fn restore(&self, accessory: &AccessoryInfo) {
        self.announce("=", "still present", accessory);
    }

    fn unregister(&self, accessory: &AccessoryInfo) {
        self.announce("-", "gone", accessory);
    }
}

struct ConsoleSink {
    color: bool,
}

impl ErrorSink for ConsoleSink {
    fn report(&self, device: &DeviceRecord, error: &CoreError) {
        warn!(device = %device.id, "{error}");
        if self.color {
            eprintln!("{} {}: {error}", "✗".red(), device.display_name);
        } else {
            eprintln!("✗ {}: {error}", device.display_name);
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let platform = super::platform(
        global,
        Arc::new(ConsoleRegistry {
            color,
            quiet: global.quiet,
        }),
        Arc::new(ConsoleSink { color }),
    );

    let mut watchers = JoinSet::new();
    let mut watched = HashSet::new();

    // The first discovery must succeed; later ones only log.
    discover_and_watch(&platform, &mut watchers, &mut watched, global, color).await?;

    let mut rediscover = (args.rediscover > 0).then(|| {
        tokio::time::interval(Duration::from_secs(args.rediscover))
    });
    if let Some(ref mut interval) = rediscover {
        interval.tick().await; // consume the immediate first tick
    }

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            () = next_tick(rediscover.as_mut()) => {
                if let Err(e) =
                    discover_and_watch(&platform, &mut watchers, &mut watched, global, color).await
                {
                    warn!(error = %e, "rediscovery failed");
                }
            }
        }
    }

    info!("shutting down");
    watchers.abort_all();
    platform.shutdown().await;
    Ok(())
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Run one discovery cycle and start a state printer for every light that
/// does not have one yet.
async fn discover_and_watch(
    platform: &Platform,
    watchers: &mut JoinSet<()>,
    watched: &mut HashSet<AccessoryId>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    platform.discover_devices().await?;

    let known = platform.known_accessories().await;
    let present: HashSet<AccessoryId> = known.iter().map(|a| a.id).collect();
    watched.retain(|id| present.contains(id));

    for accessory in known {
        if watched.contains(&accessory.id) {
            continue;
        }
        let Ok(light) = platform.light(&accessory.device.id).await else {
            continue;
        };
        watched.insert(accessory.id);

        let mut rx = light.subscribe();
        let format = global.output;
        let quiet = global.quiet;
        watchers.spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let (Some(power), Some(at)) = (state.current(), state.updated_at) else {
                    continue;
                };
                if quiet {
                    continue;
                }
                let line = match format {
                    OutputFormat::Json | OutputFormat::JsonCompact => json!({
                        "id": accessory.device.id,
                        "name": accessory.display_name(),
                        "power": power,
                        "at": at,
                    })
                    .to_string(),
                    OutputFormat::Table | OutputFormat::Plain => format!(
                        "[{}] {}: {}",
                        at.with_timezone(&Local).format("%H:%M:%S"),
                        accessory.display_name(),
                        output::power_label(power.is_on(), color),
                    ),
                };
                output::print_output(&line, false);
            }
        });
    }

    Ok(())
}
