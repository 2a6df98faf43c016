//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use hthome_core::{CoreError, DeviceCategory, DeviceRecord, supported_categories};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Supported")]
    supported: String,
}

#[derive(Serialize)]
struct DeviceEntry<'a> {
    #[serde(flatten)]
    record: &'a DeviceRecord,
    supported: bool,
}

fn is_supported(supported: &[DeviceCategory], record: &DeviceRecord) -> bool {
    supported.contains(&record.category)
}

impl From<&DeviceEntry<'_>> for DeviceRow {
    fn from(e: &DeviceEntry<'_>) -> Self {
        Self {
            id: e.record.id.clone(),
            name: e.record.display_name.clone(),
            category: e.record.category.to_string(),
            location: e.record.location.clone(),
            supported: if e.supported { "yes" } else { "-" }.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let platform = super::one_shot_platform(global);
            let devices = platform
                .client()?
                .discover()
                .await
                .map_err(CoreError::from)?;

            let supported = supported_categories();
            let entries: Vec<DeviceEntry<'_>> = devices
                .iter()
                .map(|record| DeviceEntry {
                    record,
                    supported: is_supported(&supported, record),
                })
                .collect();

            let out = output::render_list(
                global.output,
                &entries,
                |e| DeviceRow::from(e),
                |e| e.record.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
