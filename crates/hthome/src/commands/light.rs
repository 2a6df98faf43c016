//! Light command handlers.

use serde::Serialize;

use hthome_core::{DeviceController, Light, Power};

use crate::cli::{GlobalOpts, LightArgs, LightCommand};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LightStatus {
    id: String,
    name: String,
    power: Power,
}

fn detail(s: &LightStatus, color: bool) -> String {
    [
        format!("ID:       {}", s.id),
        format!("Name:     {}", s.name),
        format!("Power:    {}", output::power_label(s.power.is_on(), color)),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: LightArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (id, action) = match args.command {
        LightCommand::Status { id } => (id, None),
        LightCommand::On { id } => (id, Some(Power::On)),
        LightCommand::Off { id } => (id, Some(Power::Off)),
    };

    let platform = super::one_shot_platform(global);
    platform.discover_devices().await?;

    let result = match platform.light(&id).await {
        Ok(light) => run(&light, action, global).await,
        Err(e) => Err(e.into()),
    };

    platform.shutdown().await;
    result
}

async fn run(
    light: &DeviceController<Light>,
    action: Option<Power>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let record = light.record();

    if let Some(power) = action {
        light.send_command(&power).await?;
        if !global.quiet {
            eprintln!("✓ Turned {power} {}", record.display_name);
        }
        return Ok(());
    }

    let status = LightStatus {
        id: record.id.clone(),
        name: record.display_name.clone(),
        power: light.poll_state().await?,
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &status,
        |s| detail(s, color),
        |s| s.power.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
