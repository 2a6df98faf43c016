// Device kinds
//
// A device kind knows its vendor category, its REST resource and how to map
// between the vendor's `{command, value}` pairs and a typed state. Adding a
// kind means implementing `DeviceKind`; the controller is generic over it.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Error;
use crate::models::{DeviceCategory, DeviceDetail, StatusEntry};

/// Per-category state mapping.
pub trait DeviceKind: Send + Sync + 'static {
    /// Typed state reported by the device.
    type State: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;
    /// Typed command accepted by the device.
    type Command: Clone + fmt::Debug + Send + Sync + 'static;

    /// Vendor category this kind handles.
    fn category() -> DeviceCategory;

    /// Plural path segment under `proxy/ctoc/`.
    const RESOURCE: &'static str;

    /// Interpret the first status entry of `detail`.
    fn decode_state(detail: &DeviceDetail) -> Result<Self::State, Error>;

    /// Build the command list for `command`.
    fn encode_command(command: &Self::Command) -> Vec<StatusEntry>;

    /// State that results from successfully issuing `command`.
    fn state_after(command: &Self::Command) -> Self::State;
}

/// First status entry, or `MalformedDeviceDetail` when the list is empty.
pub fn first_status(detail: &DeviceDetail) -> Result<&StatusEntry, Error> {
    detail
        .status_list
        .first()
        .ok_or_else(|| Error::MalformedDeviceDetail {
            device_id: detail.id.clone(),
        })
}

// ── Light ────────────────────────────────────────────────────────────

/// On/off light.
#[derive(Debug, Clone, Copy, Default)]
pub struct Light;

/// Light power state, as the vendor spells it on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    Off,
}

impl Power {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for Power {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

const POWER_COMMAND: &str = "power";

impl DeviceKind for Light {
    type State = Power;
    type Command = Power;

    fn category() -> DeviceCategory {
        DeviceCategory::Light
    }

    const RESOURCE: &'static str = "lights";

    fn decode_state(detail: &DeviceDetail) -> Result<Power, Error> {
        let entry = first_status(detail)?;
        entry
            .value
            .parse::<Power>()
            .map_err(|_| Error::UnexpectedStatus {
                device_id: detail.id.clone(),
                command: entry.command.clone(),
                value: entry.value.clone(),
            })
    }

    fn encode_command(command: &Power) -> Vec<StatusEntry> {
        vec![StatusEntry::new(POWER_COMMAND, command.to_string())]
    }

    fn state_after(command: &Power) -> Power {
        *command
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn detail(entries: &[(&str, &str)]) -> DeviceDetail {
        DeviceDetail {
            id: "L-1".into(),
            device_type: DeviceCategory::Light,
            status_list: entries
                .iter()
                .map(|(c, v)| StatusEntry::new(*c, *v))
                .collect(),
        }
    }

    #[test]
    fn light_decodes_first_entry() {
        assert_eq!(Light::decode_state(&detail(&[("power", "on")])).unwrap(), Power::On);
        assert_eq!(
            Light::decode_state(&detail(&[("power", "off"), ("power", "on")])).unwrap(),
            Power::Off
        );
    }

    #[test]
    fn empty_status_list_is_malformed() {
        let err = Light::decode_state(&detail(&[])).unwrap_err();
        assert!(matches!(err, Error::MalformedDeviceDetail { ref device_id } if device_id == "L-1"));
    }

    #[test]
    fn unknown_power_value_is_rejected() {
        let err = Light::decode_state(&detail(&[("power", "dim")])).unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { ref value, .. } if value == "dim"));
    }

    #[test]
    fn light_command_wire_shape() {
        assert_eq!(
            Light::encode_command(&Power::Off),
            vec![StatusEntry::new("power", "off")]
        );
        assert_eq!(Light::state_after(&Power::On), Power::On);
    }
}
