// Host-facing accessory identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace under which device ids are hashed into accessory ids.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a9e_4b7d_5e30_9a8c_3d21_f0e4_b756);

/// Deterministic identifier a host registry keys accessories by.
///
/// A UUID v5 of the vendor's stable device id, so the same device maps to
/// the same accessory across restarts and cache reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessoryId(Uuid);

impl AccessoryId {
    pub fn for_device(device_id: &str) -> Self {
        Self(Uuid::new_v5(&ACCESSORY_NAMESPACE, device_id.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccessoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_device_same_id() {
        assert_eq!(AccessoryId::for_device("L-1"), AccessoryId::for_device("L-1"));
        assert_ne!(AccessoryId::for_device("L-1"), AccessoryId::for_device("L-2"));
    }

    #[test]
    fn ids_are_version_5() {
        assert_eq!(AccessoryId::for_device("L-1").as_uuid().get_version_num(), 5);
    }
}
