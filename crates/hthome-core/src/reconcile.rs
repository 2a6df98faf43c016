// ── Known-device reconciliation ──
//
// Diffs the host's previous accessory set against one discovery result.
// Pure: callers apply the returned decisions themselves.

use std::collections::HashSet;

use hthome_api::{DeviceCategory, DeviceRecord};
use indexmap::IndexMap;

use crate::identity::AccessoryId;

/// What to do with one accessory after a discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<H> {
    /// Newly discovered device; the host has no accessory for it yet.
    Add { id: AccessoryId, record: DeviceRecord },
    /// Device still present; reuse the existing handle.
    Keep {
        id: AccessoryId,
        record: DeviceRecord,
        handle: H,
    },
    /// Device absent from discovery; tear the handle down.
    Remove { id: AccessoryId, handle: H },
}

impl<H> Decision<H> {
    pub fn id(&self) -> AccessoryId {
        match self {
            Self::Add { id, .. } | Self::Keep { id, .. } | Self::Remove { id, .. } => *id,
        }
    }
}

/// Compute Add/Keep/Remove decisions.
///
/// Add and Keep follow `discovered` order, then Remove follows `previous`
/// order. Records whose category is not in `supported` are skipped
/// entirely: they are neither added nor kept, and a previous entry with the
/// same id is not removed either. A device id listed twice in one discovery
/// is handled once, at its first occurrence.
pub fn reconcile<H: Clone>(
    previous: &IndexMap<AccessoryId, H>,
    discovered: Vec<DeviceRecord>,
    supported: &[DeviceCategory],
) -> Vec<Decision<H>> {
    let mut seen: HashSet<AccessoryId> = HashSet::with_capacity(discovered.len());
    let mut decisions = Vec::with_capacity(discovered.len());

    for record in discovered {
        let id = AccessoryId::for_device(&record.id);
        if !seen.insert(id) {
            continue;
        }
        if !supported.contains(&record.category) {
            continue;
        }

        match previous.get(&id) {
            Some(handle) => decisions.push(Decision::Keep {
                id,
                record,
                handle: handle.clone(),
            }),
            None => decisions.push(Decision::Add { id, record }),
        }
    }

    decisions.extend(
        previous
            .iter()
            .filter(|(id, _)| !seen.contains(*id))
            .map(|(id, handle)| Decision::Remove {
                id: *id,
                handle: handle.clone(),
            }),
    );

    decisions
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn light(id: &str) -> DeviceRecord {
        DeviceRecord {
            id: id.into(),
            display_name: format!("Room {id} light"),
            category: DeviceCategory::Light,
            location: format!("Room {id}"),
        }
    }

    fn known(ids: &[&str]) -> IndexMap<AccessoryId, String> {
        ids.iter()
            .map(|id| (AccessoryId::for_device(id), format!("handle-{id}")))
            .collect()
    }

    fn id(device: &str) -> AccessoryId {
        AccessoryId::for_device(device)
    }

    #[test]
    fn keep_add_then_remove() {
        let decisions = reconcile(
            &known(&["A", "B"]),
            vec![light("B"), light("C")],
            &[DeviceCategory::Light],
        );

        assert_eq!(
            decisions,
            vec![
                Decision::Keep {
                    id: id("B"),
                    record: light("B"),
                    handle: "handle-B".to_owned(),
                },
                Decision::Add {
                    id: id("C"),
                    record: light("C"),
                },
                Decision::Remove {
                    id: id("A"),
                    handle: "handle-A".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn empty_discovery_removes_everything_in_order() {
        let decisions = reconcile(&known(&["A", "B"]), Vec::new(), &[DeviceCategory::Light]);
        let removed: Vec<_> = decisions.iter().map(Decision::id).collect();
        assert_eq!(removed, vec![id("A"), id("B")]);
        assert!(decisions.iter().all(|d| matches!(d, Decision::Remove { .. })));
    }

    #[test]
    fn unsupported_categories_are_left_alone() {
        let mut gas = light("G");
        gas.category = DeviceCategory::Gas;

        let decisions = reconcile(
            &known(&["G"]),
            vec![gas.clone(), light("L")],
            &[DeviceCategory::Light],
        );

        assert_eq!(
            decisions,
            vec![Decision::Add {
                id: id("L"),
                record: light("L"),
            }]
        );
    }

    #[test]
    fn duplicate_ids_are_emitted_once() {
        let mut renamed = light("A");
        renamed.display_name = "Other name".into();

        let decisions = reconcile(
            &known(&[]),
            vec![light("A"), renamed],
            &[DeviceCategory::Light],
        );

        assert_eq!(decisions.len(), 1);
        assert!(matches!(
            &decisions[0],
            Decision::Add { record, .. } if record.display_name == "Room A light"
        ));
    }

    #[test]
    fn applying_decisions_converges_to_discovery() {
        let mut set = known(&["A", "B", "D"]);
        let discovered = vec![light("C"), light("B"), light("E")];

        for decision in reconcile(&set, discovered, &[DeviceCategory::Light]) {
            match decision {
                Decision::Add { id, record } => {
                    set.insert(id, format!("handle-{}", record.id));
                }
                Decision::Keep { .. } => {}
                Decision::Remove { id, .. } => {
                    set.shift_remove(&id);
                }
            }
        }

        let mut ids: Vec<_> = set.keys().copied().collect();
        ids.sort();
        let mut expected = vec![id("B"), id("C"), id("E")];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
