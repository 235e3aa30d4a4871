//! Tests for the runtime module.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use crate::geometry::{Location, ParcelId, RegionBounds};

use super::providers::{CapabilityCheck, EconomyProvider, Messenger, WorldAdapter};
use super::region::{Parcel, Region};
use super::snapshot::WorldSnapshot;

pub(super) const WORLD: &str = "overworld";
pub(super) const REGION: &str = "alpha";

pub(super) fn loc(x: f64, z: f64) -> Location {
    Location::new(WORLD, x, 64.0, z)
}

pub(super) fn test_region() -> Region {
    Region::new(
        REGION,
        WORLD,
        RegionBounds {
            min_x: 0.0,
            min_z: 0.0,
            max_x: 1024.0,
            max_z: 1024.0,
        },
    )
}

pub(super) fn claimed(region: &mut Region, x: i32, z: i32, owner: &str) {
    let id = ParcelId::new(x, z);
    let mut parcel = Parcel::new(id, region.id.clone());
    parcel.owner = Some(owner.to_string());
    region.parcels.insert(id, parcel);
}

pub(super) fn unowned(region: &mut Region, x: i32, z: i32) {
    let id = ParcelId::new(x, z);
    region.parcels.insert(id, Parcel::new(id, region.id.clone()));
}

pub(super) fn snapshot_of(region: Region) -> WorldSnapshot {
    WorldSnapshot::new(vec![region])
}

/// Capability authority backed by explicit (actor, capability) grants.
#[derive(Default)]
pub(super) struct StaticCaps {
    grants: BTreeSet<(String, String)>,
}

impl StaticCaps {
    pub(super) fn grant(mut self, actor: &str, capability: &str) -> Self {
        self.grants
            .insert((actor.to_string(), capability.to_string()));
        self
    }
}

impl CapabilityCheck for StaticCaps {
    fn has_capability(&self, actor: &str, capability: &str) -> bool {
        self.grants
            .contains(&(actor.to_string(), capability.to_string()))
    }
}

/// Messenger recording every notification for assertions.
#[derive(Default)]
pub(super) struct RecordingMessenger {
    pub(super) sent: Mutex<Vec<(String, String, BTreeMap<String, String>)>>,
}

impl RecordingMessenger {
    pub(super) fn keys_for(&self, actor: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _, _)| to == actor)
            .map(|(_, key, _)| key.clone())
            .collect()
    }
}

impl Messenger for RecordingMessenger {
    fn notify(&self, actor: &str, message_key: &str, args: &BTreeMap<String, String>) {
        self.sent.lock().unwrap().push((
            actor.to_string(),
            message_key.to_string(),
            args.clone(),
        ));
    }
}

/// Economy with fixed balances; enablement follows the region.
#[derive(Default)]
pub(super) struct FixedEconomy {
    pub(super) balances: BTreeMap<String, f64>,
}

impl EconomyProvider for FixedEconomy {
    fn is_enabled(&self, region: &Region) -> bool {
        region.economy_enabled
    }

    fn balance(&self, actor: &str) -> f64 {
        self.balances.get(actor).copied().unwrap_or(0.0)
    }
}

/// World adapter with a single relocation switch.
pub(super) struct OpenWorld {
    pub(super) allow_relocation: bool,
}

impl WorldAdapter for OpenWorld {
    fn can_relocate(&self, _actor: &str, _location: &Location) -> bool {
        self.allow_relocation
    }
}

pub(super) fn arc_caps(caps: StaticCaps) -> Arc<dyn CapabilityCheck> {
    Arc::new(caps)
}

mod dispatch;
mod flags;
