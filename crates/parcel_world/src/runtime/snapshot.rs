//! Published claim snapshots and the coordinate-to-context index.
//!
//! Evaluations run as pure reads against an immutable [`WorldSnapshot`]
//! behind an `Arc`. Mutation happens outside this core: whoever owns
//! the claim set builds a fresh snapshot and publishes it whole through
//! [`SnapshotHandle`], so readers never observe a half-updated merge
//! group.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::geometry::{Location, ParcelId};

use super::region::{Parcel, Region};

/// An immutable view of every region and parcel in the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub regions: Vec<Region>,
}

impl WorldSnapshot {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    /// Region whose bounds enclose the location, if any.
    pub fn region_of(&self, location: &Location) -> Option<&Region> {
        self.regions.iter().find(|region| region.contains(location))
    }

    /// Parcel claimed at the location's grid cell. `None` when no
    /// region encloses the location or the cell is unclaimed.
    pub fn parcel_of(&self, location: &Location) -> Option<&Parcel> {
        let region = self.region_of(location)?;
        region.parcels.get(&region.cell_of(location))
    }

    /// Like [`parcel_of`](Self::parcel_of) but only parcels with an owner.
    pub fn owned_parcel_of(&self, location: &Location) -> Option<&Parcel> {
        self.parcel_of(location).filter(|parcel| parcel.has_owner())
    }

    pub fn parcel(&self, region_id: &str, id: ParcelId) -> Option<&Parcel> {
        self.region(region_id)?.parcels.get(&id)
    }

    /// The parcel's merge group, always including the parcel itself.
    pub fn merge_group_of(&self, parcel: &Parcel) -> BTreeSet<ParcelId> {
        if parcel.merge_group.is_empty() {
            let mut group = BTreeSet::new();
            group.insert(parcel.id);
            return group;
        }
        parcel.merge_group.clone()
    }

    /// Cheap same-cell identity check between two resolved parcels.
    pub fn id_equivalent(a: &Parcel, b: &Parcel) -> bool {
        a.region == b.region && a.id == b.id
    }
}

/// Shared handle through which snapshots are published and read.
///
/// Readers clone out the current `Arc` and evaluate against it without
/// holding any lock; publication replaces the `Arc` atomically.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    current: Arc<RwLock<Arc<WorldSnapshot>>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: WorldSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    pub fn current(&self) -> Arc<WorldSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still holds a fully published snapshot.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn publish(&self, snapshot: WorldSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

impl Default for SnapshotHandle {
    fn default() -> Self {
        Self::new(WorldSnapshot::default())
    }
}

/// Join the merge groups of the listed parcels within one region,
/// keeping membership symmetric and transitive. Used by snapshot
/// builders before publication; readers never mutate groups.
pub fn merge_parcels(region: &mut Region, ids: &[ParcelId]) {
    let mut group: BTreeSet<ParcelId> = BTreeSet::new();
    for id in ids {
        if let Some(parcel) = region.parcels.get(id) {
            group.insert(*id);
            group.extend(parcel.merge_group.iter().copied());
        }
    }
    if group.len() < 2 {
        return;
    }
    for member in group.clone() {
        if let Some(parcel) = region.parcels.get_mut(&member) {
            parcel.merge_group = group.clone();
        }
    }
}
