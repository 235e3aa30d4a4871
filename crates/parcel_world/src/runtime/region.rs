//! Region and parcel data model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::geometry::{Location, ParcelId, RegionBounds};

use super::flags::FlagContainer;
use super::types::{ActorId, CommandId, RegionId};

pub const DEFAULT_PARCEL_SIZE: i64 = 32;

/// Category toggles a region applies to spawn causes in its space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpawnSettings {
    pub mob_spawning: bool,
    pub spawn_eggs: bool,
    pub spawn_breeding: bool,
    pub spawn_custom: bool,
    pub mob_spawner_spawning: bool,
    /// Non-living spawns on unclaimed cells.
    pub misc_spawn_unclaimed: bool,
}

impl Default for RegionSpawnSettings {
    fn default() -> Self {
        Self {
            mob_spawning: true,
            spawn_eggs: true,
            spawn_breeding: true,
            spawn_custom: true,
            mob_spawner_spawning: true,
            misc_spawn_unclaimed: false,
        }
    }
}

/// A named administrative area of one world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub world: String,
    pub bounds: RegionBounds,
    /// Grid cell edge length used to derive parcel identity.
    pub parcel_size: i64,
    pub spawn: RegionSpawnSettings,
    /// Flag defaults applying to unclaimed/road space in this region.
    pub road_flags: FlagContainer,
    pub economy_enabled: bool,
    /// Price per priced command id; absent means free.
    pub prices: BTreeMap<CommandId, f64>,
    pub parcels: BTreeMap<ParcelId, Parcel>,
}

impl Region {
    pub fn new(id: impl Into<RegionId>, world: impl Into<String>, bounds: RegionBounds) -> Self {
        Self {
            id: id.into(),
            world: world.into(),
            bounds,
            parcel_size: DEFAULT_PARCEL_SIZE,
            spawn: RegionSpawnSettings::default(),
            road_flags: FlagContainer::new(),
            economy_enabled: false,
            prices: BTreeMap::new(),
            parcels: BTreeMap::new(),
        }
    }

    pub fn contains(&self, location: &Location) -> bool {
        location.world == self.world && self.bounds.contains(location.x, location.z)
    }

    /// Grid cell of a location inside this region.
    pub fn cell_of(&self, location: &Location) -> ParcelId {
        let size = self.parcel_size.max(1);
        ParcelId {
            x: (location.x.floor() as i64).div_euclid(size) as i32,
            z: (location.z.floor() as i64).div_euclid(size) as i32,
        }
    }

    /// Center point of a grid cell, used as the scope-switch target.
    pub fn cell_center(&self, cell: ParcelId) -> Location {
        let size = self.parcel_size.max(1) as f64;
        Location {
            world: self.world.clone(),
            x: (cell.x as f64 + 0.5) * size,
            y: 0.0,
            z: (cell.z as f64 + 0.5) * size,
        }
    }

    pub fn price_of(&self, command_id: &str) -> f64 {
        self.prices.get(command_id).copied().unwrap_or(0.0)
    }
}

/// A single claimed grid cell inside a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,
    pub region: RegionId,
    pub owner: Option<ActorId>,
    #[serde(default)]
    pub added: BTreeSet<ActorId>,
    #[serde(default)]
    pub trusted: BTreeSet<ActorId>,
    #[serde(default)]
    pub denied: BTreeSet<ActorId>,
    #[serde(default)]
    pub flags: FlagContainer,
    /// Full merge group including this parcel when merged; empty when
    /// the parcel stands alone.
    #[serde(default)]
    pub merge_group: BTreeSet<ParcelId>,
    /// Construction-finished marker.
    #[serde(default)]
    pub done: bool,
}

impl Parcel {
    pub fn new(id: ParcelId, region: impl Into<RegionId>) -> Self {
        Self {
            id,
            region: region.into(),
            owner: None,
            added: BTreeSet::new(),
            trusted: BTreeSet::new(),
            denied: BTreeSet::new(),
            flags: FlagContainer::new(),
            merge_group: BTreeSet::new(),
            done: false,
        }
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_merged(&self) -> bool {
        !self.merge_group.is_empty()
    }

    /// Owner plus added and trusted members, minus explicit denials.
    pub fn is_added(&self, actor: &str) -> bool {
        if self.denied.contains(actor) {
            return false;
        }
        self.owner.as_deref() == Some(actor)
            || self.added.contains(actor)
            || self.trusted.contains(actor)
    }

    pub fn is_denied(&self, actor: &str) -> bool {
        self.denied.contains(actor)
    }
}
