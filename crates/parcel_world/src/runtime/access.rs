//! The spatial access-control evaluator.
//!
//! Consumes the published claim snapshot, flag resolution and the
//! external capability check to render an allow/deny decision per
//! action category. Evaluations are pure reads; a disabled component
//! toggle short-circuits its category to allow without side effects,
//! and rules never fail — a flag lookup that cannot produce a typed
//! value resolves toward the kind's global default.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::geometry::Location;

use super::flags::{resolve_flag, boolean_flag_value, FlagKind};
use super::providers::{
    notify_with, CapabilityCheck, Messenger, CAP_ADMIN_PROJECTILE_OTHER,
    CAP_ADMIN_PROJECTILE_ROAD, CAP_ADMIN_PROJECTILE_UNOWNED,
};
use super::region::Region;
use super::settings::Settings;
use super::snapshot::{SnapshotHandle, WorldSnapshot};
use super::types::ActorId;

/// What produced a spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCause {
    DispensedEgg,
    ThrownEgg,
    SpawnEgg,
    Natural,
    Reinforcements,
    Mount,
    Patrol,
    Raid,
    Trap,
    VillageDefense,
    VillageInvasion,
    Ambient,
    ChunkPopulation,
    Pearl,
    Breeding,
    BuiltGolem,
    BuiltSnowman,
    BuiltWither,
    Custom,
    SpawnerDevice,
    Command,
    Conversion,
    Unknown,
}

/// Gate buckets spawn causes collapse into. Causes outside every
/// bucket are allowed by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnBucket {
    Egg,
    Natural,
    Breeding,
    BuiltStructure,
    SpawnerDevice,
}

impl SpawnCause {
    pub fn bucket(self) -> Option<SpawnBucket> {
        match self {
            SpawnCause::DispensedEgg | SpawnCause::ThrownEgg | SpawnCause::SpawnEgg => {
                Some(SpawnBucket::Egg)
            }
            SpawnCause::Natural
            | SpawnCause::Reinforcements
            | SpawnCause::Mount
            | SpawnCause::Patrol
            | SpawnCause::Raid
            | SpawnCause::Trap
            | SpawnCause::VillageDefense
            | SpawnCause::VillageInvasion
            | SpawnCause::Ambient
            | SpawnCause::ChunkPopulation
            | SpawnCause::Pearl => Some(SpawnBucket::Natural),
            SpawnCause::Breeding => Some(SpawnBucket::Breeding),
            SpawnCause::BuiltGolem
            | SpawnCause::BuiltSnowman
            | SpawnCause::BuiltWither
            | SpawnCause::Custom => Some(SpawnBucket::BuiltStructure),
            SpawnCause::SpawnerDevice => Some(SpawnBucket::SpawnerDevice),
            SpawnCause::Command | SpawnCause::Conversion | SpawnCause::Unknown => None,
        }
    }
}

/// The kind of entity a spawn or movement concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Creature,
    /// Dropped item stacks.
    Item,
    /// Decorative stands are handled by per-parcel options elsewhere
    /// and bypass the area-wide spawn pipeline.
    DecorativeStand,
    /// Other non-living objects.
    Object,
}

impl EntityKind {
    pub fn is_alive(self) -> bool {
        matches!(self, EntityKind::Player | EntityKind::Creature)
    }
}

/// One inbound action to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum AccessRequest {
    /// An entity moving or pathing from one location toward another.
    Movement { from: Location, to: Location },
    /// An entity about to spawn.
    Spawn {
        location: Location,
        cause: SpawnCause,
        entity: EntityKind,
        /// Live entities already in the spawn chunk.
        chunk_entity_count: usize,
    },
    /// Per-player natural spawn radius around a player's position.
    NaturalSpawnRadius { location: Location },
    /// A spawner device preparing to run, keyed by device position.
    SpawnerDevice { location: Location },
    /// A player-controlled source launching a ranged projectile.
    Projectile { actor: ActorId, location: Location },
    /// A beacon-style aura reaching from a source block to a player.
    AmbientEffect {
        source: Location,
        player_location: Location,
    },
    /// Placement of a dense structural object.
    TilePlacement {
        actor: ActorId,
        location: Location,
        /// Dense structural objects already in the placement chunk.
        chunk_tile_count: usize,
    },
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    RegionBoundary,
    ClaimBoundary,
    EntityCapReached,
    SpawnCategoryDisabled { bucket: SpawnBucket },
    UnclaimedItemCleanup,
    UnclaimedLivingSpawn,
    UnclaimedMiscSpawn,
    DoneParcelRestricted,
    /// Capability checks for projectile launches. A denied projectile
    /// must also be destroyed by the world adapter.
    MissingCapability { capability: String },
    EffectFlagDenied,
    EffectOverflowDisabled,
    TileCapReached { cap: i64 },
}

/// Verdict for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny { reason: DenyReason },
}

impl Decision {
    pub fn deny(reason: DenyReason) -> Self {
        Decision::Deny { reason }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny { reason } => Some(reason),
        }
    }
}

/// Renders allow/deny decisions against the current published snapshot.
pub struct AccessEvaluator {
    snapshots: SnapshotHandle,
    settings: Arc<Settings>,
    capabilities: Arc<dyn CapabilityCheck>,
    messenger: Arc<dyn Messenger>,
}

impl AccessEvaluator {
    pub fn new(
        snapshots: SnapshotHandle,
        settings: Arc<Settings>,
        capabilities: Arc<dyn CapabilityCheck>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            snapshots,
            settings,
            capabilities,
            messenger,
        }
    }

    pub fn evaluate(&self, request: &AccessRequest) -> Decision {
        let snapshot = self.snapshots.current();
        match request {
            AccessRequest::Movement { from, to } => self.movement(&snapshot, from, to),
            AccessRequest::Spawn {
                location,
                cause,
                entity,
                chunk_entity_count,
            } => self.spawn(&snapshot, location, *cause, *entity, *chunk_entity_count),
            AccessRequest::NaturalSpawnRadius { location } => {
                self.natural_spawn_radius(&snapshot, location)
            }
            AccessRequest::SpawnerDevice { location } => self.spawner_device(&snapshot, location),
            AccessRequest::Projectile { actor, location } => {
                self.projectile(&snapshot, actor, location)
            }
            AccessRequest::AmbientEffect {
                source,
                player_location,
            } => self.ambient_effect(&snapshot, source, player_location),
            AccessRequest::TilePlacement {
                actor,
                location,
                chunk_tile_count,
            } => self.tile_placement(&snapshot, actor, location, *chunk_tile_count),
        }
    }

    /// Cross-parcel movement for both general pathfinding and
    /// short-range creature targeting.
    fn movement(&self, snapshot: &WorldSnapshot, from: &Location, to: &Location) -> Decision {
        if !self.settings.components.entity_movement {
            return Decision::Allow;
        }
        let Some(to_region) = snapshot.region_of(to) else {
            return Decision::Allow;
        };
        let Some(from_region) = snapshot.region_of(from) else {
            return Decision::Allow;
        };
        if to_region.id != from_region.id {
            return Decision::deny(DenyReason::RegionBoundary);
        }
        let to_parcel = snapshot.parcel_of(to);
        let from_parcel = snapshot.parcel_of(from);
        let (from_parcel, to_parcel) = match (from_parcel, to_parcel) {
            (None, None) => return Decision::Allow,
            (Some(_), None) | (None, Some(_)) => {
                return Decision::deny(DenyReason::ClaimBoundary);
            }
            (Some(from_parcel), Some(to_parcel)) => (from_parcel, to_parcel),
        };
        if WorldSnapshot::id_equivalent(from_parcel, to_parcel) {
            return Decision::Allow;
        }
        // Connectivity is tested against the source's own cell, not
        // the destination's.
        if from_parcel.is_merged()
            && snapshot.merge_group_of(from_parcel).contains(&from_parcel.id)
        {
            return Decision::Allow;
        }
        Decision::deny(DenyReason::ClaimBoundary)
    }

    fn spawn(
        &self,
        snapshot: &WorldSnapshot,
        location: &Location,
        cause: SpawnCause,
        entity: EntityKind,
        chunk_entity_count: usize,
    ) -> Decision {
        if !self.settings.components.creature_spawn {
            return Decision::Allow;
        }
        let Some(region) = snapshot.region_of(location) else {
            return Decision::Allow;
        };
        if entity == EntityKind::DecorativeStand {
            return Decision::Allow;
        }
        if chunk_entity_count >= self.settings.chunk.max_entities {
            return Decision::deny(DenyReason::EntityCapReached);
        }
        if let Some(bucket) = cause.bucket() {
            let enabled = match bucket {
                SpawnBucket::Egg => region.spawn.spawn_eggs,
                SpawnBucket::Natural => region.spawn.mob_spawning,
                SpawnBucket::Breeding => region.spawn.spawn_breeding,
                SpawnBucket::BuiltStructure => region.spawn.spawn_custom,
                SpawnBucket::SpawnerDevice => region.spawn.mob_spawner_spawning,
            };
            if !enabled {
                return Decision::deny(DenyReason::SpawnCategoryDisabled { bucket });
            }
        }
        match snapshot.owned_parcel_of(location) {
            None => {
                if entity == EntityKind::Item {
                    if self.settings.kill_unclaimed_items {
                        return Decision::deny(DenyReason::UnclaimedItemCleanup);
                    }
                    return Decision::Allow;
                }
                if !region.spawn.mob_spawning {
                    if entity == EntityKind::Player {
                        return Decision::Allow;
                    }
                    if entity.is_alive() {
                        return Decision::deny(DenyReason::UnclaimedLivingSpawn);
                    }
                }
                if !region.spawn.misc_spawn_unclaimed && !entity.is_alive() {
                    return Decision::deny(DenyReason::UnclaimedMiscSpawn);
                }
                Decision::Allow
            }
            Some(parcel) => {
                if self.settings.done_restrict_building
                    && parcel.done
                    && cause.bucket() == Some(SpawnBucket::BuiltStructure)
                {
                    return Decision::deny(DenyReason::DoneParcelRestricted);
                }
                Decision::Allow
            }
        }
    }

    fn natural_spawn_radius(&self, snapshot: &WorldSnapshot, location: &Location) -> Decision {
        if !self.settings.components.natural_spawn_radius {
            return Decision::Allow;
        }
        match snapshot.region_of(location) {
            Some(region) if !region.spawn.mob_spawning => Decision::deny(
                DenyReason::SpawnCategoryDisabled {
                    bucket: SpawnBucket::Natural,
                },
            ),
            _ => Decision::Allow,
        }
    }

    fn spawner_device(&self, snapshot: &WorldSnapshot, location: &Location) -> Decision {
        if !self.settings.components.spawner_device {
            return Decision::Allow;
        }
        match snapshot.region_of(location) {
            Some(region) if !region.spawn.mob_spawner_spawning => Decision::deny(
                DenyReason::SpawnCategoryDisabled {
                    bucket: SpawnBucket::SpawnerDevice,
                },
            ),
            _ => Decision::Allow,
        }
    }

    fn projectile(&self, snapshot: &WorldSnapshot, actor: &ActorId, location: &Location) -> Decision {
        if !self.settings.components.projectile_launch {
            return Decision::Allow;
        }
        let Some(region) = snapshot.region_of(location) else {
            return Decision::Allow;
        };
        match snapshot.parcel_of(location) {
            None => {
                let road_allows =
                    boolean_flag_value(FlagKind::Projectiles, &region.road_flags, None, None);
                if !road_allows {
                    return self.deny_projectile(actor, CAP_ADMIN_PROJECTILE_ROAD);
                }
                Decision::Allow
            }
            Some(parcel) if !parcel.has_owner() => {
                self.deny_projectile(actor, CAP_ADMIN_PROJECTILE_UNOWNED)
            }
            Some(parcel) if !parcel.is_added(actor) => {
                let parcel_allows = boolean_flag_value(
                    FlagKind::Projectiles,
                    &parcel.flags,
                    Some(&region.road_flags),
                    None,
                );
                if !parcel_allows {
                    return self.deny_projectile(actor, CAP_ADMIN_PROJECTILE_OTHER);
                }
                Decision::Allow
            }
            Some(_) => Decision::Allow,
        }
    }

    /// Deny-and-notify unless the actor holds the override capability.
    fn deny_projectile(&self, actor: &ActorId, capability: &str) -> Decision {
        if self.capabilities.has_capability(actor, capability) {
            return Decision::Allow;
        }
        notify_with(
            self.messenger.as_ref(),
            actor,
            "permission.no_permission_event",
            "node",
            capability,
        );
        Decision::deny(DenyReason::MissingCapability {
            capability: capability.to_string(),
        })
    }

    fn ambient_effect(
        &self,
        snapshot: &WorldSnapshot,
        source: &Location,
        player_location: &Location,
    ) -> Decision {
        if !self.settings.components.ambient_effects {
            return Decision::Allow;
        }
        let Some(region) = snapshot.region_of(source) else {
            return Decision::Allow;
        };
        let source_parcel = snapshot.parcel_of(source);
        match snapshot.parcel_of(player_location) {
            None => {
                let road_allows = boolean_flag_value(
                    FlagKind::AmbientEffects,
                    &region.road_flags,
                    None,
                    Some(true),
                );
                if !road_allows {
                    return Decision::deny(DenyReason::EffectFlagDenied);
                }
                if source_parcel.is_some() && self.settings.disable_effect_overflow {
                    return Decision::deny(DenyReason::EffectOverflowDisabled);
                }
                Decision::Allow
            }
            Some(parcel) => {
                let parcel_allows = boolean_flag_value(
                    FlagKind::AmbientEffects,
                    &parcel.flags,
                    None,
                    Some(true),
                );
                let same_parcel = source_parcel
                    .map(|source| WorldSnapshot::id_equivalent(source, parcel))
                    .unwrap_or(false);
                if same_parcel {
                    if !parcel_allows {
                        return Decision::deny(DenyReason::EffectFlagDenied);
                    }
                    return Decision::Allow;
                }
                if !parcel_allows {
                    return Decision::deny(DenyReason::EffectFlagDenied);
                }
                if self.settings.disable_effect_overflow {
                    return Decision::deny(DenyReason::EffectOverflowDisabled);
                }
                Decision::Allow
            }
        }
    }

    fn tile_placement(
        &self,
        snapshot: &WorldSnapshot,
        actor: &ActorId,
        location: &Location,
        chunk_tile_count: usize,
    ) -> Decision {
        if !self.settings.components.tile_density {
            return Decision::Allow;
        }
        let Some(region) = snapshot.region_of(location) else {
            return Decision::Allow;
        };
        let cap = self.density_cap(region, snapshot, location);
        if cap >= 0 && chunk_tile_count as i64 >= cap {
            notify_with(
                self.messenger.as_ref(),
                actor,
                "errors.tile_entity_cap_reached",
                "amount",
                cap,
            );
            return Decision::deny(DenyReason::TileCapReached { cap });
        }
        Decision::Allow
    }

    /// Parcel-level density cap override, falling back to the global
    /// chunk setting when unset or negative.
    fn density_cap(&self, region: &Region, snapshot: &WorldSnapshot, location: &Location) -> i64 {
        let global = self.settings.chunk.max_tiles as i64;
        let container = match snapshot.parcel_of(location) {
            Some(parcel) => &parcel.flags,
            None => &region.road_flags,
        };
        let resolved = resolve_flag(FlagKind::DensityCap, container, Some(&region.road_flags), None);
        match resolved.as_int() {
            Some(cap) if cap >= 0 => cap,
            _ => global,
        }
    }
}
