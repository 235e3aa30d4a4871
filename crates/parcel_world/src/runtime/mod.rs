//! Runtime module - the access-control and command-dispatch core.
//!
//! This module contains the supporting types for:
//! - Claim snapshots and coordinate-to-context resolution
//! - Typed policy flags with inheritance
//! - The spatial access-control evaluator
//! - The command tree, confirmation gate and dispatcher

mod access;
mod actor;
mod command;
mod confirm;
mod dispatch;
mod error;
mod flags;
mod providers;
mod region;
mod settings;
mod snapshot;
mod types;

#[cfg(test)]
mod tests;

// Types
pub use types::{ActorId, ActorKind, CommandId, RegionId};

// Flags
pub use flags::{boolean_flag_value, resolve_flag, FlagContainer, FlagKind, FlagValue};

// Regions and parcels
pub use region::{Parcel, Region, RegionSpawnSettings, DEFAULT_PARCEL_SIZE};

// Snapshots
pub use snapshot::{merge_parcels, SnapshotHandle, WorldSnapshot};

// Settings
pub use settings::{ChunkSettings, ComponentSettings, Settings, SettingsError};

// Collaborator interfaces
pub use providers::{
    notify_key, notify_with, CapabilityCheck, EconomyProvider, Messenger, WorldAdapter, CAP_ADMIN,
    CAP_ADMIN_BYPASS_ECON, CAP_ADMIN_PROJECTILE_OTHER, CAP_ADMIN_PROJECTILE_ROAD,
    CAP_ADMIN_PROJECTILE_UNOWNED, CAP_ADMIN_SUDO_AREA,
};

// Access evaluation
pub use access::{
    AccessEvaluator, AccessRequest, Decision, DenyReason, EntityKind, SpawnBucket, SpawnCause,
};

// Actors and scoped context
pub use actor::{Actor, ActorScope, ScopeGuard};

// Commands
pub use command::{CommandContext, CommandExecutor, CommandNode, CommandTree};

// Confirmation
pub use confirm::{ConfirmationGate, Continuation};

// Errors
pub use error::DispatchError;

// Dispatch
pub use dispatch::{DispatchHandle, DispatchResult, Dispatcher};
