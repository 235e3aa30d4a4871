pub mod geometry;
pub mod runtime;

pub use geometry::{Location, ParcelId, ParcelIdParseError, RegionBounds};
pub use runtime::{
    boolean_flag_value, merge_parcels, notify_key, notify_with, resolve_flag, AccessEvaluator,
    AccessRequest, Actor, ActorId, ActorKind, ActorScope, CapabilityCheck, ChunkSettings,
    CommandContext, CommandExecutor, CommandId, CommandNode, CommandTree, ComponentSettings,
    ConfirmationGate, Continuation, Decision, DenyReason, DispatchError, DispatchHandle,
    DispatchResult, Dispatcher, EconomyProvider, EntityKind, FlagContainer, FlagKind, FlagValue,
    Messenger, Parcel, Region, RegionId, RegionSpawnSettings, ScopeGuard, Settings, SettingsError,
    SnapshotHandle, SpawnBucket, SpawnCause, WorldAdapter, WorldSnapshot, CAP_ADMIN,
    CAP_ADMIN_BYPASS_ECON, CAP_ADMIN_PROJECTILE_OTHER, CAP_ADMIN_PROJECTILE_ROAD,
    CAP_ADMIN_PROJECTILE_UNOWNED, CAP_ADMIN_SUDO_AREA, DEFAULT_PARCEL_SIZE,
};
