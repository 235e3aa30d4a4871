//! External collaborator interfaces.
//!
//! The core renders decisions; these traits are how it asks the
//! outside world about capabilities, money and relocation, and how it
//! pushes localized notifications back out. All are object-safe and
//! shared as `Arc<dyn _>`.

use std::collections::BTreeMap;

use crate::geometry::Location;

use super::region::Region;
use super::types::ActorId;

pub const CAP_ADMIN: &str = "parcels.admin";
pub const CAP_ADMIN_SUDO_AREA: &str = "parcels.admin.area.sudo";
pub const CAP_ADMIN_PROJECTILE_ROAD: &str = "parcels.admin.projectile.road";
pub const CAP_ADMIN_PROJECTILE_UNOWNED: &str = "parcels.admin.projectile.unowned";
pub const CAP_ADMIN_PROJECTILE_OTHER: &str = "parcels.admin.projectile.other";
pub const CAP_ADMIN_BYPASS_ECON: &str = "parcels.admin.bypass.econ";

/// External permission-string authority.
pub trait CapabilityCheck: Send + Sync {
    fn has_capability(&self, actor: &str, capability: &str) -> bool;
}

/// External economy/currency provider.
pub trait EconomyProvider: Send + Sync {
    fn is_enabled(&self, region: &Region) -> bool;
    fn balance(&self, actor: &str) -> f64;
}

/// Fire-and-forget localized messaging.
pub trait Messenger: Send + Sync {
    fn notify(&self, actor: &str, message_key: &str, args: &BTreeMap<String, String>);
}

/// World-engine facts the core cannot know itself.
pub trait WorldAdapter: Send + Sync {
    /// Whether the actor may be relocated to the location. A refusal
    /// aborts a scope switch with a border-denied failure.
    fn can_relocate(&self, actor: &str, location: &Location) -> bool;
}

/// Notify with no message arguments.
pub fn notify_key(messenger: &dyn Messenger, actor: &ActorId, message_key: &str) {
    messenger.notify(actor, message_key, &BTreeMap::new());
}

/// Notify with a single named argument.
pub fn notify_with(messenger: &dyn Messenger, actor: &ActorId, message_key: &str, name: &str, value: impl ToString) {
    let mut args = BTreeMap::new();
    args.insert(name.to_string(), value.to_string());
    messenger.notify(actor, message_key, &args);
}
