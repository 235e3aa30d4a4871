//! Type aliases and basic identifiers for the runtime module.

use serde::{Deserialize, Serialize};

pub type ActorId = String;
pub type RegionId = String;

/// Stable identifier of a priced command, e.g. `"parcel.merge"`.
pub type CommandId = String;

/// What kind of principal is invoking commands and actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    Console,
}

impl ActorKind {
    pub fn is_console(self) -> bool {
        matches!(self, ActorKind::Console)
    }
}
