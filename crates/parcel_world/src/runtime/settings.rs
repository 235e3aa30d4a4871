//! Service-wide settings.
//!
//! Every evaluator rule hangs off a component toggle; a disabled
//! component short-circuits its category to allow. The whole structure
//! deserializes from TOML so an embedding service can ship a settings
//! file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Per-rule enable switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentSettings {
    pub entity_movement: bool,
    pub creature_spawn: bool,
    pub natural_spawn_radius: bool,
    pub spawner_device: bool,
    pub projectile_launch: bool,
    pub ambient_effects: bool,
    pub tile_density: bool,
    pub async_completion: bool,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            entity_movement: true,
            creature_spawn: true,
            natural_spawn_radius: true,
            spawner_device: true,
            projectile_launch: true,
            ambient_effects: true,
            tile_density: true,
            async_completion: true,
        }
    }
}

/// Hard caps applied per chunk-equivalent unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSettings {
    pub max_entities: usize,
    pub max_tiles: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            max_entities: 512,
            max_tiles: 4_096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub components: ComponentSettings,
    pub chunk: ChunkSettings,
    /// Deny dropped-item spawns on unclaimed cells.
    pub kill_unclaimed_items: bool,
    /// Deny building-category spawns on parcels marked done.
    pub done_restrict_building: bool,
    /// Deny ambient effects leaking from a claimed source parcel onto
    /// surrounding space.
    pub disable_effect_overflow: bool,
    /// Root command aliases that participate in tab completion.
    pub completion_root_aliases: Vec<String>,
    /// Seconds before a pending confirmation expires.
    pub confirmation_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            components: ComponentSettings::default(),
            chunk: ChunkSettings::default(),
            kill_unclaimed_items: false,
            done_restrict_building: false,
            disable_effect_overflow: false,
            completion_root_aliases: vec!["parcel".to_string(), "p".to_string()],
            confirmation_timeout_secs: 20,
        }
    }
}

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self, SettingsError> {
        toml::from_str(input).map_err(|error| SettingsError::Parse(error.to_string()))
    }

    /// TTL for pending confirmations, for wiring a confirmation gate.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    Parse(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(detail) => write!(f, "invalid settings: {detail}"),
        }
    }
}

impl std::error::Error for SettingsError {}
