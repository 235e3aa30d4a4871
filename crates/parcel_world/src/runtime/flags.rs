//! Typed policy flags with default fallback resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of policy flag kinds.
///
/// Every kind declares a global default so flag resolution is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// May non-members launch projectiles inside the parcel.
    Projectiles,
    /// Do beacon-style auras apply to entities on the parcel.
    AmbientEffects,
    /// May non-members walk into the parcel.
    Entry,
    /// Free-form owner description shown on parcel info.
    Description,
    /// Per-parcel override of the structural density cap, `-1` for none.
    DensityCap,
}

impl FlagKind {
    pub fn global_default(self) -> FlagValue {
        match self {
            FlagKind::Projectiles => FlagValue::Bool(false),
            FlagKind::AmbientEffects => FlagValue::Bool(true),
            FlagKind::Entry => FlagValue::Bool(true),
            FlagKind::Description => FlagValue::Text(String::new()),
            FlagKind::DensityCap => FlagValue::Int(-1),
        }
    }
}

/// A typed flag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

/// Explicit flag values attached to one parcel or one region road default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagContainer {
    entries: BTreeMap<FlagKind, FlagValue>,
}

impl FlagContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: FlagKind, value: FlagValue) {
        self.entries.insert(kind, value);
    }

    pub fn remove(&mut self, kind: FlagKind) -> Option<FlagValue> {
        self.entries.remove(&kind)
    }

    pub fn get(&self, kind: FlagKind) -> Option<&FlagValue> {
        self.entries.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the effective value of `kind`.
///
/// Precedence: explicit value in `container`, then the region road
/// default, then `fallback`, then the kind's global default. Never
/// fails: a value of the wrong shape for the caller is still returned
/// and the typed accessors below fall back past it.
pub fn resolve_flag(
    kind: FlagKind,
    container: &FlagContainer,
    road_default: Option<&FlagContainer>,
    fallback: Option<FlagValue>,
) -> FlagValue {
    if let Some(value) = container.get(kind) {
        return value.clone();
    }
    if let Some(road) = road_default {
        if let Some(value) = road.get(kind) {
            return value.clone();
        }
    }
    if let Some(value) = fallback {
        return value;
    }
    kind.global_default()
}

/// Boolean view of [`resolve_flag`]. A mistyped stored value resolves
/// to the kind's global default rather than an error.
pub fn boolean_flag_value(
    kind: FlagKind,
    container: &FlagContainer,
    road_default: Option<&FlagContainer>,
    fallback: Option<bool>,
) -> bool {
    let resolved = resolve_flag(kind, container, road_default, fallback.map(FlagValue::Bool));
    match resolved.as_bool() {
        Some(value) => value,
        None => kind
            .global_default()
            .as_bool()
            .unwrap_or(false),
    }
}
