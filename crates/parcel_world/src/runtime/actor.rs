//! Actors and scoped temporary context.
//!
//! A command may temporarily relocate the actor's effective context to
//! a named target parcel. The replaced values are held by a
//! [`ScopeGuard`] and put back when the guard drops, so every exit
//! path out of a dispatch, including panics inside command execution,
//! restores the prior context exactly.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::geometry::{Location, ParcelId};

use super::types::{ActorId, ActorKind, RegionId};

/// Transient per-actor context consulted during evaluation and dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorScope {
    /// Temporary location override installed by a scope switch.
    pub location: Option<Location>,
    /// Last parcel the actor's context resolved to.
    pub last_parcel: Option<(RegionId, ParcelId)>,
}

/// The requesting identity for commands and actions.
#[derive(Debug)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    /// Where the world engine last placed the actor.
    base_location: Mutex<Option<Location>>,
    scope: Mutex<ActorScope>,
    /// Cached region the actor's context most recently resolved into.
    region_hint: Mutex<Option<RegionId>>,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>, kind: ActorKind) -> Self {
        Self {
            id: id.into(),
            kind,
            base_location: Mutex::new(None),
            scope: Mutex::new(ActorScope::default()),
            region_hint: Mutex::new(None),
        }
    }

    pub fn player(id: impl Into<ActorId>) -> Self {
        Self::new(id, ActorKind::Player)
    }

    pub fn console() -> Self {
        Self::new("console", ActorKind::Console)
    }

    pub fn is_console(&self) -> bool {
        self.kind.is_console()
    }

    pub fn set_base_location(&self, location: Option<Location>) {
        *lock(&self.base_location) = location;
    }

    /// Scope override when present, otherwise the world-engine location.
    pub fn effective_location(&self) -> Option<Location> {
        if let Some(location) = lock(&self.scope).location.clone() {
            return Some(location);
        }
        lock(&self.base_location).clone()
    }

    pub fn scope(&self) -> ActorScope {
        lock(&self.scope).clone()
    }

    pub fn region_hint(&self) -> Option<RegionId> {
        lock(&self.region_hint).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Saved prior scope and region hint, restored on drop.
///
/// Console actors keep their replaced scope; only player contexts
/// are restored after a scoped command.
#[derive(Debug)]
pub struct ScopeGuard {
    actor: Arc<Actor>,
    prior: Option<(ActorScope, Option<RegionId>)>,
}

impl ScopeGuard {
    /// Replace the actor's scope and region hint with the target
    /// context and remember what was there before.
    pub fn install(actor: Arc<Actor>, location: Location, parcel: (RegionId, ParcelId)) -> Self {
        let region = parcel.0.clone();
        let prior_scope = {
            let mut scope = lock(&actor.scope);
            let prior = scope.clone();
            scope.location = Some(location);
            scope.last_parcel = Some(parcel);
            prior
        };
        let prior_hint = std::mem::replace(&mut *lock(&actor.region_hint), Some(region));
        Self {
            actor,
            prior: Some((prior_scope, prior_hint)),
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.actor.is_console() {
            return;
        }
        if let Some((scope, hint)) = self.prior.take() {
            *lock(&self.actor.scope) = scope;
            *lock(&self.actor.region_hint) = hint;
        }
    }
}
