//! Two-phase confirmation for priced or destructive commands.
//!
//! Per-actor state machine: `Idle` (no entry) or a single pending
//! confirmation with an expiry. A new request replaces the prior one;
//! `confirm` removes the entry and runs the stored continuation
//! exactly once; expiry is lazy time-based eviction on access, not a
//! running-task cancellation.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::ActorId;

/// Success continuation invoked on confirm.
pub type Continuation = Box<dyn FnOnce() + Send + 'static>;

struct PendingConfirmation {
    display: String,
    expires_at: Instant,
    on_confirm: Continuation,
}

pub struct ConfirmationGate {
    ttl: Duration,
    pending: Mutex<BTreeMap<ActorId, PendingConfirmation>>,
}

impl ConfirmationGate {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    /// Park a continuation behind a confirmation, replacing any prior
    /// pending entry for the actor.
    pub fn request(&self, actor: &ActorId, display: impl Into<String>, on_confirm: Continuation) {
        let entry = PendingConfirmation {
            display: display.into(),
            expires_at: Instant::now() + self.ttl,
            on_confirm,
        };
        self.lock().insert(actor.clone(), entry);
    }

    /// Confirm the pending entry: removes it and runs the continuation.
    /// Returns false when nothing (or only an expired entry) is pending.
    pub fn confirm(&self, actor: &ActorId) -> bool {
        let entry = self.lock().remove(actor);
        match entry {
            Some(entry) if entry.expires_at > Instant::now() => {
                (entry.on_confirm)();
                true
            }
            _ => false,
        }
    }

    /// Drop the pending entry without running it.
    pub fn expire(&self, actor: &ActorId) {
        self.lock().remove(actor);
    }

    /// Display text of the live pending entry, if any. Expired entries
    /// are evicted here.
    pub fn pending_display(&self, actor: &ActorId) -> Option<String> {
        let mut pending = self.lock();
        match pending.get(actor) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.display.clone()),
            Some(_) => {
                pending.remove(actor);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ActorId, PendingConfirmation>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
