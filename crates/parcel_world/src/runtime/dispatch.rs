//! One command invocation, end to end.
//!
//! Parsing, scope switching and gating run on the calling context; the
//! resolved executable unit runs on the runtime's workers. The caller
//! gets a future-like [`DispatchHandle`] it may await or drop; it must
//! never block on it from the invoking thread.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::geometry::{Location, ParcelId};

use super::actor::{Actor, ScopeGuard};
use super::command::{CommandContext, CommandExecutor, CommandNode, CommandTree};
use super::confirm::{ConfirmationGate, Continuation};
use super::error::DispatchError;
use super::providers::{
    notify_key, notify_with, CapabilityCheck, EconomyProvider, Messenger, WorldAdapter,
    CAP_ADMIN, CAP_ADMIN_BYPASS_ECON, CAP_ADMIN_SUDO_AREA,
};
use super::settings::Settings;
use super::snapshot::{SnapshotHandle, WorldSnapshot};
use super::types::{ActorId, RegionId};

/// Outcome of one dispatch invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum DispatchResult {
    Completed,
    /// Execution parked behind a pending confirmation.
    ConfirmationRequested,
    Failed(DispatchError),
}

/// Future-like handle over a dispatch invocation.
pub struct DispatchHandle {
    inner: HandleInner,
}

enum HandleInner {
    Ready(Option<DispatchResult>),
    Task(tokio::task::JoinHandle<DispatchResult>),
}

impl DispatchHandle {
    fn ready(result: DispatchResult) -> Self {
        Self {
            inner: HandleInner::Ready(Some(result)),
        }
    }

    fn task(handle: tokio::task::JoinHandle<DispatchResult>) -> Self {
        Self {
            inner: HandleInner::Task(handle),
        }
    }
}

impl Future for DispatchHandle {
    type Output = DispatchResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            HandleInner::Ready(slot) => Poll::Ready(
                slot.take()
                    .expect("DispatchHandle polled after completion"),
            ),
            HandleInner::Task(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                // The task only fails if the runtime cancelled it; the
                // scope guard was dropped with the task either way.
                Poll::Ready(Err(join_error)) => {
                    Poll::Ready(DispatchResult::Failed(DispatchError::CommandFault {
                        message: Some(join_error.to_string()),
                    }))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// Orchestrates command invocations against an immutable tree.
#[derive(Clone)]
pub struct Dispatcher {
    tree: Arc<CommandTree>,
    snapshots: SnapshotHandle,
    settings: Arc<Settings>,
    gate: Arc<ConfirmationGate>,
    capabilities: Arc<dyn CapabilityCheck>,
    economy: Arc<dyn EconomyProvider>,
    messenger: Arc<dyn Messenger>,
    world: Arc<dyn WorldAdapter>,
    runtime: tokio::runtime::Handle,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tree: Arc<CommandTree>,
        snapshots: SnapshotHandle,
        settings: Arc<Settings>,
        gate: Arc<ConfirmationGate>,
        capabilities: Arc<dyn CapabilityCheck>,
        economy: Arc<dyn EconomyProvider>,
        messenger: Arc<dyn Messenger>,
        world: Arc<dyn WorldAdapter>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            tree,
            snapshots,
            settings,
            gate,
            capabilities,
            economy,
            messenger,
            world,
            runtime,
        }
    }

    /// Dispatch one raw command line for the actor.
    pub fn dispatch(&self, actor: Arc<Actor>, raw: &str) -> DispatchHandle {
        let mut args = self.tokenize(raw);
        if args.is_empty() {
            let error = DispatchError::UnknownCommand {
                input: raw.to_string(),
            };
            self.report(&actor.id, &error);
            return DispatchHandle::ready(DispatchResult::Failed(error));
        }
        rewrite_colon_alias(&mut args);

        let snapshot = self.snapshots.current();
        let mut guard = None;
        let mut force = false;
        if args.len() >= 2 {
            if let Some((region_id, parcel_id, target)) =
                self.scope_target(&snapshot, &actor, &args[0])
            {
                if !self.world.can_relocate(&actor.id, &target) {
                    let error = DispatchError::BorderDenied;
                    self.report(&actor.id, &error);
                    return DispatchHandle::ready(DispatchResult::Failed(error));
                }
                guard = Some(ScopeGuard::install(
                    Arc::clone(&actor),
                    target,
                    (region_id, parcel_id),
                ));
                args.remove(0);
            }
            if args.len() >= 2 && args[0].starts_with('-') {
                if args[0] == "-f" {
                    force = true;
                    args.remove(0);
                } else {
                    let error = DispatchError::InvalidFlag {
                        flag: args[0].trim_start_matches('-').to_string(),
                    };
                    self.report(&actor.id, &error);
                    return DispatchHandle::ready(DispatchResult::Failed(error));
                }
            }
        }

        let (node, rest) = self.tree.resolve(&args);
        let Some(executor) = node.executor_ref() else {
            let error = DispatchError::UnknownCommand {
                input: args.join(" "),
            };
            self.report(&actor.id, &error);
            return DispatchHandle::ready(DispatchResult::Failed(error));
        };

        let this = self.clone();
        let rest = rest.to_vec();
        let display = raw.to_string();
        let task = self.runtime.spawn(async move {
            // Scope restore happens when the guard drops with this
            // task, on success, declared failure, fault and panic
            // alike.
            let _scope = guard;
            this.execute_gated(actor, node, executor, rest, display, force)
                .await
        });
        DispatchHandle::task(task)
    }

    /// Confirm the actor's pending command. False when nothing is
    /// pending.
    pub fn confirm_pending(&self, actor: &ActorId) -> bool {
        let confirmed = self.gate.confirm(actor);
        if !confirmed {
            self.report(actor, &DispatchError::NoConfirmationPending);
        }
        confirmed
    }

    /// Tab-completion candidates for a raw input buffer.
    ///
    /// Engages only for player actors on buffers whose root token is a
    /// configured completion alias; everything else degrades to no
    /// completions.
    pub fn complete(&self, actor: &Actor, buffer: &str) -> Vec<String> {
        if !self.settings.components.async_completion || actor.is_console() {
            return Vec::new();
        }
        if !buffer.starts_with('/') || !buffer.contains(' ') {
            return Vec::new();
        }
        let trailing_space = buffer.ends_with(' ');
        let tokens: Vec<String> = buffer
            .trim_start_matches('/')
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if tokens.len() <= 1 {
            return Vec::new();
        }
        let root = tokens[0].to_ascii_lowercase();
        if !self
            .settings
            .completion_root_aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(&root))
        {
            return Vec::new();
        }
        self.tree.complete(
            &tokens[1..],
            trailing_space,
            actor,
            self.capabilities.as_ref(),
        )
    }

    fn tokenize(&self, raw: &str) -> Vec<String> {
        let mut tokens: Vec<String> = raw
            .trim()
            .trim_start_matches('/')
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if tokens
            .first()
            .is_some_and(|token| self.tree.root().matches(token))
        {
            tokens.remove(0);
        }
        tokens
    }

    /// Resolve a leading token naming a parcel the actor may view:
    /// owner, same-region, admin capability, or the console.
    fn scope_target(
        &self,
        snapshot: &WorldSnapshot,
        actor: &Actor,
        token: &str,
    ) -> Option<(RegionId, ParcelId, Location)> {
        let parcel_id: ParcelId = token.parse().ok()?;
        let area = self.applicable_region(snapshot, actor);
        let parcel = match area {
            Some(region) => region.parcels.get(&parcel_id),
            None => snapshot
                .regions
                .iter()
                .find_map(|region| region.parcels.get(&parcel_id)),
        }?;
        let region = snapshot.region(&parcel.region)?;

        let same_region = area.map(|area| area.id == region.id).unwrap_or(false);
        let is_owner = parcel.owner.as_deref() == Some(actor.id.as_str());
        let authorized = actor.is_console()
            || is_owner
            || same_region
            || self.capabilities.has_capability(&actor.id, CAP_ADMIN)
            || self
                .capabilities
                .has_capability(&actor.id, CAP_ADMIN_SUDO_AREA);
        if !authorized || parcel.is_denied(&actor.id) {
            return None;
        }
        let target = region.cell_center(parcel.id);
        Some((region.id.clone(), parcel.id, target))
    }

    fn applicable_region<'a>(
        &self,
        snapshot: &'a WorldSnapshot,
        actor: &Actor,
    ) -> Option<&'a super::region::Region> {
        if let Some(hint) = actor.region_hint() {
            if let Some(region) = snapshot.region(&hint) {
                return Some(region);
            }
        }
        let location = actor.effective_location()?;
        snapshot.region_of(&location)
    }

    async fn execute_gated(
        &self,
        actor: Arc<Actor>,
        node: Arc<CommandNode>,
        executor: Arc<dyn CommandExecutor>,
        args: Vec<String>,
        display: String,
        force: bool,
    ) -> DispatchResult {
        let snapshot = self.snapshots.current();
        if node.requires_confirmation() && !force {
            let this = self.clone();
            let pending_actor = Arc::clone(&actor);
            let pending_node = Arc::clone(&node);
            let continuation: Continuation = Box::new(move || {
                let runtime = this.runtime.clone();
                runtime.spawn(async move {
                    // The confirmed result is surfaced to the actor via
                    // notifications; this caller discards it.
                    let _ = this.confirmed_execute(pending_actor, pending_node, args).await;
                });
            });
            self.gate.request(&actor.id, display.clone(), continuation);
            notify_with(
                self.messenger.as_ref(),
                &actor.id,
                "confirm.requires_confirm",
                "command",
                display,
            );
            return DispatchResult::ConfirmationRequested;
        }
        // The force override skips the confirmation request but still
        // prices the command, without the bypass capability exemption.
        if let Err(error) = self.economy_gate(&actor, &node, &snapshot, !force) {
            self.report(&actor.id, &error);
            return DispatchResult::Failed(error);
        }
        self.run_executor(actor, executor, args, snapshot).await
    }

    async fn confirmed_execute(
        &self,
        actor: Arc<Actor>,
        node: Arc<CommandNode>,
        args: Vec<String>,
    ) -> DispatchResult {
        let snapshot = self.snapshots.current();
        if let Err(error) = self.economy_gate(&actor, &node, &snapshot, true) {
            self.report(&actor.id, &error);
            return DispatchResult::Failed(error);
        }
        let Some(executor) = node.executor_ref() else {
            return DispatchResult::Failed(DispatchError::UnknownCommand {
                input: node.name().to_string(),
            });
        };
        self.run_executor(actor, executor, args, snapshot).await
    }

    fn economy_gate(
        &self,
        actor: &Actor,
        node: &CommandNode,
        snapshot: &WorldSnapshot,
        allow_bypass: bool,
    ) -> Result<(), DispatchError> {
        let Some(command_id) = node.command_id() else {
            return Ok(());
        };
        if actor.is_console() {
            return Ok(());
        }
        let Some(region) = self.applicable_region(snapshot, actor) else {
            return Ok(());
        };
        if !self.economy.is_enabled(region) {
            return Ok(());
        }
        if allow_bypass
            && self
                .capabilities
                .has_capability(&actor.id, CAP_ADMIN_BYPASS_ECON)
        {
            return Ok(());
        }
        let price = region.price_of(command_id);
        let balance = self.economy.balance(&actor.id);
        if price != 0.0 && balance < price {
            return Err(DispatchError::InsufficientFunds { price, balance });
        }
        Ok(())
    }

    async fn run_executor(
        &self,
        actor: Arc<Actor>,
        executor: Arc<dyn CommandExecutor>,
        args: Vec<String>,
        snapshot: Arc<WorldSnapshot>,
    ) -> DispatchResult {
        let ctx = CommandContext {
            actor: Arc::clone(&actor),
            args,
            snapshot,
        };
        let outcome = std::panic::AssertUnwindSafe(executor.execute(ctx))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => DispatchResult::Completed,
            Ok(Err(error)) => {
                self.report(&actor.id, &error);
                DispatchResult::Failed(error)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!(
                    "recovered command fault: {}",
                    message.as_deref().unwrap_or("no message")
                );
                let error = DispatchError::CommandFault { message };
                self.report(&actor.id, &error);
                DispatchResult::Failed(error)
            }
        }
    }

    fn report(&self, actor: &ActorId, error: &DispatchError) {
        let key = error.message_key();
        match error {
            DispatchError::CommandFault { message: Some(detail) } => {
                notify_with(self.messenger.as_ref(), actor, key, "value", detail);
            }
            // Console-only generic error: already logged, nothing to
            // render for the actor.
            DispatchError::CommandFault { message: None } => {}
            DispatchError::PermissionDenied { capability } => {
                notify_with(self.messenger.as_ref(), actor, key, "node", capability);
            }
            DispatchError::InsufficientFunds { price, .. } => {
                notify_with(self.messenger.as_ref(), actor, key, "money", price);
            }
            DispatchError::InvalidFlag { flag } => {
                notify_with(self.messenger.as_ref(), actor, key, "flag", flag);
            }
            DispatchError::BorderDenied
            | DispatchError::NoConfirmationPending
            | DispatchError::UnknownCommand { .. } => {
                notify_key(self.messenger.as_ref(), actor, key);
            }
        }
    }
}

/// Rewrite a leading `left:right` token to `left` with `right` pushed
/// to the end of the argument tail. One-time and non-recursive:
/// `["h:2", "Steve"]` becomes `["h", "Steve", "2"]`. A bare trailing
/// colon carries no right part and is left alone.
fn rewrite_colon_alias(args: &mut Vec<String>) {
    let Some(first) = args.first() else {
        return;
    };
    let parts: Vec<&str> = first.split(':').collect();
    if parts.len() != 2 || parts[1].is_empty() {
        return;
    }
    let left = parts[0].to_string();
    let right = parts[1].to_string();
    args[0] = left;
    args.push(right);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> Option<String> {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return Some((*message).to_string());
    }
    payload.downcast_ref::<String>().cloned()
}
