//! The hierarchical command registry.
//!
//! The tree is built once at startup, wrapped in an `Arc` and read
//! concurrently without locking. Registration failures (sibling name
//! or alias collisions) log and skip the offending node rather than
//! poisoning the whole tree.

use futures::future::BoxFuture;
use std::sync::Arc;

use super::actor::Actor;
use super::error::DispatchError;
use super::providers::CapabilityCheck;
use super::snapshot::WorldSnapshot;
use super::types::CommandId;

/// Everything a command implementation receives.
pub struct CommandContext {
    pub actor: Arc<Actor>,
    pub args: Vec<String>,
    pub snapshot: Arc<WorldSnapshot>,
}

/// An opaque executable unit behind a command node.
///
/// Declared failures are reported through the [`DispatchError`]
/// taxonomy; a panic is recovered by the dispatcher as a command
/// fault.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, ctx: CommandContext) -> BoxFuture<'static, Result<(), DispatchError>>;
}

impl<F> CommandExecutor for F
where
    F: Fn(CommandContext) -> BoxFuture<'static, Result<(), DispatchError>> + Send + Sync,
{
    fn execute(&self, ctx: CommandContext) -> BoxFuture<'static, Result<(), DispatchError>> {
        self(ctx)
    }
}

/// One node of the command tree.
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    children: Vec<Arc<CommandNode>>,
    executor: Option<Arc<dyn CommandExecutor>>,
    /// Priced-action identifier used for economy gating.
    command_id: Option<CommandId>,
    /// Capability required to see and run the node.
    required_capability: Option<String>,
    /// Destructive or priced nodes go through two-phase confirmation.
    requires_confirmation: bool,
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            children: Vec::new(),
            executor: None,
            command_id: None,
            required_capability: None,
            requires_confirmation: false,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn executor(mut self, executor: impl CommandExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    pub fn priced(mut self, command_id: impl Into<CommandId>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capability = Some(capability.into());
        self
    }

    pub fn confirm(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    /// Register a child. A name or alias colliding with an existing
    /// sibling logs the collision and drops the child.
    pub fn then(mut self, child: CommandNode) -> Self {
        if self.collides(&child) {
            log::error!(
                "command registration skipped: {:?} collides under {:?}",
                child.name,
                self.name
            );
            return self;
        }
        self.children.push(Arc::new(child));
        self
    }

    fn collides(&self, child: &CommandNode) -> bool {
        let mut labels = vec![child.name.as_str()];
        labels.extend(child.aliases.iter().map(String::as_str));
        self.children.iter().any(|sibling| {
            labels
                .iter()
                .any(|label| sibling.matches(label))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command_id(&self) -> Option<&str> {
        self.command_id.as_deref()
    }

    pub fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    pub(crate) fn executor_ref(&self) -> Option<Arc<dyn CommandExecutor>> {
        self.executor.clone()
    }

    pub fn matches(&self, token: &str) -> bool {
        self.name.eq_ignore_ascii_case(token)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(token))
    }

    fn child(&self, token: &str) -> Option<&Arc<CommandNode>> {
        self.children.iter().find(|child| child.matches(token))
    }

    /// Capability-gated visibility; hidden nodes are excluded from
    /// completion, never an error.
    fn visible_to(&self, actor: &Actor, capabilities: &dyn CapabilityCheck) -> bool {
        match &self.required_capability {
            None => true,
            Some(capability) => {
                actor.is_console() || capabilities.has_capability(&actor.id, capability)
            }
        }
    }
}

/// Immutable registry of command nodes under a single root.
pub struct CommandTree {
    root: Arc<CommandNode>,
}

impl CommandTree {
    pub fn new(root: CommandNode) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Arc<CommandNode> {
        &self.root
    }

    /// Walk tokens through names and aliases, stopping at the deepest
    /// matching node; the rest of the tokens become its arguments.
    pub fn resolve<'a>(&self, tokens: &'a [String]) -> (Arc<CommandNode>, &'a [String]) {
        let mut current = Arc::clone(&self.root);
        let mut index = 0;
        while index < tokens.len() {
            let Some(child) = current.child(&tokens[index]) else {
                break;
            };
            current = Arc::clone(child);
            index += 1;
        }
        (current, &tokens[index..])
    }

    /// Completion candidates for the argument tokens after the root.
    ///
    /// With a single argument and no trailing space this is a no-op;
    /// a trailing space descends into the named child and lists its
    /// children. Hidden nodes are filtered by capability.
    pub fn complete(
        &self,
        args: &[String],
        trailing_space: bool,
        actor: &Actor,
        capabilities: &dyn CapabilityCheck,
    ) -> Vec<String> {
        Self::complete_at(&self.root, args, trailing_space, actor, capabilities)
    }

    fn complete_at(
        node: &Arc<CommandNode>,
        args: &[String],
        trailing_space: bool,
        actor: &Actor,
        capabilities: &dyn CapabilityCheck,
    ) -> Vec<String> {
        match args {
            [] => node
                .children
                .iter()
                .filter(|child| child.visible_to(actor, capabilities))
                .map(|child| child.name.clone())
                .collect(),
            [last] => {
                if !trailing_space {
                    return Vec::new();
                }
                match node.child(last) {
                    Some(child) if child.visible_to(actor, capabilities) => {
                        Self::complete_at(child, &[], trailing_space, actor, capabilities)
                    }
                    _ => Vec::new(),
                }
            }
            [head, rest @ ..] => match node.child(head) {
                Some(child) if child.visible_to(actor, capabilities) => {
                    Self::complete_at(child, rest, trailing_space, actor, capabilities)
                }
                _ => Vec::new(),
            },
        }
    }
}
