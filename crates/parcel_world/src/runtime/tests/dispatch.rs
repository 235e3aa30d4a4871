use super::super::*;
use super::{
    arc_caps, claimed, loc, snapshot_of, test_region, FixedEconomy, OpenWorld, RecordingMessenger,
    StaticCaps, REGION, WORLD,
};
use crate::geometry::{ParcelId, RegionBounds};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::super::region::Region;

fn recording(seen: &Arc<Mutex<Vec<String>>>) -> impl CommandExecutor {
    let seen = Arc::clone(seen);
    move |ctx: CommandContext| -> BoxFuture<'static, Result<(), DispatchError>> {
        let seen = Arc::clone(&seen);
        async move {
            *seen.lock().unwrap() = ctx.args;
            Ok(())
        }
        .boxed()
    }
}

fn flagging(ran: &Arc<AtomicBool>) -> impl CommandExecutor {
    let ran = Arc::clone(ran);
    move |_ctx: CommandContext| -> BoxFuture<'static, Result<(), DispatchError>> {
        let ran = Arc::clone(&ran);
        async move {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}

fn panicking() -> impl CommandExecutor {
    |_ctx: CommandContext| -> BoxFuture<'static, Result<(), DispatchError>> {
        async { panic!("kaboom") }.boxed()
    }
}

fn dispatcher_for(
    tree: CommandTree,
    snapshot: WorldSnapshot,
    caps: StaticCaps,
    economy: FixedEconomy,
    allow_relocation: bool,
) -> (Dispatcher, Arc<RecordingMessenger>) {
    let messenger = Arc::new(RecordingMessenger::default());
    let settings = Settings::default();
    let gate = Arc::new(ConfirmationGate::new(settings.confirmation_timeout()));
    let dispatcher = Dispatcher::new(
        Arc::new(tree),
        SnapshotHandle::new(snapshot),
        Arc::new(settings),
        gate,
        arc_caps(caps),
        Arc::new(economy),
        messenger.clone(),
        Arc::new(OpenWorld { allow_relocation }),
        tokio::runtime::Handle::current(),
    );
    (dispatcher, messenger)
}

fn dispatcher_with(
    tree: CommandTree,
    region: Region,
    caps: StaticCaps,
    economy: FixedEconomy,
    allow_relocation: bool,
) -> (Dispatcher, Arc<RecordingMessenger>) {
    dispatcher_for(tree, snapshot_of(region), caps, economy, allow_relocation)
}

fn located_player(x: f64, z: f64) -> Arc<Actor> {
    let actor = Arc::new(Actor::player("steve"));
    actor.set_base_location(Some(loc(x, z)));
    actor
}

async fn wait_for(flag: &Arc<AtomicBool>) -> bool {
    for _ in 0..100 {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn colon_alias_rewrites_into_a_trailing_argument() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let tree = CommandTree::new(
        CommandNode::new("parcel")
            .alias("p")
            .then(CommandNode::new("home").alias("h").executor(recording(&seen))),
    );
    let (dispatcher, _) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/p h:2 Steve")
        .await;
    assert_eq!(result, DispatchResult::Completed);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["Steve".to_string(), "2".to_string()]
    );
}

#[tokio::test]
async fn scope_switch_is_visible_during_execution_and_restored_after() {
    let observed = Arc::new(Mutex::new(None));
    let executor = {
        let observed = Arc::clone(&observed);
        move |ctx: CommandContext| -> BoxFuture<'static, Result<(), DispatchError>> {
            let observed = Arc::clone(&observed);
            async move {
                *observed.lock().unwrap() = ctx.actor.scope().last_parcel;
                Ok(())
            }
            .boxed()
        }
    };
    let tree =
        CommandTree::new(CommandNode::new("parcel").then(CommandNode::new("echo").executor(executor)));
    let mut region = test_region();
    claimed(&mut region, 0, 0, "steve");
    let (dispatcher, _) = dispatcher_with(
        tree,
        region,
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let actor = located_player(10.0, 10.0);
    let result = dispatcher.dispatch(Arc::clone(&actor), "/parcel 0;0 echo").await;
    assert_eq!(result, DispatchResult::Completed);
    assert_eq!(
        *observed.lock().unwrap(),
        Some((REGION.to_string(), ParcelId::new(0, 0)))
    );
    assert_eq!(actor.scope(), ActorScope::default());
    assert_eq!(actor.region_hint(), None);
}

#[tokio::test]
async fn scope_is_restored_after_a_command_panic() {
    let tree =
        CommandTree::new(CommandNode::new("parcel").then(CommandNode::new("boom").executor(panicking())));
    let mut region = test_region();
    claimed(&mut region, 0, 0, "steve");
    let (dispatcher, _) = dispatcher_with(
        tree,
        region,
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let actor = located_player(10.0, 10.0);
    let result = dispatcher.dispatch(Arc::clone(&actor), "/parcel 0;0 boom").await;
    assert_eq!(
        result,
        DispatchResult::Failed(DispatchError::CommandFault {
            message: Some("kaboom".to_string()),
        })
    );
    assert_eq!(actor.scope(), ActorScope::default());
}

#[tokio::test]
async fn relocation_veto_fails_the_scope_switch() {
    let tree =
        CommandTree::new(CommandNode::new("parcel").then(CommandNode::new("echo").executor(flagging(
            &Arc::new(AtomicBool::new(false)),
        ))));
    let mut region = test_region();
    claimed(&mut region, 0, 0, "steve");
    let (dispatcher, messenger) = dispatcher_with(
        tree,
        region,
        StaticCaps::default(),
        FixedEconomy::default(),
        false,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel 0;0 echo")
        .await;
    assert_eq!(result, DispatchResult::Failed(DispatchError::BorderDenied));
    assert_eq!(messenger.keys_for("steve"), vec!["border.denied".to_string()]);
}

#[tokio::test]
async fn unrecognized_dash_flag_is_rejected() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree =
        CommandTree::new(CommandNode::new("parcel").then(CommandNode::new("home").executor(flagging(&ran))));
    let (dispatcher, messenger) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel -x home")
        .await;
    assert_eq!(
        result,
        DispatchResult::Failed(DispatchError::InvalidFlag {
            flag: "x".to_string(),
        })
    );
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(
        messenger.keys_for("steve"),
        vec!["errors.invalid_command_flag".to_string()]
    );
}

#[tokio::test]
async fn unknown_subcommands_fail_without_spawning() {
    let tree = CommandTree::new(
        CommandNode::new("parcel").then(CommandNode::new("home").executor(flagging(
            &Arc::new(AtomicBool::new(false)),
        ))),
    );
    let (dispatcher, messenger) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel teleport")
        .await;
    assert!(matches!(
        result,
        DispatchResult::Failed(DispatchError::UnknownCommand { .. })
    ));
    assert_eq!(
        messenger.keys_for("steve"),
        vec!["commands.not_valid_subcommand".to_string()]
    );
}

#[tokio::test]
async fn confirmation_parks_execution_until_confirmed() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(
        CommandNode::new("parcel").then(CommandNode::new("delete").confirm().executor(flagging(&ran))),
    );
    let (dispatcher, messenger) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let actor = located_player(10.0, 10.0);
    let result = dispatcher.dispatch(Arc::clone(&actor), "/parcel delete").await;
    assert_eq!(result, DispatchResult::ConfirmationRequested);
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(
        messenger.keys_for("steve"),
        vec!["confirm.requires_confirm".to_string()]
    );

    assert!(dispatcher.confirm_pending(&actor.id));
    assert!(wait_for(&ran).await);
}

#[tokio::test]
async fn confirming_with_nothing_pending_reports_a_failure() {
    let tree = CommandTree::new(CommandNode::new("parcel"));
    let (dispatcher, messenger) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    assert!(!dispatcher.confirm_pending(&"steve".to_string()));
    assert_eq!(messenger.keys_for("steve"), vec!["confirm.failed".to_string()]);
}

#[tokio::test]
async fn force_flag_skips_confirmation() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(
        CommandNode::new("parcel").then(CommandNode::new("delete").confirm().executor(flagging(&ran))),
    );
    let (dispatcher, _) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel -f delete")
        .await;
    assert_eq!(result, DispatchResult::Completed);
    assert!(ran.load(Ordering::SeqCst));
}

fn priced_region(price: f64) -> Region {
    let mut region = test_region();
    region.economy_enabled = true;
    region.prices.insert("claim".to_string(), price);
    region
}

#[tokio::test]
async fn priced_commands_require_sufficient_balance() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(
        CommandNode::new("parcel").then(CommandNode::new("claim").priced("claim").executor(flagging(&ran))),
    );
    let mut economy = FixedEconomy::default();
    economy.balances.insert("steve".to_string(), 5.0);
    let (dispatcher, messenger) = dispatcher_with(
        tree,
        priced_region(100.0),
        StaticCaps::default(),
        economy,
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel claim")
        .await;
    assert_eq!(
        result,
        DispatchResult::Failed(DispatchError::InsufficientFunds {
            price: 100.0,
            balance: 5.0,
        })
    );
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(
        messenger.keys_for("steve"),
        vec!["economy.cannot_afford_command".to_string()]
    );
}

#[tokio::test]
async fn economy_bypass_capability_waives_the_price() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(
        CommandNode::new("parcel").then(CommandNode::new("claim").priced("claim").executor(flagging(&ran))),
    );
    let (dispatcher, _) = dispatcher_with(
        tree,
        priced_region(100.0),
        StaticCaps::default().grant("steve", CAP_ADMIN_BYPASS_ECON),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel claim")
        .await;
    assert_eq!(result, DispatchResult::Completed);
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn forced_dispatch_prices_without_the_bypass_exemption() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(CommandNode::new("parcel").then(
        CommandNode::new("claim").priced("claim").confirm().executor(flagging(&ran)),
    ));
    let (dispatcher, _) = dispatcher_with(
        tree,
        priced_region(100.0),
        StaticCaps::default().grant("steve", CAP_ADMIN_BYPASS_ECON),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel -f claim")
        .await;
    assert_eq!(
        result,
        DispatchResult::Failed(DispatchError::InsufficientFunds {
            price: 100.0,
            balance: 0.0,
        })
    );
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn console_actors_are_never_priced() {
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(
        CommandNode::new("parcel").then(CommandNode::new("claim").priced("claim").executor(flagging(&ran))),
    );
    let (dispatcher, _) = dispatcher_with(
        tree,
        priced_region(100.0),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let result = dispatcher
        .dispatch(Arc::new(Actor::console()), "/parcel claim")
        .await;
    assert_eq!(result, DispatchResult::Completed);
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn completion_requires_a_configured_root_alias() {
    let tree = CommandTree::new(
        CommandNode::new("parcel")
            .then(CommandNode::new("home").then(CommandNode::new("list"))),
    );
    let (dispatcher, _) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );
    let actor = Actor::player("steve");

    assert_eq!(
        dispatcher.complete(&actor, "/parcel home "),
        vec!["list".to_string()]
    );
    // A still-open single argument never completes.
    assert!(dispatcher.complete(&actor, "/parcel home").is_empty());
    // Unconfigured root alias.
    assert!(dispatcher.complete(&actor, "/plot home ").is_empty());
    // No slash, no root-only buffers.
    assert!(dispatcher.complete(&actor, "parcel home ").is_empty());
    assert!(dispatcher.complete(&actor, "/parcel").is_empty());
    // Console actors are not completed.
    assert!(dispatcher.complete(&Actor::console(), "/parcel home ").is_empty());
}

#[tokio::test]
async fn region_hint_does_not_leak_into_later_dispatches() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let ran = Arc::new(AtomicBool::new(false));
    let tree = CommandTree::new(
        CommandNode::new("parcel")
            .then(CommandNode::new("echo").executor(recording(&seen)))
            .then(CommandNode::new("claim").priced("claim").executor(flagging(&ran))),
    );
    // Economy is off in alpha and on in beta.
    let alpha = test_region();
    let mut beta = Region::new(
        "beta",
        WORLD,
        RegionBounds {
            min_x: 2048.0,
            min_z: 2048.0,
            max_x: 3072.0,
            max_z: 3072.0,
        },
    );
    beta.economy_enabled = true;
    beta.prices.insert("claim".to_string(), 100.0);
    let id = ParcelId::new(64, 64);
    let mut parcel = Parcel::new(id, beta.id.clone());
    parcel.owner = Some("steve".to_string());
    beta.parcels.insert(id, parcel);

    let (dispatcher, _) = dispatcher_for(
        tree,
        WorldSnapshot::new(vec![alpha, beta]),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    let actor = Arc::new(Actor::player("steve"));
    let result = dispatcher
        .dispatch(Arc::clone(&actor), "/parcel 64;64 echo")
        .await;
    assert_eq!(result, DispatchResult::Completed);
    assert_eq!(actor.region_hint(), None);

    // Standing in alpha afterwards, the priced command is not billed
    // against beta's price table.
    actor.set_base_location(Some(loc(10.0, 10.0)));
    let result = dispatcher.dispatch(Arc::clone(&actor), "/parcel claim").await;
    assert_eq!(result, DispatchResult::Completed);
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn bare_trailing_colon_is_not_rewritten() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let tree = CommandTree::new(
        CommandNode::new("parcel")
            .then(CommandNode::new("home").alias("h").executor(recording(&seen))),
    );
    let (dispatcher, _) = dispatcher_with(
        tree,
        test_region(),
        StaticCaps::default(),
        FixedEconomy::default(),
        true,
    );

    // "h:" has no right part; it must not resolve to the "h" alias
    // with an empty trailing argument.
    let result = dispatcher
        .dispatch(located_player(10.0, 10.0), "/parcel h: Steve")
        .await;
    assert!(matches!(
        result,
        DispatchResult::Failed(DispatchError::UnknownCommand { .. })
    ));
    assert!(seen.lock().unwrap().is_empty());
}
