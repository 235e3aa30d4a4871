use super::super::*;

#[test]
fn explicit_value_wins() {
    let mut container = FlagContainer::new();
    container.set(FlagKind::Projectiles, FlagValue::Bool(true));
    let mut road = FlagContainer::new();
    road.set(FlagKind::Projectiles, FlagValue::Bool(false));

    let resolved = resolve_flag(FlagKind::Projectiles, &container, Some(&road), None);
    assert_eq!(resolved, FlagValue::Bool(true));
}

#[test]
fn road_default_wins_over_caller_default() {
    let container = FlagContainer::new();
    let mut road = FlagContainer::new();
    road.set(FlagKind::Projectiles, FlagValue::Bool(true));

    let resolved = resolve_flag(
        FlagKind::Projectiles,
        &container,
        Some(&road),
        Some(FlagValue::Bool(false)),
    );
    assert_eq!(resolved, FlagValue::Bool(true));
}

#[test]
fn caller_default_wins_over_global() {
    let container = FlagContainer::new();
    let resolved = resolve_flag(
        FlagKind::Projectiles,
        &container,
        None,
        Some(FlagValue::Bool(true)),
    );
    assert_eq!(resolved, FlagValue::Bool(true));
}

#[test]
fn resolution_is_total() {
    let container = FlagContainer::new();
    for kind in [
        FlagKind::Projectiles,
        FlagKind::AmbientEffects,
        FlagKind::Entry,
        FlagKind::Description,
        FlagKind::DensityCap,
    ] {
        let resolved = resolve_flag(kind, &container, None, None);
        assert_eq!(resolved, kind.global_default());
    }
}

#[test]
fn mistyped_boolean_falls_back_to_global_default() {
    let mut container = FlagContainer::new();
    container.set(FlagKind::AmbientEffects, FlagValue::Text("oops".to_string()));

    // AmbientEffects defaults to true; the mistyped stored value must
    // resolve toward that, not toward denial.
    assert!(boolean_flag_value(
        FlagKind::AmbientEffects,
        &container,
        None,
        None
    ));
}

#[test]
fn remove_restores_inherited_value() {
    let mut container = FlagContainer::new();
    container.set(FlagKind::Entry, FlagValue::Bool(false));
    assert!(!boolean_flag_value(FlagKind::Entry, &container, None, None));

    container.remove(FlagKind::Entry);
    assert!(boolean_flag_value(FlagKind::Entry, &container, None, None));
}
