mod common;

use std::time::Duration;

use common::*;
use portalbox_controller::{AccessState, ControllerConfig, DisplayColors, InputSnapshot, NotificationMode, SideEffect};
use portalbox_core::AuthorityLevel;
use portalbox_effects::LightCommand;

fn effects(steps: &[portalbox_controller::Step]) -> Vec<SideEffect> {
    steps.iter().flat_map(|s| s.effects.clone()).collect()
}

fn path(steps: &[portalbox_controller::Step]) -> Vec<AccessState> {
    steps.iter().flat_map(|s| s.path.clone()).collect()
}

#[test]
fn test_authorized_user_powers_equipment() {
    let mut h = Harness::idle(ControllerConfig::default());

    let step = h.tick(InputSnapshot::no_card());
    assert!(!step.changed());

    let step = h.tick(user(OWNER, AuthorityLevel::User));
    assert_eq!(step.path, vec![AccessState::IdleUnknownCard, AccessState::RunningAuthorizedUser]);
    assert_eq!(
        step.effects,
        vec![
            SideEffect::SetPower(true),
            SideEffect::Light(LightCommand::Color {
                rgb: DisplayColors::default().auth_color
            }),
            SideEffect::LogAccessAttempt {
                card: card(OWNER),
                success: true
            },
        ]
    );
    assert_eq!(h.machine.session().authorized_card_id, Some(card(OWNER)));
    assert_eq!(h.machine.session().user_authority_level, AuthorityLevel::User);
}

#[test]
fn test_card_removed_past_grace_completes_session_once() {
    let mut h = Harness::idle(ControllerConfig::default());
    h.tick(user(OWNER, AuthorityLevel::User));

    let steps = h.hold(InputSnapshot::no_card(), Duration::from_secs(3));
    assert_eq!(
        path(&steps),
        vec![AccessState::RunningNoCard, AccessState::AccessComplete, AccessState::IdleNoCard]
    );
    assert_eq!(h.state(), AccessState::IdleNoCard);

    let all = effects(&steps);
    let completions: Vec<_> = all
        .iter()
        .filter(|e| matches!(e, SideEffect::LogAccessCompletion { .. }))
        .collect();
    assert_eq!(completions, vec![&SideEffect::LogAccessCompletion { card: card(OWNER) }]);

    let power_off = all.iter().position(|e| *e == SideEffect::SetPower(false)).unwrap();
    let sleep = all
        .iter()
        .position(|e| matches!(e, SideEffect::Light(LightCommand::Pulse { .. })))
        .unwrap();
    assert!(power_off < sleep);
    assert!(h.machine.session().is_empty());
}

#[test]
fn test_grace_holds_until_period_elapses() {
    let mut h = Harness::idle(ControllerConfig::default());
    h.tick(user(OWNER, AuthorityLevel::User));

    let steps = h.hold(InputSnapshot::no_card(), Duration::from_millis(1900));
    assert_eq!(path(&steps), vec![AccessState::RunningNoCard]);

    // card back inside the grace period
    let step = h.tick(user(OWNER, AuthorityLevel::User));
    assert_eq!(step.path, vec![AccessState::RunningAuthorizedUser]);
}

#[test]
fn test_proxy_card_takes_over_during_grace() {
    let config = ControllerConfig {
        allow_proxy: true,
        ..ControllerConfig::default()
    };
    let mut h = Harness::idle(config);
    h.tick(user(OWNER, AuthorityLevel::User));
    h.tick(InputSnapshot::no_card());
    assert_eq!(h.state(), AccessState::RunningNoCard);

    let step = h.tick(proxy(PROXY));
    assert_eq!(step.path, vec![AccessState::RunningProxy]);
    assert_eq!(h.machine.session().proxy_card_id, Some(card(PROXY)));
    assert_eq!(h.machine.session().training_card_id, None);
    assert_eq!(h.machine.session().authorized_card_id, Some(card(OWNER)));
    assert!(step.effects.contains(&SideEffect::Light(LightCommand::Color {
        rgb: DisplayColors::default().proxy_color
    })));
}

#[test]
fn test_proxy_refused_when_not_allowed() {
    let mut h = Harness::idle(ControllerConfig::default());
    h.tick(user(OWNER, AuthorityLevel::User));
    h.tick(InputSnapshot::no_card());

    let step = h.tick(proxy(PROXY));
    assert_eq!(
        step.path,
        vec![
            AccessState::AccessComplete,
            AccessState::IdleNoCard,
            AccessState::IdleUnknownCard,
            AccessState::IdleUnauthorizedCard,
        ]
    );
}

#[test]
fn test_completion_is_logged_for_owner_in_proxy_mode() {
    let config = ControllerConfig {
        allow_proxy: true,
        ..ControllerConfig::default()
    };
    let mut h = Harness::idle(config);
    h.tick(user(OWNER, AuthorityLevel::User));
    h.tick(InputSnapshot::no_card());
    h.tick(proxy(PROXY));

    let steps = h.hold(InputSnapshot::no_card(), Duration::from_secs(3));
    assert!(effects(&steps).contains(&SideEffect::LogAccessCompletion { card: card(OWNER) }));
    assert_eq!(h.state(), AccessState::IdleNoCard);
}

#[test]
fn test_trainer_hands_over_to_trainee_and_back() {
    let mut h = Harness::idle(ControllerConfig::default());
    h.tick(user(OWNER, AuthorityLevel::Trainer));
    h.tick(InputSnapshot::no_card());

    let step = h.tick(trainee(TRAINEE, true));
    assert_eq!(step.path, vec![AccessState::RunningTraining]);
    assert_eq!(h.machine.session().training_card_id, Some(card(TRAINEE)));

    h.tick(InputSnapshot::no_card());
    let step = h.tick(user(OWNER, AuthorityLevel::Trainer));
    assert_eq!(step.path, vec![AccessState::RunningAuthorizedUser]);
    assert_eq!(h.machine.session().training_card_id, None);
}

#[test]
fn test_training_needs_trainer_and_eligible_card() {
    for (level, eligible) in [(AuthorityLevel::User, true), (AuthorityLevel::Trainer, false)] {
        let mut h = Harness::idle(ControllerConfig::default());
        h.tick(user(OWNER, level));
        h.tick(InputSnapshot::no_card());
        h.tick(trainee(TRAINEE, eligible));
        assert_eq!(h.state(), AccessState::IdleUnauthorizedCard, "{:?} {}", level, eligible);
    }
}

#[test]
fn test_proxy_blocked_after_training() {
    let config = ControllerConfig {
        allow_proxy: true,
        ..ControllerConfig::default()
    };
    let mut h = Harness::idle(config);
    h.tick(user(OWNER, AuthorityLevel::Trainer));
    h.tick(InputSnapshot::no_card());
    h.tick(trainee(TRAINEE, true));
    h.tick(InputSnapshot::no_card());

    let step = h.tick(proxy(PROXY));
    assert!(step.visited(AccessState::AccessComplete));
    assert_eq!(h.state(), AccessState::IdleUnauthorizedCard);
}

#[test]
fn test_left_behind_proxy_card_uses_proxy_template() {
    let config = ControllerConfig {
        allow_proxy: true,
        timeout_minutes: 1,
        ..ControllerConfig::default()
    };
    let mut h = Harness::idle(config);
    h.tick(user(OWNER, AuthorityLevel::User));
    h.tick(InputSnapshot::no_card());
    h.tick(proxy(PROXY));
    assert_eq!(h.state(), AccessState::RunningProxy);

    let steps = h.hold(proxy(PROXY), Duration::from_millis(60_100));
    assert_eq!(path(&steps), vec![AccessState::RunningTimedOut]);

    let steps = h.hold(proxy(PROXY), Duration::from_secs(30));
    assert_eq!(path(&steps), vec![AccessState::IdleCardLeftBehind]);
    assert!(effects(&steps).contains(&SideEffect::EmailCardLeftBehind(NotificationMode::Proxy {
        user: card(OWNER),
        proxy: card(PROXY)
    })));

    let step = h.tick(InputSnapshot::no_card());
    assert_eq!(step.path, vec![AccessState::AccessComplete, AccessState::IdleNoCard]);
}

#[test]
fn test_shutdown_request_from_running_session() {
    let mut h = Harness::idle(ControllerConfig::default());
    h.tick(user(OWNER, AuthorityLevel::User));

    let now = h.now;
    let step = h.machine.shutdown(now);
    assert_eq!(step.path, vec![AccessState::ShuttingDown]);
    assert_eq!(step.effects.first(), Some(&SideEffect::SetPower(false)));
    assert_eq!(step.effects.last(), Some(&SideEffect::Exit));
}
