//! End-to-end decision pipeline scenarios

use std::time::Duration;

use orders_instinct::decision::*;
use orders_instinct::EngineConfig;

const EPS: f32 = 1e-3;

fn cornered_snapshot() -> SensorSnapshot {
    SensorSnapshot::calm()
        .with_threat(0.9)
        .with_target(TargetClass::Boss, 150.0)
        .with_resources(Resources {
            energy: 10.0,
            heat: 80.0,
            special_gauge: 0.0,
            hp: 20.0,
        })
}

fn flat_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.base_weights = BiasTable::uniform(50.0);
    config
}

#[test]
fn test_prudent_evade_dominates_all_out_directive() {
    let config = flat_config();
    let profile =
        PersonalityProfile::new("veteran", Sliders::new(0.0, 0.6, 0.4), 1.0).unwrap();
    assert_eq!(profile.archetype(), Archetype::Prudent);

    let mut controller = CombatantController::new(&config, profile);
    controller.set_directive("all-out");

    let weights = controller.weights_for(&cornered_snapshot());

    // (50 + 40 threat + 20 heat) * 1.18
    assert!((weights.get(ActionCategory::Evade) - 129.8).abs() < EPS);
    // (50 - 30 energy - 20 heat + 40 order) * 0.88
    assert!((weights.get(ActionCategory::StrongAttack) - 35.2).abs() < EPS);

    let top = ranked(&weights)[0].0;
    assert_eq!(top, ActionCategory::Evade);

    let p = distribution(&weights);
    let evade = p[ActionCategory::Evade.index()];
    assert!(p.iter().all(|&other| other <= evade));
}

#[test]
fn test_unknown_directive_behaves_like_none() {
    let config = flat_config();
    let profile = PersonalityProfile::preset(Archetype::Aggressive, 1.0).unwrap();

    let mut plain = CombatantController::new(&config, profile.clone());
    let mut confused = CombatantController::new(&config, profile);
    confused.set_directive("do a barrel roll");

    let snapshot = cornered_snapshot();
    assert_eq!(plain.weights_for(&snapshot), confused.weights_for(&snapshot));

    for _ in 0..20 {
        assert_eq!(plain.think(&snapshot).0, confused.think(&snapshot).0);
    }
}

#[test]
fn test_directive_tokens_are_case_insensitive() {
    let config = EngineConfig::default();
    let profile = PersonalityProfile::balanced(1.0).unwrap();

    let mut lower = CombatantController::new(&config, profile.clone());
    lower.set_directive("hold");
    let mut shouted = CombatantController::new(&config, profile);
    shouted.set_directive("  HOLD ");

    let snapshot = SensorSnapshot::calm();
    assert_eq!(lower.weights_for(&snapshot), shouted.weights_for(&snapshot));
}

#[test]
fn test_step_masked_while_on_cooldown() {
    let config = EngineConfig::default();
    let profile = PersonalityProfile::preset(Archetype::Skittish, 1.0).unwrap();
    let mut controller = CombatantController::with_sampler(&config, profile, FixedDraw(0.0), 7);
    controller.set_directive("defensive");

    let snapshot = cornered_snapshot().with_step_ready(false);
    let weights = controller.weights_for(&snapshot);
    assert_eq!(weights.get(ActionCategory::Step), 0.0);

    let ready = controller.weights_for(&snapshot.with_step_ready(true));
    assert!(ready.get(ActionCategory::Step) > 0.0);
}

#[test]
fn test_same_seeds_replay_identically() {
    let config = EngineConfig::default();
    let profile = PersonalityProfile::preset(Archetype::Prudent, 1.0).unwrap();

    let run = |profile: PersonalityProfile| {
        let mut controller = CombatantController::with_seeds(&config, profile, 2024, 7);
        controller.set_directive("conserve");
        let mut sink = RecordingSink::new();
        let mut now = Duration::ZERO;
        for step in 0..200u32 {
            let threat = (step % 10) as f32 / 10.0;
            let snapshot = SensorSnapshot::calm().with_threat(threat).with_sync(0.5);
            controller.process_tick(&snapshot, now, &mut sink);
            now += Duration::from_millis(50);
        }
        sink.executed
    };

    let first = run(profile.clone());
    let second = run(profile);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_higher_sync_executes_sooner() {
    let mut config = EngineConfig::default();
    config.jitter_secs = 0.0;
    let profile = PersonalityProfile::balanced(1.0).unwrap();

    let mut slow = CombatantController::new(&config, profile.clone());
    let mut fast = CombatantController::new(&config, profile);
    let mut sink = RecordingSink::new();

    slow.process_tick(&SensorSnapshot::calm().with_sync(0.0), Duration::ZERO, &mut sink);
    fast.process_tick(&SensorSnapshot::calm().with_sync(0.8), Duration::ZERO, &mut sink);

    let slow_delay = slow.pending().unwrap().delay();
    let fast_delay = fast.pending().unwrap().delay();
    assert!(fast_delay < slow_delay);
}

#[test]
fn test_sync_cap_keeps_some_hesitation() {
    let mut config = EngineConfig::default();
    config.jitter_secs = 0.0;
    let profile = PersonalityProfile::balanced(1.0).unwrap();
    let mut controller = CombatantController::new(&config, profile);
    let mut sink = RecordingSink::new();

    controller.process_tick(&SensorSnapshot::calm().with_sync(1.0), Duration::ZERO, &mut sink);

    // 350ms * (1 - 0.9)
    let delay = controller.pending().unwrap().delay().as_secs_f32();
    assert!((delay - 0.035).abs() < 1e-3);
    assert!(sink.executed.is_empty());
}

#[test]
fn test_costly_victory_and_defeat_shift_personality() {
    let config = EngineConfig::default();
    let profile = PersonalityProfile::new("rookie", Sliders::new(0.33, 0.33, 0.34), 1.0).unwrap();
    let mut controller = CombatantController::new(&config, profile);

    let report = controller.end_battle(&BattleOutcomeRecord::victory(100.0, 20.0));
    assert_eq!(report.archetype, Archetype::Aggressive);
    assert!(report.archetype_changed());
    assert!((controller.profile().sliders().sum() - 1.0).abs() < 1e-4);

    let mut losses = 0;
    while controller.profile().archetype() != Archetype::Skittish {
        controller.end_battle(&BattleOutcomeRecord::defeat(10.0, 100.0));
        losses += 1;
        assert!(losses < 10, "repeated defeats should make the combatant skittish");
    }
    assert!((controller.profile().sliders().sum() - 1.0).abs() < 1e-4);
}

#[test]
fn test_end_battle_drops_pending_and_directive() {
    let mut config = EngineConfig::default();
    config.min_delay_secs = 1.0;
    let profile = PersonalityProfile::balanced(1.0).unwrap();
    let mut controller = CombatantController::new(&config, profile);
    controller.set_directive("all-out");

    let mut sink = RecordingSink::new();
    controller.process_tick(&SensorSnapshot::calm(), Duration::ZERO, &mut sink);
    assert!(controller.pending().is_some());

    controller.end_battle(&BattleOutcomeRecord::victory(10.0, 0.0));
    assert!(controller.pending().is_none());
    assert!(controller.directive().is_none());
    assert_eq!(controller.ticks(), 0);
    assert!(controller.execute_due(Duration::from_secs(10), &mut sink).is_none());
    assert!(sink.executed.is_empty());
}

#[test]
fn test_personality_presets_load_from_data() {
    let dir = std::path::Path::new("data/personalities");
    for (name, archetype) in [
        ("aggressive", Archetype::Aggressive),
        ("prudent", Archetype::Prudent),
        ("skittish", Archetype::Skittish),
    ] {
        let profile = load_personality(dir, name, 1.0).unwrap();
        assert_eq!(profile.archetype(), archetype);
        assert_eq!(profile.name, name);
    }
    assert!(load_personality(dir, "nonexistent", 1.0).is_err());
}

#[test]
fn test_shipped_engine_config_loads() {
    let config = EngineConfig::load(std::path::Path::new("data/engine.toml")).unwrap();
    let resolver = OrderBiasResolver::new(config.order_biases.clone());
    for token in ["all-out", "hold", "conserve", "balanced"] {
        assert!(resolver.is_known(token), "missing directive {}", token);
    }
    assert!(resolver.resolve("balanced").is_zero());
}
