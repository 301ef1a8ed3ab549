//! Headless Skirmish Runner
//!
//! Replays seeded duels between one AI combatant and a scripted boss, feeding
//! battle outcomes back into the combatant's personality between battles.
//! Prints one JSON (or text) line per battle.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use orders_instinct::decision::{
    load_personality, ActionCategory, Archetype, BattleOutcomeRecord, CombatantController,
    PersonalityProfile, RecordingSink, Resources, SensorSnapshot, TargetClass,
};
use orders_instinct::{EngineConfig, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Headless Skirmish Runner - AI partner vs scripted boss
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run seeded skirmishes and report decisions and personality drift")]
struct Args {
    /// Engine config file
    #[arg(long, default_value = "data/engine.toml")]
    config: PathBuf,

    /// Personality preset (loaded from data/personalities/)
    #[arg(long, default_value = "prudent")]
    personality: String,

    /// Directive given for the whole battle
    #[arg(long, default_value = "balanced")]
    directive: String,

    /// Number of consecutive battles
    #[arg(long, default_value_t = 5)]
    battles: u32,

    /// Battle time limit in seconds
    #[arg(long, default_value_t = 90)]
    time_limit: u64,

    /// Player/AI synchronization (0.0 - 1.0)
    #[arg(long, default_value_t = 0.35)]
    sync: f32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable debug logging of every decision
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishResult {
    battle: u32,
    won: bool,
    seconds: f32,
    damage_dealt: f32,
    damage_taken: f32,
    actions: BTreeMap<String, u32>,
    archetype: String,
    aggressiveness: f32,
    prudence: f32,
    skittishness: f32,
    seed: u64,
}

const STEP: Duration = Duration::from_millis(50);
const BOSS_HP: f32 = 600.0;

/// Minimal stand-in for the game world
struct Arena {
    rng: ChaCha8Rng,
    resources: Resources,
    boss_hp: f32,
    threat: f32,
    distance: f32,
    step_cooldown: f32,
    guard: f32,
    sync: f32,
    dealt: f32,
    taken: f32,
}

impl Arena {
    fn new(seed: u64, sync: f32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            resources: Resources::default(),
            boss_hp: BOSS_HP,
            threat: 0.3,
            distance: 250.0,
            step_cooldown: 0.0,
            guard: 0.0,
            sync,
            dealt: 0.0,
            taken: 0.0,
        }
    }

    fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            threat_level: self.threat,
            target_score: TargetClass::Boss.score(),
            distance: self.distance,
            resources: self.resources,
            sync: self.sync,
            step_ready: self.step_cooldown <= 0.0,
        }
    }

    /// Advance the world by `dt` seconds
    fn advance(&mut self, dt: f32) {
        let r = &mut self.resources;
        r.energy = (r.energy + 20.0 * dt).min(100.0);
        r.heat = (r.heat - 15.0 * dt).max(0.0);
        r.special_gauge = (r.special_gauge + 5.0 * dt).min(100.0);
        self.step_cooldown = (self.step_cooldown - dt).max(0.0);
        self.guard = (self.guard - dt).max(0.0);

        let drift: f32 = self.rng.gen_range(-0.15..=0.15);
        let closeness = (1.0 - self.distance / 400.0).clamp(0.0, 1.0);
        self.threat = (self.threat + drift * dt * 4.0 + (closeness - 0.5) * dt).clamp(0.0, 1.0);

        let exposure = if self.guard > 0.0 { 0.2 } else { 1.0 };
        let damage = self.threat * 6.0 * dt * exposure;
        self.resources.hp = (self.resources.hp - damage).max(0.0);
        self.taken += damage;
    }

    fn hit(&mut self, damage: f32) {
        let falloff = (1.0 - self.distance / 600.0).clamp(0.3, 1.0);
        let dealt = damage * falloff;
        self.boss_hp = (self.boss_hp - dealt).max(0.0);
        self.dealt += dealt;
    }

    fn execute(&mut self, action: ActionCategory) {
        match action {
            ActionCategory::NormalAttack => {
                self.hit(6.0);
                self.resources.heat = (self.resources.heat + 8.0).min(100.0);
                self.resources.energy = (self.resources.energy + 5.0).min(100.0);
            }
            ActionCategory::StrongAttack => {
                if self.resources.energy >= 35.0 {
                    self.hit(3.0 * 22.0);
                    self.resources.energy -= 35.0;
                    self.resources.heat = (self.resources.heat + 25.0).min(100.0);
                }
            }
            ActionCategory::Approach => self.distance = (self.distance - 40.0).max(60.0),
            ActionCategory::KeepDistance => self.distance = (self.distance + 40.0).min(400.0),
            ActionCategory::Evade => self.guard = 0.4,
            ActionCategory::Step => {
                if self.step_cooldown <= 0.0 {
                    self.guard = 0.35;
                    self.step_cooldown = 1.6;
                }
            }
            ActionCategory::Special => {
                if self.resources.special_gauge >= 100.0 {
                    self.hit(7.0 * 18.0);
                    self.resources.special_gauge = 0.0;
                    self.resources.energy = (self.resources.energy - 40.0).max(0.0);
                    self.resources.heat = (self.resources.heat + 40.0).min(100.0);
                }
            }
        }
    }

    fn finished(&self) -> bool {
        self.boss_hp <= 0.0 || self.resources.hp <= 0.0
    }
}

fn run_battle(
    controller: &mut CombatantController,
    directive: &str,
    seed: u64,
    sync: f32,
    time_limit: Duration,
) -> (BattleOutcomeRecord, Duration, BTreeMap<String, u32>) {
    let mut arena = Arena::new(seed, sync);
    let mut sink = RecordingSink::new();
    let mut actions: BTreeMap<String, u32> = BTreeMap::new();
    let mut now = Duration::ZERO;

    controller.set_directive(directive);

    while now < time_limit && !arena.finished() {
        let snapshot = arena.snapshot();
        controller.process_tick(&snapshot, now, &mut sink);

        for (action, _) in sink.executed.drain(..) {
            arena.execute(action);
            *actions.entry(action.to_string()).or_insert(0) += 1;
        }

        arena.advance(STEP.as_secs_f32());
        now += STEP;
    }

    let won = arena.boss_hp <= 0.0;
    let outcome = BattleOutcomeRecord {
        won,
        damage_dealt: arena.dealt,
        damage_taken: arena.taken,
    };
    (outcome, now, actions)
}

fn load_profile(args: &Args, config: &EngineConfig) -> Result<PersonalityProfile> {
    let dir = PathBuf::from("data/personalities");
    if dir.exists() {
        return load_personality(&dir, &args.personality, config.slider_budget);
    }

    let archetype = match args.personality.as_str() {
        "aggressive" => Archetype::Aggressive,
        "skittish" => Archetype::Skittish,
        _ => Archetype::Prudent,
    };
    PersonalityProfile::preset(archetype, config.slider_budget)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "orders_instinct=debug"
    } else {
        "orders_instinct=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = if args.config.exists() {
        EngineConfig::load(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "Config not found, using defaults");
        EngineConfig::default()
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let profile = load_profile(&args, &config)?;
    let mut controller =
        CombatantController::with_seeds(&config, profile, seed, seed.wrapping_add(1));
    let time_limit = Duration::from_secs(args.time_limit);

    for battle in 0..args.battles {
        let battle_seed = seed.wrapping_add(u64::from(battle) * 7919);
        let (outcome, elapsed, actions) = run_battle(
            &mut controller,
            &args.directive,
            battle_seed,
            args.sync,
            time_limit,
        );
        let report = controller.end_battle(&outcome);

        let result = SkirmishResult {
            battle: battle + 1,
            won: outcome.won,
            seconds: elapsed.as_secs_f32(),
            damage_dealt: outcome.damage_dealt,
            damage_taken: outcome.damage_taken,
            actions,
            archetype: report.archetype.to_string(),
            aggressiveness: report.after.aggressiveness,
            prudence: report.after.prudence,
            skittishness: report.after.skittishness,
            seed: battle_seed,
        };

        if args.format == "text" {
            println!(
                "#{:<3} {:<7} {:>5.1}s dealt {:>6.1} taken {:>5.1} -> {} (a {:.2} p {:.2} s {:.2})",
                result.battle,
                if result.won { "WIN" } else { "LOSS" },
                result.seconds,
                result.damage_dealt,
                result.damage_taken,
                result.archetype,
                result.aggressiveness,
                result.prudence,
                result.skittishness,
            );
        } else {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
