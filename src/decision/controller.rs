//! Combatant controller - one combatant's complete decision loop
//!
//! Owns the personality, the directive cache, both random streams and the
//! pending decision. Nothing here is shared between combatants.

use std::time::Duration;

use crate::core::config::EngineConfig;
use crate::core::types::{CombatantId, GameTime, Tick};
use crate::decision::action::ActionCategory;
use crate::decision::bias::BiasTable;
use crate::decision::orders::{ActiveOrder, OrderBiasResolver};
use crate::decision::personality::PersonalityProfile;
use crate::decision::progression::{BattleOutcomeRecord, ProgressionReport, ProgressionTracker};
use crate::decision::scheduler::{
    ActionSink, Decision, DelayModel, ExecutionScheduler, PreemptionPolicy, ScheduleOutcome,
};
use crate::decision::selector::{ActionSelector, CategoricalSampler, SeededSampler};
use crate::decision::sensor::SensorSnapshot;
use crate::decision::situational::SituationalBiasRule;

/// Everything that happened during one call to `process_tick`
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Set when this call sampled and decided
    pub decision: Option<ScheduleOutcome>,
    /// Set when a pending decision was handed to the sink
    pub executed: Option<Decision>,
}

pub struct CombatantController<S = SeededSampler> {
    id: CombatantId,
    profile: PersonalityProfile,
    situational: SituationalBiasRule,
    orders: OrderBiasResolver,
    active_order: ActiveOrder,
    selector: ActionSelector<S>,
    scheduler: ExecutionScheduler,
    progression: ProgressionTracker,
    sampling_interval: Duration,
    tick: Tick,
    last_evaluation: Option<GameTime>,
}

impl CombatantController<SeededSampler> {
    /// Create a controller with fixed default seeds
    pub fn new(config: &EngineConfig, profile: PersonalityProfile) -> Self {
        Self::with_seeds(config, profile, 42, 43)
    }

    /// Create with specific seeds for the selection and jitter streams
    pub fn with_seeds(
        config: &EngineConfig,
        profile: PersonalityProfile,
        selection_seed: u64,
        jitter_seed: u64,
    ) -> Self {
        Self::with_sampler(config, profile, SeededSampler::new(selection_seed), jitter_seed)
    }
}

impl<S: CategoricalSampler> CombatantController<S> {
    /// Create with a custom categorical sampler
    pub fn with_sampler(
        config: &EngineConfig,
        profile: PersonalityProfile,
        sampler: S,
        jitter_seed: u64,
    ) -> Self {
        Self {
            id: CombatantId::new(),
            profile,
            situational: SituationalBiasRule::new(config.thresholds.clone()),
            orders: OrderBiasResolver::new(config.order_biases.clone()),
            active_order: ActiveOrder::new(),
            selector: ActionSelector::new(config.base_weights, config.modulation.clone(), sampler),
            scheduler: ExecutionScheduler::new(
                DelayModel::from_config(config),
                PreemptionPolicy::default(),
                jitter_seed,
            ),
            progression: ProgressionTracker::new(config.progression.clone()),
            sampling_interval: config.sampling_interval,
            tick: 0,
            last_evaluation: None,
        }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn profile(&self) -> &PersonalityProfile {
        &self.profile
    }

    pub fn directive(&self) -> Option<&str> {
        self.active_order.token()
    }

    pub fn pending(&self) -> Option<&Decision> {
        self.scheduler.pending()
    }

    pub fn ticks(&self) -> Tick {
        self.tick
    }

    pub fn sampling_interval(&self) -> Duration {
        self.sampling_interval
    }

    pub fn set_preemption_policy(&mut self, policy: PreemptionPolicy) {
        self.scheduler.set_policy(policy);
    }

    /// Switch the active directive; the order bias is cached until it changes
    pub fn set_directive(&mut self, token: &str) {
        self.active_order.update(&self.orders, token);
    }

    /// Final, non-negative weights for a snapshot
    pub fn weights_for(&self, snapshot: &SensorSnapshot) -> BiasTable {
        let situational = self.situational.evaluate(snapshot);
        let mut weights =
            self.selector
                .combine(&situational, self.active_order.bias(), &self.profile);

        if !snapshot.step_ready {
            weights.set(ActionCategory::Step, 0.0);
        }
        weights
    }

    /// Choose an action for a snapshot without scheduling it
    pub fn think(&mut self, snapshot: &SensorSnapshot) -> (ActionCategory, BiasTable) {
        let weights = self.weights_for(snapshot);
        let action = self.selector.select(&weights);
        (action, weights)
    }

    /// Is a fresh sample due at `now`?
    fn should_evaluate(&self, now: GameTime) -> bool {
        match self.last_evaluation {
            None => true,
            Some(last) => now >= last + self.sampling_interval,
        }
    }

    /// Advance the loop to `now`
    ///
    /// Executes a due pending decision, then samples and decides if the
    /// sampling interval has elapsed. A zero-delay decision executes in the
    /// same call.
    pub fn process_tick(
        &mut self,
        snapshot: &SensorSnapshot,
        now: GameTime,
        sink: &mut dyn ActionSink,
    ) -> TickReport {
        let mut report = TickReport {
            decision: None,
            executed: self.scheduler.poll(now, sink),
        };

        if !self.should_evaluate(now) {
            return report;
        }
        self.last_evaluation = Some(now);

        let (action, weights) = self.think(snapshot);
        let hint = self.profile.ordering_hint();
        let outcome = self
            .scheduler
            .schedule(action, snapshot.sync, self.tick, now, &hint);

        tracing::debug!(
            combatant = %self.id,
            tick = self.tick,
            action = %action,
            total_weight = weights.total(),
            "Decided"
        );

        self.tick += 1;
        report.decision = Some(outcome);

        if report.executed.is_none() {
            report.executed = self.scheduler.poll(now, sink);
        }
        report
    }

    /// Hand the pending decision to `sink` if it is due, without sampling
    pub fn execute_due(&mut self, now: GameTime, sink: &mut dyn ActionSink) -> Option<Decision> {
        self.scheduler.poll(now, sink)
    }

    /// Drop the pending decision without executing it
    pub fn cancel_pending(&mut self) -> Option<Decision> {
        self.scheduler.cancel()
    }

    /// Resolve the battle: drop any pending decision and evolve personality
    ///
    /// Takes `&mut self`, so it cannot overlap a running tick.
    pub fn end_battle(&mut self, outcome: &BattleOutcomeRecord) -> ProgressionReport {
        if let Some(dropped) = self.scheduler.cancel() {
            tracing::debug!(combatant = %self.id, action = %dropped.action, "Pending decision dropped at battle end");
        }
        self.tick = 0;
        self.last_evaluation = None;
        self.active_order.clear();
        self.progression.apply(outcome, &mut self.profile)
    }
}
