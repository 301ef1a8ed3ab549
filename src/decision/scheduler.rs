//! Delayed execution of chosen actions
//!
//! A decision becomes executable after a reaction delay shortened by
//! synchronization and blurred by jitter. Scheduling never blocks: the
//! decision loop keeps sampling while a decision waits, and a fresher one
//! may take its place according to the preemption policy.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::types::{GameTime, Tick};
use crate::decision::action::ActionCategory;

/// A chosen action waiting for its execution time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub action: ActionCategory,
    /// Sampling tick the decision was made on
    pub tick: Tick,
    pub decided_at: GameTime,
    pub executable_at: GameTime,
}

impl Decision {
    pub fn is_due(&self, now: GameTime) -> bool {
        now >= self.executable_at
    }

    pub fn delay(&self) -> Duration {
        self.executable_at.saturating_sub(self.decided_at)
    }
}

/// Receiver of executable actions (animation/physics side)
pub trait ActionSink {
    fn execute(&mut self, action: ActionCategory, scheduled_at: GameTime);
}

/// Sink that records everything it is handed
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub executed: Vec<(ActionCategory, GameTime)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<ActionCategory> {
        self.executed.iter().map(|(action, _)| *action).collect()
    }
}

impl ActionSink for RecordingSink {
    fn execute(&mut self, action: ActionCategory, scheduled_at: GameTime) {
        self.executed.push((action, scheduled_at));
    }
}

/// Adapter turning a closure into a sink
pub struct FnSink<F>(pub F);

impl<F: FnMut(ActionCategory, GameTime)> ActionSink for FnSink<F> {
    fn execute(&mut self, action: ActionCategory, scheduled_at: GameTime) {
        (self.0)(action, scheduled_at)
    }
}

/// What happens when a decision arrives while another is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreemptionPolicy {
    /// The newer action replaces the pending one but keeps its execution
    /// time, so fresh information wins without postponing execution
    #[default]
    Retarget,
    /// The newer decision replaces the pending one, delay included
    ///
    /// With a delay longer than the sampling interval nothing executes
    /// until the combatant stops deciding.
    Supersede,
    /// New decisions are dropped until the pending one executes
    KeepPending,
    /// The newer decision replaces the pending one only if it ranks at
    /// least as high in the personality's ordering hint
    Ranked,
}

/// Result of handing a decision to the scheduler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleOutcome {
    /// Nothing was pending; the decision is now pending
    Scheduled(Decision),
    /// The decision replaced an older pending one
    Replaced { scheduled: Decision, dropped: Decision },
    /// The pending decision was kept and this one discarded
    Rejected(Decision),
}

impl ScheduleOutcome {
    /// The decision that is pending after this call
    pub fn pending(&self, current: Option<&Decision>) -> Option<Decision> {
        match self {
            ScheduleOutcome::Scheduled(d) | ScheduleOutcome::Replaced { scheduled: d, .. } => {
                Some(*d)
            }
            ScheduleOutcome::Rejected(_) => current.copied(),
        }
    }
}

/// Delay parameters, shared by every decision of one combatant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayModel {
    pub base_delay: Duration,
    pub jitter_secs: f32,
    pub min_delay_secs: f32,
    pub max_sync: f32,
}

impl DelayModel {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            base_delay: config.base_delay,
            jitter_secs: config.jitter_secs,
            min_delay_secs: config.min_delay_secs,
            max_sync: config.max_sync,
        }
    }

    /// `base · (1 - sync) + jitter`, floored at the minimum delay and at zero
    pub fn delay(&self, sync: f32, jitter: f32) -> Duration {
        let sync = if sync.is_finite() { sync.clamp(0.0, self.max_sync) } else { 0.0 };
        let secs = self.base_delay.as_secs_f32() * (1.0 - sync) + jitter;
        let secs = secs.max(self.min_delay_secs).max(0.0);
        Duration::from_secs_f32(secs)
    }
}

impl Default for DelayModel {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

pub struct ExecutionScheduler {
    model: DelayModel,
    policy: PreemptionPolicy,
    rng: ChaCha8Rng,
    pending: Option<Decision>,
}

impl ExecutionScheduler {
    pub fn new(model: DelayModel, policy: PreemptionPolicy, jitter_seed: u64) -> Self {
        Self {
            model,
            policy,
            rng: ChaCha8Rng::seed_from_u64(jitter_seed),
            pending: None,
        }
    }

    pub fn model(&self) -> &DelayModel {
        &self.model
    }

    pub fn policy(&self) -> PreemptionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: PreemptionPolicy) {
        self.policy = policy;
    }

    pub fn pending(&self) -> Option<&Decision> {
        self.pending.as_ref()
    }

    /// Draw a jittered delay for the given synchronization
    pub fn next_delay(&mut self, sync: f32) -> Duration {
        let j = self.model.jitter_secs;
        let jitter = if j > 0.0 { self.rng.gen_range(-j..=j) } else { 0.0 };
        self.model.delay(sync, jitter)
    }

    /// Record a decision for `action` made at `now`
    ///
    /// `hint` is the owner's ordering hint, consulted by the ranked policy.
    pub fn schedule(
        &mut self,
        action: ActionCategory,
        sync: f32,
        tick: Tick,
        now: GameTime,
        hint: &[ActionCategory; ActionCategory::COUNT],
    ) -> ScheduleOutcome {
        let delay = self.next_delay(sync);
        let mut decision = Decision {
            action,
            tick,
            decided_at: now,
            executable_at: now + delay,
        };

        let Some(current) = self.pending else {
            self.pending = Some(decision);
            return ScheduleOutcome::Scheduled(decision);
        };

        let replace = match self.policy {
            PreemptionPolicy::Retarget => {
                decision.executable_at = current.executable_at;
                true
            }
            PreemptionPolicy::Supersede => true,
            PreemptionPolicy::KeepPending => false,
            PreemptionPolicy::Ranked => rank(hint, action) <= rank(hint, current.action),
        };

        if replace {
            tracing::debug!(
                dropped = %current.action,
                scheduled = %action,
                "Pending decision superseded"
            );
            self.pending = Some(decision);
            ScheduleOutcome::Replaced {
                scheduled: decision,
                dropped: current,
            }
        } else {
            ScheduleOutcome::Rejected(decision)
        }
    }

    /// Hand the pending decision to `sink` if it is due
    pub fn poll(&mut self, now: GameTime, sink: &mut dyn ActionSink) -> Option<Decision> {
        match self.pending {
            Some(decision) if decision.is_due(now) => {
                self.pending = None;
                sink.execute(decision.action, decision.executable_at);
                Some(decision)
            }
            _ => None,
        }
    }

    /// Drop the pending decision, e.g. on a hard interrupt
    pub fn cancel(&mut self) -> Option<Decision> {
        self.pending.take()
    }
}

fn rank(hint: &[ActionCategory; ActionCategory::COUNT], action: ActionCategory) -> usize {
    hint.iter()
        .position(|&a| a == action)
        .unwrap_or(ActionCategory::COUNT)
}
