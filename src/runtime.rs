//! Async driver: one tokio task per combatant
//!
//! Each task samples on a fixed cadence and wakes early when its pending
//! decision falls due. Battle end stops the task first and only then
//! evolves the personality, so a profile is never written while a tick
//! for the same combatant is running.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::error::{EngineError, Result};
use crate::core::types::{CombatantId, GameTime};
use crate::decision::action::ActionCategory;
use crate::decision::controller::CombatantController;
use crate::decision::progression::{BattleOutcomeRecord, ProgressionReport};
use crate::decision::scheduler::ActionSink;
use crate::decision::selector::{CategoricalSampler, SeededSampler};
use crate::decision::sensor::SensorSnapshot;

/// Source of sensor snapshots, called once per sampling tick
pub trait SensorProvider: Send + 'static {
    fn sample(&mut self, now: GameTime) -> SensorSnapshot;
}

impl<F> SensorProvider for F
where
    F: FnMut(GameTime) -> SensorSnapshot + Send + 'static,
{
    fn sample(&mut self, now: GameTime) -> SensorSnapshot {
        self(now)
    }
}

/// Source of the player's current directive
pub trait DirectiveProvider: Send + 'static {
    fn current(&mut self) -> Option<String>;
}

impl DirectiveProvider for watch::Receiver<String> {
    fn current(&mut self) -> Option<String> {
        Some(self.borrow_and_update().clone())
    }
}

/// Directive that never changes
#[derive(Debug, Clone)]
pub struct FixedDirective(pub String);

impl DirectiveProvider for FixedDirective {
    fn current(&mut self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// An action handed to the game, tagged with its combatant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutedAction {
    pub combatant: CombatantId,
    pub action: ActionCategory,
    pub scheduled_at: GameTime,
}

/// Sink forwarding executable actions over a channel
pub struct ChannelSink {
    combatant: CombatantId,
    tx: mpsc::UnboundedSender<ExecutedAction>,
}

impl ChannelSink {
    pub fn new(combatant: CombatantId, tx: mpsc::UnboundedSender<ExecutedAction>) -> Self {
        Self { combatant, tx }
    }
}

impl ActionSink for ChannelSink {
    fn execute(&mut self, action: ActionCategory, scheduled_at: GameTime) {
        let executed = ExecutedAction {
            combatant: self.combatant,
            action,
            scheduled_at,
        };
        if self.tx.send(executed).is_err() {
            tracing::warn!(combatant = %self.combatant, "Action receiver dropped");
        }
    }
}

/// Handle to a running combatant loop
pub struct CombatantHandle<S = SeededSampler> {
    id: CombatantId,
    stop: watch::Sender<bool>,
    task: JoinHandle<CombatantController<S>>,
}

impl<S> CombatantHandle<S> {
    pub fn id(&self) -> CombatantId {
        self.id
    }

    /// Stop the loop and take the controller back
    pub async fn stop(self) -> Result<CombatantController<S>> {
        // Err only means the loop already exited
        let _ = self.stop.send(true);
        self.task
            .await
            .map_err(|e| EngineError::RuntimeError(e.to_string()))
    }
}

impl<S: CategoricalSampler> CombatantHandle<S> {
    /// Quiesce the loop, then apply the battle outcome to its personality
    pub async fn end_battle(
        self,
        outcome: BattleOutcomeRecord,
    ) -> Result<(CombatantController<S>, ProgressionReport)> {
        let mut controller = self.stop().await?;
        let report = controller.end_battle(&outcome);
        Ok((controller, report))
    }
}

/// Run `controller` on its own task
pub fn spawn_combatant<S, P, D, K>(
    controller: CombatantController<S>,
    sensors: P,
    directives: D,
    sink: K,
) -> CombatantHandle<S>
where
    S: CategoricalSampler + 'static,
    P: SensorProvider,
    D: DirectiveProvider,
    K: ActionSink + Send + 'static,
{
    let id = controller.id();
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run_loop(controller, sensors, directives, sink, stop_rx));
    CombatantHandle { id, stop, task }
}

async fn run_loop<S, P, D, K>(
    mut controller: CombatantController<S>,
    mut sensors: P,
    mut directives: D,
    mut sink: K,
    mut stop: watch::Receiver<bool>,
) -> CombatantController<S>
where
    S: CategoricalSampler,
    P: SensorProvider,
    D: DirectiveProvider,
    K: ActionSink,
{
    let start = Instant::now();
    let mut cadence = tokio::time::interval(controller.sampling_interval());
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        combatant = %controller.id(),
        archetype = %controller.profile().archetype(),
        "Combatant loop started"
    );

    loop {
        let due = controller.pending().map(|decision| decision.executable_at);

        tokio::select! {
            biased;

            _ = stop.changed() => break,

            _ = sleep_until_due(due.map(|at| start + at)) => {
                // The timer fired for this deadline, so the decision is due
                // even if the elapsed clock reads slightly earlier
                let now = due.map_or(start.elapsed(), |at| start.elapsed().max(at));
                if controller.execute_due(now, &mut sink).is_none() {
                    tracing::warn!(combatant = %controller.id(), "Woke for a decision that was not due");
                    controller.cancel_pending();
                }
            }

            _ = cadence.tick() => {
                if let Some(token) = directives.current() {
                    controller.set_directive(&token);
                }
                let now = start.elapsed();
                let snapshot = sensors.sample(now);
                controller.process_tick(&snapshot, now, &mut sink);
            }
        }
    }

    tracing::info!(
        combatant = %controller.id(),
        ticks = controller.ticks(),
        "Combatant loop stopped"
    );
    controller
}

async fn sleep_until_due(wake: Option<Instant>) {
    match wake {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::decision::personality::{Archetype, PersonalityProfile};
    use crate::decision::scheduler::RecordingSink;
    use std::time::Duration;

    fn controller() -> CombatantController {
        let profile = PersonalityProfile::preset(Archetype::Aggressive, 1.0).unwrap();
        CombatantController::new(&EngineConfig::default(), profile)
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_samples_and_executes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = controller();
        let sink = ChannelSink::new(controller.id(), tx);
        let handle = spawn_combatant(
            controller,
            |_now: GameTime| SensorSnapshot::calm(),
            FixedDirective("all-out".to_string()),
            sink,
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        let controller = handle.stop().await.unwrap();

        assert!(controller.ticks() >= 9, "ticks = {}", controller.ticks());
        assert_eq!(controller.directive(), Some("all-out"));

        let mut executed = Vec::new();
        while let Ok(action) = rx.try_recv() {
            executed.push(action);
        }
        assert!(!executed.is_empty());
        assert!(executed.iter().all(|a| a.combatant == controller.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_directive_changes_reach_loop() {
        let (directive_tx, directive_rx) = watch::channel("hold".to_string());
        let handle = spawn_combatant(
            controller(),
            |_now: GameTime| SensorSnapshot::calm(),
            directive_rx,
            RecordingSink::new(),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        directive_tx.send("conserve".to_string()).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let controller = handle.stop().await.unwrap();
        assert_eq!(controller.directive(), Some("conserve"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_battle_applies_progression_after_stop() {
        let handle = spawn_combatant(
            controller(),
            |_now: GameTime| SensorSnapshot::calm().with_threat(0.9),
            FixedDirective("balanced".to_string()),
            RecordingSink::new(),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;

        let (controller, report) = handle
            .end_battle(BattleOutcomeRecord::defeat(5.0, 100.0))
            .await
            .unwrap();

        assert!(report.after.skittishness > report.before.skittishness);
        assert_eq!(controller.profile().sliders(), report.after);
        assert!(controller.pending().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_wakeup_always_drains_pending() {
        let mut config = EngineConfig::default();
        // Delay far longer than the cadence: only the wake-up arm can execute
        config.min_delay_secs = 0.5;
        config.jitter_secs = 0.0;
        let profile = PersonalityProfile::preset(Archetype::Prudent, 1.0).unwrap();
        let controller = CombatantController::new(&config, profile);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(controller.id(), tx);
        let handle = spawn_combatant(
            controller,
            |_now: GameTime| SensorSnapshot::calm(),
            FixedDirective("hold".to_string()),
            sink,
        );

        tokio::time::sleep(Duration::from_millis(1_650)).await;
        let controller = handle.stop().await.unwrap();

        let mut executed = Vec::new();
        while let Ok(action) = rx.try_recv() {
            executed.push(action);
        }
        // Decided at 0.0s and 0.6s, due at 0.5s and 1.1s; the 1.2s decision is still pending
        assert_eq!(executed.len(), 2, "{:?}", executed);
        assert!(executed.windows(2).all(|w| w[0].scheduled_at < w[1].scheduled_at));
        assert!(controller.ticks() >= 8);
    }
}
