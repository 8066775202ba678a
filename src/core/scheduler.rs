//! The matchmaker control loop and its shared monitor state.
//!
//! One long-lived scheduler task assembles groups and claims slots; one
//! short-lived run task per active group simulates the work. All shared
//! mutable state lives behind a single [`tokio::sync::Mutex`], with a
//! [`Notify`] as the notify-all condition variable: waiters register
//! interest, re-check their predicate under the lock, and suspend until the
//! next state change. Every transition that can satisfy a waiter
//! (run completion, shutdown request, reaching Stopped) wakes all waiters.
//!
//! The scheduler is a four-state machine:
//!
//! - **Running-Waiting**: no formable group or no free capacity; suspended.
//! - **Running-Launching**: a group is formable and capacity is free; the
//!   group is dequeued, a slot occupied, and a run task spawned, all under
//!   one lock acquisition.
//! - **Draining-Waiting**: shutdown was requested but a group can still
//!   form; launching continues until the queues can no longer produce one.
//! - **Stopped**: terminal. No group can ever form again and every run task
//!   has been joined.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{InitialRoster, SchedulerConfig};
use crate::core::executor;
use crate::error::ConfigError;
use crate::events::SlotEvent;
use crate::model::{Participant, ParticipantId, Role, RunOutcome};
use crate::queue::{QueueDepths, RoleQueuePool};
use crate::slots::{SlotPool, SlotSnapshot};

/// Scheduler lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Running,
    Draining,
    Stopped,
}

/// All shared mutable state, protected as one unit: queue consumption and
/// slot occupation must be observed together or races between loop
/// iterations could oversubscribe the capacity.
#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) queues: RoleQueuePool,
    pub(crate) slots: SlotPool,
    pub(crate) phase: Phase,
}

/// The monitor: one lock, one notify-all wake signal, one event stream.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) state: Mutex<SchedulerState>,
    pub(crate) wake: Notify,
    pub(crate) events: broadcast::Sender<SlotEvent>,
}

impl Shared {
    /// Suspend until `pred` holds, re-evaluating it on every wake.
    ///
    /// Interest in the next `notify_waiters` is registered before the
    /// predicate is checked, so a state change between the check and the
    /// suspension cannot be missed.
    pub(crate) async fn wait_until(&self, mut pred: impl FnMut(&SchedulerState) -> bool) {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if pred(&*self.state.lock().await) {
                return;
            }
            notified.await;
        }
    }

    /// Publish a slot-state transition; no subscribers is fine.
    pub(crate) fn publish(&self, event: SlotEvent) {
        let _ = self.events.send(event);
    }
}

/// The matchmaker loop. Owns the run task handles so no run can outlive it.
struct Scheduler {
    shared: Arc<Shared>,
    config: SchedulerConfig,
    runs: Vec<JoinHandle<RunOutcome>>,
    launched: u64,
}

impl Scheduler {
    async fn run(mut self) {
        let shared = Arc::clone(&self.shared);
        loop {
            let notified = shared.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = shared.state.lock().await;

                // Once draining and no group can form, none ever will:
                // nothing is enqueued after start.
                if state.phase == Phase::Draining && !state.queues.can_form_group() {
                    break;
                }

                // Formability and capacity are checked and acted on under
                // this one lock acquisition.
                if state.queues.can_form_group() && state.slots.active_count() < self.config.cap {
                    self.launch(&mut state);
                    self.runs.retain(|run| !run.is_finished());
                    continue;
                }
            }

            notified.await;
        }

        // In-flight runs finish on their own schedule; join them all before
        // declaring the terminal state.
        for run in self.runs.drain(..) {
            if let Ok(outcome) = run.await {
                debug!(slot = %outcome.slot_id, group = %outcome.group_id, "run joined");
            }
        }

        {
            let mut state = self.shared.state.lock().await;
            debug_assert_eq!(state.slots.active_count(), 0);
            state.phase = Phase::Stopped;
            self.shared.publish(SlotEvent::Stopped);
        }
        info!(groups_formed = self.launched, "scheduler stopped");
        self.shared.wake.notify_waiters();
    }

    /// Dequeue a group, occupy the lowest free slot, and spawn its run task.
    /// Caller holds the lock and has verified formability and capacity.
    fn launch(&mut self, state: &mut SchedulerState) {
        let group = state.queues.dequeue_group();
        let slot_id = state
            .slots
            .find_free()
            .expect("a free slot must exist below capacity");
        state.slots.occupy(slot_id, group.clone());

        info!(slot = %slot_id, group = %group.id, members = %group, "group launched");
        self.shared.publish(SlotEvent::Occupied {
            slot_id,
            group_id: group.id,
        });
        self.launched += 1;

        self.runs.push(tokio::spawn(executor::run_group(
            Arc::clone(&self.shared),
            self.config,
            slot_id,
            group,
        )));
    }
}

/// Control handle returned by [`start`]. Cloning is intentionally not
/// offered; the handle is the single owner of the scheduler task.
#[derive(Debug)]
pub struct MatchmakerHandle {
    shared: Arc<Shared>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl MatchmakerHandle {
    /// Request cooperative shutdown. Idempotent; never interrupts an
    /// in-flight run, and groups keep launching while the queues can still
    /// produce one.
    pub async fn request_shutdown(&self) {
        {
            let mut state = self.shared.state.lock().await;
            if state.phase == Phase::Running {
                state.phase = Phase::Draining;
                info!("shutdown requested, draining");
            }
        }
        self.shared.wake.notify_waiters();
    }

    /// Block until the scheduler reaches Stopped, then join the scheduler
    /// task itself so nothing outlives this call.
    pub async fn await_stopped(&self) {
        self.shared
            .wait_until(|state| state.phase == Phase::Stopped)
            .await;

        let task = self.scheduler.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Ordered, lock-protected snapshot of every slot.
    pub async fn slot_snapshot(&self) -> Vec<SlotSnapshot> {
        self.shared.state.lock().await.slots.snapshot()
    }

    /// Current per-role queue depths.
    pub async fn queue_depths(&self) -> QueueDepths {
        self.shared.state.lock().await.queues.depths()
    }

    /// Subscribe to slot-state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<SlotEvent> {
        self.shared.events.subscribe()
    }
}

/// Validate the configuration, populate the role queues from the roster
/// (participant ids minted from 1: tanks, then healers, then damage), and
/// spawn the scheduler loop. Must be called within a Tokio runtime.
pub fn start(config: SchedulerConfig, roster: InitialRoster) -> Result<MatchmakerHandle, ConfigError> {
    config.validate()?;

    let mut queues = RoleQueuePool::new();
    let mut next_id = 1u32;
    for (role, count) in [
        (Role::Tank, roster.tanks),
        (Role::Healer, roster.healers),
        (Role::Damage, roster.damage),
    ] {
        for _ in 0..count {
            queues.enqueue(Participant::new(ParticipantId::new(next_id), role));
            next_id += 1;
        }
    }

    let depths = queues.depths();
    info!(
        cap = config.cap,
        tanks = depths.tanks,
        healers = depths.healers,
        damage = depths.damage,
        "scheduler starting"
    );

    let (events, _) = broadcast::channel(256);
    let shared = Arc::new(Shared {
        state: Mutex::new(SchedulerState {
            queues,
            slots: SlotPool::new(config.cap),
            phase: Phase::Running,
        }),
        wake: Notify::new(),
        events,
    });

    let scheduler = Scheduler {
        shared: Arc::clone(&shared),
        config,
        runs: Vec::new(),
        launched: 0,
    };
    let task = tokio::spawn(scheduler.run());

    Ok(MatchmakerHandle {
        shared,
        scheduler: Mutex::new(Some(task)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    async fn drain_events(rx: &mut broadcast::Receiver<SlotEvent>) -> Vec<SlotEvent> {
        let mut events = Vec::new();
        loop {
            match rx.recv().await {
                Ok(SlotEvent::Stopped) => {
                    events.push(SlotEvent::Stopped);
                    return events;
                }
                Ok(event) => events.push(event),
                Err(_) => return events,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_group_fixed_duration() {
        // Scenario: exactly one group's worth of participants, cap 1,
        // duration pinned to 2 seconds.
        let config = SchedulerConfig::new(1, 2, 2).unwrap();
        let handle = start(config, InitialRoster::new(1, 1, 3)).unwrap();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let slots = handle.slot_snapshot().await;
        assert_eq!(slots.len(), 1);
        assert!(!slots[0].occupied);
        assert_eq!(slots[0].group_id, None);
        assert_eq!(slots[0].completed_runs, 1);
        assert_eq!(slots[0].cumulative_secs, 2);
        assert_eq!(handle.queue_depths().await.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_surplus_tank_left_queued() {
        let config = SchedulerConfig::new(1, 1, 1).unwrap();
        let handle = start(config, InitialRoster::new(2, 1, 3)).unwrap();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let depths = handle.queue_depths().await;
        assert_eq!(depths.tanks, 1);
        assert_eq!(depths.healers, 0);
        assert_eq!(depths.damage, 0);

        let total_runs: u64 = handle
            .slot_snapshot()
            .await
            .iter()
            .map(|slot| slot.completed_runs)
            .sum();
        assert_eq!(total_runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_damage_stops_without_groups() {
        let config = SchedulerConfig::new(1, 1, 1).unwrap();
        let handle = start(config, InitialRoster::new(1, 1, 2)).unwrap();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let slots = handle.slot_snapshot().await;
        assert_eq!(slots[0].completed_runs, 0);
        assert_eq!(slots[0].cumulative_secs, 0);

        let depths = handle.queue_depths().await;
        assert_eq!((depths.tanks, depths.healers, depths.damage), (1, 1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_never_exceeded() {
        // Three groups' worth of participants through two slots.
        let config = SchedulerConfig::new(2, 1, 1).unwrap();
        let handle = start(config, InitialRoster::new(3, 3, 9)).unwrap();
        let mut rx = handle.subscribe();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let events = drain_events(&mut rx).await;
        let mut active = 0usize;
        let mut launched = 0usize;
        let mut completed = 0usize;
        for event in &events {
            match event {
                SlotEvent::Occupied { .. } => {
                    active += 1;
                    launched += 1;
                    assert!(active <= 2, "more groups active than the cap allows");
                }
                SlotEvent::Released { .. } => {
                    active -= 1;
                    completed += 1;
                }
                SlotEvent::Stopped => assert_eq!(active, 0),
            }
        }
        assert_eq!(launched, 3);
        assert_eq!(completed, 3);
        assert_eq!(events.last(), Some(&SlotEvent::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_counters_conserve_sampled_durations() {
        let config = SchedulerConfig::new(2, 1, 3).unwrap();
        let handle = start(config, InitialRoster::new(2, 2, 6)).unwrap();
        let mut rx = handle.subscribe();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let events = drain_events(&mut rx).await;
        let mut groups_formed = 0u64;
        let mut sampled_total = 0u64;
        for event in &events {
            match event {
                SlotEvent::Occupied { .. } => groups_formed += 1,
                SlotEvent::Released { elapsed_secs, .. } => sampled_total += elapsed_secs,
                SlotEvent::Stopped => {}
            }
        }

        let slots = handle.slot_snapshot().await;
        let completed: u64 = slots.iter().map(|slot| slot.completed_runs).sum();
        let cumulative: u64 = slots.iter().map(|slot| slot.cumulative_secs).sum();
        assert_eq!(completed, groups_formed);
        assert_eq!(completed, 2);
        assert_eq!(cumulative, sampled_total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let config = SchedulerConfig::new(1, 1, 1).unwrap();
        let handle = start(config, InitialRoster::new(1, 1, 3)).unwrap();

        handle.request_shutdown().await;
        handle.request_shutdown().await;
        handle.await_stopped().await;

        // After Stopped, further requests and waits are no-ops.
        handle.request_shutdown().await;
        handle.await_stopped().await;

        let slots = handle.slot_snapshot().await;
        assert_eq!(slots[0].completed_runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_draining_still_launches_formable_groups() {
        // Shutdown is requested before the scheduler ever polls; both
        // groups must still run to completion.
        let config = SchedulerConfig::new(1, 1, 1).unwrap();
        let handle = start(config, InitialRoster::new(2, 2, 6)).unwrap();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let slots = handle.slot_snapshot().await;
        assert_eq!(slots[0].completed_runs, 2);
        assert_eq!(handle.queue_depths().await.total(), 0);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let config = SchedulerConfig {
            cap: 0,
            min_duration_secs: 1,
            max_duration_secs: 1,
        };
        let err = start(config, InitialRoster::default()).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveCap);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_events_after_stopped() {
        let config = SchedulerConfig::new(1, 1, 1).unwrap();
        let handle = start(config, InitialRoster::new(1, 1, 3)).unwrap();
        let mut rx = handle.subscribe();

        handle.request_shutdown().await;
        handle.await_stopped().await;

        let events = drain_events(&mut rx).await;
        assert_eq!(events.last(), Some(&SlotEvent::Stopped));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
