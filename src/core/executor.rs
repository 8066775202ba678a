//! Per-group run execution.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::core::scheduler::Shared;
use crate::events::SlotEvent;
use crate::model::{GroupComposition, RunOutcome, SlotId};

/// Execute one group's simulated run in its slot.
///
/// Samples a uniform duration in `[min, max]`, suspends for it, then
/// atomically releases the slot and wakes every waiter. The scheduler lock
/// is never held across the suspension; the simulated work touches no
/// shared state, so other runs and the scheduler proceed freely.
pub(crate) async fn run_group(
    shared: Arc<Shared>,
    config: SchedulerConfig,
    slot_id: SlotId,
    group: GroupComposition,
) -> RunOutcome {
    let elapsed_secs =
        rand::rng().random_range(config.min_duration_secs..=config.max_duration_secs);

    tokio::time::sleep(Duration::from_secs(elapsed_secs)).await;

    {
        let mut state = shared.state.lock().await;
        state.slots.release(slot_id, elapsed_secs);
        shared.publish(SlotEvent::Released {
            slot_id,
            group_id: group.id,
            elapsed_secs,
        });
    }
    info!(slot = %slot_id, group = %group.id, elapsed_secs, "run completed");

    // A completion can satisfy both the scheduler's wait predicate and an
    // await_stopped caller; wake everyone, not just one.
    shared.wake.notify_waiters();

    RunOutcome {
        slot_id,
        group_id: group.id,
        elapsed_secs,
    }
}
