//! Slot-state-change notifications for observers.
//!
//! Observers subscribe to a broadcast stream instead of polling slot state
//! on an interval; the status display in the CLI is one such subscriber.

use serde::Serialize;

use crate::model::{GroupId, SlotId};

/// One slot-state transition, published under the scheduler lock so event
/// order matches the order the transitions actually happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SlotEvent {
    /// A group was assigned to a slot and its run launched.
    Occupied { slot_id: SlotId, group_id: GroupId },
    /// A run finished and its slot was released.
    Released {
        slot_id: SlotId,
        group_id: GroupId,
        elapsed_secs: u64,
    },
    /// The scheduler reached its terminal state; no further events follow.
    Stopped,
}
