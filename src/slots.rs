//! Fixed pool of execution slots with per-slot cumulative statistics.

use serde::{Deserialize, Serialize};

use crate::model::{GroupComposition, GroupId, SlotId};

/// One execution slot. Empty at creation, Active while a group runs in it,
/// Empty again on release; the counters only ever increase.
#[derive(Debug)]
struct ExecutionSlot {
    id: SlotId,
    occupant: Option<GroupComposition>,
    completed_runs: u64,
    cumulative_secs: u64,
}

/// Lock-protected snapshot of one slot's state, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub id: SlotId,
    pub occupied: bool,
    pub group_id: Option<GroupId>,
    pub completed_runs: u64,
    pub cumulative_secs: u64,
}

/// Fixed array of execution slots, ids `1..=cap`. Free-slot selection is a
/// linear scan, lowest id first, so assignment is deterministic.
#[derive(Debug)]
pub struct SlotPool {
    slots: Vec<ExecutionSlot>,
}

impl SlotPool {
    pub fn new(cap: usize) -> Self {
        let slots = (1..=cap)
            .map(|id| ExecutionSlot {
                id: SlotId::new(id as u32),
                occupant: None,
                completed_runs: 0,
                cumulative_secs: 0,
            })
            .collect();
        Self { slots }
    }

    /// Lowest-id free slot, if any.
    pub fn find_free(&self) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|slot| slot.occupant.is_none())
            .map(|slot| slot.id)
    }

    /// Mark a slot Active and store the running group.
    ///
    /// Precondition: the slot is Empty. Occupying an Active slot is a logic
    /// defect and panics.
    pub fn occupy(&mut self, slot_id: SlotId, group: GroupComposition) {
        let slot = self.slot_mut(slot_id);
        assert!(
            slot.occupant.is_none(),
            "occupy called on active slot {slot_id}"
        );
        slot.occupant = Some(group);
    }

    /// Mark a slot Empty and fold the run's elapsed time into its counters.
    ///
    /// Precondition: the slot is Active. Returns the group that ran in it.
    pub fn release(&mut self, slot_id: SlotId, elapsed_secs: u64) -> GroupComposition {
        let slot = self.slot_mut(slot_id);
        let group = slot
            .occupant
            .take()
            .unwrap_or_else(|| panic!("release called on empty slot {slot_id}"));
        slot.completed_runs += 1;
        slot.cumulative_secs += elapsed_secs;
        group
    }

    /// Number of currently Active slots.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.occupant.is_some())
            .count()
    }

    /// Ordered (by slot id) snapshot of every slot, for reporting.
    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .map(|slot| SlotSnapshot {
                id: slot.id,
                occupied: slot.occupant.is_some(),
                group_id: slot.occupant.as_ref().map(|group| group.id),
                completed_runs: slot.completed_runs,
                cumulative_secs: slot.cumulative_secs,
            })
            .collect()
    }

    fn slot_mut(&mut self, slot_id: SlotId) -> &mut ExecutionSlot {
        let index = (slot_id.get() - 1) as usize;
        &mut self.slots[index]
    }
}
