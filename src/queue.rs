//! Role-typed FIFO queues and atomic group assembly.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::{GroupComposition, GroupId, Participant, Role};

/// Read-only snapshot of per-role queue depths, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepths {
    pub tanks: usize,
    pub healers: usize,
    pub damage: usize,
}

impl QueueDepths {
    pub fn total(&self) -> usize {
        self.tanks + self.healers + self.damage
    }
}

/// Three independent FIFO queues, one per role, plus the monotonic group id
/// counter. Group assembly pops one tank, one healer, and three damage
/// participants in FIFO order per role.
#[derive(Debug, Default)]
pub struct RoleQueuePool {
    tanks: VecDeque<Participant>,
    healers: VecDeque<Participant>,
    damage: VecDeque<Participant>,
    next_group: u32,
}

impl RoleQueuePool {
    pub fn new() -> Self {
        Self {
            tanks: VecDeque::new(),
            healers: VecDeque::new(),
            damage: VecDeque::new(),
            next_group: 1,
        }
    }

    /// Append a participant to its role's queue.
    pub fn enqueue(&mut self, participant: Participant) {
        match participant.role {
            Role::Tank => self.tanks.push_back(participant),
            Role::Healer => self.healers.push_back(participant),
            Role::Damage => self.damage.push_back(participant),
        }
    }

    /// True iff a full group (1 tank, 1 healer, 3 damage) can be assembled
    /// right now.
    pub fn can_form_group(&self) -> bool {
        !self.tanks.is_empty() && !self.healers.is_empty() && self.damage.len() >= 3
    }

    /// Assemble the next group and assign it a fresh id.
    ///
    /// Precondition: `can_form_group()` holds. Calling without it is a logic
    /// defect and panics; the scheduler's wait predicate makes it unreachable.
    pub fn dequeue_group(&mut self) -> GroupComposition {
        assert!(
            self.can_form_group(),
            "dequeue_group called without a formable group"
        );

        let id = GroupId::new(self.next_group);
        self.next_group += 1;

        let tank = self.tanks.pop_front().unwrap().id;
        let healer = self.healers.pop_front().unwrap().id;
        let damage = [
            self.damage.pop_front().unwrap().id,
            self.damage.pop_front().unwrap().id,
            self.damage.pop_front().unwrap().id,
        ];

        GroupComposition {
            id,
            tank,
            healer,
            damage,
        }
    }

    /// Per-role depths, for reporting.
    pub fn depths(&self) -> QueueDepths {
        QueueDepths {
            tanks: self.tanks.len(),
            healers: self.healers.len(),
            damage: self.damage.len(),
        }
    }
}
