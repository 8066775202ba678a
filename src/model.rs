//! Core domain types for the matchmaking scheduler.
//!
//! Id newtypes prevent accidental mixing of participant, group, and slot
//! identifiers (e.g., logging a group id where a slot id is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate an integer id newtype with standard trait implementations.
macro_rules! newtype_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a new id from its raw value.
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            /// Get the raw id value.
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

newtype_id! {
    /// Unique, monotonically assigned participant identifier.
    ParticipantId
}

newtype_id! {
    /// Unique, monotonically assigned group identifier.
    GroupId
}

newtype_id! {
    /// Execution slot identifier, `1..=cap`.
    SlotId
}

/// Participant category. Each participant waits in exactly one role queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Damage,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tank => write!(f, "tank"),
            Role::Healer => write!(f, "healer"),
            Role::Damage => write!(f, "damage"),
        }
    }
}

/// A waiting participant. Created at population time; consumed exactly once
/// when selected into a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub role: Role,
}

impl Participant {
    pub fn new(id: ParticipantId, role: Role) -> Self {
        Self { id, role }
    }
}

/// A fully formed group: one tank, one healer, three damage participants.
/// Immutable once formed; every member id was dequeued exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupComposition {
    pub id: GroupId,
    pub tank: ParticipantId,
    pub healer: ParticipantId,
    pub damage: [ParticipantId; 3],
}

impl fmt::Display for GroupComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tank={} healer={} damage={},{},{}",
            self.tank, self.healer, self.damage[0], self.damage[1], self.damage[2]
        )
    }
}

/// Result of one completed run, produced exactly once per run and used to
/// update slot counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub slot_id: SlotId,
    pub group_id: GroupId,
    pub elapsed_secs: u64,
}
