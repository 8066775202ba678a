//! Bounded-concurrency matchmaking scheduler.
//!
//! Participants wait in three role-typed FIFO queues; the scheduler
//! assembles fixed-shape groups (one tank, one healer, three damage),
//! assigns each to one of a fixed number of execution slots, runs a timed
//! simulated task per group, and stops cleanly once shutdown has been
//! requested and no further group can ever form.

// Core modules
mod config;
mod error;
mod events;
mod model;
mod queue;
mod slots;

// Scheduler loop and run execution
mod core;

// Re-export key types and functions
pub use crate::config::{InitialRoster, SchedulerConfig};
pub use crate::core::{start, MatchmakerHandle};
pub use crate::error::ConfigError;
pub use crate::events::SlotEvent;
pub use crate::model::{
    GroupComposition, GroupId, Participant, ParticipantId, Role, RunOutcome, SlotId,
};
pub use crate::queue::{QueueDepths, RoleQueuePool};
pub use crate::slots::{SlotPool, SlotSnapshot};
