// Scheduler loop and per-group run execution

pub mod executor;
pub mod scheduler;

pub use scheduler::{start, MatchmakerHandle};
