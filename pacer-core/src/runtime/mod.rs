//! Periodic task runtime contract
//!
//! The executor itself lives in the firmware. This module holds what the
//! firmware and the host tests share: task identity, the release state
//! machine, and the switch hooks that feed the observers.

pub mod task;
pub mod trace;

pub use task::{Behavior, PeriodicTask, TaskDescriptor, TaskPhase, TaskTag, MAX_TASKS};
pub use trace::{Clock, SwitchHooks, SwitchObserver, Traced};
