//! Task switch observers
//!
//! The runtime reports every switch-in and switch-out through
//! [`SwitchObserver`](crate::runtime::SwitchObserver). Two observers live
//! here: the CPU-load accountant and the per-task activity pins. The
//! gauge republishes the accountant's figures for lock-free readers.

pub mod accountant;
pub mod activity;
pub mod gauge;

pub use accountant::{load_percent, CpuLoadAccountant, LoadSnapshot, TaskRecord};
pub use activity::ActivityPins;
pub use gauge::{LoadGauge, PublishingAccountant};
