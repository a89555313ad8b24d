//! Board-agnostic core logic for the Pacer task pipeline
//!
//! This crate contains all pipeline logic that does not depend on a
//! specific chip:
//!
//! - Events and the per-release bodies of every task behaviour
//!   (edge detector, heartbeat producer, load simulator, aggregator)
//! - Single-slot channels, the only coordination primitive between tasks
//! - CPU-load accounting driven by task switch-in/switch-out hooks
//! - The periodic task contract (release state machine, traced futures)
//! - Configuration types and the pipeline config parser
//!
//! Everything here runs on the host, so the whole pipeline is unit tested
//! without hardware.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod accounting;
pub mod channel;
pub mod config;
pub mod pipeline;
pub mod runtime;

pub use accounting::{CpuLoadAccountant, LoadGauge, LoadSnapshot};
pub use channel::{SingleSlot, SlotFull, Slots};
pub use pipeline::{Event, Source};
pub use runtime::{TaskTag, MAX_TASKS};
