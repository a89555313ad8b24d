//! Pacer Hardware Abstraction Layer
//!
//! This crate defines the narrow hardware interfaces the task pipeline
//! consumes: synchronous pin reads, synchronous pin writes, and a blocking
//! serial writer. Chip-specific HALs implement them so the pipeline logic in
//! `pacer-core` never touches a register.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pacer-core / pacer-firmware            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pacer-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │ pacer-hal-rp2040│
//!            └─────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::UartTx`] - Serial output

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, OutputPin};
pub use uart::{UartConfig, UartTx};
