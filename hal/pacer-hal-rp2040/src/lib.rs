//! RP2040-specific HAL for the Pacer firmware
//!
//! This crate provides RP2040 implementations of the `pacer-hal` traits,
//! plus the RP2040-specific plumbing the firmware needs at boot:
//!
//! - Dynamic pin allocation for config-driven setup
//! - GPIO allocation tracking and pin adapters
//! - UART pin mapping and the blocking serial writer

#![no_std]

pub mod gpio;
pub mod pins;
pub mod uart;

pub use gpio::{ActivityOutput, ButtonInput, RpInput, RpOutput};
pub use pins::{PinBank, PinError, RemainingPeripherals};
pub use uart::{RpSerial, SerialError};
