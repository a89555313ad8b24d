//! Inter-task messaging
//!
//! Single-slot channels are the only coordination primitive between tasks.

pub mod slot;

pub use slot::{SingleSlot, SlotFull, Slots};
