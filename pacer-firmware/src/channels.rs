//! Inter-task communication channels
//!
//! The three single-slot channels between the producers and the
//! aggregator. Nothing else is shared between tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use pacer_core::channel::{SingleSlot, Slots};

/// Channel type shared by producers and the aggregator
pub type Slot = SingleSlot<CriticalSectionRawMutex>;

/// Heartbeat, button 1 and button 2 channels
pub static SLOTS: Slots<CriticalSectionRawMutex> = Slots::new();
