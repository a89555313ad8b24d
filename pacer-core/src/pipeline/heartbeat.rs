//! Heartbeat producer
//!
//! Emits a constant token every period, independent of any input.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::event::{Delivery, Event};
use crate::channel::SingleSlot;

/// Heartbeat producer state
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartbeatProducer {
    /// Heartbeats emitted (delivered or dropped)
    beats: u32,
}

impl HeartbeatProducer {
    /// Create a new producer
    pub const fn new() -> Self {
        Self { beats: 0 }
    }

    /// Number of heartbeats emitted so far
    pub fn beats(&self) -> u32 {
        self.beats
    }

    /// Per-release body: offer a heartbeat to `slot`
    ///
    /// Same drop-on-full rule as every other producer.
    pub fn release<M: RawMutex>(&mut self, slot: &SingleSlot<M>) -> Delivery {
        self.beats = self.beats.wrapping_add(1);
        match slot.send(Event::Heartbeat) {
            Ok(()) => Delivery::Sent(Event::Heartbeat),
            Err(_) => Delivery::Dropped(Event::Heartbeat),
        }
    }
}
