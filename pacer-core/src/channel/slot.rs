//! Single-slot channel
//!
//! A capacity-1 conduit between exactly one producer task and the
//! aggregator. Sending never blocks: when the slot is occupied the new event
//! is dropped and the consumer later reads the older one. Receiving waits at
//! most until a caller-supplied timeout future completes.
//!
//! Dropped events are not counted here; producers report them through
//! [`Delivery::Dropped`](crate::pipeline::Delivery).

use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::pipeline::{Event, Source};

/// Send failed because the slot already holds an event
///
/// Carries the event that was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotFull(pub Event);

/// Capacity-1 event channel
pub struct SingleSlot<M: RawMutex> {
    inner: Channel<M, Event, 1>,
}

impl<M: RawMutex> Default for SingleSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> SingleSlot<M> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Store `event` if the slot is free
    ///
    /// Never blocks. Fails with the rejected event when occupied; the
    /// pending event is left untouched.
    pub fn send(&self, event: Event) -> Result<(), SlotFull> {
        self.inner.try_send(event).map_err(|_| SlotFull(event))
    }

    /// Take the pending event, if any, without waiting
    pub fn try_receive(&self) -> Option<Event> {
        self.inner.try_receive().ok()
    }

    /// Wait for an event until `timeout` completes
    ///
    /// A pending event is returned immediately. `None` means nothing arrived
    /// in time, which is the normal outcome of a quiet period.
    pub async fn receive_within<T: Future>(&self, timeout: T) -> Option<Event> {
        match select(self.inner.receive(), timeout).await {
            Either::First(event) => Some(event),
            Either::Second(_) => None,
        }
    }

    /// Check if an event is pending
    pub fn is_occupied(&self) -> bool {
        self.inner.is_full()
    }
}

/// The three channels of the pipeline
pub struct Slots<M: RawMutex> {
    /// Heartbeat producer to aggregator
    pub heartbeat: SingleSlot<M>,
    /// First edge detector to aggregator
    pub button_1: SingleSlot<M>,
    /// Second edge detector to aggregator
    pub button_2: SingleSlot<M>,
}

impl<M: RawMutex> Default for Slots<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Slots<M> {
    /// Create all channels empty
    pub const fn new() -> Self {
        Self {
            heartbeat: SingleSlot::new(),
            button_1: SingleSlot::new(),
            button_2: SingleSlot::new(),
        }
    }

    /// Channel carrying events from `source`
    pub fn slot(&self, source: Source) -> &SingleSlot<M> {
        match source {
            Source::Heartbeat => &self.heartbeat,
            Source::Button1 => &self.button_1,
            Source::Button2 => &self.button_2,
        }
    }
}
