//! Edge detection on a sampled digital input
//!
//! The detector only sees the input once per period. Two states are
//! modelled, without debounce or hysteresis, so a signal that toggles faster
//! than the sampling period loses transitions.

use embassy_sync::blocking_mutex::raw::RawMutex;
use pacer_hal::InputPin;

use super::event::{Delivery, Event};
use crate::channel::SingleSlot;

/// Classify a pair of consecutive samples
pub const fn classify(previous: bool, current: bool) -> Event {
    match (previous, current) {
        (false, true) => Event::Rising,
        (true, false) => Event::Falling,
        _ => Event::None,
    }
}

/// Edge detector state
///
/// Holds the previous sample. Never terminates, so one instance lives for
/// the whole life of its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    /// Create a detector seeded with an initial sample
    pub const fn new(initial: bool) -> Self {
        Self { previous: initial }
    }

    /// Create a detector seeded from one synchronous read of `pin`
    pub fn from_pin<P: InputPin>(pin: &P) -> Self {
        Self::new(pin.is_high())
    }

    /// Last sample seen
    pub fn previous(&self) -> bool {
        self.previous
    }

    /// Feed the next sample and classify the transition
    pub fn classify(&mut self, current: bool) -> Event {
        let event = classify(self.previous, current);
        self.previous = current;
        event
    }

    /// Read `pin` once and classify the transition
    pub fn sample<P: InputPin>(&mut self, pin: &P) -> Event {
        self.classify(pin.is_high())
    }

    /// Per-release body: sample `pin` and forward any edge into `slot`
    ///
    /// `Event::None` is never sent.
    pub fn release<P: InputPin, M: RawMutex>(&mut self, pin: &P, slot: &SingleSlot<M>) -> Delivery {
        match self.sample(pin) {
            Event::None => Delivery::Idle,
            event => match slot.send(event) {
                Ok(()) => Delivery::Sent(event),
                Err(_) => Delivery::Dropped(event),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use proptest::prelude::*;

    struct ScriptedPin(Cell<bool>);

    impl InputPin for ScriptedPin {
        fn is_high(&self) -> bool {
            self.0.get()
        }
    }

    fn detect(samples: &[bool]) -> Vec<Event> {
        let mut detector = EdgeDetector::new(samples[0]);
        samples[1..].iter().map(|&s| detector.classify(s)).collect()
    }

    #[test]
    fn test_classify_pairs() {
        assert_eq!(classify(false, true), Event::Rising);
        assert_eq!(classify(true, false), Event::Falling);
        assert_eq!(classify(false, false), Event::None);
        assert_eq!(classify(true, true), Event::None);
    }

    #[test]
    fn test_sample_sequence_scenario() {
        let events = detect(&[false, false, true, true, false]);
        assert_eq!(
            events,
            vec![Event::None, Event::Rising, Event::None, Event::Falling]
        );
    }

    #[test]
    fn test_from_pin_seeds_previous() {
        let pin = ScriptedPin(Cell::new(true));
        let mut detector = EdgeDetector::from_pin(&pin);
        assert!(detector.previous());

        pin.0.set(false);
        assert_eq!(detector.sample(&pin), Event::Falling);
        assert!(!detector.previous());
    }

    #[test]
    fn test_release_sends_edges_only() {
        let pin = ScriptedPin(Cell::new(false));
        let slot: SingleSlot<NoopRawMutex> = SingleSlot::new();
        let mut detector = EdgeDetector::from_pin(&pin);

        assert_eq!(detector.release(&pin, &slot), Delivery::Idle);
        assert!(!slot.is_occupied());

        pin.0.set(true);
        assert_eq!(detector.release(&pin, &slot), Delivery::Sent(Event::Rising));
        assert!(slot.is_occupied());
    }

    #[test]
    fn test_release_drops_when_consumer_is_late() {
        let pin = ScriptedPin(Cell::new(false));
        let slot: SingleSlot<NoopRawMutex> = SingleSlot::new();
        let mut detector = EdgeDetector::from_pin(&pin);

        pin.0.set(true);
        detector.release(&pin, &slot);
        pin.0.set(false);
        assert_eq!(
            detector.release(&pin, &slot),
            Delivery::Dropped(Event::Falling)
        );

        // The older edge is still there
        assert_eq!(slot.try_receive(), Some(Event::Rising));
    }

    proptest! {
        #[test]
        fn prop_one_event_per_transition(samples in prop::collection::vec(any::<bool>(), 1..64)) {
            let events = detect(&samples);

            let rises = samples.windows(2).filter(|w| !w[0] && w[1]).count();
            let falls = samples.windows(2).filter(|w| w[0] && !w[1]).count();

            prop_assert_eq!(events.len(), samples.len() - 1);
            prop_assert_eq!(events.iter().filter(|e| **e == Event::Rising).count(), rises);
            prop_assert_eq!(events.iter().filter(|e| **e == Event::Falling).count(), falls);
            prop_assert!(events.iter().all(|e| *e != Event::Heartbeat));
        }

        #[test]
        fn prop_edges_alternate(samples in prop::collection::vec(any::<bool>(), 1..64)) {
            let edges: Vec<Event> = detect(&samples).into_iter().filter(Event::is_edge).collect();
            for pair in edges.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
            }
        }
    }
}
