//! Per-task activity pins
//!
//! Each tagged task may own an output that is high while the task occupies
//! the CPU. Hooked up to a logic analyser this shows the real schedule.

use pacer_hal::OutputPin;

use crate::runtime::{SwitchObserver, TaskTag, MAX_TASKS};

/// Activity outputs indexed by task tag
pub struct ActivityPins<P: OutputPin> {
    pins: [Option<P>; MAX_TASKS],
}

impl<P: OutputPin> Default for ActivityPins<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin> ActivityPins<P> {
    /// Create with no pin assigned
    pub const fn new() -> Self {
        Self {
            pins: [const { None }; MAX_TASKS],
        }
    }

    /// Give task `tag` an activity pin, driven low
    ///
    /// Hands the pin back if the tag has no slot.
    pub fn assign(&mut self, tag: TaskTag, mut pin: P) -> Result<(), P> {
        let Some(slot) = tag.index().and_then(|i| self.pins.get_mut(i)) else {
            return Err(pin);
        };
        pin.set_low();
        *slot = Some(pin);
        Ok(())
    }

    /// Number of tasks with a pin
    pub fn assigned(&self) -> usize {
        self.pins.iter().filter(|p| p.is_some()).count()
    }

    /// Pin of task `tag`
    pub fn pin(&self, tag: TaskTag) -> Option<&P> {
        tag.index()
            .and_then(|i| self.pins.get(i))
            .and_then(Option::as_ref)
    }

    fn pin_mut(&mut self, tag: TaskTag) -> Option<&mut P> {
        tag.index()
            .and_then(|i| self.pins.get_mut(i))
            .and_then(Option::as_mut)
    }
}

impl<P: OutputPin> SwitchObserver for ActivityPins<P> {
    fn on_switch_in(&mut self, tag: TaskTag, _now: u64) {
        if let Some(pin) = self.pin_mut(tag) {
            pin.set_high();
        }
    }

    fn on_switch_out(&mut self, tag: TaskTag, _now: u64) {
        if let Some(pin) = self.pin_mut(tag) {
            pin.set_low();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        high: bool,
        edges: u8,
    }

    impl OutputPin for Probe {
        fn set_high(&mut self) {
            self.high = true;
            self.edges += 1;
        }

        fn set_low(&mut self) {
            self.high = false;
            self.edges += 1;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_pin_follows_switches() {
        let mut pins = ActivityPins::new();
        pins.assign(TaskTag::new(2), Probe::default()).ok().unwrap();

        pins.on_switch_in(TaskTag::new(2), 0);
        assert!(pins.pin(TaskTag::new(2)).unwrap().is_set_high());

        pins.on_switch_out(TaskTag::new(2), 5);
        assert!(!pins.pin(TaskTag::new(2)).unwrap().is_set_high());
    }

    #[test]
    fn test_other_tags_untouched() {
        let mut pins = ActivityPins::new();
        pins.assign(TaskTag::new(1), Probe::default()).ok().unwrap();
        let edges = pins.pin(TaskTag::new(1)).unwrap().edges;

        pins.on_switch_in(TaskTag::new(3), 0);
        pins.on_switch_in(TaskTag::UNTAGGED, 0);
        assert_eq!(pins.pin(TaskTag::new(1)).unwrap().edges, edges);
        assert_eq!(pins.assigned(), 1);
    }

    #[test]
    fn test_assign_rejects_untagged() {
        let mut pins: ActivityPins<Probe> = ActivityPins::new();
        assert!(pins.assign(TaskTag::UNTAGGED, Probe::default()).is_err());
        assert!(pins
            .assign(TaskTag::new(MAX_TASKS as u8 + 1), Probe::default())
            .is_err());
        assert_eq!(pins.assigned(), 0);
    }

    #[test]
    fn test_assign_drives_low() {
        let mut pins = ActivityPins::new();
        pins.assign(
            TaskTag::new(1),
            Probe {
                high: true,
                edges: 0,
            },
        )
        .ok()
        .unwrap();
        assert!(!pins.pin(TaskTag::new(1)).unwrap().is_set_high());
    }
}
