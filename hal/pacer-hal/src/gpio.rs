//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins that can be implemented
//! by chip-specific HALs. Both are synchronous: a read or write completes
//! before the call returns and never blocks on anything else.

/// Digital output pin
///
/// Used for signalling only (period boundaries, per-task activity), so
/// writes are infallible.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Active-low adapter
///
/// Wraps a pin so that its logical level is the inverse of the electrical
/// level. Configured with the `!` prefix on a pin string.
#[derive(Debug)]
pub struct Inverted<P>(pub P);

impl<P> Inverted<P> {
    /// Unwrap the underlying pin
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: InputPin> InputPin for Inverted<P> {
    fn is_high(&self) -> bool {
        self.0.is_low()
    }
}

impl<P: OutputPin> OutputPin for Inverted<P> {
    fn set_high(&mut self) {
        self.0.set_low();
    }

    fn set_low(&mut self) {
        self.0.set_high();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_low()
    }
}

/// Pin that is either used as-is or through [`Inverted`]
///
/// Lets configuration decide polarity at runtime without changing the pin
/// type handed to tasks.
#[derive(Debug)]
pub enum Polarity<P> {
    /// Logical level equals electrical level
    Normal(P),
    /// Logical level is the inverse of electrical level
    Inverted(Inverted<P>),
}

impl<P> Polarity<P> {
    /// Wrap `pin`, inverting it when `inverted` is set
    pub fn new(pin: P, inverted: bool) -> Self {
        if inverted {
            Polarity::Inverted(Inverted(pin))
        } else {
            Polarity::Normal(pin)
        }
    }
}

impl<P: InputPin> InputPin for Polarity<P> {
    fn is_high(&self) -> bool {
        match self {
            Polarity::Normal(p) => p.is_high(),
            Polarity::Inverted(p) => p.is_high(),
        }
    }
}

impl<P: OutputPin> OutputPin for Polarity<P> {
    fn set_high(&mut self) {
        match self {
            Polarity::Normal(p) => p.set_high(),
            Polarity::Inverted(p) => p.set_high(),
        }
    }

    fn set_low(&mut self) {
        match self {
            Polarity::Normal(p) => p.set_low(),
            Polarity::Inverted(p) => p.set_low(),
        }
    }

    fn is_set_high(&self) -> bool {
        match self {
            Polarity::Normal(p) => p.is_set_high(),
            Polarity::Inverted(p) => p.is_set_high(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Level(bool);

    impl InputPin for Level {
        fn is_high(&self) -> bool {
            self.0
        }
    }

    impl OutputPin for Level {
        fn set_high(&mut self) {
            self.0 = true;
        }

        fn set_low(&mut self) {
            self.0 = false;
        }

        fn is_set_high(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_inverted_input() {
        assert!(Inverted(Level(false)).is_high());
        assert!(Inverted(Level(true)).is_low());
    }

    #[test]
    fn test_inverted_output() {
        let mut pin = Inverted(Level(false));
        pin.set_low();
        assert!(pin.is_set_low());
        assert!(pin.into_inner().0);
    }

    #[test]
    fn test_toggle_default() {
        let mut pin = Level(false);
        pin.toggle();
        assert!(pin.is_set_high());
        pin.toggle();
        assert!(pin.is_set_low());
    }

    #[test]
    fn test_polarity_selects_at_runtime() {
        assert!(Polarity::new(Level(true), false).is_high());
        assert!(Polarity::new(Level(true), true).is_low());

        let mut out = Polarity::new(Level(false), true);
        out.set_state(true);
        assert!(out.is_set_high());
    }
}
