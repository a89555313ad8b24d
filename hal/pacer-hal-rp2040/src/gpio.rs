//! GPIO allocation and pin adapters
//!
//! Tracks which GPIO pins the configuration uses to report conflicts before
//! any pin is taken, and adapts `embassy-rp` pins to the `pacer-hal`
//! traits.

use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::Peri;
use heapless::FnvIndexSet;
use pacer_core::config::{PinConfig, PipelineConfig};
use pacer_hal::gpio::Polarity;
use pacer_hal::{InputPin, OutputPin};

use crate::pins::{is_reserved, PinError, GPIO_COUNT};

/// Sampled digital input
pub struct RpInput(Input<'static>);

impl InputPin for RpInput {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}

/// Push-pull output
pub struct RpOutput(Output<'static>);

impl OutputPin for RpOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// Edge detector input with configured polarity
pub type ButtonInput = Polarity<RpInput>;

/// Activity or tick marker output with configured polarity
pub type ActivityOutput = Polarity<RpOutput>;

/// Configure `pin` as an input
pub fn input(pin: Peri<'static, AnyPin>, config: &PinConfig) -> ButtonInput {
    let pull = if config.pull_up { Pull::Up } else { Pull::None };
    Polarity::new(RpInput(Input::new(pin, pull)), config.inverted)
}

/// Configure `pin` as an output, logically low
pub fn output(pin: Peri<'static, AnyPin>, config: &PinConfig) -> ActivityOutput {
    let level = if config.inverted { Level::High } else { Level::Low };
    Polarity::new(RpOutput(Output::new(pin, level)), config.inverted)
}

/// GPIO allocator to track pin usage
pub struct GpioAllocator {
    /// Set of allocated GPIO pins
    allocated: FnvIndexSet<u8, 32>,
}

impl Default for GpioAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioAllocator {
    /// Create a new GPIO allocator
    pub fn new() -> Self {
        Self {
            allocated: FnvIndexSet::new(),
        }
    }

    /// Allocate a GPIO pin
    pub fn allocate(&mut self, pin: u8) -> Result<(), PinError> {
        if pin >= GPIO_COUNT as u8 {
            return Err(PinError::InvalidPin);
        }
        if is_reserved(pin) {
            return Err(PinError::Reserved);
        }
        if self.allocated.contains(&pin) {
            return Err(PinError::AlreadyTaken);
        }
        self.allocated
            .insert(pin)
            .map_err(|_| PinError::InvalidPin)?;
        Ok(())
    }

    /// Check if a pin is allocated
    pub fn is_allocated(&self, pin: u8) -> bool {
        self.allocated.contains(&pin)
    }

    /// Get the number of allocated pins
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    /// Allocate every pin `config` uses
    ///
    /// Stops at the first conflict and reports the offending pin.
    pub fn allocate_config(&mut self, config: &PipelineConfig) -> Result<(), (u8, PinError)> {
        let task_pins = config
            .tasks
            .iter()
            .flat_map(|t| [t.input, t.activity_pin]);
        for pin in task_pins
            .chain(core::iter::once(config.telemetry.tick_pin))
            .flatten()
        {
            self.allocate(pin.pin).map_err(|e| (pin.pin, e))?;
        }
        Ok(())
    }
}
