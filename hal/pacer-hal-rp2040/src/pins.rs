//! Dynamic pin allocation for config-driven hardware setup
//!
//! Provides a way to get GPIO pins by number at runtime, so task inputs and
//! activity pins come from `pipeline.toml` rather than being hardcoded.
//! GPIO 0 and 1 are reserved for the UART0 serial link.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{PIN_0, UART0};
use embassy_rp::{Peri, Peripherals};

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// UART0 TX pin
pub const UART_TX_PIN: u8 = 0;

/// UART0 RX pin
pub const UART_RX_PIN: u8 = 1;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for the serial link
    Reserved,
}

/// Check if `pin` belongs to the serial link
pub const fn is_reserved(pin: u8) -> bool {
    pin == UART_TX_PIN || pin == UART_RX_PIN
}

/// Pin bank that holds the free GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Split the peripherals into the pin bank and the serial peripherals
    pub fn split(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        let remaining = RemainingPeripherals {
            uart0: p.UART0,
            uart_tx: p.PIN_0,
        };
        (bank, remaining)
    }

    /// Take a pin by number
    ///
    /// Fails if the number is out of range, the pin belongs to the serial
    /// link, or it was already taken.
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if is_reserved(pin_num) {
            return Err(PinError::Reserved);
        }
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin)?
            .take()
            .ok_or(PinError::AlreadyTaken)
    }
}

/// Peripherals left after creating the pin bank
///
/// GPIO 1 (UART0 RX) is left unclaimed; the link only transmits.
pub struct RemainingPeripherals {
    pub uart0: Peri<'static, UART0>,
    pub uart_tx: Peri<'static, PIN_0>,
}
