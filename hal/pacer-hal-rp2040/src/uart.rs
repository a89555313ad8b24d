//! UART serial output
//!
//! The pipeline writes complete lines on UART0 (TX on GPIO 0). Writes are
//! blocking.

use embassy_rp::peripherals::{PIN_0, UART0};
use embassy_rp::uart::{self, Blocking};
use embassy_rp::Peri;
use pacer_hal::uart::{DataBits, Parity, StopBits};
use pacer_hal::{UartConfig, UartTx};

/// Serial write failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialError(pub uart::Error);

/// Convert the board-agnostic framing into the driver configuration
pub fn driver_config(config: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = config.baudrate;
    cfg.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    cfg.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}

/// Blocking serial writer on UART0
pub struct RpSerial {
    tx: uart::UartTx<'static, Blocking>,
}

impl RpSerial {
    pub fn new(uart: Peri<'static, UART0>, tx: Peri<'static, PIN_0>, config: &UartConfig) -> Self {
        Self {
            tx: uart::UartTx::new_blocking(uart, tx, driver_config(config)),
        }
    }
}

impl UartTx for RpSerial {
    type Error = SerialError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.tx.blocking_write(data).map_err(SerialError)
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.tx.blocking_flush().map_err(SerialError)
    }
}
