//! USART glue for STM32F4
//!
//! Line coding conversion from board tables, error mapping, and the
//! blocking transmitter used by the debug console.

use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::{self, Error as UsartError};
use nucleo429_core::config::board::UartAttr;
use nucleo429_hal::uart::{DataBits, Parity, StopBits, UartTx};

/// Error from UART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartBusError {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// Overrun error
    Overrun,
    /// Parity error
    Parity,
    /// Buffer too small
    BufferTooSmall,
    /// Line coding the peripheral cannot produce
    Unsupported,
    /// Other error
    Other,
}

impl From<UsartError> for UartBusError {
    fn from(e: UsartError) -> Self {
        match e {
            UsartError::Framing => UartBusError::Framing,
            UsartError::Noise => UartBusError::Noise,
            UsartError::Overrun => UartBusError::Overrun,
            UsartError::Parity => UartBusError::Parity,
            UsartError::BufferTooLong => UartBusError::BufferTooSmall,
            _ => UartBusError::Other,
        }
    }
}

/// Build an embassy USART configuration from a board UART attribute
///
/// Flow control pins are not handled here; the board tables leave them
/// unconnected.
pub fn usart_config(attr: &UartAttr) -> Result<usart::Config, UartBusError> {
    let line = attr.line_config();
    let mut config = usart::Config::default();

    config.baudrate = line.baudrate;
    config.data_bits = match line.data_bits {
        DataBits::Eight => usart::DataBits::DataBits8,
        DataBits::Nine => usart::DataBits::DataBits9,
        DataBits::Seven => return Err(UartBusError::Unsupported),
    };
    config.parity = match line.parity {
        Parity::None => usart::Parity::ParityNone,
        Parity::Even => usart::Parity::ParityEven,
        Parity::Odd => usart::Parity::ParityOdd,
    };
    config.stop_bits = match line.stop_bits {
        StopBits::One => usart::StopBits::STOP1,
        StopBits::Two => usart::StopBits::STOP2,
    };

    Ok(config)
}

/// Blocking transmitter of the debug UART
pub struct DebugUart<'d> {
    tx: usart::UartTx<'d, Blocking>,
}

impl<'d> DebugUart<'d> {
    pub fn new(tx: usart::UartTx<'d, Blocking>) -> Self {
        Self { tx }
    }
}

impl UartTx for DebugUart<'_> {
    type Error = UartBusError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.blocking_write(data).map_err(UartBusError::from)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush().map_err(UartBusError::from)
    }
}
