//! MCU board configuration
//!
//! Oscillator and core frequencies, debug UART wiring, the status LED and
//! the USB receive buffer size.

use nucleo429_hal::gpio::PortPin;
use nucleo429_hal::uart::{DataBits, Parity, StopBits, UartConfig};

use super::clock::{HSE_FREQ_HZ, SYSTEM_CLOCK_HZ};

/// Size of the buffer the USB driver receives OUT packets into
pub const USB_RX_BUFFER_SIZE: usize = 512;

/// Max packet size of the USB control endpoint
pub const USB_MAX_PACKET_ZERO: u8 = 64;

/// Default debug UART baud rate
pub const DEBUG_UART_BAUDRATE: u32 = 115_200;

/// UART attribute flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartFlags(pub u32);

impl UartFlags {
    /// Apply line coding with no parity and one stop bit
    pub const SET_LINE_CODING_DEFAULT: UartFlags = UartFlags(1 << 0);
    pub const IS_PARITY_EVEN: UartFlags = UartFlags(1 << 1);
    pub const IS_PARITY_ODD: UartFlags = UartFlags(1 << 2);
    pub const IS_STOP2: UartFlags = UartFlags(1 << 3);

    pub const fn contains(&self, other: UartFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: UartFlags) -> UartFlags {
        UartFlags(self.0 | other.0)
    }
}

/// UART wiring and line coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartAttr {
    pub flags: UartFlags,
    pub width: DataBits,
    /// Baud rate
    pub freq: u32,
    pub tx: PortPin,
    pub rx: PortPin,
    /// Flow control pins, `None` when not wired
    pub rts: Option<PortPin>,
    pub cts: Option<PortPin>,
}

impl UartAttr {
    /// Declare a UART from raw port/pin pairs
    ///
    /// Pins given as 0xff are treated as not connected. Widths other than
    /// 7 or 9 fall back to 8 data bits.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        flags: UartFlags,
        width: u8,
        freq: u32,
        tx: (u8, u8),
        rx: (u8, u8),
        rts: (u8, u8),
        cts: (u8, u8),
    ) -> Self {
        let width = match DataBits::from_width(width) {
            Some(width) => width,
            None => DataBits::Eight,
        };
        Self {
            flags,
            width,
            freq,
            tx: PortPin::new(tx.0, tx.1),
            rx: PortPin::new(rx.0, rx.1),
            rts: PortPin::new(rts.0, rts.1).connected(),
            cts: PortPin::new(cts.0, cts.1).connected(),
        }
    }

    /// Line coding derived from the flags
    pub fn line_config(&self) -> UartConfig {
        let parity = if self.flags.contains(UartFlags::IS_PARITY_EVEN) {
            Parity::Even
        } else if self.flags.contains(UartFlags::IS_PARITY_ODD) {
            Parity::Odd
        } else {
            Parity::None
        };
        let stop_bits = if self.flags.contains(UartFlags::IS_STOP2) {
            StopBits::Two
        } else {
            StopBits::One
        };
        UartConfig {
            baudrate: self.freq,
            data_bits: self.width,
            parity,
            stop_bits,
        }
    }

    pub fn has_flow_control(&self) -> bool {
        self.rts.is_some() || self.cts.is_some()
    }
}

/// Board behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardFlags(pub u32);

impl BoardFlags {
    pub const LED_ACTIVE_HIGH: BoardFlags = BoardFlags(1 << 0);

    pub const fn contains(&self, other: BoardFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// MCU-level board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// External oscillator frequency
    pub core_osc_freq: u32,
    pub core_cpu_freq: u32,
    pub core_periph_freq: u32,
    pub usb_max_packet_zero: u8,
    /// Zero-based USART index used for the debug console (2 = USART3)
    pub debug_uart_port: u8,
    pub debug_uart_attr: UartAttr,
    pub flags: BoardFlags,
    pub led: PortPin,
    pub usb_rx_buffer_size: usize,
}

impl BoardConfig {
    pub const fn led_active_high(&self) -> bool {
        self.flags.contains(BoardFlags::LED_ACTIVE_HIGH)
    }
}

/// Nucleo-144 wiring: ST-LINK VCP on USART3 (PD8/PD9), LD2 (blue) on PB7
pub const MCU_BOARD_CONFIG: BoardConfig = BoardConfig {
    core_osc_freq: HSE_FREQ_HZ,
    core_cpu_freq: SYSTEM_CLOCK_HZ,
    core_periph_freq: SYSTEM_CLOCK_HZ,
    usb_max_packet_zero: USB_MAX_PACKET_ZERO,
    debug_uart_port: 2,
    debug_uart_attr: UartAttr::new(
        UartFlags::SET_LINE_CODING_DEFAULT,
        8,
        DEBUG_UART_BAUDRATE,
        (3, 8),       // tx port, pin
        (3, 9),       // rx port, pin
        (0xff, 0xff), // rts port, pin
        (0xff, 0xff), // cts port, pin
    ),
    flags: BoardFlags::LED_ACTIVE_HIGH,
    led: PortPin::new(1, 7),
    usb_rx_buffer_size: USB_RX_BUFFER_SIZE,
};
