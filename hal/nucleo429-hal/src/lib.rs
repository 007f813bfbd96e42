//! Nucleo429 Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the board support
//! package is written against. The STM32F4 glue crate implements them on
//! top of `embassy-stm32`; host tests implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Images (nucleo429-firmware, -boot)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  nucleo429-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  nucleo429-hal-stm32f4 (embassy-stm32)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::UartTx`] - Blocking serial transmit
//!
//! # Types
//!
//! - [`gpio::PortPin`] - Port/pin coordinates used by board tables
//! - [`gpio::Led`] - Polarity-aware status LED
//! - [`gpio::LedStartup`] - Startup blink sequence, one step at a time
//! - [`console::Console`] - `core::fmt::Write` adapter over a UART

#![no_std]
#![deny(unsafe_code)]

pub mod console;
pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use console::Console;
pub use gpio::{InputPin, Led, LedStartup, OutputPin, PortPin};
pub use uart::{UartConfig, UartTx};
