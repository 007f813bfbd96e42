//! STM32F4-specific HAL for the Nucleo-F429ZI board
//!
//! Translates the board tables of `nucleo429-core` into `embassy-stm32`
//! configuration and implements the `nucleo429-hal` traits on top of
//! embassy peripherals.
//!
//! # Features
//!
//! - `stm32f429zi` - Enable support for STM32F429ZIT6 (Nucleo-144)
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod gpio;
pub mod rcc;
pub mod uart;

/// NVIC priority bits implemented on the STM32F4
pub const IRQ_PRIORITY_BITS: u8 = 4;

/// Middle of the 16 priority levels
pub const IRQ_MIDDLE_PRIO: u8 = 1 << (IRQ_PRIORITY_BITS - 1);

pub use gpio::{Stm32Input, Stm32Output};
pub use rcc::embassy_config;
pub use uart::{usart_config, DebugUart, UartBusError};
