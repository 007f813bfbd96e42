//! GPIO glue for STM32F4
//!
//! Wraps embassy GPIO types so board code can use the `nucleo429-hal`
//! traits (status LED, bootloader request button).

use embassy_stm32::gpio::{Input, Output};
use nucleo429_hal::gpio::{InputPin, OutputPin};

/// Push-pull output implementing [`OutputPin`]
pub struct Stm32Output<'d>(pub Output<'d>);

impl OutputPin for Stm32Output<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn toggle(&mut self) {
        self.0.toggle();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}

/// Input implementing [`InputPin`]
pub struct Stm32Input<'d>(pub Input<'d>);

impl InputPin for Stm32Input<'_> {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}
