//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins that can be implemented
//! by chip-specific HALs, plus the port/pin coordinates board tables use.

use core::fmt;

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

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

/// Marker for an unused port or pin in board tables
pub const PIN_UNUSED: u8 = 0xff;

/// Highest GPIO port letter on the STM32F42x (GPIOA..GPIOK)
pub const LAST_PORT: char = 'K';

/// A GPIO coordinate: port index (0 = GPIOA) and pin number (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortPin {
    pub port: u8,
    pub pin: u8,
}

impl PortPin {
    /// The "not connected" coordinate (0xff, 0xff)
    pub const NONE: PortPin = PortPin {
        port: PIN_UNUSED,
        pin: PIN_UNUSED,
    };

    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }

    /// True unless this is the unused marker
    pub const fn is_connected(&self) -> bool {
        self.port != PIN_UNUSED && self.pin != PIN_UNUSED
    }

    /// Convert the unused marker into `None`
    pub const fn connected(self) -> Option<PortPin> {
        if self.is_connected() {
            Some(self)
        } else {
            None
        }
    }

    /// Port letter ('A' for port 0), if the port exists on the chip
    pub fn port_letter(&self) -> Option<char> {
        let letter = (b'A' + self.port.min(25)) as char;
        if self.is_connected() && letter <= LAST_PORT {
            Some(letter)
        } else {
            None
        }
    }
}

impl fmt::Display for PortPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port_letter() {
            Some(letter) => write!(f, "P{}{}", letter, self.pin),
            None => f.write_str("NC"),
        }
    }
}

/// Status LED with board-defined polarity
///
/// Boards wire LEDs either active-high or active-low; callers only ever
/// think in terms of on/off.
pub struct Led<P: OutputPin> {
    pin: P,
    active_high: bool,
}

impl<P: OutputPin> Led<P> {
    /// Wrap a pin; the LED starts off
    pub fn new(mut pin: P, active_high: bool) -> Self {
        pin.set_state(!active_high);
        Self { pin, active_high }
    }

    pub fn on(&mut self) {
        self.pin.set_state(self.active_high);
    }

    pub fn off(&mut self) {
        self.pin.set_state(!self.active_high);
    }

    pub fn toggle(&mut self) {
        self.pin.toggle();
    }

    pub fn is_on(&self) -> bool {
        self.pin.is_set_high() == self.active_high
    }

    /// Release the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

/// Startup blink sequence for a [`Led`]
///
/// The caller decides how long to wait between steps, so the sequence can
/// run from an async task without holding the LED between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedStartup {
    remaining: u32,
}

impl LedStartup {
    pub const fn new(toggles: u32) -> Self {
        Self { remaining: toggles }
    }

    pub const fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Advance one step; returns false once the sequence has finished
    ///
    /// The last step leaves the LED off.
    pub fn step<P: OutputPin>(&mut self, led: &mut Led<P>) -> bool {
        match self.remaining {
            0 => false,
            1 => {
                self.remaining = 0;
                led.off();
                false
            }
            _ => {
                self.remaining -= 1;
                led.toggle();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPin {
        high: bool,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn toggle(&mut self) {
            self.high = !self.high;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_display_pin() {
        let mut s: heapless::String<8> = heapless::String::new();
        core::fmt::write(&mut s, format_args!("{}", PortPin::new(3, 8))).unwrap();
        assert_eq!(s.as_str(), "PD8");

        s.clear();
        core::fmt::write(&mut s, format_args!("{}", PortPin::NONE)).unwrap();
        assert_eq!(s.as_str(), "NC");
    }

    #[test]
    fn test_unused_pin() {
        assert!(!PortPin::NONE.is_connected());
        assert_eq!(PortPin::NONE.connected(), None);
        assert_eq!(PortPin::new(0, 2).connected(), Some(PortPin::new(0, 2)));
        assert_eq!(PortPin::NONE.port_letter(), None);
    }

    #[test]
    fn test_led_active_high() {
        let mut led = Led::new(MockPin { high: true }, true);
        assert!(!led.is_on());
        led.on();
        assert!(led.is_on());
        assert!(led.into_inner().high);
    }

    #[test]
    fn test_led_startup_sequence() {
        let mut led = Led::new(MockPin { high: false }, true);
        let mut sweep = LedStartup::new(8);
        let mut states: heapless::Vec<bool, 16> = heapless::Vec::new();
        while sweep.step(&mut led) {
            states.push(led.is_on()).unwrap();
        }
        assert_eq!(states.as_slice(), &[true, false, true, false, true, false, true]);
        assert!(sweep.is_done());
        assert!(!led.is_on());
        assert!(!sweep.step(&mut led));
    }

    #[test]
    fn test_led_startup_ends_off_from_on() {
        let mut led = Led::new(MockPin { high: false }, false);
        led.on();
        let mut sweep = LedStartup::new(1);
        assert!(!sweep.step(&mut led));
        assert!(!led.is_on());
    }

    #[test]
    fn test_led_active_low() {
        let mut led = Led::new(MockPin { high: false }, false);
        assert!(!led.is_on());
        led.on();
        assert!(led.is_on());
        led.toggle();
        assert!(!led.is_on());
        assert!(led.into_inner().high);
    }
}
