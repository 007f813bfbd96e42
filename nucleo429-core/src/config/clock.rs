//! Clock tree configuration
//!
//! The STM32F429 derives SYSCLK from the main PLL:
//!
//! ```text
//! HSE (8 MHz) ─ /M ─► VCO in (2 MHz) ─ ×N ─► VCO out (336 MHz) ─┬─ /P ─► SYSCLK (168 MHz)
//!                                                                └─ /Q ─► 48 MHz (USB OTG FS)
//! SYSCLK ─ AHB /1 ─► HCLK (168 MHz) ─┬─ APB1 /4 ─► PCLK1 (42 MHz)
//!                                    └─ APB2 /2 ─► PCLK2 (84 MHz)
//! ```
//!
//! The table itself is plain data. [`ClockConfig::validate`] checks it
//! against the chip limits before it is handed to the RCC driver.

/// Frequency of the external clock (ST-LINK MCO output, bypass mode)
pub const HSE_FREQ_HZ: u32 = 8_000_000;

/// Target system clock
pub const SYSTEM_CLOCK_HZ: u32 = 168_000_000;

/// Nominal peripheral clock published to drivers
pub const PERIPH_CLOCK_HZ: u32 = SYSTEM_CLOCK_HZ / 4;

/// Clock required by the USB OTG FS core
pub const USB_CLOCK_HZ: u32 = 48_000_000;

/// VCO input limits (RM0090 §6.3.2; 1-2 MHz recommended)
pub const VCO_INPUT_MIN_HZ: u32 = 950_000;
pub const VCO_INPUT_MAX_HZ: u32 = 2_100_000;

/// VCO output limits
pub const VCO_OUTPUT_MIN_HZ: u32 = 100_000_000;
pub const VCO_OUTPUT_MAX_HZ: u32 = 432_000_000;

/// Highest SYSCLK the part supports (over-drive on)
pub const SYSCLK_MAX_HZ: u32 = 180_000_000;

/// APB bus limits
pub const PCLK1_MAX_HZ: u32 = 45_000_000;
pub const PCLK2_MAX_HZ: u32 = 90_000_000;

/// HCLK covered by each flash wait state at 2.7-3.6 V
pub const FLASH_WAIT_STATE_STEP_HZ: u32 = 30_000_000;

/// AHB prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AhbPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div64,
    Div128,
    Div256,
    Div512,
}

impl AhbPrescaler {
    pub const fn divisor(&self) -> u32 {
        match self {
            AhbPrescaler::Div1 => 1,
            AhbPrescaler::Div2 => 2,
            AhbPrescaler::Div4 => 4,
            AhbPrescaler::Div8 => 8,
            AhbPrescaler::Div16 => 16,
            AhbPrescaler::Div64 => 64,
            AhbPrescaler::Div128 => 128,
            AhbPrescaler::Div256 => 256,
            AhbPrescaler::Div512 => 512,
        }
    }
}

/// APB1/APB2 prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApbPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
}

impl ApbPrescaler {
    pub const fn divisor(&self) -> u32 {
        match self {
            ApbPrescaler::Div1 => 1,
            ApbPrescaler::Div2 => 2,
            ApbPrescaler::Div4 => 4,
            ApbPrescaler::Div8 => 8,
            ApbPrescaler::Div16 => 16,
        }
    }
}

/// Regulator voltage scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VoltageScale {
    Scale1,
    Scale2,
    Scale3,
}

impl VoltageScale {
    /// Highest HCLK the regulator supports at this scale
    ///
    /// Scale 1 reaches 180 MHz only with over-drive enabled.
    pub const fn max_hclk_hz(&self) -> u32 {
        match self {
            VoltageScale::Scale1 => 180_000_000,
            VoltageScale::Scale2 => 144_000_000,
            VoltageScale::Scale3 => 120_000_000,
        }
    }
}

/// Source of the 48 MHz domain on parts that have a CK48 mux
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Clk48Source {
    PllQ,
    PllSaiP,
}

/// Clock configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// PLLM outside 2..=63
    PllmOutOfRange(u8),
    /// PLLN outside 50..=432
    PllnOutOfRange(u16),
    /// PLLP not one of 2, 4, 6, 8
    InvalidPllp(u8),
    /// PLLQ outside 2..=15
    PllqOutOfRange(u8),
    /// VCO input frequency out of range (Hz)
    VcoInputOutOfRange(u32),
    /// VCO output frequency out of range (Hz)
    VcoOutputOutOfRange(u32),
    /// SYSCLK exceeds 180 MHz (Hz)
    SysclkTooHigh(u32),
    /// HCLK exceeds what the voltage scale allows (Hz)
    HclkTooHigh(u32),
    /// APB1 clock exceeds 45 MHz (Hz)
    Pclk1TooHigh(u32),
    /// APB2 clock exceeds 90 MHz (Hz)
    Pclk2TooHigh(u32),
    /// 48 MHz domain above 48 MHz, or not exactly 48 MHz when USB needs it (Hz)
    Clk48Mismatch(u32),
    /// Configured flash latency is below the required wait states
    FlashLatencyTooLow { required: u8, configured: u8 },
    /// This part has no CK48 mux
    Clk48MuxUnavailable,
}

impl ClockError {
    /// Short human readable description for console output
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockError::PllmOutOfRange(_) => "PLLM out of range",
            ClockError::PllnOutOfRange(_) => "PLLN out of range",
            ClockError::InvalidPllp(_) => "PLLP must be 2, 4, 6 or 8",
            ClockError::PllqOutOfRange(_) => "PLLQ out of range",
            ClockError::VcoInputOutOfRange(_) => "VCO input out of range",
            ClockError::VcoOutputOutOfRange(_) => "VCO output out of range",
            ClockError::SysclkTooHigh(_) => "SYSCLK too high",
            ClockError::HclkTooHigh(_) => "HCLK too high for voltage scale",
            ClockError::Pclk1TooHigh(_) => "APB1 clock too high",
            ClockError::Pclk2TooHigh(_) => "APB2 clock too high",
            ClockError::Clk48Mismatch(_) => "48 MHz clock mismatch",
            ClockError::FlashLatencyTooLow { .. } => "flash latency too low",
            ClockError::Clk48MuxUnavailable => "no CK48 mux on this part",
        }
    }
}

/// Main PLL and bus prescaler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// Input divider (VCO input = oscillator / M)
    pub pllm: u8,
    /// VCO multiplier
    pub plln: u16,
    /// System clock divider
    pub pllp: u8,
    /// 48 MHz domain divider
    pub pllq: u8,
    pub ahb_prescaler: AhbPrescaler,
    pub apb1_prescaler: ApbPrescaler,
    pub apb2_prescaler: ApbPrescaler,
    /// `None` on parts where PLLQ feeds USB directly (F42x/F43x)
    pub clk48_source: Option<Clk48Source>,
    pub voltage_scale: VoltageScale,
    /// Flash wait states
    pub flash_latency: u8,
}

/// Clock tree of this board: 8 MHz HSE to 168 MHz SYSCLK
pub const STM32_ARCH_CONFIG: ClockConfig = ClockConfig {
    pllm: 4,
    plln: 168,
    pllp: 2,
    pllq: 7,
    ahb_prescaler: AhbPrescaler::Div1,
    apb1_prescaler: ApbPrescaler::Div4,
    apb2_prescaler: ApbPrescaler::Div2,
    clk48_source: None,
    voltage_scale: VoltageScale::Scale1,
    flash_latency: 5,
};

const _: () = assert!(STM32_ARCH_CONFIG.sysclk_hz(HSE_FREQ_HZ) == SYSTEM_CLOCK_HZ);
const _: () = assert!(STM32_ARCH_CONFIG.pll48_hz(HSE_FREQ_HZ) == USB_CLOCK_HZ);

/// Flash wait states needed for an HCLK at 2.7-3.6 V
pub const fn required_flash_latency(hclk_hz: u32) -> u8 {
    if hclk_hz == 0 {
        return 0;
    }
    ((hclk_hz - 1) / FLASH_WAIT_STATE_STEP_HZ) as u8
}

impl ClockConfig {
    pub const fn vco_input_hz(&self, osc_hz: u32) -> u32 {
        if self.pllm == 0 {
            return 0;
        }
        osc_hz / self.pllm as u32
    }

    pub const fn vco_output_hz(&self, osc_hz: u32) -> u32 {
        self.vco_input_hz(osc_hz).saturating_mul(self.plln as u32)
    }

    pub const fn sysclk_hz(&self, osc_hz: u32) -> u32 {
        if self.pllp == 0 {
            return 0;
        }
        self.vco_output_hz(osc_hz) / self.pllp as u32
    }

    pub const fn pll48_hz(&self, osc_hz: u32) -> u32 {
        if self.pllq == 0 {
            return 0;
        }
        self.vco_output_hz(osc_hz) / self.pllq as u32
    }

    pub const fn hclk_hz(&self, osc_hz: u32) -> u32 {
        self.sysclk_hz(osc_hz) / self.ahb_prescaler.divisor()
    }

    pub const fn pclk1_hz(&self, osc_hz: u32) -> u32 {
        self.hclk_hz(osc_hz) / self.apb1_prescaler.divisor()
    }

    pub const fn pclk2_hz(&self, osc_hz: u32) -> u32 {
        self.hclk_hz(osc_hz) / self.apb2_prescaler.divisor()
    }

    /// Check the table against the STM32F42x clock limits
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self, osc_hz: u32) -> Result<(), ClockError> {
        if !(2..=63).contains(&self.pllm) {
            return Err(ClockError::PllmOutOfRange(self.pllm));
        }
        if !(50..=432).contains(&self.plln) {
            return Err(ClockError::PllnOutOfRange(self.plln));
        }
        if !matches!(self.pllp, 2 | 4 | 6 | 8) {
            return Err(ClockError::InvalidPllp(self.pllp));
        }
        if !(2..=15).contains(&self.pllq) {
            return Err(ClockError::PllqOutOfRange(self.pllq));
        }
        if self.clk48_source.is_some() {
            return Err(ClockError::Clk48MuxUnavailable);
        }

        let vco_in = self.vco_input_hz(osc_hz);
        if !(VCO_INPUT_MIN_HZ..=VCO_INPUT_MAX_HZ).contains(&vco_in) {
            return Err(ClockError::VcoInputOutOfRange(vco_in));
        }

        let vco_out = self.vco_output_hz(osc_hz);
        if !(VCO_OUTPUT_MIN_HZ..=VCO_OUTPUT_MAX_HZ).contains(&vco_out) {
            return Err(ClockError::VcoOutputOutOfRange(vco_out));
        }

        let sysclk = self.sysclk_hz(osc_hz);
        if sysclk > SYSCLK_MAX_HZ {
            return Err(ClockError::SysclkTooHigh(sysclk));
        }

        let hclk = self.hclk_hz(osc_hz);
        if hclk > self.voltage_scale.max_hclk_hz() {
            return Err(ClockError::HclkTooHigh(hclk));
        }

        let pclk1 = self.pclk1_hz(osc_hz);
        if pclk1 > PCLK1_MAX_HZ {
            return Err(ClockError::Pclk1TooHigh(pclk1));
        }

        let pclk2 = self.pclk2_hz(osc_hz);
        if pclk2 > PCLK2_MAX_HZ {
            return Err(ClockError::Pclk2TooHigh(pclk2));
        }

        let pll48 = self.pll48_hz(osc_hz);
        if pll48 > USB_CLOCK_HZ {
            return Err(ClockError::Clk48Mismatch(pll48));
        }

        let required = required_flash_latency(hclk);
        if self.flash_latency < required {
            return Err(ClockError::FlashLatencyTooLow {
                required,
                configured: self.flash_latency,
            });
        }

        Ok(())
    }

    /// [`validate`](Self::validate), plus an exact 48 MHz USB clock
    pub fn validate_with_usb(&self, osc_hz: u32) -> Result<(), ClockError> {
        self.validate(osc_hz)?;
        let pll48 = self.pll48_hz(osc_hz);
        if pll48 != USB_CLOCK_HZ {
            return Err(ClockError::Clk48Mismatch(pll48));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_board_clock_tree() {
        let c = STM32_ARCH_CONFIG;
        assert_eq!(c.vco_input_hz(HSE_FREQ_HZ), 2_000_000);
        assert_eq!(c.vco_output_hz(HSE_FREQ_HZ), 336_000_000);
        assert_eq!(c.sysclk_hz(HSE_FREQ_HZ), SYSTEM_CLOCK_HZ);
        assert_eq!(c.pll48_hz(HSE_FREQ_HZ), 48_000_000);
        assert_eq!(c.hclk_hz(HSE_FREQ_HZ), 168_000_000);
        assert_eq!(c.pclk1_hz(HSE_FREQ_HZ), PERIPH_CLOCK_HZ);
        assert_eq!(c.pclk2_hz(HSE_FREQ_HZ), 84_000_000);
    }

    #[test]
    fn test_pll_identity() {
        let c = STM32_ARCH_CONFIG;
        let expected =
            HSE_FREQ_HZ as u64 * c.plln as u64 / (c.pllm as u64 * c.pllp as u64);
        assert_eq!(expected, SYSTEM_CLOCK_HZ as u64);
    }

    #[test]
    fn test_board_config_validates() {
        assert_eq!(STM32_ARCH_CONFIG.validate(HSE_FREQ_HZ), Ok(()));
        assert_eq!(STM32_ARCH_CONFIG.validate_with_usb(HSE_FREQ_HZ), Ok(()));
    }

    #[test]
    fn test_flash_latency_table() {
        assert_eq!(required_flash_latency(0), 0);
        assert_eq!(required_flash_latency(30_000_000), 0);
        assert_eq!(required_flash_latency(30_000_001), 1);
        assert_eq!(required_flash_latency(168_000_000), 5);
        assert_eq!(required_flash_latency(180_000_000), 5);
    }

    #[test]
    fn test_rejects_bad_dividers() {
        let c = ClockConfig {
            pllm: 1,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.validate(HSE_FREQ_HZ), Err(ClockError::PllmOutOfRange(1)));

        let c = ClockConfig {
            pllp: 3,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.validate(HSE_FREQ_HZ), Err(ClockError::InvalidPllp(3)));

        let c = ClockConfig {
            pllq: 16,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.validate(HSE_FREQ_HZ), Err(ClockError::PllqOutOfRange(16)));
    }

    #[test]
    fn test_vco_input_window() {
        // 1-2 MHz sits inside the accepted window
        assert!((VCO_INPUT_MIN_HZ..=VCO_INPUT_MAX_HZ).contains(&1_000_000));
        assert!((VCO_INPUT_MIN_HZ..=VCO_INPUT_MAX_HZ).contains(&2_000_000));

        let c = ClockConfig {
            pllm: 8,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.vco_input_hz(HSE_FREQ_HZ), 1_000_000);
        assert_ne!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::VcoInputOutOfRange(1_000_000))
        );

        let c = ClockConfig {
            pllm: 9,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::VcoInputOutOfRange(888_888))
        );

        let c = ClockConfig {
            pllm: 3,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::VcoInputOutOfRange(2_666_666))
        );
    }

    #[test]
    fn test_rejects_fast_buses() {
        let c = ClockConfig {
            apb1_prescaler: ApbPrescaler::Div2,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::Pclk1TooHigh(84_000_000))
        );

        let c = ClockConfig {
            apb2_prescaler: ApbPrescaler::Div1,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::Pclk2TooHigh(168_000_000))
        );
    }

    #[test]
    fn test_rejects_low_flash_latency() {
        let c = ClockConfig {
            flash_latency: 4,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::FlashLatencyTooLow {
                required: 5,
                configured: 4
            })
        );
    }

    #[test]
    fn test_rejects_fast_sysclk_behind_ahb_divider() {
        // HCLK is only 108 MHz, but the core domain would run at 216 MHz
        let c = ClockConfig {
            pllm: 4,
            plln: 216,
            pllp: 2,
            pllq: 9,
            ahb_prescaler: AhbPrescaler::Div2,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.hclk_hz(HSE_FREQ_HZ), 108_000_000);
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::SysclkTooHigh(216_000_000))
        );
        assert_eq!(
            c.validate_with_usb(HSE_FREQ_HZ),
            Err(ClockError::SysclkTooHigh(216_000_000))
        );
    }

    #[test]
    fn test_voltage_scale_limits_hclk() {
        let c = ClockConfig {
            voltage_scale: VoltageScale::Scale3,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(
            c.validate(HSE_FREQ_HZ),
            Err(ClockError::HclkTooHigh(168_000_000))
        );
    }

    #[test]
    fn test_usb_requires_exact_48mhz() {
        // 336 MHz / 8 = 42 MHz is legal for the chip but useless for USB
        let c = ClockConfig {
            pllq: 8,
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.validate(HSE_FREQ_HZ), Ok(()));
        assert_eq!(
            c.validate_with_usb(HSE_FREQ_HZ),
            Err(ClockError::Clk48Mismatch(42_000_000))
        );
    }

    #[test]
    fn test_no_clk48_mux() {
        let c = ClockConfig {
            clk48_source: Some(Clk48Source::PllQ),
            ..STM32_ARCH_CONFIG
        };
        assert_eq!(c.validate(HSE_FREQ_HZ), Err(ClockError::Clk48MuxUnavailable));
    }

    proptest! {
        #[test]
        fn prop_valid_config_stays_within_limits(
            pllm in 2u8..=63,
            plln in 50u16..=432,
            pllp in prop::sample::select(vec![2u8, 4, 6, 8]),
            pllq in 2u8..=15,
            ahb_prescaler in prop::sample::select(vec![
                AhbPrescaler::Div1,
                AhbPrescaler::Div2,
                AhbPrescaler::Div4,
            ]),
        ) {
            let c = ClockConfig {
                pllm,
                plln,
                pllp,
                pllq,
                ahb_prescaler,
                ..STM32_ARCH_CONFIG
            };
            if c.validate(HSE_FREQ_HZ).is_ok() {
                let vco_in = c.vco_input_hz(HSE_FREQ_HZ);
                let vco_out = c.vco_output_hz(HSE_FREQ_HZ);
                prop_assert!((VCO_INPUT_MIN_HZ..=VCO_INPUT_MAX_HZ).contains(&vco_in));
                prop_assert!((VCO_OUTPUT_MIN_HZ..=VCO_OUTPUT_MAX_HZ).contains(&vco_out));
                prop_assert!(c.sysclk_hz(HSE_FREQ_HZ) <= SYSCLK_MAX_HZ);
                prop_assert!(c.hclk_hz(HSE_FREQ_HZ) <= SYSCLK_MAX_HZ);
                prop_assert!(c.pclk1_hz(HSE_FREQ_HZ) <= PCLK1_MAX_HZ);
                prop_assert!(c.pclk2_hz(HSE_FREQ_HZ) <= PCLK2_MAX_HZ);
                prop_assert!(c.pll48_hz(HSE_FREQ_HZ) <= USB_CLOCK_HZ);
            }
        }

        #[test]
        fn prop_sysclk_is_vco_over_p(
            pllm in 2u8..=63,
            plln in 50u16..=432,
            pllp in prop::sample::select(vec![2u8, 4, 6, 8]),
        ) {
            let c = ClockConfig { pllm, plln, pllp, ..STM32_ARCH_CONFIG };
            prop_assert_eq!(
                c.sysclk_hz(HSE_FREQ_HZ),
                HSE_FREQ_HZ / pllm as u32 * plln as u32 / pllp as u32
            );
        }
    }
}
