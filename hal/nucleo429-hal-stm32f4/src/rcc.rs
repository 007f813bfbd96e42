//! Clock tree glue
//!
//! Turns the board [`ClockConfig`] into the RCC part of
//! `embassy_stm32::Config`. The table is validated first; embassy then
//! programs the PLL, bus prescalers and flash wait states.

use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllMul, PllPDiv, PllPreDiv, PllQDiv,
    PllSource, Sysclk,
};
use embassy_stm32::time::Hertz;
use nucleo429_core::config::clock::{AhbPrescaler, ApbPrescaler, ClockConfig, ClockError};

fn ahb_prescaler(pre: AhbPrescaler) -> AHBPrescaler {
    match pre {
        AhbPrescaler::Div1 => AHBPrescaler::DIV1,
        AhbPrescaler::Div2 => AHBPrescaler::DIV2,
        AhbPrescaler::Div4 => AHBPrescaler::DIV4,
        AhbPrescaler::Div8 => AHBPrescaler::DIV8,
        AhbPrescaler::Div16 => AHBPrescaler::DIV16,
        AhbPrescaler::Div64 => AHBPrescaler::DIV64,
        AhbPrescaler::Div128 => AHBPrescaler::DIV128,
        AhbPrescaler::Div256 => AHBPrescaler::DIV256,
        AhbPrescaler::Div512 => AHBPrescaler::DIV512,
    }
}

fn apb_prescaler(pre: ApbPrescaler) -> APBPrescaler {
    match pre {
        ApbPrescaler::Div1 => APBPrescaler::DIV1,
        ApbPrescaler::Div2 => APBPrescaler::DIV2,
        ApbPrescaler::Div4 => APBPrescaler::DIV4,
        ApbPrescaler::Div8 => APBPrescaler::DIV8,
        ApbPrescaler::Div16 => APBPrescaler::DIV16,
    }
}

fn pllp(p: u8) -> Result<PllPDiv, ClockError> {
    match p {
        2 => Ok(PllPDiv::DIV2),
        4 => Ok(PllPDiv::DIV4),
        6 => Ok(PllPDiv::DIV6),
        8 => Ok(PllPDiv::DIV8),
        other => Err(ClockError::InvalidPllp(other)),
    }
}

/// Build the embassy configuration for this board's clock tree
///
/// `osc_hz` is the HSE frequency; on the Nucleo-144 it comes from the
/// ST-LINK MCO output, so the oscillator runs in bypass mode.
///
/// `voltage_scale` and `flash_latency` are checked against HCLK but not
/// applied: embassy-stm32 sets the regulator scale and flash wait states
/// itself from the resulting clock tree.
pub fn embassy_config(clock: &ClockConfig, osc_hz: u32) -> Result<embassy_stm32::Config, ClockError> {
    clock.validate_with_usb(osc_hz)?;

    let mut config = embassy_stm32::Config::default();

    config.rcc.hse = Some(Hse {
        freq: Hertz(osc_hz),
        mode: HseMode::Bypass,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::from_bits(clock.pllm),
        mul: PllMul::from_bits(clock.plln),
        divp: Some(pllp(clock.pllp)?),
        divq: Some(PllQDiv::from_bits(clock.pllq)),
        divr: None,
    });
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = ahb_prescaler(clock.ahb_prescaler);
    config.rcc.apb1_pre = apb_prescaler(clock.apb1_prescaler);
    config.rcc.apb2_pre = apb_prescaler(clock.apb2_prescaler);

    Ok(config)
}
