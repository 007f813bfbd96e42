//! Nucleo-F429ZI - bootloader
//!
//! Sits in the first 64 KB of flash. On reset it checks the OS image that
//! follows it and jumps there, unless the user button is held or the image
//! does not look launchable. The bootloader runs on the reset clock (HSI)
//! so the image starts from the same clock state as after a cold reset.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt::*;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::usart;
use {defmt_rtt as _, panic_probe as _};

use nucleo429_core::boot::{decide, BootConfig, BootDecision, StayReason, VectorHead, BOOT_BOARD_CONFIG};
use nucleo429_core::config::board::MCU_BOARD_CONFIG;
use nucleo429_core::config::clock::STM32_ARCH_CONFIG;
use nucleo429_hal::{Console, InputPin, Led};
use nucleo429_hal_stm32f4::{usart_config, DebugUart, Stm32Input, Stm32Output};

#[entry]
fn main() -> ! {
    boot_main(&BOOT_BOARD_CONFIG)
}

fn boot_main(config: &BootConfig) -> ! {
    let board = &MCU_BOARD_CONFIG;
    let p = embassy_stm32::init(Default::default());

    info!(
        "Bootloader {=u16:x} hw {=u32:x}, image at {=u32:x}",
        config.sw_version, config.hardware_id, config.program_start
    );

    // The OS image brings up the PLL; a bad table would only fault there
    if let Err(e) = STM32_ARCH_CONFIG.validate_with_usb(board.core_osc_freq) {
        warn!("Clock table rejected: {}", e.as_str());
    }

    let mut console = usart_config(&board.debug_uart_attr)
        .ok()
        .and_then(|cfg| usart::UartTx::new_blocking(p.USART3, p.PD8, cfg).ok())
        .map(|tx| Console::new(DebugUart::new(tx)));
    if let Some(console) = console.as_mut() {
        console.print(format_args!(
            "boot {:x}.{:02x} hw {:#x}\r\n",
            config.sw_version >> 8,
            config.sw_version & 0xff,
            config.hardware_id
        ));
    }

    // B1 (PC13) pulls high while pressed
    let button = Stm32Input(Input::new(p.PC13, Pull::Down));
    let request = button.is_high();

    let head = read_vector_head(config.program_start);
    match decide(request, head.check(config)) {
        BootDecision::Launch => {
            info!("Launching image at {=u32:x}", config.program_start);
            if let Some(console) = console.as_mut() {
                console.print(format_args!("launch {:#010x}\r\n", config.program_start));
            }
            // SAFETY: the vector table was checked above; the image owns the
            // core from here on
            unsafe { cortex_m::asm::bootload(config.program_start as *const u32) }
        }
        BootDecision::StayInBootloader(reason) => {
            let why = match reason {
                StayReason::Requested => "requested",
                StayReason::Image(e) => e.as_str(),
            };
            warn!("Staying in bootloader: {}", why);
            if let Some(console) = console.as_mut() {
                console.print(format_args!("stay: {}\r\n", why));
            }

            let mut led = Led::new(
                Stm32Output(Output::new(p.PB7, Level::Low, Speed::Low)),
                board.led_active_high(),
            );
            led.on();
            loop {
                cortex_m::asm::wfi();
            }
        }
    }
}

fn read_vector_head(base: u32) -> VectorHead {
    let table = base as *const u32;
    // SAFETY: `base` is an aligned address inside internal flash, which is
    // always readable
    unsafe {
        VectorHead::new(
            core::ptr::read_volatile(table),
            core::ptr::read_volatile(table.add(1)),
        )
    }
}
