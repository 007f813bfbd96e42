//! LED startup sequence

use defmt::*;
use embassy_time::Timer;

use nucleo429_hal::LedStartup;

use crate::board::{self, LED_STARTUP};

/// LED toggles in the startup sequence
const LED_STARTUP_TOGGLES: u32 = 8;

/// Time between toggles
const LED_STARTUP_STEP_MS: u64 = 50;

/// Runs the sequence each time the board handler asks for it
///
/// The board lock is only taken for a single toggle, so USB and the time
/// driver keep running during the sequence.
#[embassy_executor::task]
pub async fn led_task() {
    loop {
        LED_STARTUP.wait().await;
        debug!("LED startup sequence");

        let mut sequence = LedStartup::new(LED_STARTUP_TOGGLES);
        while board::with_led(|led| sequence.step(led)).unwrap_or(false) {
            Timer::after_millis(LED_STARTUP_STEP_MS).await;
        }
    }
}
