//! Board services for the event handler
//!
//! The console and LED are installed once in `main` and shared behind a
//! critical-section mutex, so any task can raise a board event.

use core::cell::RefCell;
use core::fmt;

use defmt::{error, info, Display2Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use nucleo429_core::{handle_event, BoardEvent, BoardServices};
use nucleo429_hal::{Console, Led};
use nucleo429_hal_stm32f4::{DebugUart, Stm32Output, IRQ_MIDDLE_PRIO};

/// Wakes [`crate::tasks::led_task`] to run the startup sequence
pub static LED_STARTUP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub struct NucleoBoard {
    console: Console<DebugUart<'static>>,
    led: Led<Stm32Output<'static>>,
}

impl NucleoBoard {
    pub fn new(console: Console<DebugUart<'static>>, led: Led<Stm32Output<'static>>) -> Self {
        Self { console, led }
    }
}

impl BoardServices for NucleoBoard {
    fn debug_write(&mut self, args: fmt::Arguments<'_>) {
        self.console.print(args);
        error!("{}", Display2Format(&args));
    }

    fn user_write(&mut self, args: fmt::Arguments<'_>) {
        self.console.print(args);
        info!("{}", Display2Format(&args));
    }

    fn irq_middle_prio(&self) -> u8 {
        IRQ_MIDDLE_PRIO
    }

    fn led_startup(&mut self) {
        // The sequence itself runs in led_task, outside the board lock
        LED_STARTUP.signal(());
    }

    fn spin(&mut self) {
        cortex_m::asm::nop();
    }
}

/// Stand-in used before the console exists; output goes to defmt only
struct Headless;

impl BoardServices for Headless {
    fn debug_write(&mut self, args: fmt::Arguments<'_>) {
        error!("{}", Display2Format(&args));
    }

    fn user_write(&mut self, args: fmt::Arguments<'_>) {
        info!("{}", Display2Format(&args));
    }

    fn irq_middle_prio(&self) -> u8 {
        IRQ_MIDDLE_PRIO
    }

    fn led_startup(&mut self) {}

    fn spin(&mut self) {
        cortex_m::asm::nop();
    }
}

static BOARD: Mutex<CriticalSectionRawMutex, RefCell<Option<NucleoBoard>>> =
    Mutex::new(RefCell::new(None));

/// Make `board` the target of [`emit`]
pub fn install(board: NucleoBoard) {
    BOARD.lock(|cell| {
        cell.replace(Some(board));
    });
}

/// Run `f` on the board LED; `None` before [`install`]
pub fn with_led<R>(f: impl FnOnce(&mut Led<Stm32Output<'static>>) -> R) -> Option<R> {
    BOARD.lock(|cell| cell.borrow_mut().as_mut().map(|board| f(&mut board.led)))
}

/// Raise a board event
///
/// A fatal event does not return; it holds the critical section, which
/// stops every other task along with it.
pub fn emit(event: BoardEvent<'_>) {
    BOARD.lock(|cell| match cell.borrow_mut().as_mut() {
        Some(board) => handle_event(board, event),
        None => handle_event(&mut Headless, event),
    });
}

/// Raise a fatal event
pub fn fatal(message: &str) -> ! {
    emit(BoardEvent::RootFatal(Some(message)));
    // handle_event never returns from a fatal event
    loop {
        cortex_m::asm::nop();
    }
}
