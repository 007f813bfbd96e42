//! Board lifecycle events
//!
//! The executor reports a handful of lifecycle events to the board. Most are
//! informational; a fatal event is terminal and halts the processor in a
//! busy loop (fail-stop).

use core::fmt;

/// Numeric event tags as reported by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum EventTag {
    RootTaskInit = 1,
    RootFatal = 2,
    StartInit = 3,
    StartLink = 4,
    StartFilesystem = 5,
}

/// Tag value that does not name a board event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownEvent(pub u32);

impl TryFrom<u32> for EventTag {
    type Error = UnknownEvent;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EventTag::RootTaskInit),
            2 => Ok(EventTag::RootFatal),
            3 => Ok(EventTag::StartInit),
            4 => Ok(EventTag::StartLink),
            5 => Ok(EventTag::StartFilesystem),
            other => Err(UnknownEvent(other)),
        }
    }
}

/// A lifecycle event and its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardEvent<'a> {
    /// Root task is about to initialise
    RootTaskInit,
    /// Unrecoverable kernel fault, with an optional diagnostic
    RootFatal(Option<&'a str>),
    /// Start routine entered
    StartInit,
    /// Host link is up
    StartLink,
    /// Filesystems mounted; number of applications started
    StartFilesystem(Option<u32>),
}

impl BoardEvent<'_> {
    pub const fn tag(&self) -> EventTag {
        match self {
            BoardEvent::RootTaskInit => EventTag::RootTaskInit,
            BoardEvent::RootFatal(_) => EventTag::RootFatal,
            BoardEvent::StartInit => EventTag::StartInit,
            BoardEvent::StartLink => EventTag::StartLink,
            BoardEvent::StartFilesystem(_) => EventTag::StartFilesystem,
        }
    }
}

/// What the event handler may do to the board
pub trait BoardServices {
    /// Kernel debug output (always enabled)
    fn debug_write(&mut self, args: fmt::Arguments<'_>);

    /// User-level debug output
    fn user_write(&mut self, args: fmt::Arguments<'_>);

    /// Middle interrupt priority of the MCU
    fn irq_middle_prio(&self) -> u8;

    /// Start the LED startup sequence
    ///
    /// Called with the board lock held; implementations should hand the
    /// sequence off rather than wait in here.
    fn led_startup(&mut self);

    /// One iteration of the fail-stop loop
    fn spin(&mut self);
}

/// Dispatch a lifecycle event
///
/// Returns for every event except [`BoardEvent::RootFatal`], which never
/// returns.
pub fn handle_event<B: BoardServices + ?Sized>(board: &mut B, event: BoardEvent<'_>) {
    match event {
        BoardEvent::RootTaskInit => {}

        BoardEvent::RootFatal(message) => {
            match message {
                Some(message) => board.debug_write(format_args!("Fatal Error {}\n", message)),
                None => board.debug_write(format_args!("Fatal Error unknown\n")),
            }
            fail_stop(board)
        }

        BoardEvent::StartInit => {}

        BoardEvent::StartLink => {
            let prio = board.irq_middle_prio();
            board.user_write(format_args!("Start LED {}\n", prio));
            board.led_startup();
        }

        BoardEvent::StartFilesystem(apps) => match apps {
            Some(apps) => board.user_write(format_args!("Started {} apps\n", apps)),
            None => board.user_write(format_args!("Started unknown apps\n")),
        },
    }
}

/// Halt permanently
pub fn fail_stop<B: BoardServices + ?Sized>(board: &mut B) -> ! {
    loop {
        board.spin();
    }
}
