//! Board data for the Nucleo-F429ZI
//!
//! Everything the executor, drivers and bootloader need to know about this
//! board, expressed as `const`/`static` tables that never change at runtime:
//!
//! - Clock tree (PLL and bus prescalers) with limit checks
//! - MCU board wiring (debug UART, LED, USB receive buffer)
//! - OS sizing and identity (task table, stdio paths, system strings)
//! - Device directory (`/dev`) and mount table
//! - Bootloader parameters and application image checks
//! - The board lifecycle event handler
//! - Trace records for `/dev/trace`
//!
//! Nothing here touches hardware, so the whole crate is tested on the host.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod config;
pub mod devfs;
pub mod event;
pub mod sysfs;
pub mod trace;

pub use devfs::{Device, DeviceTable, DEVFS_LIST};
pub use event::{handle_event, BoardEvent, BoardServices};
pub use sysfs::{Mount, MountTable, SYSFS_LIST};
pub use trace::{TraceEvent, TraceKind};

/// Error raised when a static table breaks its structural contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// No terminator entry found
    MissingTerminator,
    /// Terminator found before the end of the table (index)
    EarlyTerminator(usize),
    /// An entry has an empty name (index)
    EmptyName(usize),
    /// Two entries share a name (first index, second index)
    DuplicateName(usize, usize),
    /// A mount path is not absolute (index)
    RelativePath(usize),
    /// The last mount is not the root filesystem
    RootNotLast,
    /// A configured path does not name a device
    UnknownDevice,
}

impl TableError {
    /// Short human readable description for console output
    pub fn as_str(&self) -> &'static str {
        match self {
            TableError::MissingTerminator => "table has no terminator",
            TableError::EarlyTerminator(_) => "terminator before end of table",
            TableError::EmptyName(_) => "entry with empty name",
            TableError::DuplicateName(_, _) => "duplicate entry name",
            TableError::RelativePath(_) => "mount path is not absolute",
            TableError::RootNotLast => "root mount is not last",
            TableError::UnknownDevice => "path does not name a device",
        }
    }
}
