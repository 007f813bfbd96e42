//! Device directory
//!
//! The list of devices that show up under `/dev`. By default the MCU
//! peripherals are available plus the board's software fifos. Entries are
//! read in order until the terminator, the same way the device-directory
//! scanner walks the table.

use crate::config::board::{UartAttr, UartFlags, USB_RX_BUFFER_SIZE};
use crate::config::os::SOS_BOARD_STDIO_BUFFER_SIZE;
use crate::TableError;

/// Board fifo: channels and bytes per channel
pub const BOARD_FIFO_CHANNELS: usize = 4;
pub const BOARD_FIFO_SIZE: usize = 256;

/// Receive fifo behind `/dev/uart0`
pub const UART0_FIFO_SIZE: usize = 1024;

/// Trace events buffered behind `/dev/trace`
pub const TRACE_FIFO_FRAMES: usize = 32;

/// USB endpoint carrying the host link
pub const LINK_USB_ENDPOINT: u8 = 2;

/// Access permissions (octal, owner/group/other)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode(pub u16);

impl Mode {
    pub const RW_ALL: Mode = Mode(0o666);

    pub const fn is_world_writable(&self) -> bool {
        self.0 & 0o002 != 0
    }
}

/// Owner of a device node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Owner {
    Root,
    User,
}

/// Node type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileKind {
    Char,
    Block,
}

/// Driver bound to a device entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Driver {
    /// Frame fifo (fixed-size records)
    Ffifo,
    /// Multi-channel fifo
    Cfifo,
    Fifo,
    UsbFifo,
    Sys,
    McuCore,
    McuI2c,
    McuPio,
    McuSpi,
    McuTmr,
    UartFifo,
    McuMem,
    /// End-of-table marker
    Terminator,
}

impl Driver {
    /// True for drivers backed directly by an MCU peripheral
    pub const fn is_mcu_peripheral(&self) -> bool {
        matches!(
            self,
            Driver::McuCore
                | Driver::McuI2c
                | Driver::McuPio
                | Driver::McuSpi
                | Driver::McuTmr
                | Driver::McuMem
        )
    }
}

/// Driver-specific configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceConfig {
    None,
    Fifo { size: usize },
    CFifo { channels: usize, size: usize },
    Trace { frames: usize },
    UsbFifo { endpoint: u8, size: usize },
    UartFifo { port: u8, size: usize, attr: UartAttr },
}

/// One entry of the device directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device {
    pub name: &'static str,
    pub driver: Driver,
    /// Peripheral instance (0 = first)
    pub instance: u8,
    pub config: DeviceConfig,
    pub mode: Mode,
    pub owner: Owner,
    pub kind: FileKind,
}

impl Device {
    /// Root-owned 0666 character device without driver configuration
    pub const fn char(name: &'static str, driver: Driver, instance: u8) -> Self {
        Self {
            name,
            driver,
            instance,
            config: DeviceConfig::None,
            mode: Mode::RW_ALL,
            owner: Owner::Root,
            kind: FileKind::Char,
        }
    }

    pub const fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn block(mut self) -> Self {
        self.kind = FileKind::Block;
        self
    }

    pub const fn is_terminator(&self) -> bool {
        matches!(self.driver, Driver::Terminator)
    }
}

/// End-of-list marker recognised by the device-directory scanner
pub const DEVFS_TERMINATOR: Device = Device::char("", Driver::Terminator, 0);

/// Wiring of `/dev/uart0`: USART on PA2 (tx) / PA3 (rx), 8N1 at 115200
pub const UART0_ATTR: UartAttr = UartAttr::new(
    UartFlags::SET_LINE_CODING_DEFAULT,
    8,
    115_200,
    (0, 2),
    (0, 3),
    (0xff, 0xff),
    (0xff, 0xff),
);

/// Everything under `/dev`
pub static DEVFS_LIST: [Device; 34] = [
    // System devices
    Device::char("trace", Driver::Ffifo, 0).with_config(DeviceConfig::Trace {
        frames: TRACE_FIFO_FRAMES,
    }),
    Device::char("fifo", Driver::Cfifo, 0).with_config(DeviceConfig::CFifo {
        channels: BOARD_FIFO_CHANNELS,
        size: BOARD_FIFO_SIZE,
    }),
    Device::char("stdio-out", Driver::Fifo, 0).with_config(DeviceConfig::Fifo {
        size: SOS_BOARD_STDIO_BUFFER_SIZE,
    }),
    Device::char("stdio-in", Driver::Fifo, 0).with_config(DeviceConfig::Fifo {
        size: SOS_BOARD_STDIO_BUFFER_SIZE,
    }),
    Device::char("link-phy-usb", Driver::UsbFifo, 0).with_config(DeviceConfig::UsbFifo {
        endpoint: LINK_USB_ENDPOINT,
        size: USB_RX_BUFFER_SIZE,
    }),
    Device::char("sys", Driver::Sys, 0),
    // MCU peripherals
    Device::char("core", Driver::McuCore, 0),
    Device::char("core0", Driver::McuCore, 0),
    Device::char("i2c0", Driver::McuI2c, 0),
    Device::char("i2c1", Driver::McuI2c, 1),
    Device::char("i2c2", Driver::McuI2c, 2),
    Device::char("i2c3", Driver::McuI2c, 3),
    Device::char("pio0", Driver::McuPio, 0), // GPIOA
    Device::char("pio1", Driver::McuPio, 1), // GPIOB
    Device::char("pio2", Driver::McuPio, 2), // GPIOC
    Device::char("pio3", Driver::McuPio, 3), // GPIOD
    Device::char("pio4", Driver::McuPio, 4), // GPIOE
    Device::char("pio5", Driver::McuPio, 5), // GPIOF
    Device::char("pio6", Driver::McuPio, 6), // GPIOG
    Device::char("pio7", Driver::McuPio, 7), // GPIOH
    Device::char("spi0", Driver::McuSpi, 0),
    Device::char("spi1", Driver::McuSpi, 1),
    Device::char("spi2", Driver::McuSpi, 2),
    Device::char("spi3", Driver::McuSpi, 3),
    Device::char("tmr0", Driver::McuTmr, 0), // TIM1
    Device::char("tmr1", Driver::McuTmr, 1), // TIM2
    Device::char("tmr2", Driver::McuTmr, 2),
    Device::char("tmr3", Driver::McuTmr, 3),
    Device::char("tmr4", Driver::McuTmr, 4),
    Device::char("tmr5", Driver::McuTmr, 5),
    Device::char("tmr6", Driver::McuTmr, 6),
    Device::char("tmr7", Driver::McuTmr, 7), // TIM8
    Device::char("uart0", Driver::UartFifo, 0).with_config(DeviceConfig::UartFifo {
        port: 0,
        size: UART0_FIFO_SIZE,
        attr: UART0_ATTR,
    }),
    DEVFS_TERMINATOR,
];

/// Internal memory, mounted as the application filesystem
pub static MEM0: Device = Device::char("mem0", Driver::McuMem, 0).block();

/// Read-only view of a terminated device list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceTable {
    entries: &'static [Device],
}

impl DeviceTable {
    pub const fn new(entries: &'static [Device]) -> Self {
        Self { entries }
    }

    /// Raw entries, terminator included
    pub const fn entries(&self) -> &'static [Device] {
        self.entries
    }

    /// Devices up to (not including) the first terminator
    pub fn iter(&self) -> impl Iterator<Item = &'static Device> {
        self.entries.iter().take_while(|d| !d.is_terminator())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, name: &str) -> Option<&'static Device> {
        self.iter().find(|d| d.name == name)
    }

    /// Check the structural contract of the table
    ///
    /// The terminator must appear exactly once, as the final entry, and
    /// device names must be non-empty and pairwise distinct.
    pub fn validate(&self) -> Result<(), TableError> {
        let last = match self.entries.len().checked_sub(1) {
            Some(last) => last,
            None => return Err(TableError::MissingTerminator),
        };

        for (i, device) in self.entries.iter().enumerate() {
            if device.is_terminator() {
                if i != last {
                    return Err(TableError::EarlyTerminator(i));
                }
                continue;
            }
            if device.name.is_empty() {
                return Err(TableError::EmptyName(i));
            }
            if let Some(j) = self.entries[..i].iter().position(|d| d.name == device.name) {
                return Err(TableError::DuplicateName(j, i));
            }
        }

        if !self.entries[last].is_terminator() {
            return Err(TableError::MissingTerminator);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_table_is_valid() {
        assert_eq!(DeviceTable::new(&DEVFS_LIST).validate(), Ok(()));
    }

    #[test]
    fn test_terminator_once_and_last() {
        let terminators: Vec<usize> = DEVFS_LIST
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_terminator())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(terminators, vec![DEVFS_LIST.len() - 1]);
    }

    #[test]
    fn test_names_are_unique() {
        let table = DeviceTable::new(&DEVFS_LIST);
        let mut names: Vec<&str> = table.iter().map(|d| d.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 33);
    }

    #[test]
    fn test_table_order() {
        let names: Vec<&str> = DeviceTable::new(&DEVFS_LIST).iter().map(|d| d.name).collect();
        let expected = [
            "trace", "fifo", "stdio-out", "stdio-in", "link-phy-usb", "sys",
            "core", "core0",
            "i2c0", "i2c1", "i2c2", "i2c3",
            "pio0", "pio1", "pio2", "pio3", "pio4", "pio5", "pio6", "pio7",
            "spi0", "spi1", "spi2", "spi3",
            "tmr0", "tmr1", "tmr2", "tmr3", "tmr4", "tmr5", "tmr6", "tmr7",
            "uart0",
        ];
        assert_eq!(names, expected);
        assert!(DEVFS_LIST[expected.len()].is_terminator());
    }

    #[test]
    fn test_find_device() {
        let table = DeviceTable::new(&DEVFS_LIST);
        let tmr1 = table.find("tmr1").unwrap();
        assert_eq!(tmr1.driver, Driver::McuTmr);
        assert_eq!(tmr1.instance, 1);
        assert!(table.find("").is_none());
        assert!(table.find("uart1").is_none());
    }

    #[test]
    fn test_all_devices_rw_root_char() {
        for device in DeviceTable::new(&DEVFS_LIST).iter() {
            assert_eq!(device.mode, Mode::RW_ALL);
            assert!(device.mode.is_world_writable());
            assert_eq!(device.owner, Owner::Root);
            assert_eq!(device.kind, FileKind::Char);
        }
        assert_eq!(MEM0.kind, FileKind::Block);
        assert!(MEM0.driver.is_mcu_peripheral());
    }

    #[test]
    fn test_fifo_sizes() {
        let table = DeviceTable::new(&DEVFS_LIST);
        assert_eq!(
            table.find("stdio-in").unwrap().config,
            DeviceConfig::Fifo { size: 512 }
        );
        assert_eq!(
            table.find("fifo").unwrap().config,
            DeviceConfig::CFifo {
                channels: 4,
                size: 256
            }
        );
        match table.find("uart0").unwrap().config {
            DeviceConfig::UartFifo { size, attr, .. } => {
                assert_eq!(size, 1024);
                assert_eq!(attr.freq, 115_200);
            }
            other => panic!("unexpected uart0 config {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_terminator() {
        static NO_END: [Device; 1] = [Device::char("a", Driver::Fifo, 0)];
        static EMPTY: [Device; 0] = [];
        assert_eq!(
            DeviceTable::new(&NO_END).validate(),
            Err(TableError::MissingTerminator)
        );
        assert_eq!(
            DeviceTable::new(&EMPTY).validate(),
            Err(TableError::MissingTerminator)
        );
    }

    #[test]
    fn test_rejects_early_terminator() {
        static EARLY: [Device; 3] = [
            Device::char("a", Driver::Fifo, 0),
            DEVFS_TERMINATOR,
            Device::char("b", Driver::Fifo, 0),
        ];
        let table = DeviceTable::new(&EARLY);
        assert_eq!(table.validate(), Err(TableError::EarlyTerminator(1)));
        // the scanner never sees entries past the first terminator
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        static DUP: [Device; 4] = [
            Device::char("a", Driver::Fifo, 0),
            Device::char("b", Driver::Fifo, 0),
            Device::char("a", Driver::Sys, 0),
            DEVFS_TERMINATOR,
        ];
        assert_eq!(
            DeviceTable::new(&DUP).validate(),
            Err(TableError::DuplicateName(0, 2))
        );
    }

    #[test]
    fn test_rejects_empty_name() {
        static NAMELESS: [Device; 2] = [Device::char("", Driver::Fifo, 0), DEVFS_TERMINATOR];
        assert_eq!(
            DeviceTable::new(&NAMELESS).validate(),
            Err(TableError::EmptyName(0))
        );
    }
}
