//! OS configuration
//!
//! Task-table sizing, standard I/O device paths, system identity and the
//! start routine handed to the executor.

use heapless::Vec;

use crate::devfs::DeviceTable;
use crate::sysfs::DEVFS_MOUNT_PATH;
use crate::TableError;

/// Total number of tasks for the entire system
pub const SOS_BOARD_TASK_TOTAL: usize = 10;

/// Memory reserved for the system
pub const SOS_BOARD_SYSTEM_MEMORY_SIZE: u32 = 8192 * 3;

pub const SOS_BOARD_NAME: &str = "Nucleo-F429ZI";
pub const SOS_BOARD_VERSION: &str = "0.5";
pub const SOS_BOARD_ID: &str = "-L6TkvdQalXZTxgM_74-";

/// Stack given to the start routine
pub const SOS_DEFAULT_START_STACK_SIZE: u32 = 2048;

/// Size of each standard I/O fifo
pub const SOS_BOARD_STDIO_BUFFER_SIZE: usize = 512;

/// System flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SysFlags(pub u32);

impl SysFlags {
    /// Standard I/O goes through fifo devices
    pub const IS_STDIO_FIFO: SysFlags = SysFlags(1 << 0);
    /// Trace events are enabled
    pub const IS_TRACE: SysFlags = SysFlags(1 << 1);

    pub const fn contains(&self, other: SysFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: SysFlags) -> SysFlags {
        SysFlags(self.0 | other.0)
    }
}

/// Routine the executor starts once the board is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartEntry {
    /// Serve the host link and launch applications
    DefaultThread,
}

/// Physical transport of the host link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkTransport {
    /// USB CDC-ACM on OTG FS, exposed as `/dev/link-phy-usb`
    Usb,
    /// Debug UART
    Uart,
}

/// OS-level board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OsConfig {
    /// Timer used for the microsecond clock (1 = TIM2, 32 bit)
    pub clk_usecond_tmr: u8,
    pub task_total: usize,
    pub stdin_dev: &'static str,
    pub stdout_dev: &'static str,
    pub stderr_dev: &'static str,
    pub sys_flags: SysFlags,
    pub sys_name: &'static str,
    pub sys_version: &'static str,
    pub sys_id: &'static str,
    pub sys_memory_size: u32,
    pub start: StartEntry,
    pub start_args: LinkTransport,
    pub start_stack_size: u32,
    pub trace_dev: &'static str,
}

pub const SOS_BOARD_CONFIG: OsConfig = OsConfig {
    clk_usecond_tmr: 1,
    task_total: SOS_BOARD_TASK_TOTAL,
    stdin_dev: "/dev/stdio-in",
    stdout_dev: "/dev/stdio-out",
    stderr_dev: "/dev/stdio-out",
    sys_flags: SysFlags::IS_STDIO_FIFO.union(SysFlags::IS_TRACE),
    sys_name: SOS_BOARD_NAME,
    sys_version: SOS_BOARD_VERSION,
    sys_id: SOS_BOARD_ID,
    sys_memory_size: SOS_BOARD_SYSTEM_MEMORY_SIZE,
    start: StartEntry::DefaultThread,
    start_args: LinkTransport::Usb,
    start_stack_size: SOS_DEFAULT_START_STACK_SIZE,
    trace_dev: "/dev/trace",
};

impl OsConfig {
    /// Check that every configured device path names an entry in `devices`
    pub fn validate(&self, devices: &DeviceTable) -> Result<(), TableError> {
        let mut paths = [self.stdin_dev, self.stdout_dev, self.stderr_dev, ""];
        if self.sys_flags.contains(SysFlags::IS_TRACE) {
            paths[3] = self.trace_dev;
        }

        for path in paths.iter().filter(|p| !p.is_empty()) {
            let name = device_name(path).ok_or(TableError::UnknownDevice)?;
            devices.find(name).ok_or(TableError::UnknownDevice)?;
        }
        Ok(())
    }
}

/// Strip the device directory prefix from a `/dev/<name>` path
pub fn device_name(path: &str) -> Option<&str> {
    let name = path.strip_prefix(DEVFS_MOUNT_PATH)?.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') {
        None
    } else {
        Some(name)
    }
}

/// What a task-table slot is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskKind {
    /// Board service (link, trace, device fifos)
    System,
    /// User-facing application
    App,
}

/// Task table is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskTableFull;

/// Handle to a registered task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskSlot {
    pub name: &'static str,
    pub kind: TaskKind,
}

/// Fixed-capacity record of the tasks started on the executor
///
/// Capacity is the OS task total; registering past it fails instead of
/// growing.
#[derive(Debug, Default)]
pub struct TaskTable<const N: usize> {
    slots: Vec<TaskSlot, N>,
}

impl<const N: usize> TaskTable<N> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn register(&mut self, name: &'static str, kind: TaskKind) -> Result<TaskId, TaskTableFull> {
        let id = TaskId(self.slots.len() as u8);
        self.slots
            .push(TaskSlot { name, kind })
            .map_err(|_| TaskTableFull)?;
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskSlot> {
        self.slots.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of application tasks started
    pub fn app_count(&self) -> u32 {
        self.slots.iter().filter(|s| s.kind == TaskKind::App).count() as u32
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSlot> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devfs::{Device, DEVFS_LIST, DEVFS_TERMINATOR};

    #[test]
    fn test_identity() {
        assert_eq!(SOS_BOARD_CONFIG.sys_name, "Nucleo-F429ZI");
        assert_eq!(SOS_BOARD_CONFIG.sys_version, "0.5");
        assert_eq!(SOS_BOARD_CONFIG.sys_id, "-L6TkvdQalXZTxgM_74-");
        assert_eq!(SOS_BOARD_CONFIG.sys_memory_size, 24576);
        assert_eq!(SOS_BOARD_CONFIG.task_total, 10);
    }

    #[test]
    fn test_sys_flags() {
        let flags = SOS_BOARD_CONFIG.sys_flags;
        assert!(flags.contains(SysFlags::IS_STDIO_FIFO));
        assert!(flags.contains(SysFlags::IS_TRACE));
    }

    #[test]
    fn test_device_name() {
        assert_eq!(device_name("/dev/stdio-in"), Some("stdio-in"));
        assert_eq!(device_name("/dev/"), None);
        assert_eq!(device_name("/device"), None);
        assert_eq!(device_name("/app/flash"), None);
        assert_eq!(device_name("/dev/a/b"), None);
    }

    #[test]
    fn test_paths_resolve_to_devices() {
        let devices = DeviceTable::new(&DEVFS_LIST);
        assert_eq!(SOS_BOARD_CONFIG.validate(&devices), Ok(()));
    }

    #[test]
    fn test_missing_trace_device() {
        static ONLY_STDIO: [Device; 3] = [
            Device::char("stdio-in", crate::devfs::Driver::Fifo, 0),
            Device::char("stdio-out", crate::devfs::Driver::Fifo, 0),
            DEVFS_TERMINATOR,
        ];
        let devices = DeviceTable::new(&ONLY_STDIO);
        assert_eq!(
            SOS_BOARD_CONFIG.validate(&devices),
            Err(TableError::UnknownDevice)
        );

        let no_trace = OsConfig {
            sys_flags: SysFlags::IS_STDIO_FIFO,
            ..SOS_BOARD_CONFIG
        };
        assert_eq!(no_trace.validate(&devices), Ok(()));
    }

    #[test]
    fn test_task_table_capacity() {
        let mut table: TaskTable<SOS_BOARD_TASK_TOTAL> = TaskTable::new();
        for _ in 0..SOS_BOARD_TASK_TOTAL {
            assert!(table.register("task", TaskKind::System).is_ok());
        }
        assert_eq!(table.len(), table.capacity());
        assert_eq!(table.register("extra", TaskKind::App), Err(TaskTableFull));
    }

    #[test]
    fn test_task_table_counts_apps() {
        let mut table: TaskTable<4> = TaskTable::new();
        assert!(table.is_empty());
        table.register("usb_link", TaskKind::System).unwrap();
        let id = table.register("stdio_app", TaskKind::App).unwrap();
        assert_eq!(table.app_count(), 1);
        assert_eq!(table.get(id).map(|s| s.name), Some("stdio_app"));
        assert_eq!(table.iter().count(), 2);
    }
}
