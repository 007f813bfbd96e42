//! Root filesystem mount table
//!
//! Defines the process-wide namespace: application storage, the device
//! directory and the root filesystem. Lookups take the first mount in
//! table order whose path prefixes the request, so the root mount has to
//! be last or it would shadow everything after it.

use crate::devfs::{Device, DeviceTable, DEVFS_LIST, MEM0};
use crate::TableError;

pub const APPFS_MOUNT_PATH: &str = "/app";
pub const DEVFS_MOUNT_PATH: &str = "/dev";
pub const ROOT_MOUNT_PATH: &str = "/";

/// Access allowed through a mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    All,
}

/// What a mount point is backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountBacking {
    /// Application filesystem on a block device
    App(&'static Device),
    /// Device directory over a device table
    Devfs(DeviceTable),
    /// Root filesystem listing the other mounts
    Root,
    /// End-of-list marker
    Terminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mount {
    pub path: &'static str,
    pub backing: MountBacking,
    pub access: Access,
}

impl Mount {
    pub const fn new(path: &'static str, backing: MountBacking, access: Access) -> Self {
        Self {
            path,
            backing,
            access,
        }
    }

    pub const fn is_terminator(&self) -> bool {
        matches!(self.backing, MountBacking::Terminator)
    }

    pub const fn is_root(&self) -> bool {
        matches!(self.backing, MountBacking::Root)
    }

    pub const fn is_writable(&self) -> bool {
        matches!(self.access, Access::All)
    }

    /// If this mount covers `path`, return the path relative to the mount
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.path == ROOT_MOUNT_PATH {
            return path.strip_prefix('/');
        }
        let rest = path.strip_prefix(self.path)?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

pub const SYSFS_TERMINATOR: Mount = Mount::new("", MountBacking::Terminator, Access::ReadOnly);

/// The board's mount table; the root filesystem must be last
pub static SYSFS_LIST: [Mount; 4] = [
    // ram/flash applications
    Mount::new(APPFS_MOUNT_PATH, MountBacking::App(&MEM0), Access::All),
    Mount::new(
        DEVFS_MOUNT_PATH,
        MountBacking::Devfs(DeviceTable::new(&DEVFS_LIST)),
        Access::ReadOnly,
    ),
    Mount::new(ROOT_MOUNT_PATH, MountBacking::Root, Access::ReadOnly),
    SYSFS_TERMINATOR,
];

/// Read-only view of a terminated mount list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MountTable {
    entries: &'static [Mount],
}

impl MountTable {
    pub const fn new(entries: &'static [Mount]) -> Self {
        Self { entries }
    }

    /// Mounts up to (not including) the first terminator
    pub fn iter(&self) -> impl Iterator<Item = &'static Mount> {
        self.entries.iter().take_while(|m| !m.is_terminator())
    }

    pub fn root(&self) -> Option<&'static Mount> {
        self.iter().find(|m| m.is_root())
    }

    /// The device directory mounted in this table, if any
    pub fn devfs(&self) -> Option<DeviceTable> {
        self.iter().find_map(|m| match m.backing {
            MountBacking::Devfs(table) => Some(table),
            _ => None,
        })
    }

    /// Find the mount serving `path` and the remainder relative to it
    pub fn resolve<'p>(&self, path: &'p str) -> Option<(&'static Mount, &'p str)> {
        if !path.starts_with('/') {
            return None;
        }
        self.iter()
            .find_map(|mount| mount.strip(path).map(|rest| (mount, rest)))
    }

    /// Resolve a `/dev/<name>` style path to its device entry
    pub fn lookup_device(&self, path: &str) -> Option<&'static Device> {
        match self.resolve(path)? {
            (
                Mount {
                    backing: MountBacking::Devfs(table),
                    ..
                },
                name,
            ) if !name.is_empty() && !name.contains('/') => table.find(name),
            _ => None,
        }
    }

    /// Check the structural contract of the table
    ///
    /// The terminator must appear exactly once as the final entry, the
    /// last mount before it must be the root filesystem, paths must be
    /// absolute and unique, and any device directory must itself be valid.
    pub fn validate(&self) -> Result<(), TableError> {
        let last = match self.entries.len().checked_sub(1) {
            Some(last) => last,
            None => return Err(TableError::MissingTerminator),
        };

        for (i, mount) in self.entries.iter().enumerate() {
            if mount.is_terminator() {
                if i != last {
                    return Err(TableError::EarlyTerminator(i));
                }
                continue;
            }
            if mount.path.is_empty() {
                return Err(TableError::EmptyName(i));
            }
            if !mount.path.starts_with('/') {
                return Err(TableError::RelativePath(i));
            }
            if let Some(j) = self.entries[..i].iter().position(|m| m.path == mount.path) {
                return Err(TableError::DuplicateName(j, i));
            }
            if let MountBacking::Devfs(table) = mount.backing {
                table.validate()?;
            }
        }

        if !self.entries[last].is_terminator() {
            return Err(TableError::MissingTerminator);
        }
        match self.iter().last() {
            Some(mount) if mount.is_root() => Ok(()),
            _ => Err(TableError::RootNotLast),
        }
    }
}
