//! Bootloader configuration
//!
//! Memory map, bootloader parameters and the checks the bootloader runs on
//! the application image before handing control to it. The bootloader
//! shares [`MCU_BOARD_CONFIG`](crate::config::MCU_BOARD_CONFIG) with the OS
//! image and does not need the OS configuration.

use crate::config::os::LinkTransport;

/// Internal flash (2 MB, dual bank)
pub const FLASH_START: u32 = 0x0800_0000;
pub const FLASH_SIZE: u32 = 2 * 1024 * 1024;

/// Bootloader: sectors 0-3 (4 × 16 KB)
pub const BOOTLOADER_START: u32 = FLASH_START;
pub const BOOTLOADER_SIZE: u32 = 64 * 1024;

/// OS image: rest of bank 1
pub const KERNEL_START: u32 = BOOTLOADER_START + BOOTLOADER_SIZE;
pub const KERNEL_SIZE: u32 = 1024 * 1024 - BOOTLOADER_SIZE;

/// Application storage behind `/app` (`mem0`): bank 2
pub const APPFS_START: u32 = FLASH_START + 1024 * 1024;
pub const APPFS_SIZE: u32 = 1024 * 1024;

/// Contiguous SRAM1/SRAM2/SRAM3 (CCM excluded)
pub const SRAM_START: u32 = 0x2000_0000;
pub const SRAM_SIZE: u32 = 192 * 1024;

const _: () = assert!(APPFS_START + APPFS_SIZE == FLASH_START + FLASH_SIZE);
const _: () = assert!(KERNEL_START + KERNEL_SIZE == APPFS_START);

/// Bootloader software version (BCD major.minor)
pub const BOOT_SW_VERSION: u16 = 0x0005;

/// Hardware identifier reported to the host
pub const BOOT_HARDWARE_ID: u32 = 0x0000_0429;

/// Parameters of the bootloader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootConfig {
    pub sw_version: u16,
    /// Address of the image the bootloader launches
    pub program_start: u32,
    /// Size of the image region
    pub program_size: u32,
    pub hardware_id: u32,
    pub link_transport: LinkTransport,
}

pub const BOOT_BOARD_CONFIG: BootConfig = BootConfig {
    sw_version: BOOT_SW_VERSION,
    program_start: KERNEL_START,
    program_size: KERNEL_SIZE,
    hardware_id: BOOT_HARDWARE_ID,
    link_transport: LinkTransport::Usb,
};

impl BootConfig {
    pub const fn program_end(&self) -> u32 {
        self.program_start + self.program_size
    }

    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.program_start && addr < self.program_end()
    }
}

/// Reasons an application image cannot be launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Flash is erased at the vector table
    Erased,
    /// Initial stack pointer outside SRAM or misaligned
    BadStackPointer(u32),
    /// Reset vector outside the image or not a Thumb address
    BadResetVector(u32),
}

impl ImageError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageError::Erased => "no image",
            ImageError::BadStackPointer(_) => "bad initial stack pointer",
            ImageError::BadResetVector(_) => "bad reset vector",
        }
    }
}

/// First two words of a Cortex-M vector table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VectorHead {
    pub initial_sp: u32,
    pub reset: u32,
}

impl VectorHead {
    pub const fn new(initial_sp: u32, reset: u32) -> Self {
        Self { initial_sp, reset }
    }

    /// Check that the vector table looks like a launchable image
    pub fn check(&self, config: &BootConfig) -> Result<(), ImageError> {
        if self.initial_sp == u32::MAX && self.reset == u32::MAX {
            return Err(ImageError::Erased);
        }

        // The stack pointer may sit one past the end of SRAM (full descending stack)
        let sp_ok = self.initial_sp > SRAM_START
            && self.initial_sp <= SRAM_START + SRAM_SIZE
            && self.initial_sp % 4 == 0;
        if !sp_ok {
            return Err(ImageError::BadStackPointer(self.initial_sp));
        }

        let thumb = self.reset & 1 == 1;
        if !thumb || !config.contains(self.reset & !1) {
            return Err(ImageError::BadResetVector(self.reset));
        }

        Ok(())
    }
}

/// Why the bootloader keeps control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StayReason {
    /// The request pin was held at reset
    Requested,
    /// The image failed its check
    Image(ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootDecision {
    /// Jump to the image at `program_start`
    Launch,
    StayInBootloader(StayReason),
}

/// Decide whether to launch the image
///
/// An explicit request wins over a valid image.
pub fn decide(request_held: bool, image: Result<(), ImageError>) -> BootDecision {
    if request_held {
        return BootDecision::StayInBootloader(StayReason::Requested);
    }
    match image {
        Ok(()) => BootDecision::Launch,
        Err(e) => BootDecision::StayInBootloader(StayReason::Image(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: VectorHead = VectorHead::new(SRAM_START + SRAM_SIZE, KERNEL_START + 0x1c1);

    #[test]
    fn test_memory_map() {
        assert_eq!(BOOT_BOARD_CONFIG.program_start, 0x0801_0000);
        assert_eq!(APPFS_START, 0x0810_0000);
        assert!(!BOOT_BOARD_CONFIG.contains(BOOTLOADER_START));
        assert!(!BOOT_BOARD_CONFIG.contains(APPFS_START));
    }

    #[test]
    fn test_valid_image() {
        assert_eq!(GOOD.check(&BOOT_BOARD_CONFIG), Ok(()));
    }

    #[test]
    fn test_erased_flash() {
        let erased = VectorHead::new(u32::MAX, u32::MAX);
        assert_eq!(erased.check(&BOOT_BOARD_CONFIG), Err(ImageError::Erased));
    }

    #[test]
    fn test_bad_stack_pointer() {
        for sp in [0, SRAM_START, SRAM_START + SRAM_SIZE + 4, SRAM_START + 0x102] {
            let image = VectorHead { initial_sp: sp, ..GOOD };
            assert_eq!(
                image.check(&BOOT_BOARD_CONFIG),
                Err(ImageError::BadStackPointer(sp))
            );
        }
    }

    #[test]
    fn test_bad_reset_vector() {
        // ARM (non-Thumb) address
        let image = VectorHead { reset: KERNEL_START + 0x1c0, ..GOOD };
        assert!(matches!(
            image.check(&BOOT_BOARD_CONFIG),
            Err(ImageError::BadResetVector(_))
        ));

        // points back into the bootloader
        let image = VectorHead { reset: BOOTLOADER_START + 0x101, ..GOOD };
        assert!(matches!(
            image.check(&BOOT_BOARD_CONFIG),
            Err(ImageError::BadResetVector(_))
        ));
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(false, Ok(())), BootDecision::Launch);
        assert_eq!(
            decide(true, Ok(())),
            BootDecision::StayInBootloader(StayReason::Requested)
        );
        assert_eq!(
            decide(false, Err(ImageError::Erased)),
            BootDecision::StayInBootloader(StayReason::Image(ImageError::Erased))
        );
    }
}
