//! Embassy async tasks
//!
//! Each task serves one device of the board and talks to the others
//! through the fifos in [`crate::channels`].

pub mod led;
pub mod stdio_app;
pub mod trace;
pub mod uart0;
pub mod usb_link;

pub use led::led_task;
pub use stdio_app::stdio_app_task;
pub use trace::trace_task;
pub use uart0::uart0_task;
pub use usb_link::{usb_device_task, usb_link_task, UsbDriver};
