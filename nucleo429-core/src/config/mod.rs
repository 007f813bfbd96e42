//! Configuration types
//!
//! Board-level configuration blocks, each declared once as a constant and
//! consumed read-only by the images.

pub mod board;
pub mod clock;
pub mod os;

pub use board::*;
pub use clock::*;
pub use os::*;
