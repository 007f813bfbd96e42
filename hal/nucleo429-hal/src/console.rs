//! Text console over a blocking UART
//!
//! Formatting goes through `core::fmt::Write`, so diagnostics can be
//! produced with `write!` without an allocator.

use core::fmt;

use crate::uart::UartTx;

/// `core::fmt::Write` adapter over a [`UartTx`]
pub struct Console<T: UartTx> {
    tx: T,
    errors: u32,
}

impl<T: UartTx> Console<T> {
    pub fn new(tx: T) -> Self {
        Self { tx, errors: 0 }
    }

    /// Write formatted text, swallowing transmit errors
    ///
    /// Console output is best effort; failures are counted instead of
    /// propagated so that fatal paths never stall on the console.
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        if fmt::write(self, args).is_err() {
            self.errors = self.errors.saturating_add(1);
        }
        if self.tx.flush().is_err() {
            self.errors = self.errors.saturating_add(1);
        }
    }

    /// Number of failed writes since creation
    pub fn error_count(&self) -> u32 {
        self.errors
    }

    pub fn into_inner(self) -> T {
        self.tx
    }
}

impl<T: UartTx> fmt::Write for Console<T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.write_blocking(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockTx {
        out: heapless::Vec<u8, 64>,
        fail: bool,
    }

    impl UartTx for MockTx {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.out.extend_from_slice(data).map_err(|_| ())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    #[test]
    fn test_print_formats() {
        let mut console = Console::new(MockTx::default());
        console.print(format_args!("Started {} apps\n", 3));
        assert_eq!(console.error_count(), 0);
        assert_eq!(&console.into_inner().out[..], b"Started 3 apps\n");
    }

    #[test]
    fn test_print_counts_errors() {
        let mut console = Console::new(MockTx {
            fail: true,
            ..Default::default()
        });
        console.print(format_args!("lost"));
        assert_eq!(console.error_count(), 1);
    }
}
