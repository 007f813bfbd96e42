//! Backing storage of the fifo devices
//!
//! Each fifo listed under `/dev` is a static embassy-sync pipe or channel
//! sized from the device directory.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;

use nucleo429_core::config::os::SOS_BOARD_STDIO_BUFFER_SIZE;
use nucleo429_core::devfs::{BOARD_FIFO_CHANNELS, BOARD_FIFO_SIZE, TRACE_FIFO_FRAMES, UART0_FIFO_SIZE};
use nucleo429_core::TraceEvent;

pub type StdioPipe = Pipe<CriticalSectionRawMutex, SOS_BOARD_STDIO_BUFFER_SIZE>;
pub type BoardFifo = Pipe<CriticalSectionRawMutex, BOARD_FIFO_SIZE>;
pub type Uart0Pipe = Pipe<CriticalSectionRawMutex, UART0_FIFO_SIZE>;

/// `/dev/stdio-in`: host to applications
pub static STDIO_IN: StdioPipe = Pipe::new();

/// `/dev/stdio-out`: applications to host
pub static STDIO_OUT: StdioPipe = Pipe::new();

/// `/dev/fifo`: general purpose channels
pub static BOARD_FIFO: [BoardFifo; BOARD_FIFO_CHANNELS] = [const { Pipe::new() }; BOARD_FIFO_CHANNELS];

/// `/dev/uart0`, receive side
pub static UART0_RX: Uart0Pipe = Pipe::new();

/// `/dev/uart0`, transmit side
pub static UART0_TX: Uart0Pipe = Pipe::new();

/// `/dev/trace`
pub static TRACE_CHANNEL: Channel<CriticalSectionRawMutex, TraceEvent, TRACE_FIFO_FRAMES> =
    Channel::new();

/// Channel of the board fifo, if it exists
pub fn board_fifo(channel: usize) -> Option<&'static BoardFifo> {
    BOARD_FIFO.get(channel)
}
