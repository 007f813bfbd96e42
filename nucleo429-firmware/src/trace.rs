//! Trace event callback
//!
//! Any task may post a record; the trace task drains them. Posting never
//! blocks. When the fifo is full the record is dropped and counted.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_time::Instant;
use nucleo429_core::{TraceEvent, TraceKind};

use crate::channels::TRACE_CHANNEL;

static DROPPED: AtomicU32 = AtomicU32::new(0);

pub fn post(kind: TraceKind, message: &str) {
    let event = TraceEvent::new(kind, Instant::now().as_micros(), message);
    if TRACE_CHANNEL.try_send(event).is_err() {
        DROPPED.fetch_add(1, Ordering::Relaxed);
    }
}

/// Records lost since the last call
pub fn take_dropped() -> u32 {
    DROPPED.swap(0, Ordering::Relaxed)
}
