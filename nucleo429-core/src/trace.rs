//! Trace records
//!
//! Records posted to `/dev/trace`. The device is a frame fifo, so every
//! record has a fixed capacity and longer messages are cut short.

use heapless::String;

/// Bytes of message text kept per record
pub const TRACE_MESSAGE_LEN: usize = 32;

/// Severity of a trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TraceKind {
    Message,
    Warning,
    Error,
    Fatal,
}

/// One frame of the trace fifo
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TraceEvent {
    pub kind: TraceKind,
    /// Microseconds since boot
    pub timestamp_us: u64,
    pub message: String<TRACE_MESSAGE_LEN>,
    /// The message did not fit and was cut at a character boundary
    pub truncated: bool,
}

impl TraceEvent {
    pub fn new(kind: TraceKind, timestamp_us: u64, text: &str) -> Self {
        let mut end = text.len().min(TRACE_MESSAGE_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        let mut message = String::new();
        // Cannot fail: `end` is within capacity
        let _ = message.push_str(&text[..end]);

        Self {
            kind,
            timestamp_us,
            message,
            truncated: end < text.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_message_kept() {
        let event = TraceEvent::new(TraceKind::Message, 42, "usb connected");
        assert_eq!(event.message.as_str(), "usb connected");
        assert_eq!(event.timestamp_us, 42);
        assert!(!event.truncated);
    }

    #[test]
    fn test_long_message_truncated() {
        let text = "uart0 overrun while the stdio fifo was full";
        let event = TraceEvent::new(TraceKind::Warning, 0, text);
        assert_eq!(event.message.len(), TRACE_MESSAGE_LEN);
        assert!(text.starts_with(event.message.as_str()));
        assert!(event.truncated);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        // 31 ASCII bytes then a 2-byte character straddling the limit
        let text = format!("{}é", "a".repeat(TRACE_MESSAGE_LEN - 1));
        let event = TraceEvent::new(TraceKind::Error, 0, &text);
        assert_eq!(event.message.len(), TRACE_MESSAGE_LEN - 1);
        assert!(event.truncated);
    }

    proptest! {
        #[test]
        fn prop_message_is_prefix(text in "\\PC{0,64}") {
            let event = TraceEvent::new(TraceKind::Message, 0, &text);
            prop_assert!(event.message.len() <= TRACE_MESSAGE_LEN);
            prop_assert!(text.starts_with(event.message.as_str()));
            prop_assert_eq!(event.truncated, event.message.len() < text.len());
        }
    }
}
