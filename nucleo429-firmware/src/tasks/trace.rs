//! Drains `/dev/trace` to the defmt log

use defmt::*;

use nucleo429_core::TraceKind;

use crate::channels::TRACE_CHANNEL;
use crate::trace::take_dropped;

#[embassy_executor::task]
pub async fn trace_task() {
    info!("Trace task started");

    loop {
        let event = TRACE_CHANNEL.receive().await;

        let dropped = take_dropped();
        if dropped > 0 {
            warn!("trace: {} records dropped", dropped);
        }

        let cut = if event.truncated { "..." } else { "" };
        match event.kind {
            TraceKind::Message => info!("[{}us] {}{}", event.timestamp_us, event.message.as_str(), cut),
            TraceKind::Warning => warn!("[{}us] {}{}", event.timestamp_us, event.message.as_str(), cut),
            TraceKind::Error | TraceKind::Fatal => {
                error!("[{}us] {}{}", event.timestamp_us, event.message.as_str(), cut)
            }
        }
    }
}
