//! `/dev/uart0` on USART2 (PA2 tx, PA3 rx)

use defmt::*;
use embassy_futures::join::join;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::{Uart, UartRx, UartTx};

use nucleo429_core::TraceKind;

use crate::channels::{UART0_RX, UART0_TX};
use crate::trace;

/// DMA chunk size for each direction
const CHUNK_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn uart0_task(uart: Uart<'static, Async>) {
    info!("uart0 task started");

    let (mut tx, mut rx) = uart.split();
    join(receive(&mut rx), transmit(&mut tx)).await;
}

async fn receive(rx: &mut UartRx<'static, Async>) {
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        match rx.read_until_idle(&mut buf).await {
            Ok(0) => {}
            Ok(n) => UART0_RX.write_all(&buf[..n]).await,
            Err(e) => {
                warn!("uart0 rx error: {:?}", e);
                trace::post(TraceKind::Warning, "uart0 rx error");
            }
        }
    }
}

async fn transmit(tx: &mut UartTx<'static, Async>) {
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = UART0_TX.read(&mut buf).await;
        if let Err(e) = tx.write(&buf[..n]).await {
            warn!("uart0 tx error: {:?}", e);
            trace::post(TraceKind::Warning, "uart0 tx error");
        }
    }
}
