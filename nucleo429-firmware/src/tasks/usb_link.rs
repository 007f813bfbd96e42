//! Host link over USB CDC-ACM (`/dev/link-phy-usb`)
//!
//! Bytes from the host land in `stdio-in`; `stdio-out` is sent back in
//! max-size packets.

use defmt::*;
use embassy_futures::join::join;
use embassy_stm32::peripherals::USB_OTG_FS;
use embassy_stm32::usb::Driver;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender};
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;

use nucleo429_core::TraceKind;

use crate::channels::{STDIO_IN, STDIO_OUT};
use crate::trace;

pub type UsbDriver = Driver<'static, USB_OTG_FS>;

/// Max packet size of the CDC data endpoints
pub const CDC_PACKET_SIZE: u16 = 64;

/// Runs the USB device state machine
#[embassy_executor::task]
pub async fn usb_device_task(mut usb: UsbDevice<'static, UsbDriver>) {
    usb.run().await;
}

/// Bridges the CDC-ACM class and the standard I/O fifos
#[embassy_executor::task]
pub async fn usb_link_task(class: CdcAcmClass<'static, UsbDriver>) {
    info!("USB link task started");

    let (mut sender, mut receiver) = class.split();
    join(host_to_stdio(&mut receiver), stdio_to_host(&mut sender)).await;
}

async fn host_to_stdio(receiver: &mut Receiver<'static, UsbDriver>) {
    let mut buf = [0u8; CDC_PACKET_SIZE as usize];

    loop {
        receiver.wait_connection().await;
        info!("USB host connected");
        trace::post(TraceKind::Message, "usb connected");

        loop {
            match receiver.read_packet(&mut buf).await {
                Ok(n) => STDIO_IN.write_all(&buf[..n]).await,
                Err(EndpointError::Disabled) => break,
                Err(EndpointError::BufferOverflow) => {
                    warn!("USB packet larger than {} bytes", CDC_PACKET_SIZE);
                }
            }
        }

        info!("USB host disconnected");
        trace::post(TraceKind::Message, "usb disconnected");
    }
}

async fn stdio_to_host(sender: &mut Sender<'static, UsbDriver>) {
    let mut buf = [0u8; CDC_PACKET_SIZE as usize];

    loop {
        sender.wait_connection().await;

        loop {
            let n = STDIO_OUT.read(&mut buf).await;
            if send_packet(sender, &buf[..n]).await.is_err() {
                break;
            }
        }
    }
}

/// Send one chunk, closing a full-size packet with a zero-length one
async fn send_packet(
    sender: &mut Sender<'static, UsbDriver>,
    data: &[u8],
) -> Result<(), EndpointError> {
    sender.write_packet(data).await?;
    if data.len() == CDC_PACKET_SIZE as usize {
        sender.write_packet(&[]).await?;
    }
    Ok(())
}
