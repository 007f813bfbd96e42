//! Line console on the standard I/O fifos
//!
//! The single application started by the board. Input is echoed; complete
//! lines are run as commands against the board fifos:
//!
//! - `devs` lists `/dev`
//! - `fifo <n> <text>` writes to channel `n` of `/dev/fifo`
//! - `read <n>` drains channel `n` of `/dev/fifo`
//! - `uart <text>` sends a line on `/dev/uart0`
//! - `rx` drains what `/dev/uart0` has received

use core::fmt::Write;

use defmt::*;
use heapless::{String, Vec};

use nucleo429_core::{DeviceTable, DEVFS_LIST};

use crate::channels::{board_fifo, STDIO_IN, STDIO_OUT, UART0_RX, UART0_TX};

/// Longest command line
const LINE_SIZE: usize = 128;

const PROMPT: &[u8] = b"> ";

#[embassy_executor::task]
pub async fn stdio_app_task() {
    info!("stdio app started");

    let mut line: Vec<u8, LINE_SIZE> = Vec::new();
    let mut buf = [0u8; 32];

    STDIO_OUT.write_all(PROMPT).await;

    loop {
        let n = STDIO_IN.read(&mut buf).await;
        STDIO_OUT.write_all(&buf[..n]).await;

        for &byte in &buf[..n] {
            match byte {
                b'\r' | b'\n' => {
                    if !line.is_empty() {
                        run(&line).await;
                        line.clear();
                    }
                    STDIO_OUT.write_all(PROMPT).await;
                }
                _ => {
                    if line.push(byte).is_err() {
                        warn!("stdio line longer than {} bytes, discarded", LINE_SIZE);
                        line.clear();
                    }
                }
            }
        }
    }
}

async fn run(line: &[u8]) {
    let Ok(line) = core::str::from_utf8(line) else {
        reply(format_args!("\r\nnot utf-8\r\n")).await;
        return;
    };
    let line = line.trim();
    let (command, args) = line.split_once(' ').unwrap_or((line, ""));

    match command {
        "devs" => {
            STDIO_OUT.write_all(b"\r\n").await;
            for device in DeviceTable::new(&DEVFS_LIST).iter() {
                reply(format_args!("/dev/{}\r\n", device.name)).await;
            }
        }
        "fifo" => {
            let Some((channel, text)) = args.split_once(' ') else {
                reply(format_args!("\r\nusage: fifo <n> <text>\r\n")).await;
                return;
            };
            match channel.parse::<usize>().ok().and_then(board_fifo) {
                Some(fifo) => {
                    let written = fifo.try_write(text.as_bytes()).unwrap_or(0);
                    reply(format_args!("\r\n{} bytes\r\n", written)).await;
                }
                None => reply(format_args!("\r\nno fifo channel {}\r\n", channel)).await,
            }
        }
        "read" => match args.trim().parse::<usize>().ok().and_then(board_fifo) {
            Some(fifo) => {
                let mut data = [0u8; 64];
                let n = fifo.try_read(&mut data).unwrap_or(0);
                STDIO_OUT.write_all(b"\r\n").await;
                STDIO_OUT.write_all(&data[..n]).await;
                STDIO_OUT.write_all(b"\r\n").await;
            }
            None => reply(format_args!("\r\nno fifo channel {}\r\n", args)).await,
        },
        "uart" => {
            UART0_TX.write_all(args.as_bytes()).await;
            UART0_TX.write_all(b"\r\n").await;
            STDIO_OUT.write_all(b"\r\n").await;
        }
        "rx" => {
            let mut data = [0u8; 64];
            let n = UART0_RX.try_read(&mut data).unwrap_or(0);
            STDIO_OUT.write_all(b"\r\n").await;
            STDIO_OUT.write_all(&data[..n]).await;
            STDIO_OUT.write_all(b"\r\n").await;
        }
        other => reply(format_args!("\r\nunknown command '{}'\r\n", other)).await,
    }
}

async fn reply(args: core::fmt::Arguments<'_>) {
    let mut text: String<LINE_SIZE> = String::new();
    // Overlong replies are cut, not dropped
    let _ = text.write_fmt(args);
    STDIO_OUT.write_all(text.as_bytes()).await;
}
