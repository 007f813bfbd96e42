//! Nucleo-F429ZI - OS image
//!
//! Brings the board up from the static tables in `nucleo429-core`, starts
//! the device tasks on the embassy executor and reports each lifecycle
//! step through the board event handler.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{SpawnError, SpawnToken, Spawner};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::usart::{self, Uart};
use embassy_stm32::{bind_interrupts, peripherals, usb};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use nucleo429_core::config::board::{BoardConfig, MCU_BOARD_CONFIG, USB_RX_BUFFER_SIZE};
use nucleo429_core::config::clock::STM32_ARCH_CONFIG;
use nucleo429_core::config::os::{
    TaskKind, TaskTable, SOS_BOARD_CONFIG, SOS_BOARD_ID, SOS_BOARD_NAME,
    SOS_BOARD_TASK_TOTAL,
};
use nucleo429_core::devfs::UART0_ATTR;
use nucleo429_core::{BoardEvent, DeviceTable, MountTable, TraceKind, DEVFS_LIST, SYSFS_LIST};
use nucleo429_hal::{Console, Led};
use nucleo429_hal_stm32f4::{embassy_config, usart_config, DebugUart, Stm32Output};

mod board;
mod channels;
mod tasks;
mod trace;

use board::NucleoBoard;
use tasks::UsbDriver;

bind_interrupts!(struct Irqs {
    OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    USART2 => usart::InterruptHandler<peripherals::USART2>;
});

/// USB vendor/product ID (pid.codes test range)
const USB_VID: u16 = 0x1209;
const USB_PID: u16 = 0x0001;

/// Descriptor and control buffers for the USB device
struct UsbBuffers {
    config_descriptor: [u8; 256],
    bos_descriptor: [u8; 256],
    control: [u8; 64],
}

// USB receive buffer of the OTG FS endpoints (must live forever)
static EP_OUT_BUFFER: StaticCell<[u8; USB_RX_BUFFER_SIZE]> = StaticCell::new();
static USB_BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("{} firmware starting", SOS_BOARD_NAME);

    let board_config: &BoardConfig = &MCU_BOARD_CONFIG;

    // Validation failures before the console is up go to defmt only
    let config = match embassy_config(&STM32_ARCH_CONFIG, board_config.core_osc_freq) {
        Ok(config) => config,
        Err(e) => board::fatal(e.as_str()),
    };
    let p = embassy_stm32::init(config);
    info!(
        "Clocks: {} MHz core, {} MHz peripheral",
        board_config.core_cpu_freq / 1_000_000,
        board_config.core_periph_freq / 1_000_000
    );

    // Debug console: ST-LINK virtual COM port on USART3 (PD8 tx)
    let console_config = match usart_config(&board_config.debug_uart_attr) {
        Ok(config) => config,
        Err(_) => board::fatal("debug uart line coding"),
    };
    let debug_tx = match usart::UartTx::new_blocking(p.USART3, p.PD8, console_config) {
        Ok(tx) => tx,
        Err(_) => board::fatal("debug uart config"),
    };
    let console = Console::new(DebugUart::new(debug_tx));
    info!(
        "Debug console on {} (tx) {} (rx), LED on {}",
        Display2Format(&board_config.debug_uart_attr.tx),
        Display2Format(&board_config.debug_uart_attr.rx),
        Display2Format(&board_config.led)
    );

    // LD2 (PB7)
    let led = Led::new(
        Stm32Output(Output::new(p.PB7, Level::Low, Speed::Low)),
        board_config.led_active_high(),
    );

    board::install(NucleoBoard::new(console, led));
    board::emit(BoardEvent::StartInit);

    check_tables();
    board::emit(BoardEvent::RootTaskInit);

    let mut task_table: TaskTable<SOS_BOARD_TASK_TOTAL> = TaskTable::new();

    // Host link: CDC-ACM on USB OTG FS (PA12 D+, PA11 D-)
    let ep_out_buffer = EP_OUT_BUFFER.init([0; USB_RX_BUFFER_SIZE]);
    let mut usb_config = usb::Config::default();
    usb_config.vbus_detection = false;
    let driver: UsbDriver =
        usb::Driver::new_fs(p.USB_OTG_FS, Irqs, p.PA12, p.PA11, ep_out_buffer, usb_config);

    let mut device_config = embassy_usb::Config::new(USB_VID, USB_PID);
    device_config.manufacturer = Some("STMicroelectronics");
    device_config.product = Some(SOS_BOARD_NAME);
    device_config.serial_number = Some(SOS_BOARD_ID);
    device_config.max_power = 100;
    device_config.max_packet_size_0 = board_config.usb_max_packet_zero;

    let buffers = USB_BUFFERS.init(UsbBuffers {
        config_descriptor: [0; 256],
        bos_descriptor: [0; 256],
        control: [0; 64],
    });
    let mut builder = Builder::new(
        driver,
        device_config,
        &mut buffers.config_descriptor,
        &mut buffers.bos_descriptor,
        &mut [],
        &mut buffers.control,
    );
    let class = CdcAcmClass::new(
        &mut builder,
        CDC_STATE.init(State::new()),
        tasks::usb_link::CDC_PACKET_SIZE,
    );
    let usb = builder.build();

    start(&spawner, &mut task_table, "led", TaskKind::System, tasks::led_task());
    start(&spawner, &mut task_table, "usb_device", TaskKind::System, tasks::usb_device_task(usb));
    start(&spawner, &mut task_table, "usb_link", TaskKind::System, tasks::usb_link_task(class));
    board::emit(BoardEvent::StartLink);

    // /dev/uart0 on USART2 (PA2 tx, PA3 rx)
    let uart0_config = match usart_config(&UART0_ATTR) {
        Ok(config) => config,
        Err(_) => board::fatal("uart0 line coding"),
    };
    let uart0 = match Uart::new(
        p.USART2,
        p.PA3, // rx
        p.PA2, // tx
        Irqs,
        p.DMA1_CH6, // tx
        p.DMA1_CH5, // rx
        uart0_config,
    ) {
        Ok(uart) => uart,
        Err(_) => board::fatal("uart0 config"),
    };

    start(&spawner, &mut task_table, "uart0", TaskKind::System, tasks::uart0_task(uart0));
    start(&spawner, &mut task_table, "trace", TaskKind::System, tasks::trace_task());
    start(&spawner, &mut task_table, "stdio", TaskKind::App, tasks::stdio_app_task());

    board::emit(BoardEvent::StartFilesystem(Some(task_table.app_count())));
    trace::post(TraceKind::Message, "board started");

    info!("{} of {} task slots in use", task_table.len(), task_table.capacity());

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Check the device directory, mount table and OS paths; fatal on error
fn check_tables() {
    let mounts = MountTable::new(&SYSFS_LIST);
    if let Err(e) = mounts.validate() {
        board::fatal(e.as_str());
    }

    let devices = DeviceTable::new(&DEVFS_LIST);
    if let Err(e) = SOS_BOARD_CONFIG.validate(&devices) {
        board::fatal(e.as_str());
    }

    for mount in mounts.iter() {
        debug!("mount {}", mount.path);
    }
    info!("/dev: {} devices", devices.len());
    for device in devices.iter() {
        debug!("/dev/{} ({:?})", device.name, device.driver);
    }
}

/// Spawn a task and record it in the task table; fatal if either fails
fn start<S>(
    spawner: &Spawner,
    task_table: &mut TaskTable<SOS_BOARD_TASK_TOTAL>,
    name: &'static str,
    kind: TaskKind,
    token: Result<SpawnToken<S>, SpawnError>,
) {
    let id = match task_table.register(name, kind) {
        Ok(id) => id,
        Err(_) => board::fatal("task table full"),
    };
    match token {
        Ok(token) => spawner.spawn(token),
        Err(_) => board::fatal("task pool exhausted"),
    }
    debug!("task {} started in slot {}", name, id.0);
}
