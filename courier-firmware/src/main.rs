//! Courier - Event Dispatch and Command Link Firmware
//!
//! Main firmware binary for RP2040-based Courier nodes. Wires the
//! statically allocated dispatch engine, the domain services, and the
//! UART command link, then hands control to the embassy executor.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use courier_core::{CommandHandler, CommandRegistry, GetCounterCommand, PingCommand};

use crate::config::{UART_BAUD, UART_BUF_SIZE};
use crate::node::{on_dispatch_error, CLOCK_DISPLAY, COUNTER, ENGINE, TIMER_TOPIC, UPTIME};

mod config;
mod node;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();

// Handlers and the registry referencing them live for the whole program
static PING: StaticCell<PingCommand<'static>> = StaticCell::new();
static GET_COUNTER: StaticCell<GetCounterCommand<'static>> = StaticCell::new();
static REGISTRY: StaticCell<CommandRegistry<'static>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Courier firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // 1. Error hook before anything can publish
    ENGINE.set_error_hook(on_dispatch_error, None);

    // 2. Open the dispatch queues
    if !ENGINE.start() {
        warn!("Dispatch engine already started");
    }

    // 3. Subscribe services to the timer
    if !COUNTER.attach(&TIMER_TOPIC) {
        error!("Timer topic full, counter not attached");
    }
    if !CLOCK_DISPLAY.attach(&TIMER_TOPIC) {
        error!("Timer topic full, clock display not attached");
    }

    // 4. Built-in commands
    let registry = REGISTRY.init(CommandRegistry::new());
    let ping = PING.init(PingCommand::new(&UPTIME));
    let get_counter = GET_COUNTER.init(GetCounterCommand::new(&COUNTER));
    for handler in [ping as &dyn CommandHandler, get_counter] {
        if let Err(e) = registry.register(handler) {
            error!("Command {:?} not registered: {:?}", handler.key(), e);
        }
    }
    let registry: &'static CommandRegistry<'static> = registry;
    info!("{} commands registered", registry.len());

    // Setup UART for the command link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = UART_BAUD;

    let tx_buf = TX_BUF.init([0u8; UART_BUF_SIZE]);
    let rx_buf = RX_BUF.init([0u8; UART_BUF_SIZE]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", UART_BAUD);

    // Spawn tasks; the dispatch worker first so early ticks are drained
    spawner.spawn(tasks::dispatch_task()).unwrap();
    spawner.spawn(tasks::timer_task()).unwrap();
    spawner
        .spawn(tasks::command_link_task(rx, tx, registry))
        .unwrap();
    spawner.spawn(tasks::monitor_task()).unwrap();

    info!("All tasks spawned");
}
