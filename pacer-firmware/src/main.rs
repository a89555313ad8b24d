//! Pacer - periodic task pipeline firmware
//!
//! Main firmware binary for RP2040 boards. Two buttons are sampled for
//! edges, a heartbeat is produced, an aggregator forwards everything over
//! UART0, and two load simulators keep the CPU busy. Every task switch is
//! accounted and the CPU load is logged over defmt.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pacer_core::accounting::ActivityPins;
use pacer_core::config::PipelineConfig;
use pacer_core::runtime::Behavior;
use pacer_hal_rp2040::gpio::{self, GpioAllocator};
use pacer_hal_rp2040::{PinBank, RpSerial};

mod channels;
mod config;
mod tasks;
mod telemetry;

use crate::channels::SLOTS;
use crate::telemetry::{TraceHooks, GAUGE};

/// Embedded pipeline configuration (compiled into firmware)
/// Edit pipeline.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../pipeline.toml");

// Tasks borrow names and settings for the life of the program
static PIPELINE_CONFIG: StaticCell<PipelineConfig> = StaticCell::new();
static TRACE_HOOKS: StaticCell<TraceHooks> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pacer firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static PipelineConfig = PIPELINE_CONFIG.init(config::load(EMBEDDED_CONFIG));

    // Check every configured pin before taking any
    let mut allocator = GpioAllocator::new();
    if let Err((pin, e)) = allocator.allocate_config(config) {
        defmt::panic!("GPIO{} cannot be used: {}", pin, e);
    }
    info!("{} GPIO pins allocated", allocator.allocated_count());

    let (mut bank, remaining) = PinBank::split(p);
    let mut serial = Some(RpSerial::new(
        remaining.uart0,
        remaining.uart_tx,
        &config.serial,
    ));
    info!("UART0 initialized at {} baud", config.serial.baudrate);

    // Activity pins
    let mut activity = ActivityPins::new();
    for task in &config.tasks {
        let Some(pin_cfg) = task.activity_pin else {
            continue;
        };
        let pin = gpio::output(unwrap!(bank.take(pin_cfg.pin)), &pin_cfg);
        if activity.assign(task.tag, pin).is_err() {
            warn!("{}: no activity slot for tag {}", task.name.as_str(), task.tag.value());
        }
    }
    info!("{} activity pins assigned", activity.assigned());

    let hooks: &'static TraceHooks = TRACE_HOOKS.init(telemetry::trace_hooks(activity));

    // Spawn tasks
    for task in &config.tasks {
        let desc = task.descriptor();
        match task.behavior {
            Behavior::EdgeDetector => {
                let (Some(pin_cfg), Some(source)) = (task.input, task.source()) else {
                    warn!("{}: no input or channel, not started", desc.name);
                    continue;
                };
                let pin = gpio::input(unwrap!(bank.take(pin_cfg.pin)), &pin_cfg);
                spawner.spawn(unwrap!(tasks::button_task(hooks, desc, pin, SLOTS.slot(source))));
            }
            Behavior::HeartbeatProducer => {
                spawner.spawn(unwrap!(tasks::heartbeat_task(hooks, desc, &SLOTS.heartbeat)));
            }
            Behavior::LoadSimulator => {
                let iterations = task.iterations.unwrap_or_default();
                spawner.spawn(unwrap!(tasks::load_task(hooks, desc, iterations)));
            }
            Behavior::Aggregator => match serial.take() {
                Some(serial) => {
                    spawner.spawn(unwrap!(tasks::aggregator_task(
                        hooks,
                        desc,
                        serial,
                        config.aggregator
                    )));
                }
                None => warn!("{}: serial link already in use, not started", desc.name),
            },
        }
    }

    if let Some(pin_cfg) = config.telemetry.tick_pin {
        let pin = gpio::output(unwrap!(bank.take(pin_cfg.pin)), &pin_cfg);
        spawner.spawn(unwrap!(tasks::tick_task(
            hooks,
            pin,
            config.telemetry.tick_period_ms
        )));
    }

    info!("All tasks spawned, pipeline running");

    // Load telemetry
    let mut ticker = Ticker::every(Duration::from_millis(
        config.telemetry.log_interval_ms as u64,
    ));
    loop {
        ticker.next().await;

        let snapshot = GAUGE.snapshot();
        info!(
            "CPU load {}% at {} ms",
            snapshot.load_percent,
            snapshot.system_time / 1_000
        );
        for task in &config.tasks {
            debug!(
                "  {}: {}%",
                task.name.as_str(),
                GAUGE.task_load_percent(task.tag)
            );
        }
    }
}
