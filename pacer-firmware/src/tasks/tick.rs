//! Tick marker task
//!
//! Pulses a pin at every tick period so period boundaries show up on a
//! logic analyser next to the activity pins. Runs untagged: its polls go
//! through the switch hooks but are never accounted.

use defmt::*;
use embassy_time::{Duration, Ticker};
use pacer_core::runtime::TaskTag;
use pacer_hal::OutputPin;
use pacer_hal_rp2040::ActivityOutput;

use super::traced;
use crate::telemetry::TraceHooks;

#[embassy_executor::task]
pub async fn tick_task(
    hooks: &'static TraceHooks,
    mut pin: ActivityOutput,
    period_ms: u32,
) {
    info!("Tick marker started ({} ms)", period_ms);

    traced(hooks, TaskTag::UNTAGGED, async move {
        let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));
        loop {
            pin.set_high();
            pin.set_low();
            ticker.next().await;
        }
    })
    .await
}
