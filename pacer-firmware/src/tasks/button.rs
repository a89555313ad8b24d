//! Edge detector task
//!
//! Samples one button per period and forwards edges to its channel.

use defmt::*;
use pacer_core::pipeline::{Delivery, EdgeDetector};
use pacer_core::runtime::TaskDescriptor;
use pacer_hal_rp2040::ButtonInput;

use super::periodic::Release;
use super::traced;
use crate::channels::Slot;
use crate::telemetry::TraceHooks;

#[embassy_executor::task(pool_size = 2)]
pub async fn button_task(
    hooks: &'static TraceHooks,
    desc: TaskDescriptor<'static>,
    pin: ButtonInput,
    slot: &'static Slot,
) {
    info!(
        "{} started (tag {}, {} ms, priority {})",
        desc.name,
        desc.tag.value(),
        desc.period_ms,
        desc.priority
    );

    traced(hooks, desc.tag, async move {
        let mut detector = EdgeDetector::from_pin(&pin);
        let mut release = Release::starting_now(&desc);

        loop {
            release.begin();
            match detector.release(&pin, slot) {
                Delivery::Idle => {}
                Delivery::Sent(event) => trace!("{}: {}", desc.name, event),
                Delivery::Dropped(event) => trace!("{}: {} dropped", desc.name, event),
            }
            release.wait().await;
        }
    })
    .await
}
