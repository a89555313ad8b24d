//! Heartbeat producer task

use defmt::*;
use pacer_core::pipeline::{Delivery, HeartbeatProducer};
use pacer_core::runtime::TaskDescriptor;

use super::periodic::Release;
use super::traced;
use crate::channels::Slot;
use crate::telemetry::TraceHooks;

#[embassy_executor::task]
pub async fn heartbeat_task(
    hooks: &'static TraceHooks,
    desc: TaskDescriptor<'static>,
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
        let mut producer = HeartbeatProducer::new();
        let mut release = Release::starting_now(&desc);

        loop {
            release.begin();
            if let Delivery::Dropped(_) = producer.release(slot) {
                trace!("{}: heartbeat {} dropped", desc.name, producer.beats());
            }
            release.wait().await;
        }
    })
    .await
}
