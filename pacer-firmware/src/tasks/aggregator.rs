//! Aggregator task
//!
//! Drains the channels every period and writes one line per event to the
//! serial link, plus an optional periodic load line.

use defmt::*;
use embassy_time::Timer;
use pacer_core::config::AggregatorConfig;
use pacer_core::pipeline::Aggregator;
use pacer_core::runtime::TaskDescriptor;
use pacer_hal_rp2040::RpSerial;

use super::periodic::Release;
use super::traced;
use crate::channels::SLOTS;
use crate::telemetry::{TraceHooks, GAUGE};

#[embassy_executor::task]
pub async fn aggregator_task(
    hooks: &'static TraceHooks,
    desc: TaskDescriptor<'static>,
    mut serial: RpSerial,
    config: AggregatorConfig,
) {
    info!(
        "{} started (tag {}, {} ms, receive timeout {} ms)",
        desc.name,
        desc.tag.value(),
        desc.period_ms,
        config.receive_timeout_ms
    );

    traced(hooks, desc.tag, async move {
        let mut aggregator = Aggregator::new(config.load_report_every);
        let mut release = Release::starting_now(&desc);
        let timeout_ms = config.receive_timeout_ms as u64;

        loop {
            release.begin();

            let summary = aggregator
                .poll(&SLOTS, &mut serial, || Timer::after_millis(timeout_ms))
                .await;
            if summary.rendered > 0 {
                debug!("{}: {} lines forwarded", desc.name, summary.rendered);
            }
            if summary.write_errors > 0 {
                warn!("{}: {} serial writes failed", desc.name, summary.write_errors);
            }

            if aggregator.load_report_due() && !aggregator.report_load(&GAUGE.snapshot(), &mut serial) {
                warn!("{}: load report not written", desc.name);
            }

            release.wait().await;
        }
    })
    .await
}
