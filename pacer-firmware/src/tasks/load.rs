//! Load simulator task
//!
//! Burns a fixed number of iterations per period so the accountant has
//! something to measure.

use defmt::*;
use pacer_core::pipeline::LoadSimulator;
use pacer_core::runtime::TaskDescriptor;

use super::periodic::Release;
use super::traced;
use crate::telemetry::TraceHooks;

// Up to seven tagged tasks besides the aggregator
#[embassy_executor::task(pool_size = 7)]
pub async fn load_task(
    hooks: &'static TraceHooks,
    desc: TaskDescriptor<'static>,
    iterations: u32,
) {
    info!(
        "{} started (tag {}, {} ms, {} iterations)",
        desc.name,
        desc.tag.value(),
        desc.period_ms,
        iterations
    );

    traced(hooks, desc.tag, async move {
        let simulator = LoadSimulator::new(iterations);
        let mut release = Release::starting_now(&desc);

        loop {
            release.begin();
            simulator.release();
            release.wait().await;
        }
    })
    .await
}
