//! Delay-until release loop
//!
//! Drives a [`PeriodicTask`] with the Embassy timer. The single suspension
//! point of a periodic task is [`Release::wait`].

use defmt::*;
use embassy_time::{Instant, Timer};
use pacer_core::runtime::{PeriodicTask, TaskDescriptor};

/// Release bookkeeping of one task
pub struct Release {
    name: &'static str,
    task: PeriodicTask,
}

impl Release {
    /// First release now, then one every period
    pub fn starting_now(desc: &TaskDescriptor<'static>) -> Self {
        Self {
            name: desc.name,
            task: PeriodicTask::new(desc.period_us(), Instant::now().as_micros()),
        }
    }

    /// Mark the start of this release's body
    pub fn begin(&mut self) {
        let late = self.task.start(Instant::now().as_micros());
        if late > 0 {
            trace!("{}: released {} us late", self.name, late);
        }
    }

    /// End the body and sleep until the next release
    pub async fn wait(&mut self) {
        let overruns = self.task.overruns();
        let next = self.task.finish(Instant::now().as_micros());
        if self.task.overruns() != overruns {
            debug!(
                "{}: overran its period ({} of {} releases)",
                self.name,
                self.task.overruns(),
                self.task.releases()
            );
        }

        Timer::at(Instant::from_micros(next)).await;
        self.task.wake();
    }
}
