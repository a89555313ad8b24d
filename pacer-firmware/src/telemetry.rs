//! Switch hooks and load telemetry
//!
//! Every task body runs inside a traced future; each poll reports a
//! switch-in and a switch-out to the [`TraceHooks`] built at boot. The
//! accountant publishes its figures into [`GAUGE`] so readers never take
//! its lock.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;
use pacer_core::accounting::{ActivityPins, LoadGauge, PublishingAccountant};
use pacer_core::runtime::Clock;
use pacer_hal_rp2040::ActivityOutput;

/// Published load figures
pub static GAUGE: LoadGauge = LoadGauge::new();

pub type AccountantCell = Mutex<CriticalSectionRawMutex, RefCell<PublishingAccountant<'static>>>;
pub type ActivityCell = Mutex<CriticalSectionRawMutex, RefCell<ActivityPins<ActivityOutput>>>;

/// Observers every traced task reports to: the accountant, then the
/// activity pins
pub type TraceHooks = (AccountantCell, ActivityCell);

/// Build the hooks around the activity pins assigned at boot
pub fn trace_hooks(activity: ActivityPins<ActivityOutput>) -> TraceHooks {
    (
        Mutex::new(RefCell::new(PublishingAccountant::new(&GAUGE))),
        Mutex::new(RefCell::new(activity)),
    )
}

/// Embassy time driver as the switch clock
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}

pub static CLOCK: EmbassyClock = EmbassyClock;
