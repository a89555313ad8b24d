//! Published load figures
//!
//! The accountant lives behind the switch hooks. Other tasks read a copy
//! published into atomics after every switch-out. Reads take no lock and
//! may mix values from two consecutive switch-outs; the figures are
//! telemetry and are treated as approximate.

use portable_atomic::{AtomicU32, AtomicU64, Ordering};

use super::accountant::{load_percent, CpuLoadAccountant, LoadSnapshot};
use crate::runtime::{SwitchObserver, TaskTag, MAX_TASKS};

/// Lock-free copy of the accountant's figures
pub struct LoadGauge {
    system_time: AtomicU64,
    load_bits: AtomicU32,
    busy: [AtomicU64; MAX_TASKS],
}

impl Default for LoadGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadGauge {
    pub const fn new() -> Self {
        Self {
            system_time: AtomicU64::new(0),
            load_bits: AtomicU32::new(0),
            busy: [const { AtomicU64::new(0) }; MAX_TASKS],
        }
    }

    /// Copy the snapshot and the busy total of `tag` out of `accountant`
    pub fn publish(&self, accountant: &CpuLoadAccountant, tag: TaskTag) {
        let snapshot = accountant.snapshot();
        self.system_time
            .store(snapshot.system_time, Ordering::Relaxed);
        self.load_bits
            .store(snapshot.load_percent.to_bits(), Ordering::Relaxed);

        if let (Some(i), Some(record)) = (tag.index(), accountant.record(tag)) {
            self.busy[i].store(record.busy_total, Ordering::Relaxed);
        }
    }

    /// Last published system load
    pub fn snapshot(&self) -> LoadSnapshot {
        LoadSnapshot {
            system_time: self.system_time.load(Ordering::Relaxed),
            load_percent: f32::from_bits(self.load_bits.load(Ordering::Relaxed)),
        }
    }

    /// Last published busy total of `tag` (µs)
    pub fn busy(&self, tag: TaskTag) -> u64 {
        tag.index()
            .map_or(0, |i| self.busy[i].load(Ordering::Relaxed))
    }

    /// Share of the published system time spent in task `tag`
    pub fn task_load_percent(&self, tag: TaskTag) -> f32 {
        load_percent(self.busy(tag), self.system_time.load(Ordering::Relaxed))
    }
}

/// Accountant that publishes into a [`LoadGauge`] after every switch-out
pub struct PublishingAccountant<'g> {
    inner: CpuLoadAccountant,
    gauge: &'g LoadGauge,
}

impl<'g> PublishingAccountant<'g> {
    pub const fn new(gauge: &'g LoadGauge) -> Self {
        Self {
            inner: CpuLoadAccountant::new(),
            gauge,
        }
    }

    /// The wrapped accountant
    pub fn accountant(&self) -> &CpuLoadAccountant {
        &self.inner
    }
}

impl SwitchObserver for PublishingAccountant<'_> {
    fn on_switch_in(&mut self, tag: TaskTag, now: u64) {
        self.inner.switch_in(tag, now);
    }

    fn on_switch_out(&mut self, tag: TaskTag, now: u64) {
        self.inner.switch_out(tag, now);
        if tag.is_accounted() {
            self.gauge.publish(&self.inner, tag);
        }
    }
}
