//! CPU-load accountant
//!
//! Fed by the runtime at every task switch. Switch-in stamps the entry time
//! of the task; switch-out adds the elapsed time to the task's busy total and
//! refreshes the system load snapshot:
//!
//! ```text
//! load_percent = 100 * Σ busy_total / system_time
//! ```
//!
//! Both hooks run inside the switch path, so they never block, allocate or
//! fail. Records are indexed by task tag; untagged tasks (tag 0) and tags
//! beyond [`MAX_TASKS`] are ignored.

use crate::runtime::{SwitchObserver, TaskTag, MAX_TASKS};

/// Busy-time record of one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskRecord {
    /// Accumulated busy time (µs)
    pub busy_total: u64,
    /// Time of the last switch-in not yet matched by a switch-out (µs)
    pub last_entry: Option<u64>,
}

impl TaskRecord {
    const IDLE: Self = Self {
        busy_total: 0,
        last_entry: None,
    };
}

/// System-wide load at the last switch-out
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadSnapshot {
    /// Time of the switch-out that produced this snapshot (µs)
    pub system_time: u64,
    /// Share of `system_time` spent in tagged tasks
    pub load_percent: f32,
}

/// Percentage of `system_time` covered by `busy`
///
/// Zero while no system time has elapsed.
pub fn load_percent(busy: u64, system_time: u64) -> f32 {
    if system_time == 0 {
        return 0.0;
    }
    100.0 * busy as f32 / system_time as f32
}

/// Per-task busy time and system load
#[derive(Debug, Clone)]
pub struct CpuLoadAccountant {
    records: [TaskRecord; MAX_TASKS],
    snapshot: LoadSnapshot,
}

impl Default for CpuLoadAccountant {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuLoadAccountant {
    /// Create an accountant with every record empty
    pub const fn new() -> Self {
        Self {
            records: [TaskRecord::IDLE; MAX_TASKS],
            snapshot: LoadSnapshot {
                system_time: 0,
                load_percent: 0.0,
            },
        }
    }

    /// Task `tag` started occupying the CPU at `now`
    pub fn switch_in(&mut self, tag: TaskTag, now: u64) {
        if let Some(record) = self.record_mut(tag) {
            record.last_entry = Some(now);
        }
    }

    /// Task `tag` stopped occupying the CPU at `now`
    ///
    /// A switch-out without a matching switch-in, or one stamped before it,
    /// counts as zero elapsed time.
    pub fn switch_out(&mut self, tag: TaskTag, now: u64) {
        let Some(record) = self.record_mut(tag) else {
            return;
        };

        let elapsed = record
            .last_entry
            .take()
            .map_or(0, |entry| now.saturating_sub(entry));
        record.busy_total = record.busy_total.saturating_add(elapsed);

        let busy = self.total_busy();
        self.snapshot = LoadSnapshot {
            system_time: now,
            load_percent: load_percent(busy, now),
        };
    }

    /// Latest system load snapshot
    pub fn snapshot(&self) -> LoadSnapshot {
        self.snapshot
    }

    /// Record of task `tag`
    pub fn record(&self, tag: TaskTag) -> Option<&TaskRecord> {
        tag.index().and_then(|i| self.records.get(i))
    }

    /// Busy time summed over all tasks (µs)
    pub fn total_busy(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.busy_total))
    }

    /// Share of the snapshot's system time spent in task `tag`
    pub fn task_load_percent(&self, tag: TaskTag) -> f32 {
        self.record(tag)
            .map_or(0.0, |r| load_percent(r.busy_total, self.snapshot.system_time))
    }

    fn record_mut(&mut self, tag: TaskTag) -> Option<&mut TaskRecord> {
        tag.index().and_then(move |i| self.records.get_mut(i))
    }
}

impl SwitchObserver for CpuLoadAccountant {
    fn on_switch_in(&mut self, tag: TaskTag, now: u64) {
        self.switch_in(tag, now);
    }

    fn on_switch_out(&mut self, tag: TaskTag, now: u64) {
        self.switch_out(tag, now);
    }
}
