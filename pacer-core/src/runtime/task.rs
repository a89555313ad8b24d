//! Task identity and the periodic release state machine

/// Maximum number of tagged tasks
pub const MAX_TASKS: usize = 8;

/// Numeric task tag
///
/// Tags `1..=MAX_TASKS` index the accounting records. Tag 0 marks a task
/// that is never accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskTag(u8);

impl TaskTag {
    /// Tag of tasks excluded from accounting
    pub const UNTAGGED: Self = Self(0);

    pub const fn new(tag: u8) -> Self {
        Self(tag)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Check if this tag has an accounting record
    pub const fn is_accounted(self) -> bool {
        self.0 != 0 && self.0 as usize <= MAX_TASKS
    }

    /// Record index of this tag
    pub const fn index(self) -> Option<usize> {
        if self.is_accounted() {
            Some(self.0 as usize - 1)
        } else {
            None
        }
    }
}

/// What a task does on each release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Behavior {
    EdgeDetector,
    HeartbeatProducer,
    LoadSimulator,
    Aggregator,
}

impl Behavior {
    /// Configuration name of this behaviour
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::EdgeDetector => "edge",
            Behavior::HeartbeatProducer => "heartbeat",
            Behavior::LoadSimulator => "load",
            Behavior::Aggregator => "aggregator",
        }
    }

    /// Look up a behaviour by configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "edge" => Some(Behavior::EdgeDetector),
            "heartbeat" => Some(Behavior::HeartbeatProducer),
            "load" => Some(Behavior::LoadSimulator),
            "aggregator" => Some(Behavior::Aggregator),
            _ => None,
        }
    }

    /// Check if this behaviour writes into a channel
    pub fn is_producer(&self) -> bool {
        matches!(self, Behavior::EdgeDetector | Behavior::HeartbeatProducer)
    }
}

/// Static description of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskDescriptor<'a> {
    pub name: &'a str,
    pub tag: TaskTag,
    /// Release period (ms)
    pub period_ms: u32,
    /// Advisory priority, higher is more urgent
    pub priority: u8,
    pub behavior: Behavior,
}

impl TaskDescriptor<'_> {
    /// Release period (µs)
    pub const fn period_us(&self) -> u64 {
        self.period_ms as u64 * 1_000
    }
}

/// Where a periodic task is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskPhase {
    /// Waiting to run its body for the current release
    Released,
    /// Running its body
    Running,
    /// Sleeping until the next release
    Suspended,
}

/// Delay-until release state machine
///
/// Release `k` happens at `first_release + k * period`. A body that
/// finishes after its next release time counts as an overrun; the next
/// release then happens immediately and no release is skipped, so a task
/// catches up over the following periods.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodicTask {
    period_us: u64,
    release_at: u64,
    phase: TaskPhase,
    releases: u32,
    overruns: u32,
}

impl PeriodicTask {
    /// Create a task whose first release is at `first_release` (µs)
    pub const fn new(period_us: u64, first_release: u64) -> Self {
        Self {
            period_us,
            release_at: first_release,
            phase: TaskPhase::Released,
            releases: 0,
            overruns: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// Time of the current (or upcoming) release (µs)
    pub fn release_at(&self) -> u64 {
        self.release_at
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Bodies started so far
    pub fn releases(&self) -> u32 {
        self.releases
    }

    /// Bodies that finished after their next release time
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Body starts at `now`
    ///
    /// Returns how late the body starts relative to its release (µs).
    pub fn start(&mut self, now: u64) -> u64 {
        self.phase = TaskPhase::Running;
        self.releases = self.releases.wrapping_add(1);
        now.saturating_sub(self.release_at)
    }

    /// Body finished at `now`
    ///
    /// Returns the absolute time of the next release (µs).
    pub fn finish(&mut self, now: u64) -> u64 {
        self.release_at = self.release_at.saturating_add(self.period_us);
        if now > self.release_at {
            self.overruns = self.overruns.wrapping_add(1);
        }
        self.phase = TaskPhase::Suspended;
        self.release_at
    }

    /// Release time reached, body may run again
    pub fn wake(&mut self) {
        self.phase = TaskPhase::Released;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_index() {
        assert_eq!(TaskTag::UNTAGGED.index(), None);
        assert_eq!(TaskTag::new(1).index(), Some(0));
        assert_eq!(TaskTag::new(MAX_TASKS as u8).index(), Some(MAX_TASKS - 1));
        assert_eq!(TaskTag::new(MAX_TASKS as u8 + 1).index(), None);
        assert!(!TaskTag::default().is_accounted());
    }

    #[test]
    fn test_behavior_names() {
        for b in [
            Behavior::EdgeDetector,
            Behavior::HeartbeatProducer,
            Behavior::LoadSimulator,
            Behavior::Aggregator,
        ] {
            assert_eq!(Behavior::from_name(b.name()), Some(b));
        }
        assert_eq!(Behavior::from_name("idle"), None);
        assert!(Behavior::EdgeDetector.is_producer());
        assert!(!Behavior::Aggregator.is_producer());
    }

    #[test]
    fn test_releases_are_exact_multiples() {
        let mut task = PeriodicTask::new(50_000, 0);
        assert_eq!(task.phase(), TaskPhase::Released);

        // Short body, released on time every period
        for k in 1..=10u64 {
            let release = task.release_at();
            assert_eq!(task.start(release + 100), 100);
            assert_eq!(task.phase(), TaskPhase::Running);
            let next = task.finish(release + 300);
            assert_eq!(next, k * 50_000);
            assert_eq!(task.phase(), TaskPhase::Suspended);
            task.wake();
        }
        assert_eq!(task.releases(), 10);
        assert_eq!(task.overruns(), 0);
    }

    #[test]
    fn test_late_wakeup_does_not_drift() {
        let mut task = PeriodicTask::new(10_000, 0);
        task.start(0);
        task.finish(1_000);
        task.wake();

        // Woken 3 ms late; the following release stays on the grid
        task.start(13_000);
        assert_eq!(task.finish(14_000), 20_000);
        assert_eq!(task.overruns(), 0);
    }

    #[test]
    fn test_overrun_releases_immediately_without_skipping() {
        let mut task = PeriodicTask::new(10_000, 0);
        task.start(0);
        let next = task.finish(25_000);

        assert_eq!(next, 10_000);
        assert_eq!(task.overruns(), 1);

        task.wake();
        task.start(25_000);
        assert_eq!(task.finish(26_000), 20_000);
        assert_eq!(task.overruns(), 2);

        task.wake();
        task.start(26_000);
        assert_eq!(task.finish(27_000), 30_000);
        assert_eq!(task.overruns(), 2);
    }

    #[test]
    fn test_descriptor_period() {
        let desc = TaskDescriptor {
            name: "heartbeat",
            tag: TaskTag::new(3),
            period_ms: 100,
            priority: 2,
            behavior: Behavior::HeartbeatProducer,
        };
        assert_eq!(desc.period_us(), 100_000);
    }
}
