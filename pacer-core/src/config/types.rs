//! Configuration type definitions
//!
//! Bounded with `heapless` so a whole pipeline fits in a static without an
//! allocator.

use heapless::{String, Vec};
use pacer_hal::UartConfig;

use crate::pipeline::Source;
use crate::runtime::{Behavior, TaskDescriptor, TaskTag, MAX_TASKS};

/// Maximum task name length
pub const MAX_NAME_LEN: usize = 16;

/// GPIO pin reference, written `gpioN` with optional `!` and `^` modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO number
    pub pin: u8,
    /// Active low (`!`)
    pub inverted: bool,
    /// Internal pull-up enabled (`^`)
    pub pull_up: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }
}

/// Aggregator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AggregatorConfig {
    /// How long each channel receive may wait (ms)
    pub receive_timeout_ms: u32,
    /// Aggregator periods between `CPU load` lines (0 = never)
    pub load_report_every: u16,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: 10,
            load_report_every: 0,
        }
    }
}

/// Telemetry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryConfig {
    /// Pin pulsed at every tick period, if any
    pub tick_pin: Option<PinConfig>,
    /// Tick marker period (ms)
    pub tick_period_ms: u32,
    /// Interval between load log lines (ms)
    pub log_interval_ms: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick_pin: None,
            tick_period_ms: 1,
            log_interval_ms: 1000,
        }
    }
}

/// One periodic task
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskConfig {
    pub name: String<MAX_NAME_LEN>,
    pub tag: TaskTag,
    pub behavior: Behavior,
    /// Release period (ms)
    pub period_ms: u32,
    pub priority: u8,
    /// Sampled input (edge detectors)
    pub input: Option<PinConfig>,
    /// Channel written (producers), derived when unset
    pub source: Option<Source>,
    /// Pin high while the task occupies the CPU
    pub activity_pin: Option<PinConfig>,
    /// Busy-loop iterations per period (load simulators)
    pub iterations: Option<u32>,
}

impl TaskConfig {
    /// Create a task with no pins or options set
    ///
    /// Names longer than [`MAX_NAME_LEN`] are truncated.
    pub fn new(name: &str, tag: u8, behavior: Behavior, period_ms: u32) -> Self {
        let mut n = String::new();
        for c in name.chars() {
            if n.push(c).is_err() {
                break;
            }
        }
        Self {
            name: n,
            tag: TaskTag::new(tag),
            behavior,
            period_ms,
            priority: 1,
            input: None,
            source: None,
            activity_pin: None,
            iterations: None,
        }
    }

    fn with_input(mut self, pin: PinConfig) -> Self {
        self.input = Some(pin);
        self
    }

    fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Channel this task writes
    ///
    /// Heartbeat producers always write the heartbeat channel. Edge
    /// detectors use `source`, or the channel named like the task.
    pub fn source(&self) -> Option<Source> {
        match self.behavior {
            Behavior::HeartbeatProducer => Some(Source::Heartbeat),
            Behavior::EdgeDetector => self
                .source
                .or_else(|| Source::from_name(self.name.as_str())),
            Behavior::LoadSimulator | Behavior::Aggregator => None,
        }
    }

    pub fn descriptor(&self) -> TaskDescriptor<'_> {
        TaskDescriptor {
            name: self.name.as_str(),
            tag: self.tag,
            period_ms: self.period_ms,
            priority: self.priority,
            behavior: self.behavior,
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No task configured
    NoTasks,
    /// Tag outside `1..=MAX_TASKS`
    InvalidTag(u8),
    /// Two tasks share a tag
    DuplicateTag(u8),
    /// Task period of zero
    ZeroPeriod(u8),
    /// Edge detector without an input pin
    MissingInput(u8),
    /// Edge detector not bound to a button channel
    MissingSource(u8),
    /// Two producers write the same channel
    DuplicateSource(Source),
    /// Load simulator without an iteration count
    MissingIterations(u8),
    /// Not exactly one aggregator
    AggregatorCount(u8),
    /// Zero receive timeout, tick or log interval
    ZeroInterval,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    pub serial: UartConfig,
    pub aggregator: AggregatorConfig,
    pub telemetry: TelemetryConfig,
    pub tasks: Vec<TaskConfig, MAX_TASKS>,
}

impl Default for PipelineConfig {
    /// Two buttons on GPIO 2 and 3 (active low, pulled up), one heartbeat,
    /// one aggregator and two load simulators
    fn default() -> Self {
        let button = PinConfig {
            pin: 0,
            inverted: true,
            pull_up: true,
        };
        let tasks = [
            TaskConfig::new("button_1", 1, Behavior::EdgeDetector, 50)
                .with_input(PinConfig { pin: 2, ..button }),
            TaskConfig::new("button_2", 2, Behavior::EdgeDetector, 50)
                .with_input(PinConfig { pin: 3, ..button }),
            TaskConfig::new("heartbeat", 3, Behavior::HeartbeatProducer, 100),
            TaskConfig::new("aggregator", 4, Behavior::Aggregator, 20),
            TaskConfig::new("load_1", 5, Behavior::LoadSimulator, 10).with_iterations(33_300),
            TaskConfig::new("load_2", 6, Behavior::LoadSimulator, 100).with_iterations(79_900),
        ];

        Self {
            serial: UartConfig::default(),
            aggregator: AggregatorConfig::default(),
            telemetry: TelemetryConfig::default(),
            tasks: tasks.into_iter().collect(),
        }
    }
}

impl PipelineConfig {
    /// Create an empty configuration with default settings
    pub fn new() -> Self {
        Self {
            serial: UartConfig::default(),
            aggregator: AggregatorConfig::default(),
            telemetry: TelemetryConfig::default(),
            tasks: Vec::new(),
        }
    }

    /// Find a task by tag
    pub fn task(&self, tag: TaskTag) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.tag == tag)
    }

    /// Find a task by name
    pub fn task_by_name(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name.as_str() == name)
    }

    /// The aggregator task, if configured
    pub fn aggregator_task(&self) -> Option<&TaskConfig> {
        self.tasks
            .iter()
            .find(|t| t.behavior == Behavior::Aggregator)
    }

    /// Check the configuration describes a runnable pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }
        if self.aggregator.receive_timeout_ms == 0
            || self.telemetry.tick_period_ms == 0
            || self.telemetry.log_interval_ms == 0
        {
            return Err(ConfigError::ZeroInterval);
        }

        let mut seen_tags = [false; MAX_TASKS];
        let mut seen_sources = [false; Source::POLL_ORDER.len()];
        let mut aggregators = 0u8;

        for task in &self.tasks {
            let tag = task.tag.value();
            let index = task.tag.index().ok_or(ConfigError::InvalidTag(tag))?;
            if core::mem::replace(&mut seen_tags[index], true) {
                return Err(ConfigError::DuplicateTag(tag));
            }
            if task.period_ms == 0 {
                return Err(ConfigError::ZeroPeriod(tag));
            }

            match task.behavior {
                Behavior::EdgeDetector => {
                    if task.input.is_none() {
                        return Err(ConfigError::MissingInput(tag));
                    }
                    if matches!(task.source(), None | Some(Source::Heartbeat)) {
                        return Err(ConfigError::MissingSource(tag));
                    }
                }
                Behavior::LoadSimulator => {
                    if task.iterations.is_none() {
                        return Err(ConfigError::MissingIterations(tag));
                    }
                }
                Behavior::Aggregator => aggregators += 1,
                Behavior::HeartbeatProducer => {}
            }

            if let Some(source) = task.source() {
                let i = Source::POLL_ORDER
                    .iter()
                    .position(|s| *s == source)
                    .unwrap_or_default();
                if core::mem::replace(&mut seen_sources[i], true) {
                    return Err(ConfigError::DuplicateSource(source));
                }
            }
        }

        if aggregators != 1 {
            return Err(ConfigError::AggregatorCount(aggregators));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tasks.len(), 6);
        assert_eq!(config.serial.baudrate, 115200);

        let load_1 = config.task_by_name("load_1").unwrap();
        assert_eq!(load_1.tag, TaskTag::new(5));
        assert_eq!(load_1.period_ms, 10);
        assert_eq!(load_1.iterations, Some(33_300));

        let load_2 = config.task(TaskTag::new(6)).unwrap();
        assert_eq!(load_2.period_ms, 100);
        assert_eq!(load_2.iterations, Some(79_900));

        let agg = config.aggregator_task().unwrap();
        assert_eq!(agg.period_ms, 20);
        assert_eq!(config.aggregator.receive_timeout_ms, 10);
    }

    #[test]
    fn test_sources_derived() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.task_by_name("button_1").unwrap().source(),
            Some(Source::Button1)
        );
        assert_eq!(
            config.task_by_name("button_2").unwrap().source(),
            Some(Source::Button2)
        );
        assert_eq!(
            config.task_by_name("heartbeat").unwrap().source(),
            Some(Source::Heartbeat)
        );
        assert_eq!(config.task_by_name("load_1").unwrap().source(), None);
    }

    #[test]
    fn test_empty_is_invalid() {
        assert_eq!(PipelineConfig::new().validate(), Err(ConfigError::NoTasks));
    }

    #[test]
    fn test_duplicate_tag() {
        let mut config = PipelineConfig::default();
        config.tasks[5].tag = TaskTag::new(5);
        assert_eq!(config.validate(), Err(ConfigError::DuplicateTag(5)));
    }

    #[test]
    fn test_untagged_task_rejected() {
        let mut config = PipelineConfig::default();
        config.tasks[0].tag = TaskTag::UNTAGGED;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTag(0)));
    }

    #[test]
    fn test_zero_period() {
        let mut config = PipelineConfig::default();
        config.tasks[2].period_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod(3)));
    }

    #[test]
    fn test_duplicate_source() {
        let mut config = PipelineConfig::default();
        config.tasks[1].source = Some(Source::Button1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateSource(Source::Button1))
        );
    }

    #[test]
    fn test_edge_detector_needs_button_channel() {
        let mut config = PipelineConfig::default();
        config.tasks[0].name = String::try_from("left").unwrap();
        assert_eq!(config.validate(), Err(ConfigError::MissingSource(1)));

        config.tasks[0].source = Some(Source::Heartbeat);
        assert_eq!(config.validate(), Err(ConfigError::MissingSource(1)));
    }

    #[test]
    fn test_missing_pins_and_iterations() {
        let mut config = PipelineConfig::default();
        config.tasks[0].input = None;
        assert_eq!(config.validate(), Err(ConfigError::MissingInput(1)));

        let mut config = PipelineConfig::default();
        config.tasks[4].iterations = None;
        assert_eq!(config.validate(), Err(ConfigError::MissingIterations(5)));
    }

    #[test]
    fn test_exactly_one_aggregator() {
        let mut config = PipelineConfig::default();
        config.tasks.retain(|t| t.behavior != Behavior::Aggregator);
        assert_eq!(config.validate(), Err(ConfigError::AggregatorCount(0)));

        let mut config = PipelineConfig::default();
        config.tasks[5] = TaskConfig::new("agg_2", 6, Behavior::Aggregator, 20);
        assert_eq!(config.validate(), Err(ConfigError::AggregatorCount(2)));
    }

    #[test]
    fn test_long_name_truncated() {
        let task = TaskConfig::new("a_very_long_task_name", 1, Behavior::LoadSimulator, 10);
        assert_eq!(task.name.len(), MAX_NAME_LEN);
        assert_eq!(task.descriptor().name, "a_very_long_task");
    }
}
