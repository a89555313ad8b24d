//! Pipeline configuration parser
//!
//! A minimal parser for the TOML subset used by `pipeline.toml`. It does
//! NOT support the full TOML grammar.
//!
//! Supported:
//! - `key = value` pairs (basic or literal string, integer, boolean)
//! - `[serial]`, `[aggregator]`, `[telemetry]` and `[task.<name>]` headers
//! - Comments (`# ...`), including trailing ones after headers and values
//!
//! Settings missing from the input keep their defaults. If any `[task.*]`
//! section is present the task list is taken from the input alone;
//! otherwise the default pipeline is kept.

use heapless::String;
use pacer_hal::uart::{DataBits, Parity, StopBits};

use super::types::{PinConfig, PipelineConfig, TaskConfig, MAX_NAME_LEN};
use crate::pipeline::Source;
use crate::runtime::Behavior;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Key not known in its section
    UnknownKey,
    /// Invalid value type
    InvalidValue,
    /// Too many tasks
    TooManyItems,
    /// Invalid pin string
    InvalidPin,
    /// Task section without a `behavior` key
    MissingBehavior,
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Serial,
    Aggregator,
    Telemetry,
    Task(String<MAX_NAME_LEN>),
}

/// Task keys collected before the behaviour is known
#[derive(Default)]
struct TaskDraft {
    tag: Option<u8>,
    behavior: Option<Behavior>,
    period_ms: Option<u32>,
    priority: Option<u8>,
    input: Option<PinConfig>,
    source: Option<Source>,
    activity_pin: Option<PinConfig>,
    iterations: Option<u32>,
}

/// Parse a pipeline configuration
pub fn parse_config(input: &str) -> Result<PipelineConfig, ParseError> {
    let mut config = PipelineConfig::default();
    let mut section = Section::Root;
    let mut draft = TaskDraft::default();
    let mut tasks_replaced = false;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_task(&section, &mut draft, &mut config)?;

            section = parse_section_header(&line[1..line.len() - 1])?;
            if matches!(section, Section::Task(_)) && !tasks_replaced {
                config.tasks.clear();
                tasks_replaced = true;
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        apply_value(&section, key, value, &mut config, &mut draft)?;
    }

    save_task(&section, &mut draft, &mut config)?;
    Ok(config)
}

/// Parse section header like "serial" or "task.button_1"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some(name) = header.strip_prefix("task.") {
        if name.is_empty() || name.contains('.') {
            return Err(ParseError::InvalidSection);
        }
        let name = String::try_from(name).map_err(|_| ParseError::InvalidSection)?;
        return Ok(Section::Task(name));
    }

    match header {
        "serial" => Ok(Section::Serial),
        "aggregator" => Ok(Section::Aggregator),
        "telemetry" => Ok(Section::Telemetry),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Cut a line at the first `#` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return &line[..i],
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut PipelineConfig,
    draft: &mut TaskDraft,
) -> Result<(), ParseError> {
    match section {
        Section::Root => Err(ParseError::UnknownKey),
        Section::Serial => {
            let serial = &mut config.serial;
            match key {
                "baudrate" => serial.baudrate = parse_int(value)?,
                "data_bits" => {
                    serial.data_bits = match parse_int::<u8>(value)? {
                        7 => DataBits::Seven,
                        8 => DataBits::Eight,
                        _ => return Err(ParseError::InvalidValue),
                    }
                }
                "parity" => {
                    serial.parity = match parse_string(value)? {
                        "none" => Parity::None,
                        "even" => Parity::Even,
                        "odd" => Parity::Odd,
                        _ => return Err(ParseError::InvalidValue),
                    }
                }
                "stop_bits" => {
                    serial.stop_bits = match parse_int::<u8>(value)? {
                        1 => StopBits::One,
                        2 => StopBits::Two,
                        _ => return Err(ParseError::InvalidValue),
                    }
                }
                _ => return Err(ParseError::UnknownKey),
            }
            Ok(())
        }
        Section::Aggregator => {
            match key {
                "receive_timeout_ms" => config.aggregator.receive_timeout_ms = parse_int(value)?,
                "load_report_every" => config.aggregator.load_report_every = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
            Ok(())
        }
        Section::Telemetry => {
            let telemetry = &mut config.telemetry;
            match key {
                "tick_pin" => telemetry.tick_pin = Some(parse_pin(value)?),
                "tick_period_ms" => telemetry.tick_period_ms = parse_int(value)?,
                "log_interval_ms" => telemetry.log_interval_ms = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
            Ok(())
        }
        Section::Task(_) => {
            match key {
                "tag" => draft.tag = Some(parse_int(value)?),
                "behavior" => {
                    let name = parse_string(value)?;
                    draft.behavior = Some(Behavior::from_name(name).ok_or(ParseError::InvalidValue)?);
                }
                "period_ms" => draft.period_ms = Some(parse_int(value)?),
                "priority" => draft.priority = Some(parse_int(value)?),
                "input" => draft.input = Some(parse_pin(value)?),
                "source" => {
                    let name = parse_string(value)?;
                    draft.source = Some(Source::from_name(name).ok_or(ParseError::InvalidValue)?);
                }
                "activity_pin" => draft.activity_pin = Some(parse_pin(value)?),
                "iterations" => draft.iterations = Some(parse_int(value)?),
                _ => return Err(ParseError::UnknownKey),
            }
            Ok(())
        }
    }
}

/// Close a `[task.*]` section
fn save_task(
    section: &Section,
    draft: &mut TaskDraft,
    config: &mut PipelineConfig,
) -> Result<(), ParseError> {
    let Section::Task(name) = section else {
        return Ok(());
    };
    let d = core::mem::take(draft);
    let behavior = d.behavior.ok_or(ParseError::MissingBehavior)?;

    // Untagged tasks get the next tag in file order
    let tag = d.tag.unwrap_or(config.tasks.len() as u8 + 1);

    let mut task = TaskConfig::new(name.as_str(), tag, behavior, d.period_ms.unwrap_or(0));
    task.priority = d.priority.unwrap_or(task.priority);
    task.input = d.input;
    task.source = d.source;
    task.activity_pin = d.activity_pin;
    task.iterations = d.iterations;

    config
        .tasks
        .push(task)
        .map_err(|_| ParseError::TooManyItems)
}

/// Parse a string value (removes `"` or `'` quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    let quoted = |q: char| value.len() >= 2 && value.starts_with(q) && value.ends_with(q);
    if quoted('"') || quoted('\'') {
        Ok(&value[1..value.len() - 1])
    } else if value.contains(['"', '\'']) {
        Err(ParseError::InvalidValue)
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: String<24> = String::new();
    for c in value.chars().filter(|c| *c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a pin string like "gpio11", "!gpio12", "^gpio4"
pub fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let mut s = parse_string(value)?;
    let mut inverted = false;
    let mut pull_up = false;

    // Check for modifiers
    loop {
        if let Some(rest) = s.strip_prefix('!') {
            inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let number = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin: u8 = number.parse().map_err(|_| ParseError::InvalidPin)?;

    Ok(PinConfig {
        pin,
        inverted,
        pull_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::runtime::TaskTag;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio11").unwrap();
        assert_eq!(pin.pin, 11);
        assert!(!pin.inverted);
        assert!(!pin.pull_up);

        let pin = parse_pin("!gpio12").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        let pin = parse_pin("\"^!gpio5\"").unwrap();
        assert_eq!(pin.pin, 5);
        assert!(pin.inverted);
        assert!(pin.pull_up);

        assert_eq!(parse_pin("pin5"), Err(ParseError::InvalidPin));
        assert_eq!(parse_pin("gpio"), Err(ParseError::InvalidPin));
        assert_eq!(parse_pin("gpio300"), Err(ParseError::InvalidPin));
    }

    #[test]
    fn test_parse_section_header() {
        match parse_section_header("task.button_1").unwrap() {
            Section::Task(name) => assert_eq!(name.as_str(), "button_1"),
            _ => panic!("Wrong section type"),
        }
        assert!(matches!(parse_section_header(" serial "), Ok(Section::Serial)));
        assert_eq!(
            parse_section_header("task.").unwrap_err(),
            ParseError::InvalidSection
        );
        assert_eq!(
            parse_section_header("display").unwrap_err(),
            ParseError::InvalidSection
        );
    }

    #[test]
    fn test_parse_int_separators() {
        assert_eq!(parse_int::<u32>("33_300"), Ok(33_300));
        assert_eq!(parse_int::<u8>("300"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("# nothing\n\n"), Ok(PipelineConfig::default()));
    }

    #[test]
    fn test_settings_only_keeps_default_tasks() {
        let config = parse_config(
            r#"
[serial]
baudrate = 9600
parity = "even"  # trailing comment
stop_bits = 2

[aggregator]
receive_timeout_ms = 5
load_report_every = 50

[telemetry]
tick_pin = "gpio15"
log_interval_ms = 500
"#,
        )
        .unwrap();

        assert_eq!(config.serial.baudrate, 9600);
        assert_eq!(config.serial.parity, Parity::Even);
        assert_eq!(config.serial.stop_bits, StopBits::Two);
        assert_eq!(config.aggregator.receive_timeout_ms, 5);
        assert_eq!(config.aggregator.load_report_every, 50);
        assert_eq!(config.telemetry.tick_pin, Some(PinConfig::new(15)));
        assert_eq!(config.telemetry.tick_period_ms, 1);
        assert_eq!(config.tasks.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_task_sections_replace_defaults() {
        let config = parse_config(
            r#"
[task.button_1]
behavior = "edge"
tag = 1
period_ms = 25
input = "^!gpio2"
activity_pin = "gpio6"

[task.heartbeat]
behavior = "heartbeat"
tag = 2
period_ms = 100

[task.aggregator]
behavior = "aggregator"
tag = 3
period_ms = 20
priority = 2
"#,
        )
        .unwrap();

        assert_eq!(config.tasks.len(), 3);
        let button = &config.tasks[0];
        assert_eq!(button.behavior, Behavior::EdgeDetector);
        assert_eq!(button.period_ms, 25);
        assert_eq!(button.source(), Some(Source::Button1));
        assert_eq!(
            button.input,
            Some(PinConfig {
                pin: 2,
                inverted: true,
                pull_up: true
            })
        );
        assert_eq!(button.activity_pin, Some(PinConfig::new(6)));
        assert_eq!(config.tasks[2].priority, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_tag_follows_file_order() {
        let config = parse_config(
            r#"
[task.spin]
behavior = "load"
period_ms = 10
iterations = 1000
"#,
        )
        .unwrap();
        assert_eq!(config.tasks[0].tag, TaskTag::new(1));
        // No aggregator in this pipeline
        assert_eq!(config.validate(), Err(ConfigError::AggregatorCount(0)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_config("[task.x]\nperiod_ms = 10\n"),
            Err(ParseError::MissingBehavior)
        );
        assert_eq!(
            parse_config("[serial]\nbaud = 9600\n"),
            Err(ParseError::UnknownKey)
        );
        assert_eq!(
            parse_config("[serial]\ndata_bits = 9\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[task.x]\nbehavior = \"idle\"\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(parse_config("[display]\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("orphan = 1\n"), Err(ParseError::UnknownKey));
        assert_eq!(parse_config("[serial]\nbaudrate\n"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_header_with_trailing_comment() {
        let config = parse_config("[aggregator] # drain settings\nreceive_timeout_ms = 5\n").unwrap();
        assert_eq!(config.aggregator.receive_timeout_ms, 5);
    }

    #[test]
    fn test_literal_strings() {
        let config = parse_config(
            r#"
[serial]
parity = 'odd'

[task.beat]
behavior = 'heartbeat'
period_ms = 100
activity_pin = '!gpio7' # literal pin
"#,
        )
        .unwrap();

        assert_eq!(config.serial.parity, Parity::Odd);
        assert_eq!(config.tasks[0].behavior, Behavior::HeartbeatProducer);
        assert_eq!(
            config.tasks[0].activity_pin,
            Some(PinConfig {
                pin: 7,
                inverted: true,
                pull_up: false
            })
        );
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        assert_eq!(strip_comment("name = \"a#b\" # note"), "name = \"a#b\" ");
        assert_eq!(strip_comment("name = 'a#b'"), "name = 'a#b'");
        assert_eq!(parse_string("'mixed\""), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_too_many_tasks() {
        let mut input = std::string::String::new();
        for i in 0..9 {
            input.push_str(&format!(
                "[task.load_{i}]\nbehavior = \"load\"\nperiod_ms = 10\niterations = 1\n"
            ));
        }
        assert_eq!(parse_config(&input), Err(ParseError::TooManyItems));
    }
}
