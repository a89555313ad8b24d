//! Build script for pacer-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates pipeline.toml at compile time

use std::collections::BTreeSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Highest task tag with an accounting record
const MAX_TAG: i64 = 8;

/// Known task behaviours
const BEHAVIORS: [&str; 4] = ["edge", "heartbeat", "load", "aggregator"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate pipeline.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=pipeline.toml");

    let config_path = Path::new("pipeline.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: pipeline.toml not found!                                 ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a pipeline.toml configuration file.         ║\n\
            ║  Please create one in the pacer-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read pipeline.toml                             ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in pipeline.toml                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_tasks(&config, &mut errors);
    validate_pins(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid pipeline configuration                           ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=pipeline.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only known top-level sections
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.as_table() else {
        return;
    };
    for key in table.keys() {
        if !["serial", "aggregator", "telemetry", "task"].contains(&key.as_str()) {
            errors.push(format!("Unknown section [{}]", key));
        }
    }

    if let Some(toml::Value::Integer(every)) = config
        .get("aggregator")
        .and_then(|a| a.get("load_report_every"))
    {
        if *every < 0 || *every > u16::MAX as i64 {
            errors.push("[aggregator] load_report_every must be 0-65535".to_string());
        }
    }
}

/// Task tags, behaviours and per-behaviour keys
fn validate_tasks(config: &toml::Value, errors: &mut Vec<String>) {
    let tasks = match config.get("task") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[task] must contain [task.<name>] tables".to_string());
            return;
        }
        // Default pipeline
        None => return,
    };

    let mut tags = BTreeSet::new();
    let mut aggregators = 0;

    for (name, task) in tasks {
        let task = match task {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[task.{}] must be a table", name));
                continue;
            }
        };

        if name.len() > 16 {
            errors.push(format!("[task.{}] name longer than 16 characters", name));
        }

        match task.get("tag") {
            Some(toml::Value::Integer(tag)) if (1..=MAX_TAG).contains(tag) => {
                if !tags.insert(*tag) {
                    errors.push(format!("[task.{}] tag {} used twice", name, tag));
                }
            }
            Some(_) => errors.push(format!("[task.{}] tag must be 1-{}", name, MAX_TAG)),
            None => {}
        }

        match task.get("period_ms") {
            Some(toml::Value::Integer(p)) if *p > 0 => {}
            _ => errors.push(format!("[task.{}] missing or zero 'period_ms'", name)),
        }

        let behavior = match task.get("behavior") {
            Some(toml::Value::String(b)) if BEHAVIORS.contains(&b.as_str()) => b.as_str(),
            Some(_) => {
                errors.push(format!(
                    "[task.{}] behavior must be one of {}",
                    name,
                    BEHAVIORS.join(", ")
                ));
                continue;
            }
            None => {
                errors.push(format!("[task.{}] missing 'behavior'", name));
                continue;
            }
        };

        match behavior {
            "edge" if task.get("input").is_none() => {
                errors.push(format!("[task.{}] edge detector needs 'input'", name));
            }
            "load" if task.get("iterations").is_none() => {
                errors.push(format!("[task.{}] load simulator needs 'iterations'", name));
            }
            "aggregator" => aggregators += 1,
            _ => {}
        }
    }

    if aggregators != 1 {
        errors.push(format!("Exactly one aggregator task required, found {}", aggregators));
    }
}

/// Pin strings are `gpioN` with optional `!`/`^`, unique, and not GPIO 0/1
fn validate_pins(config: &toml::Value, errors: &mut Vec<String>) {
    let mut pins: Vec<(String, &str)> = Vec::new();

    if let Some(toml::Value::String(pin)) = config.get("telemetry").and_then(|t| t.get("tick_pin")) {
        pins.push(("[telemetry] tick_pin".to_string(), pin.as_str()));
    }
    if let Some(toml::Value::Table(tasks)) = config.get("task") {
        for (name, task) in tasks {
            for key in ["input", "activity_pin"] {
                if let Some(toml::Value::String(pin)) = task.get(key) {
                    pins.push((format!("[task.{}] {}", name, key), pin.as_str()));
                }
            }
        }
    }

    let mut used = BTreeSet::new();
    for (owner, pin) in pins {
        let number = pin
            .trim_start_matches(['!', '^'])
            .strip_prefix("gpio")
            .and_then(|n| n.parse::<u8>().ok());
        match number {
            Some(n) if n < 2 => errors.push(format!("{} uses GPIO{} (serial link)", owner, n)),
            Some(n) if n >= 30 => errors.push(format!("{} GPIO{} does not exist", owner, n)),
            Some(n) => {
                if !used.insert(n) {
                    errors.push(format!("{} GPIO{} already in use", owner, n));
                }
            }
            None => errors.push(format!("{} invalid pin '{}'", owner, pin)),
        }
    }
}
