//! Embedded configuration loader
//!
//! Parses and validates the embedded `pipeline.toml`. Falls back to the
//! default pipeline if either step fails.

use defmt::*;

use pacer_core::config::{parse_config, PipelineConfig};

/// Load the pipeline configuration from `source`
pub fn load(source: &str) -> PipelineConfig {
    let config = match parse_config(source) {
        Ok(config) => config,
        Err(e) => {
            // build.rs validates the file, so this only happens when the
            // two disagree about the format
            error!("Failed to parse embedded config: {}", e);
            error!("Using default pipeline");
            return fallback();
        }
    };

    if let Err(e) = config.validate() {
        error!("Embedded config rejected: {}", e);
        error!("Using default pipeline");
        return fallback();
    }

    info!("Parsed embedded configuration successfully");
    log_config_summary(&config);
    config
}

fn fallback() -> PipelineConfig {
    let config = PipelineConfig::default();
    log_config_summary(&config);
    config
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &PipelineConfig) {
    info!(
        "{} tasks, serial {} baud, receive timeout {} ms",
        config.tasks.len(),
        config.serial.baudrate,
        config.aggregator.receive_timeout_ms
    );
    for task in &config.tasks {
        debug!(
            "  [{}] {} {} every {} ms, priority {}",
            task.tag.value(),
            task.name.as_str(),
            task.behavior.name(),
            task.period_ms,
            task.priority
        );
    }
}
