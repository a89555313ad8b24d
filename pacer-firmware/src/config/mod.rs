//! Configuration loading
//!
//! The pipeline configuration is compiled in from `pipeline.toml`.

mod loader;

pub use loader::load;
