//! Pipeline configuration
//!
//! Typed configuration plus a small `no_std` parser for the TOML subset the
//! firmware embeds.

pub mod parse;
pub mod types;

pub use parse::{parse_config, parse_pin, ParseError};
pub use types::*;
