//! Pipeline task behaviours
//!
//! Each behaviour supplies the body a task runs once per release. The
//! bodies are plain state machines; waiting for the next release is left to
//! the runtime that drives them.

pub mod aggregator;
pub mod edge;
pub mod event;
pub mod heartbeat;
pub mod load;

pub use aggregator::{format_load_line, render, Aggregator, PollSummary};
pub use edge::{classify, EdgeDetector};
pub use event::{Delivery, Event, Source};
pub use heartbeat::HeartbeatProducer;
pub use load::LoadSimulator;
