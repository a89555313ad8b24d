//! Embassy async tasks
//!
//! Each pipeline task runs independently and communicates only through the
//! single-slot channels. Tagged tasks run their body through [`traced`] so
//! every poll is reported to the switch hooks.

pub mod aggregator;
pub mod button;
pub mod heartbeat;
pub mod load;
pub mod periodic;
pub mod tick;

use core::future::Future;
use core::pin::pin;

use pacer_core::runtime::{TaskTag, Traced};

use crate::telemetry::{TraceHooks, CLOCK};

pub use aggregator::aggregator_task;
pub use button::button_task;
pub use heartbeat::heartbeat_task;
pub use load::load_task;
pub use tick::tick_task;

/// Run `body` as task `tag`, reporting each poll to `hooks`
pub async fn traced<F: Future>(hooks: &'static TraceHooks, tag: TaskTag, body: F) -> F::Output {
    let body = pin!(body);
    Traced::new(tag, hooks, &CLOCK, body).await
}
