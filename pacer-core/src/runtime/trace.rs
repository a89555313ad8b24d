//! Task switch tracing
//!
//! On a cooperative executor a task occupies the CPU exactly while its
//! future is being polled. [`Traced`] wraps a task body and reports a
//! switch-in before every poll and a switch-out after it, stamped by a
//! [`Clock`]. The hooks are delivered to [`SwitchObserver`]s such as the
//! CPU-load accountant.
//!
//! Hooks run in the switch path: observers must not block or allocate, and
//! a hook that cannot take its observer skips the event rather than wait.

use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::task::TaskTag;

/// Monotonic time source (µs)
pub trait Clock {
    fn now_us(&self) -> u64;
}

/// Receiver of switch events
pub trait SwitchObserver {
    /// Task `tag` is about to occupy the CPU
    fn on_switch_in(&mut self, tag: TaskTag, now: u64);

    /// Task `tag` stopped occupying the CPU
    fn on_switch_out(&mut self, tag: TaskTag, now: u64);
}

/// Shared entry point the runtime calls on every switch
pub trait SwitchHooks {
    fn switch_in(&self, tag: TaskTag, now: u64);
    fn switch_out(&self, tag: TaskTag, now: u64);
}

impl<M: RawMutex, T: SwitchObserver> SwitchHooks for Mutex<M, RefCell<T>> {
    fn switch_in(&self, tag: TaskTag, now: u64) {
        self.lock(|cell| {
            if let Ok(mut observer) = cell.try_borrow_mut() {
                observer.on_switch_in(tag, now);
            }
        });
    }

    fn switch_out(&self, tag: TaskTag, now: u64) {
        self.lock(|cell| {
            if let Ok(mut observer) = cell.try_borrow_mut() {
                observer.on_switch_out(tag, now);
            }
        });
    }
}

impl<A: SwitchHooks, B: SwitchHooks> SwitchHooks for (A, B) {
    fn switch_in(&self, tag: TaskTag, now: u64) {
        self.0.switch_in(tag, now);
        self.1.switch_in(tag, now);
    }

    fn switch_out(&self, tag: TaskTag, now: u64) {
        self.0.switch_out(tag, now);
        self.1.switch_out(tag, now);
    }
}

impl<T: SwitchHooks + ?Sized> SwitchHooks for &T {
    fn switch_in(&self, tag: TaskTag, now: u64) {
        (**self).switch_in(tag, now);
    }

    fn switch_out(&self, tag: TaskTag, now: u64) {
        (**self).switch_out(tag, now);
    }
}

/// Task body wrapped with switch hooks
///
/// The body is borrowed pinned, so callers pin it on their own stack:
///
/// ```ignore
/// let body = core::pin::pin!(async { /* ... */ });
/// Traced::new(tag, &HOOKS, &CLOCK, body).await
/// ```
pub struct Traced<'a, H: ?Sized, C: ?Sized, F> {
    tag: TaskTag,
    hooks: &'a H,
    clock: &'a C,
    body: Pin<&'a mut F>,
}

impl<'a, H, C, F> Traced<'a, H, C, F>
where
    H: SwitchHooks + ?Sized,
    C: Clock + ?Sized,
    F: Future,
{
    pub fn new(tag: TaskTag, hooks: &'a H, clock: &'a C, body: Pin<&'a mut F>) -> Self {
        Self {
            tag,
            hooks,
            clock,
            body,
        }
    }

    pub fn tag(&self) -> TaskTag {
        self.tag
    }
}

impl<H, C, F> Future for Traced<'_, H, C, F>
where
    H: SwitchHooks + ?Sized,
    C: Clock + ?Sized,
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.hooks.switch_in(this.tag, this.clock.now_us());
        let poll = this.body.as_mut().poll(cx);
        this.hooks.switch_out(this.tag, this.clock.now_us());
        poll
    }
}
