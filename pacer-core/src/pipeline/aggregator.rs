//! Aggregator
//!
//! Drains the three single-slot channels once per release, in fixed order
//! (heartbeat, button 1, button 2), and writes one text line per received
//! event to the serial link. Every `report_every` releases it can also emit
//! the current CPU load.

use core::fmt::Write as _;
use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use pacer_hal::UartTx;

use super::event::{Event, Source};
use crate::accounting::LoadSnapshot;
use crate::channel::Slots;

/// Serial line for an event received from `source`
///
/// Only the combinations the producers can emit have a line; anything else
/// renders nothing.
pub fn render(source: Source, event: Event) -> Option<&'static str> {
    match (source, event) {
        (Source::Heartbeat, Event::Heartbeat) => Some("I'm Task 3\n"),
        (Source::Button1, Event::Rising) => Some("Btn(1)Rising\n"),
        (Source::Button1, Event::Falling) => Some("Btn(1)Falling\n"),
        (Source::Button2, Event::Rising) => Some("Btn(2)Rising\n"),
        (Source::Button2, Event::Falling) => Some("Btn(2)Falling\n"),
        _ => None,
    }
}

/// Serial line reporting system load, e.g. `CPU load: 42.5%\n`
pub fn format_load_line(snapshot: &LoadSnapshot) -> String<32> {
    let mut line = String::new();
    // 32 bytes always fits "CPU load: 100.0%\n"
    let _ = write!(line, "CPU load: {:.1}%\n", snapshot.load_percent);
    line
}

/// Outcome of one aggregator release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSummary {
    /// Events taken from the channels
    pub received: u8,
    /// Lines written to the serial link
    pub rendered: u8,
    /// Lines the serial link refused
    pub write_errors: u8,
}

/// Aggregator state
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Aggregator {
    /// Releases between load reports (0 disables them)
    report_every: u16,
    /// Releases since the last load report
    since_report: u16,
    /// Total events forwarded
    forwarded: u32,
}

impl Aggregator {
    /// Create an aggregator reporting load every `report_every` releases
    pub const fn new(report_every: u16) -> Self {
        Self {
            report_every,
            since_report: 0,
            forwarded: 0,
        }
    }

    /// Total events forwarded to the serial link
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }

    /// Per-release body: drain every channel into `serial`
    ///
    /// Each channel is given its own `timeout()` future to wait on. A write
    /// failure loses that line only; the remaining channels are still
    /// drained.
    pub async fn poll<M, U, F, T>(
        &mut self,
        slots: &Slots<M>,
        serial: &mut U,
        mut timeout: F,
    ) -> PollSummary
    where
        M: RawMutex,
        U: UartTx,
        F: FnMut() -> T,
        T: Future,
    {
        let mut summary = PollSummary::default();

        for source in Source::POLL_ORDER {
            let Some(event) = slots.slot(source).receive_within(timeout()).await else {
                continue;
            };
            summary.received += 1;

            let Some(line) = render(source, event) else {
                continue;
            };
            match serial.write_line(line) {
                Ok(()) => {
                    summary.rendered += 1;
                    self.forwarded = self.forwarded.wrapping_add(1);
                }
                Err(_) => summary.write_errors += 1,
            }
        }

        self.since_report = self.since_report.saturating_add(1);
        summary
    }

    /// Check if a load report is due after this release
    pub fn load_report_due(&self) -> bool {
        self.report_every != 0 && self.since_report >= self.report_every
    }

    /// Write the load line and restart the report countdown
    ///
    /// Returns false if the serial link refused the line.
    pub fn report_load<U: UartTx>(&mut self, snapshot: &LoadSnapshot, serial: &mut U) -> bool {
        self.since_report = 0;
        serial.write_line(&format_load_line(snapshot)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::future::ready;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[derive(Default)]
    struct Serial {
        out: std::string::String,
        fail: bool,
    }

    impl UartTx for Serial {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.out.push_str(core::str::from_utf8(data).map_err(|_| ())?);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    fn poll(agg: &mut Aggregator, slots: &Slots<NoopRawMutex>, serial: &mut Serial) -> PollSummary {
        block_on(agg.poll(slots, serial, || ready(())))
    }

    #[test]
    fn test_render_table() {
        assert_eq!(render(Source::Heartbeat, Event::Heartbeat), Some("I'm Task 3\n"));
        assert_eq!(render(Source::Button1, Event::Rising), Some("Btn(1)Rising\n"));
        assert_eq!(render(Source::Button1, Event::Falling), Some("Btn(1)Falling\n"));
        assert_eq!(render(Source::Button2, Event::Rising), Some("Btn(2)Rising\n"));
        assert_eq!(render(Source::Button2, Event::Falling), Some("Btn(2)Falling\n"));
    }

    #[test]
    fn test_render_mismatch_is_silent() {
        assert_eq!(render(Source::Heartbeat, Event::Rising), None);
        assert_eq!(render(Source::Button1, Event::Heartbeat), None);
        assert_eq!(render(Source::Button2, Event::None), None);
    }

    #[test]
    fn test_poll_in_fixed_order() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial::default();
        let mut agg = Aggregator::new(0);

        slots.button_2.send(Event::Falling).unwrap();
        slots.button_1.send(Event::Rising).unwrap();
        slots.heartbeat.send(Event::Heartbeat).unwrap();

        let summary = poll(&mut agg, &slots, &mut serial);
        assert_eq!(serial.out, "I'm Task 3\nBtn(1)Rising\nBtn(2)Falling\n");
        assert_eq!(
            summary,
            PollSummary {
                received: 3,
                rendered: 3,
                write_errors: 0
            }
        );
        assert_eq!(agg.forwarded(), 3);
    }

    #[test]
    fn test_quiet_period_writes_nothing() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial::default();
        let mut agg = Aggregator::new(0);

        let summary = poll(&mut agg, &slots, &mut serial);
        assert_eq!(summary, PollSummary::default());
        assert!(serial.out.is_empty());
    }

    #[test]
    fn test_only_heartbeat_pending() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial::default();
        let mut agg = Aggregator::new(0);

        slots.heartbeat.send(Event::Heartbeat).unwrap();
        poll(&mut agg, &slots, &mut serial);
        assert_eq!(serial.out, "I'm Task 3\n");
        assert!(!slots.heartbeat.is_occupied());
    }

    #[test]
    fn test_mismatched_event_is_consumed_but_not_written() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial::default();
        let mut agg = Aggregator::new(0);

        slots.heartbeat.send(Event::Rising).unwrap();
        let summary = poll(&mut agg, &slots, &mut serial);

        assert_eq!(summary.received, 1);
        assert_eq!(summary.rendered, 0);
        assert!(serial.out.is_empty());
        assert!(!slots.heartbeat.is_occupied());
    }

    #[test]
    fn test_write_error_keeps_draining() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial {
            fail: true,
            ..Default::default()
        };
        let mut agg = Aggregator::new(0);

        slots.heartbeat.send(Event::Heartbeat).unwrap();
        slots.button_1.send(Event::Falling).unwrap();
        let summary = poll(&mut agg, &slots, &mut serial);

        assert_eq!(summary.received, 2);
        assert_eq!(summary.write_errors, 2);
        assert!(!slots.button_1.is_occupied());
        assert_eq!(agg.forwarded(), 0);
    }

    #[test]
    fn test_load_report_cadence() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial::default();
        let mut agg = Aggregator::new(3);

        for _ in 0..2 {
            poll(&mut agg, &slots, &mut serial);
            assert!(!agg.load_report_due());
        }
        poll(&mut agg, &slots, &mut serial);
        assert!(agg.load_report_due());

        let snapshot = LoadSnapshot {
            system_time: 1_000,
            load_percent: 42.5,
        };
        assert!(agg.report_load(&snapshot, &mut serial));
        assert_eq!(serial.out, "CPU load: 42.5%\n");
        assert!(!agg.load_report_due());
    }

    #[test]
    fn test_load_report_disabled() {
        let slots: Slots<NoopRawMutex> = Slots::new();
        let mut serial = Serial::default();
        let mut agg = Aggregator::new(0);

        for _ in 0..10 {
            poll(&mut agg, &slots, &mut serial);
        }
        assert!(!agg.load_report_due());
    }

    #[test]
    fn test_format_load_line() {
        let full = LoadSnapshot {
            system_time: 10,
            load_percent: 100.0,
        };
        assert_eq!(format_load_line(&full).as_str(), "CPU load: 100.0%\n");
        assert_eq!(
            format_load_line(&LoadSnapshot::default()).as_str(),
            "CPU load: 0.0%\n"
        );
    }
}
