//! Events carried between tasks

/// Observation produced by a task and carried through a single-slot channel
///
/// One byte on the wire. The discriminants are the codes used on the serial
/// link and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Event {
    /// Nothing happened this period (never sent)
    #[default]
    None = 0,
    /// Periodic heartbeat token
    Heartbeat = 1,
    /// Input went from low to high
    Rising = 2,
    /// Input went from high to low
    Falling = 3,
}

impl Event {
    /// Wire code of this event
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Event::None),
            1 => Some(Event::Heartbeat),
            2 => Some(Event::Rising),
            3 => Some(Event::Falling),
            _ => None,
        }
    }

    /// Check if this is an input edge
    pub fn is_edge(&self) -> bool {
        matches!(self, Event::Rising | Event::Falling)
    }

    /// Check if this event carries nothing
    pub fn is_none(&self) -> bool {
        matches!(self, Event::None)
    }
}

/// Channel an event travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// Heartbeat producer
    Heartbeat,
    /// First digital input
    Button1,
    /// Second digital input
    Button2,
}

impl Source {
    /// Order in which the aggregator drains the channels
    pub const POLL_ORDER: [Source; 3] = [Source::Heartbeat, Source::Button1, Source::Button2];

    /// Configuration name of this source
    pub fn name(&self) -> &'static str {
        match self {
            Source::Heartbeat => "heartbeat",
            Source::Button1 => "button_1",
            Source::Button2 => "button_2",
        }
    }

    /// Look up a source by configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Source::POLL_ORDER.into_iter().find(|s| s.name() == name)
    }
}

/// What a producer's release did with its event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// Nothing to send this period
    Idle,
    /// Event stored in the channel
    Sent(Event),
    /// Channel was occupied, event dropped
    Dropped(Event),
}
