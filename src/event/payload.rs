//! Event payloads and queue items.

use super::keys::Keys;
use crate::panel::PanelId;
use std::time::Duration;

/// Process-wide unique id of an event filter.
///
/// Ids start at 1 and are never reused while the process runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct EventId(pub(crate) u32);

impl EventId {
    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Panel lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// The panel is now the settled, active panel.
    Focus,
    /// The panel was covered by a newly pushed panel.
    Blur,
}

/// Data carried by a dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// A render tick.
    Render {
        /// Frame number since the I/O driver started.
        frame: u64,
        /// Time of the tick since the I/O driver started.
        now: Duration,
    },
    /// A keypad sample that changed state.
    Keys {
        /// Keys currently held down.
        down: Keys,
        /// Keys that changed since the previous sample.
        changed: Keys,
    },
    /// Opaque message bytes.
    Message(Vec<u8>),
    /// A lifecycle event about a panel.
    Panel {
        /// The panel gaining or losing focus.
        id: PanelId,
        /// Which lifecycle event.
        event: PanelEvent,
    },
}

/// A queued dispatch: which filter fired, and with what.
///
/// The handler itself stays with the owning panel, keyed by `event`.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The filter that matched.
    pub event: EventId,
    /// The event data.
    pub payload: EventPayload,
}
