//! Event vocabulary: keys, selectors, payloads and the filter table.
//!
//! Panels subscribe with an [`EventSelector`]; the dispatcher matches each
//! emitted event against the [`FilterTable`] and queues a [`Delivery`] on
//! the owning panel's queue.

mod filter;
mod keys;
mod payload;
mod selector;

pub use filter::{Filter, FilterTable};
pub use keys::Keys;
pub use payload::{Delivery, EventId, EventPayload, PanelEvent};
pub use selector::{EventCategory, EventSelector};
