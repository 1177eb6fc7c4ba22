//! Error types for the panel runtime.

use crate::panel::PanelId;

/// The bounded resource that ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Every slot of the event filter table is in use.
    FilterSlot,
    /// A panel task could not be started or died during setup.
    Task,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A fixed-capacity resource is full.
    ResourceExhausted,
    /// A target queue was full; the event was dropped.
    DeliveryDropped,
    /// The operation is not valid in the current state.
    InvalidOperation,
}

/// Panel runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A fixed-capacity resource is full.
    #[error("resource exhausted: {resource:?}")]
    ResourceExhausted {
        /// Which resource ran out.
        resource: Resource,
    },

    /// The destination queue was full.
    #[error("delivery dropped: queue full")]
    DeliveryDropped,

    /// The operation is not valid in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// The panel is not (or no longer) on the stack.
    #[error("unknown panel {0}")]
    UnknownPanel(PanelId),
}

impl Error {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            Self::DeliveryDropped => ErrorKind::DeliveryDropped,
            Self::InvalidOperation(_) | Self::UnknownPanel(_) => ErrorKind::InvalidOperation,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
