//! Runtime configuration.
//!
//! All capacities, timeouts and screen geometry used by the dispatcher and
//! the panel runtime live here so they can be tuned in one place.

use std::time::Duration;

/// Number of filter slots in the reference device.
pub const FILTER_CAPACITY: usize = 32;

/// Depth of each panel's incoming queue.
pub const QUEUE_CAPACITY: usize = 8;

/// Screen edge length in pixels (the display is square).
pub const SCREEN_SIZE: i32 = 240;

/// Configuration for the [`Dispatcher`](crate::Dispatcher) and the panel tasks.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of live event filters.
    pub filter_capacity: usize,
    /// Capacity of each panel's bounded event queue.
    pub queue_capacity: usize,
    /// Periodic wake-up of an idle panel event loop.
    pub wake_interval: Duration,
    /// How long key, message and lifecycle deliveries may wait on a full queue.
    pub send_timeout: Duration,
    /// Duration of panel entry and exit animations.
    pub transition: Duration,
    /// Screen width in pixels.
    pub screen_width: i32,
    /// Screen height in pixels.
    pub screen_height: i32,
    /// Frame period of the I/O driver.
    pub frame_interval: Duration,
    /// Consecutive render drops after which the drop warning repeats.
    pub drop_log_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter_capacity: FILTER_CAPACITY,
            queue_capacity: QUEUE_CAPACITY,
            wake_interval: Duration::from_millis(1000),
            send_timeout: Duration::from_millis(20),
            transition: Duration::from_millis(300),
            screen_width: SCREEN_SIZE,
            screen_height: SCREEN_SIZE,
            frame_interval: Duration::from_secs(1) / 60,
            drop_log_threshold: 100,
        }
    }
}

impl Config {
    /// Set the filter table capacity.
    #[must_use]
    pub const fn with_filter_capacity(mut self, capacity: usize) -> Self {
        self.filter_capacity = capacity;
        self
    }

    /// Set the per-panel queue capacity (at least 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the idle wake interval of panel event loops.
    #[must_use]
    pub const fn with_wake_interval(mut self, interval: Duration) -> Self {
        self.wake_interval = interval;
        self
    }

    /// Set the bounded wait used for non-render deliveries.
    #[must_use]
    pub const fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the transition animation duration.
    #[must_use]
    pub const fn with_transition(mut self, duration: Duration) -> Self {
        self.transition = duration;
        self
    }

    /// Set the I/O driver frame period.
    #[must_use]
    pub const fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}
