//! I/O driver: the frame loop that feeds the dispatcher.
//!
//! Once per frame the driver advances the scene, emits a render tick, and
//! samples the keypad, emitting a key change whenever the sample differs
//! from the previous one. It runs on its own thread so panels never pace
//! the frame loop.

mod keypad;

pub use keypad::{map_key, HoldTracker, Keypad, TerminalKeypad};

use crate::dispatch::Dispatcher;
use crate::error::{Error, Resource, Result};
use crate::event::Keys;
use log::{debug, error};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Frame loop actor.
pub struct IoDriver {
    /// Handle to the driver thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Frames emitted so far.
    frames: Arc<AtomicU64>,
}

impl IoDriver {
    /// Spawn the driver thread, ticking at the dispatcher's frame interval.
    pub fn spawn<K>(dispatcher: Dispatcher, keypad: K) -> Result<Self>
    where
        K: Keypad + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let frames = Arc::new(AtomicU64::new(0));
        let shutdown_clone = shutdown.clone();
        let frames_clone = frames.clone();

        let handle = thread::Builder::new()
            .name("panel-io".to_string())
            .spawn(move || {
                Self::run_loop(&dispatcher, keypad, &shutdown_clone, &frames_clone);
            })
            .map_err(|e| {
                error!("failed to spawn I/O driver: {e}");
                Error::ResourceExhausted {
                    resource: Resource::Task,
                }
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            frames,
        })
    }

    /// Frames emitted so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Signal the driver to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the driver thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// One frame: scene, render tick, keypad.
    fn frame(dispatcher: &Dispatcher, keypad: &mut impl Keypad, last_keys: &mut Keys, now: Duration) {
        dispatcher.scene().advance(now);
        dispatcher.emit_render_tick(now);

        let keys = keypad.sample();
        if keys != *last_keys {
            dispatcher.emit_key_change(keys);
            *last_keys = keys;
        }
    }

    /// Main frame loop.
    fn run_loop(
        dispatcher: &Dispatcher,
        mut keypad: impl Keypad,
        shutdown: &AtomicBool,
        frames: &AtomicU64,
    ) {
        let interval = dispatcher.config().frame_interval;
        let start = Instant::now();
        let mut next_tick = start + interval;
        let mut last_keys = Keys::empty();

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let now = Instant::now();
            if now >= next_tick {
                Self::frame(dispatcher, &mut keypad, &mut last_keys, now - start);
                frames.fetch_add(1, Ordering::Relaxed);

                next_tick += interval;

                // Behind schedule: skip frames instead of bursting
                if next_tick < now {
                    next_tick = now + interval;
                }
            } else {
                let sleep_duration = next_tick - now;
                thread::sleep(sleep_duration.min(Duration::from_millis(1)));
            }
        }
        debug!("I/O driver stopped after {} frames", frames.load(Ordering::Relaxed));
    }
}

impl Drop for IoDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
