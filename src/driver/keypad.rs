//! Keypad collaborator.
//!
//! The device keypad debounces its buttons and reports the held set. On a
//! host, [`TerminalKeypad`] stands in for it: a thread polls terminal key
//! events and [`HoldTracker`] turns them back into a held set.

use crate::event::Keys;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Source of debounced key samples.
pub trait Keypad: Send {
    /// Keys held right now.
    fn sample(&mut self) -> Keys;
}

impl<F> Keypad for F
where
    F: FnMut() -> Keys + Send,
{
    fn sample(&mut self) -> Keys {
        self()
    }
}

/// Map a terminal key to a device key.
pub const fn map_key(code: KeyCode) -> Option<Keys> {
    Some(match code {
        KeyCode::Up | KeyCode::Char('w') => Keys::NORTH,
        KeyCode::Right | KeyCode::Char('d') => Keys::EAST,
        KeyCode::Down | KeyCode::Char('s') => Keys::SOUTH,
        KeyCode::Left | KeyCode::Char('a') => Keys::WEST,
        KeyCode::Enter | KeyCode::Char(' ') => Keys::OK,
        KeyCode::Esc | KeyCode::Backspace => Keys::CANCEL,
        _ => return None,
    })
}

/// A terminal key transition.
#[derive(Debug, Clone, Copy)]
enum KeyEdge {
    Down(Keys, Instant),
    Up(Keys),
}

/// Rebuilds a held-key set from press/repeat/release events.
///
/// Terminals without release reporting only send presses and auto-repeats,
/// so a key counts as held until `hold` passes without a repeat.
#[derive(Debug, Clone)]
pub struct HoldTracker {
    hold: Duration,
    last_seen: [Option<Instant>; 16],
}

impl HoldTracker {
    /// Track keys, releasing them `hold` after their last press or repeat.
    pub const fn new(hold: Duration) -> Self {
        Self {
            hold,
            last_seen: [None; 16],
        }
    }

    /// Record a press or repeat of `keys` at `at`.
    pub fn press(&mut self, keys: Keys, at: Instant) {
        for bit in 0..16 {
            if keys.bits() & (1 << bit) != 0 {
                self.last_seen[bit] = Some(at);
            }
        }
    }

    /// Record an explicit release of `keys`.
    pub fn release(&mut self, keys: Keys) {
        for bit in 0..16 {
            if keys.bits() & (1 << bit) != 0 {
                self.last_seen[bit] = None;
            }
        }
    }

    /// Keys considered held at `now`.
    pub fn held(&mut self, now: Instant) -> Keys {
        let mut held = 0u16;
        for (bit, seen) in self.last_seen.iter_mut().enumerate() {
            match seen {
                Some(at) if now.saturating_duration_since(*at) < self.hold => held |= 1 << bit,
                Some(_) => *seen = None,
                None => {}
            }
        }
        Keys::from_bits_truncate(held)
    }
}

/// Keypad backed by terminal input.
///
/// The terminal should be in raw mode for key events to arrive unbuffered.
pub struct TerminalKeypad {
    /// Handle to the polling thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    edges: Receiver<KeyEdge>,
    tracker: HoldTracker,
}

impl TerminalKeypad {
    /// Spawn the polling thread.
    ///
    /// * `poll_timeout` - How long to wait for events before checking shutdown.
    /// * `hold` - How long a press without repeat or release counts as held.
    pub fn spawn(poll_timeout: Duration, hold: Duration) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let (tx, rx) = unbounded();

        let handle = thread::Builder::new()
            .name("panel-keypad".to_string())
            .spawn(move || {
                Self::run_loop(&tx, &shutdown_clone, poll_timeout);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            edges: rx,
            tracker: HoldTracker::new(hold),
        })
    }

    /// Signal the polling thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the polling thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main input polling loop.
    fn run_loop(sender: &Sender<KeyEdge>, shutdown: &AtomicBool, poll_timeout: Duration) {
        while !shutdown.load(Ordering::Relaxed) {
            match event::poll(poll_timeout) {
                Ok(true) => {
                    let Ok(Event::Key(key)) = event::read() else {
                        continue;
                    };
                    let Some(keys) = map_key(key.code) else {
                        continue;
                    };
                    let edge = match key.kind {
                        KeyEventKind::Release => KeyEdge::Up(keys),
                        KeyEventKind::Press | KeyEventKind::Repeat => {
                            KeyEdge::Down(keys, Instant::now())
                        }
                    };
                    if sender.send(edge).is_err() {
                        break;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    log::warn!("keypad poll failed: {e}");
                    break;
                }
            }
        }
    }
}

impl Keypad for TerminalKeypad {
    fn sample(&mut self) -> Keys {
        for edge in self.edges.try_iter() {
            match edge {
                KeyEdge::Down(keys, at) => self.tracker.press(keys, at),
                KeyEdge::Up(keys) => self.tracker.release(keys),
            }
        }
        self.tracker.held(Instant::now())
    }
}

impl Drop for TerminalKeypad {
    fn drop(&mut self) {
        self.shutdown();
    }
}
