//! Shared helpers for integration tests.

#![allow(dead_code)]

use panelcore::{Config, Dispatcher, SimScene};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Poll `cond` until it holds, panicking after two seconds.
pub fn eventually(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(ms(2));
    }
}

pub fn setup() -> (Arc<SimScene>, Dispatcher) {
    let scene = Arc::new(SimScene::new());
    let dispatcher = Dispatcher::new(scene.clone(), Config::default());
    (scene, dispatcher)
}

/// Shared invocation counter for handlers.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
