//! Rate limiting of render-drop warnings.
//!
//! Lives in its own test binary because it installs a global logger.

mod common;

use common::{eventually, ms, setup, Counter};
use crossbeam_channel::bounded;
use log::{Level, LevelFilter, Log, Metadata, Record};
use panelcore::{EventSelector, Panel, PanelStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Counts warnings emitted by the crate.
struct WarnCounter {
    warnings: AtomicUsize,
}

impl Log for WarnCounter {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Warn && record.target().starts_with("panelcore") {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

static LOGGER: WarnCounter = WarnCounter {
    warnings: AtomicUsize::new(0),
};

fn warnings() -> usize {
    LOGGER.warnings.load(Ordering::SeqCst)
}

#[test]
fn stalled_panel_warns_on_first_and_threshold_drop() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Warn);

    let (_scene, d) = setup();
    let threshold = d.config().drop_log_threshold as u64;

    // The stalled panel blocks in its first render handler until released.
    let (release_tx, release_rx) = bounded::<()>(1);
    let stalled_started = Counter::default();
    let started = stalled_started.clone();
    let stalled = d
        .push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
            panel.on_event(EventSelector::render_scene(), move |_, _| {
                started.bump();
                let _ = release_rx.recv();
            })?;
            Ok(())
        })
        .unwrap();

    let healthy_ticks = Counter::default();
    let ticks = healthy_ticks.clone();
    let healthy = d
        .push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
            panel.on_event(EventSelector::render_scene(), move |_, _| ticks.bump())?;
            Ok(())
        })
        .unwrap();
    eventually("filters", || {
        d.filters_of(stalled).len() == 1 && d.filters_of(healthy).len() == 1
    });

    // Emit one tick at a time, letting the healthy panel drain its queue.
    let mut frame = 0;
    let mut tick = || {
        frame += 1;
        d.emit_render_tick(ms(frame * 16));
        let expected = usize::try_from(frame).unwrap();
        eventually("healthy panel keeps up", || healthy_ticks.get() == expected);
    };

    tick();
    eventually("stalled panel blocked", || stalled_started.get() == 1);
    while d.stats().render_dropped == 0 {
        tick();
    }
    assert_eq!(warnings(), 1, "first drop warns");

    // Steady state: the healthy panel's deliveries do not restart the streak.
    for _ in 0..50 {
        tick();
    }
    assert_eq!(warnings(), 1);

    while d.stats().render_dropped < threshold {
        tick();
    }
    assert_eq!(d.stats().render_dropped, threshold);
    assert_eq!(warnings(), 2, "threshold drop warns");

    // The streak restarted, so the next drop counts as a first drop again.
    tick();
    assert_eq!(warnings(), 3);
    assert_eq!(d.stats().disconnected, 0);

    release_tx.send(()).unwrap();
    thread::sleep(ms(10));
    d.shutdown();
}
