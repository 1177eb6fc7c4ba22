//! Push/pop and dispatch through real panel tasks.

mod common;

use common::{eventually, ms, setup, Counter};
use panelcore::{
    Dispatcher, ErrorKind, EventId, EventPayload, EventSelector, Keys, Panel, PanelId, PanelStyle,
    Point, Scene,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

/// Push a panel that counts OK presses and render ticks, and pops on CANCEL.
fn push_counting(d: &Dispatcher, keys: &Counter, renders: &Counter) -> PanelId {
    let (keys, renders) = (keys.clone(), renders.clone());
    d.push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
        panel.on_event(EventSelector::keys_down(Keys::OK), move |_, _| keys.bump())?;
        panel.on_event(EventSelector::render_scene(), move |_, _| renders.bump())?;
        panel.on_event(EventSelector::keys_down(Keys::CANCEL), |panel, _| {
            let _ = panel.pop();
        })?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn active_panel_isolation() {
    let (_scene, d) = setup();
    let (a_keys, a_renders) = (Counter::default(), Counter::default());
    let (b_keys, b_renders) = (Counter::default(), Counter::default());

    let a = push_counting(&d, &a_keys, &a_renders);
    let b = push_counting(&d, &b_keys, &b_renders);
    eventually("filters", || d.filters_of(a).len() == 3 && d.filters_of(b).len() == 3);
    assert_eq!(d.active_panel(), Some(b));

    d.emit_key_change(Keys::OK);
    d.emit_render_tick(ms(16));

    eventually("deliveries", || {
        b_keys.get() == 1 && a_renders.get() == 1 && b_renders.get() == 1
    });
    thread::sleep(ms(20));
    assert_eq!(a_keys.get(), 0);
    d.shutdown();
}

#[test]
fn pop_restores_parent_and_frees_filters() {
    let (_scene, d) = setup();
    let (a_keys, a_renders) = (Counter::default(), Counter::default());
    let (b_keys, b_renders) = (Counter::default(), Counter::default());

    let a = push_counting(&d, &a_keys, &a_renders);
    let b = push_counting(&d, &b_keys, &b_renders);
    eventually("filters", || d.filters_of(b).len() == 3);
    assert_eq!(d.stack(), vec![b, a]);

    d.emit_key_change(Keys::CANCEL);
    eventually("pop", || d.active_panel() == Some(a));

    assert!(d.filters_of(b).is_empty());
    assert_eq!(d.stack(), vec![a]);
    assert_eq!(d.filter_count(), 3);

    // The restored panel receives input again.
    d.emit_key_change(Keys::empty());
    d.emit_key_change(Keys::OK);
    eventually("key to restored panel", || a_keys.get() == 1);
    assert_eq!(b_keys.get(), 0);
    d.shutdown();
}

#[test]
fn root_panel_cannot_pop() {
    let (_scene, d) = setup();
    let result = Arc::new(Mutex::new(None));
    let slot = result.clone();
    d.push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
        *slot.lock().unwrap() = Some(panel.pop().map_err(|e| e.kind()));
        Ok(())
    })
    .unwrap();

    eventually("pop attempt", || result.lock().unwrap().is_some());
    assert_eq!(
        *result.lock().unwrap(),
        Some(Err(ErrorKind::InvalidOperation))
    );
    assert_eq!(d.stack().len(), 1);
    d.shutdown();
}

#[test]
fn background_panel_cannot_pop() {
    let (_scene, d) = setup();
    let outcome = Arc::new(Mutex::new(Vec::new()));
    let log = outcome.clone();

    let root = d.push(PanelStyle::Instant, |_: &mut Panel<()>| Ok(())).unwrap();
    let below = d
        .push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
            panel.on_event(EventSelector::render_scene(), move |panel, _| {
                log.lock().unwrap().push(panel.pop().map_err(|e| e.kind()));
            })?;
            Ok(())
        })
        .unwrap();
    eventually("render filter", || d.filters_of(below).len() == 1);
    let top = d.push(PanelStyle::Instant, |_: &mut Panel<()>| Ok(())).unwrap();

    d.emit_render_tick(ms(16));
    eventually("pop attempt", || !outcome.lock().unwrap().is_empty());
    assert_eq!(
        outcome.lock().unwrap()[0],
        Err(ErrorKind::InvalidOperation)
    );
    assert_eq!(d.stack(), vec![top, below, root]);
    d.shutdown();
}

#[test]
fn filter_table_exhaustion_through_panel() {
    let (_scene, d) = setup();
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = results.clone();
    d.push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
        for _ in 0..33 {
            let id = panel.on_event(EventSelector::message(), |_, _| {});
            sink.lock().unwrap().push(id.map_err(|e| e.kind()));
        }
        // Free one and try again.
        let first = sink.lock().unwrap()[0].unwrap();
        panel.off_event(first);
        let again = panel.on_event(EventSelector::message(), |_, _| {});
        sink.lock().unwrap().push(again.map_err(|e| e.kind()));
        Ok(())
    })
    .unwrap();

    eventually("registrations", || results.lock().unwrap().len() == 34);
    let results = results.lock().unwrap();
    assert!(results[..32].iter().all(Result::is_ok));
    assert_eq!(results[32], Err(ErrorKind::ResourceExhausted));
    assert!(results[33].is_ok());

    let ids: HashSet<_> = results.iter().filter_map(|r| r.ok()).collect();
    assert_eq!(ids.len(), 33, "event ids are never reused");
    d.shutdown();
}

#[test]
fn handler_can_unsubscribe_itself() {
    let (_scene, d) = setup();
    let hits = Counter::default();
    let counter = hits.clone();
    let panel = d
        .push(PanelStyle::Instant, move |panel: &mut Panel<Option<EventId>>| {
            let id = panel.on_event(EventSelector::message(), move |panel, payload| {
                counter.bump();
                if payload == &EventPayload::Message(b"stop".to_vec()) {
                    if let Some(id) = panel.state_mut().take() {
                        panel.off_event(id);
                    }
                }
            })?;
            *panel.state_mut() = Some(id);
            Ok(())
        })
        .unwrap();
    eventually("filter", || d.filters_of(panel).len() == 1);

    d.emit_message(b"go");
    eventually("first message", || hits.get() == 1);
    assert_eq!(d.filters_of(panel).len(), 1);

    d.emit_message(b"stop");
    eventually("unsubscribed", || d.filters_of(panel).is_empty());
    assert_eq!(hits.get(), 2);

    d.emit_message(b"go");
    thread::sleep(ms(20));
    assert_eq!(hits.get(), 2);
    d.shutdown();
}

/// Push an instant panel counting its focus events; it pops on CANCEL.
fn push_focus_counting(d: &Dispatcher, focus: &Counter) -> PanelId {
    let focus = focus.clone();
    d.push(PanelStyle::Instant, move |panel: &mut Panel<()>| {
        panel.on_event(EventSelector::panel_focus(), move |_, _| focus.bump())?;
        panel.on_event(EventSelector::keys_down(Keys::CANCEL), |panel, _| {
            let _ = panel.pop();
        })?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn instant_panel_focused_after_entry() {
    let (_scene, d) = setup();
    let focus = Counter::default();
    push_focus_counting(&d, &focus);

    // No render tick needed.
    eventually("entry focus", || focus.get() == 1);
    thread::sleep(ms(20));
    assert_eq!(focus.get(), 1);
    d.shutdown();
}

#[test]
fn instant_pop_snaps_parent_and_refocuses() {
    let (scene, d) = setup();
    let (a_focus, b_focus) = (Counter::default(), Counter::default());

    let a = push_focus_counting(&d, &a_focus);
    eventually("a focused", || a_focus.get() == 1);
    let b = push_focus_counting(&d, &b_focus);
    eventually("b focused", || b_focus.get() == 1);

    let a_node = d.node_of(a).unwrap();
    let b_node = d.node_of(b).unwrap();
    assert_eq!(scene.position(a_node), Point::new(-240, 0));
    assert_eq!(scene.position(b_node), Point::ZERO);

    d.emit_key_change(Keys::CANCEL);
    eventually("pop", || d.active_panel() == Some(a));

    // Instant pops complete without any render tick.
    assert_eq!(scene.position(a_node), Point::ZERO);
    assert!(!scene.contains(b_node));
    assert!(!d.is_transitioning());
    eventually("a refocused", || a_focus.get() == 2);
    assert_eq!(b_focus.get(), 1);
    d.shutdown();
}

#[test]
fn shutdown_ends_panel_tasks() {
    struct Tracked(Counter);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.bump();
        }
    }

    #[derive(Default)]
    struct State(Option<Tracked>);

    let (scene, d) = setup();
    let dropped = Counter::default();
    for _ in 0..3 {
        let dropped = dropped.clone();
        d.push(PanelStyle::Instant, move |panel: &mut Panel<State>| {
            panel.state_mut().0 = Some(Tracked(dropped));
            panel.on_event(EventSelector::render_scene(), |_, _| {})?;
            Ok(())
        })
        .unwrap();
    }
    eventually("filters", || d.filter_count() == 3);

    d.shutdown();
    eventually("tasks ended", || dropped.get() == 3);
    assert!(d.stack().is_empty());
    assert_eq!(d.filter_count(), 0);
    assert_eq!(scene.node_count(), 1);

    // The dispatcher stays usable.
    let again = d.push(PanelStyle::Instant, |_: &mut Panel<()>| Ok(())).unwrap();
    assert_eq!(d.active_panel(), Some(again));
    d.shutdown();
}
