//! Demo panels shared by the demos: a wrap-around menu and a button tester.

use crossbeam_channel::Sender;
use panelcore::{
    EventPayload, EventSelector, Keys, NodeId, Panel, PanelStyle, Point, Result, Scene,
};
use std::time::Duration;

/// Menu entries; only the button test is available on a host.
pub const MENU_ITEMS: [&str; 9] = [
    "Device",
    "GIFs",
    "Le Space",
    "Wallet",
    "Snake",
    "Tetris",
    "Pong",
    "Button Test",
    "---",
];

const BUTTON_TEST: usize = 7;
const SEPARATOR: usize = 8;

/// Vertical distance between menu rows.
const ROW_SPACING: i32 = 35;

/// How long a d-pad key must be held to leave the button test.
const HOLD_TO_EXIT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
pub struct Menu {
    pub cursor: usize,
    rows: Vec<NodeId>,
    arrow: Option<NodeId>,
}

/// Show the cursor row centred with two rows above and below it.
fn layout(scene: &dyn Scene, menu: &Menu) {
    for (i, &row) in menu.rows.iter().enumerate() {
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        let offset = i as i32 - menu.cursor as i32;
        if offset.abs() <= 2 {
            let y = 120 + offset * ROW_SPACING;
            scene.set_position(row, Point::new(70, y));
            if let (0, Some(arrow)) = (offset, menu.arrow) {
                scene.set_position(arrow, Point::new(25, y));
            }
        } else {
            scene.set_position(row, Point::new(-300, 0));
        }
    }
}

/// Entry function of the menu. Sends on `quit` when CANCEL is pressed.
pub fn menu(quit: Sender<()>) -> impl FnOnce(&mut Panel<Menu>) -> Result<()> + Send + 'static {
    move |panel: &mut Panel<Menu>| {
        let scene = panel.scene().clone();
        let rows = MENU_ITEMS
            .iter()
            .map(|_| {
                let row = scene.create_group();
                scene.append_child(panel.node(), row);
                row
            })
            .collect();
        let arrow = scene.create_group();
        scene.append_child(panel.node(), arrow);
        panel.state_mut().rows = rows;
        panel.state_mut().arrow = Some(arrow);

        layout(scene.as_ref(), panel.state());

        panel.on_event(
            EventSelector::keys_changed(Keys::NORTH | Keys::SOUTH | Keys::OK),
            on_menu_key,
        )?;
        panel.on_event(EventSelector::keys_down(Keys::CANCEL), move |_, _| {
            let _ = quit.send(());
        })?;
        log::info!("menu ready");
        Ok(())
    }
}

fn on_menu_key(panel: &mut Panel<Menu>, payload: &EventPayload) {
    let EventPayload::Keys { down, .. } = *payload else {
        return;
    };
    let count = MENU_ITEMS.len();
    let cursor = panel.state().cursor;

    if down.contains(Keys::OK) {
        match cursor {
            SEPARATOR => {}
            BUTTON_TEST => {
                if let Err(err) = panel.push(PanelStyle::SlideLeft, button_test) {
                    log::warn!("could not open button test: {err}");
                }
            }
            other => log::info!("{} is not available on this host", MENU_ITEMS[other]),
        }
        return;
    }
    let cursor = if down.contains(Keys::NORTH) {
        (cursor + count - 1) % count
    } else if down.contains(Keys::SOUTH) {
        (cursor + 1) % count
    } else {
        return;
    };
    panel.state_mut().cursor = cursor;
    log::info!("menu cursor on {}", MENU_ITEMS[cursor]);

    layout(panel.scene().as_ref(), panel.state());
}

#[derive(Debug, Default)]
pub struct ButtonTest {
    /// Latest render time seen.
    now: Duration,
    /// When the current d-pad hold started.
    hold_start: Option<Duration>,
}

/// Entry function of the button test. Leaves after a two second d-pad hold.
pub fn button_test(panel: &mut Panel<ButtonTest>) -> Result<()> {
    log::info!("button test: hold any d-pad key for 2s to exit");

    panel.on_event(EventSelector::keys_changed(Keys::DPAD), |panel, payload| {
        let EventPayload::Keys { down, .. } = *payload else {
            return;
        };
        log::info!("button test: keys {:#06x}", down.bits());
        let state = panel.state_mut();
        if down.intersects(Keys::DPAD) {
            state.hold_start.get_or_insert(state.now);
        } else {
            state.hold_start = None;
        }
    })?;

    panel.on_event(EventSelector::render_scene(), |panel, payload| {
        let EventPayload::Render { now, .. } = *payload else {
            return;
        };
        let state = panel.state_mut();
        state.now = now;
        let held = state
            .hold_start
            .is_some_and(|start| now.saturating_sub(start) > HOLD_TO_EXIT);
        if held {
            log::info!("button test: exiting after hold");
            if let Err(err) = panel.pop() {
                log::warn!("button test could not pop: {err}");
            }
        }
    })?;
    Ok(())
}
