//! Headless demo: the menu and button test driven by a scripted keypad.
//!
//! The script walks the menu up to "Button Test", opens it, holds a d-pad
//! key until the button test closes itself, then presses CANCEL.
//!
//! Run with `RUST_LOG=debug` to see every subscription and transition.

#[path = "panels.rs"]
mod panels;

use crossbeam_channel::bounded;
use panelcore::{Config, Dispatcher, IoDriver, Keys, PanelStyle, SimScene};
use std::sync::Arc;
use std::time::Duration;

/// Keys held at `frame` (60 frames per second).
fn script(frame: u64) -> Keys {
    match frame {
        // Two presses of NORTH wrap the cursor round to "Button Test".
        30..=35 | 45..=50 => Keys::NORTH,
        60..=65 => Keys::OK,
        // Hold EAST for a little over two seconds.
        100..=240 => Keys::EAST,
        300..=305 => Keys::CANCEL,
        _ => Keys::empty(),
    }
}

fn main() -> panelcore::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = Arc::new(SimScene::new());
    let dispatcher = Dispatcher::new(scene.clone(), Config::default());

    let (quit_tx, quit_rx) = bounded(1);
    let menu = dispatcher.push(PanelStyle::CoverUp, panels::menu(quit_tx))?;
    log::info!("menu is panel {menu}");

    let mut frame = 0;
    let keypad = move || {
        frame += 1;
        script(frame)
    };
    let driver = IoDriver::spawn(dispatcher.clone(), keypad)?;

    match quit_rx.recv_timeout(Duration::from_secs(10)) {
        Ok(()) => log::info!("CANCEL on the menu after {} frames", driver.frames()),
        Err(_) => log::warn!("script did not finish"),
    }
    driver.join();

    let stats = dispatcher.stats();
    log::info!(
        "stack {:?}, {} filters, {} scene nodes",
        dispatcher.stack(),
        dispatcher.filter_count(),
        scene.node_count()
    );
    log::info!("{stats:?}");
    dispatcher.shutdown();
    Ok(())
}
