//! Terminal keypad demo: drive the menu from the keyboard.
//!
//! Arrow keys or WASD move, Enter or Space is OK, Escape is CANCEL.
//! Escape on the menu quits.

#[path = "panels.rs"]
mod panels;

use crossbeam_channel::bounded;
use crossterm::terminal;
use panelcore::{Config, Dispatcher, IoDriver, PanelStyle, SimScene, TerminalKeypad};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            // Raw mode: terminate lines with CRLF.
            write!(buf, "[{} {}] {}\r\n", record.level(), record.target(), record.args())
        })
        .init();

    println!("Panelcore terminal demo");
    println!("=======================");
    println!("Arrows/WASD move, Enter selects, Escape goes back (quits on the menu).\n");

    let dispatcher = Dispatcher::new(Arc::new(SimScene::new()), Config::default());
    let (quit_tx, quit_rx) = bounded(1);
    dispatcher.push(PanelStyle::CoverUp, panels::menu(quit_tx))?;

    terminal::enable_raw_mode()?;
    let keypad = TerminalKeypad::spawn(Duration::from_millis(10), Duration::from_millis(150))?;
    let driver = IoDriver::spawn(dispatcher.clone(), keypad)?;

    let _ = quit_rx.recv();

    driver.join();
    terminal::disable_raw_mode()?;

    println!("{:?}", dispatcher.stats());
    dispatcher.shutdown();
    Ok(())
}
