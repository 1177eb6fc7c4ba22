//! # Panelcore
//!
//! Panel stack and event dispatch for a handheld device UI.
//!
//! The device shows one full-screen panel at a time (menu, games, wallet,
//! diagnostics). Panels are stacked: pushing a panel covers the current one
//! with an animated transition, popping it slides it away and restores the
//! panel beneath.
//!
//! ## Core Concepts
//!
//! - **One task per panel**: each panel runs on its own thread with a
//!   private bounded queue and an exclusively owned state block
//! - **Filter table**: a fixed-capacity table maps subscriptions to panels;
//!   emitters scan it and enqueue matching events
//! - **Active panel**: key and message events reach only the top of the
//!   stack, render ticks reach every subscribed panel
//! - **Transitions**: entry and exit animations are explicit state machines
//!   stepped by render ticks
//!
//! ## Example
//!
//! ```rust,ignore
//! use panelcore::{Config, Dispatcher, EventSelector, Keys, Panel, PanelStyle, SimScene};
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new(Arc::new(SimScene::new()), Config::default());
//! dispatcher.push(PanelStyle::Instant, |panel: &mut Panel<u32>| {
//!     panel.on_event(EventSelector::keys_down(Keys::OK), |panel, _| {
//!         *panel.state_mut() += 1;
//!     })?;
//!     Ok(())
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod event;
pub mod panel;
pub mod scene;

// Re-exports for convenience
pub use config::Config;
pub use dispatch::{DispatchStats, Dispatcher};
pub use driver::{IoDriver, Keypad, TerminalKeypad};
pub use error::{Error, ErrorKind, Resource, Result};
pub use event::{EventCategory, EventId, EventPayload, EventSelector, Keys, PanelEvent};
pub use panel::{Handler, Panel, PanelId, PanelStyle};
pub use scene::{Curve, NodeId, Point, Scene, SimScene};
