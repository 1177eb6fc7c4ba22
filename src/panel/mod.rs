//! Panels: full-screen views, each running on its own task.
//!
//! A panel is pushed with an entry function and a state type. The task
//! creates the state block, links the panel on top of the stack, then runs
//! the entry function, which typically builds the panel's scene subtree and
//! subscribes handlers:
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct Menu { cursor: usize }
//!
//! dispatcher.push(PanelStyle::CoverUp, |panel: &mut Panel<Menu>| {
//!     panel.on_event(EventSelector::keys_down(Keys::SOUTH), |panel, _| {
//!         panel.state_mut().cursor += 1;
//!     })?;
//!     Ok(())
//! })?;
//! ```
//!
//! Handlers run one at a time on the panel's own task, in queue order.

mod stack;
mod task;
mod transition;

pub use stack::{PanelLink, PanelStack};
pub use transition::{PanelStyle, Phase, Transition, TransitionKind};

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::event::{Delivery, EventId, EventPayload, EventSelector, Keys};
use crate::scene::{NodeId, Scene};
use log::{error, trace};
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide unique panel id, assigned in push order from 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct PanelId(pub(crate) u32);

impl PanelId {
    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event handler. Captured variables play the role of the handler's
/// opaque argument.
pub type Handler<S> = Box<dyn FnMut(&mut Panel<S>, &EventPayload)>;

/// A panel's context, owned by its task.
pub struct Panel<S> {
    id: PanelId,
    node: NodeId,
    state: Box<S>,
    handlers: HashMap<EventId, Handler<S>>,
    dispatcher: Dispatcher,
    /// Handler currently executing, and whether it unsubscribed itself.
    running: Option<(EventId, bool)>,
    popped: bool,
}

impl<S> std::fmt::Debug for Panel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("handlers", &self.handlers.len())
            .field("popped", &self.popped)
            .finish_non_exhaustive()
    }
}

impl<S: Default + 'static> Panel<S> {
    pub(crate) fn new(id: PanelId, node: NodeId, dispatcher: Dispatcher) -> Self {
        Self {
            id,
            node,
            state: Box::default(),
            handlers: HashMap::new(),
            dispatcher,
            running: None,
            popped: false,
        }
    }
}

impl<S: 'static> Panel<S> {
    /// This panel's id.
    pub const fn id(&self) -> PanelId {
        self.id
    }

    /// Root node of this panel's subtree.
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// The shared scene graph.
    pub fn scene(&self) -> &Arc<dyn Scene> {
        self.dispatcher.scene()
    }

    /// The dispatcher this panel is registered with.
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The panel's state block.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The panel's state block, mutably.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Keys currently held, for polling from render handlers.
    pub fn keys(&self) -> Keys {
        self.dispatcher.keys()
    }

    /// Whether this panel has popped itself.
    pub const fn is_popped(&self) -> bool {
        self.popped
    }

    /// Subscribe `handler` to events matching `selector`.
    pub fn on_event<F>(&mut self, selector: EventSelector, handler: F) -> Result<EventId>
    where
        F: FnMut(&mut Self, &EventPayload) + 'static,
    {
        let id = self.dispatcher.on_event(self.id, selector)?;
        self.handlers.insert(id, Box::new(handler));
        Ok(id)
    }

    /// Unsubscribe one of this panel's handlers. Ids owned by other panels
    /// are ignored.
    pub fn off_event(&mut self, id: EventId) {
        let owned = match &mut self.running {
            Some((running, removed)) if *running == id => {
                *removed = true;
                true
            }
            _ => self.handlers.remove(&id).is_some(),
        };
        if owned {
            self.dispatcher.off_event(id);
        }
    }

    /// Push another panel on top of this one. Blocks until its task is set up.
    pub fn push<T, F>(&self, style: PanelStyle, entry: F) -> Result<PanelId>
    where
        T: Default + 'static,
        F: FnOnce(&mut Panel<T>) -> Result<()> + Send + 'static,
    {
        self.dispatcher.push(style, entry)
    }

    /// Pop this panel off the stack.
    ///
    /// All of its subscriptions are gone when this returns, the parent is
    /// active again, and the task ends once the current handler returns.
    /// Fails if this panel is not the active one or is the root.
    pub fn pop(&mut self) -> Result<()> {
        self.dispatcher.detach(self.id)?;
        self.popped = true;
        self.handlers.clear();
        Ok(())
    }

    pub(crate) fn dispatch(&mut self, delivery: Delivery) {
        let Some(mut handler) = self.handlers.remove(&delivery.event) else {
            trace!("panel {}: no handler for {}", self.id, delivery.event);
            return;
        };
        self.running = Some((delivery.event, false));
        handler(self, &delivery.payload);
        let removed = self.running.take().is_some_and(|(_, removed)| removed);
        if !removed && !self.popped {
            self.handlers.insert(delivery.event, handler);
        }
    }
}

impl<S> Drop for Panel<S> {
    fn drop(&mut self) {
        if self.popped {
            return;
        }
        // Panels torn down by a dispatcher shutdown are already gone.
        if let Some(freed) = self.dispatcher.abandon(self.id) {
            error!("panel {} task ended without popping; {freed} filters freed", self.id);
        }
    }
}
