//! Panel stack and the push/pop controller.
//!
//! The stack is a set of links, each pointing at the panel beneath it,
//! rooted at the active panel. Only [`Dispatcher::push`] and
//! [`Panel::pop`](super::Panel::pop) change it.

use super::transition::{PanelStyle, Transition, TransitionKind};
use super::{task, Panel, PanelId};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::event::{Delivery, PanelEvent};
use crate::scene::{Curve, NodeId, Point};
use crossbeam_channel::Sender;
use log::info;
use std::collections::HashMap;

/// A live panel as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct PanelLink {
    /// Panel id.
    pub id: PanelId,
    /// The panel beneath this one.
    pub parent: Option<PanelId>,
    /// Root node of the panel's subtree.
    pub node: NodeId,
    /// Entry style, reused for the exit.
    pub style: PanelStyle,
    /// Whether the entry function has returned.
    pub ready: bool,
    /// Keeps the queue open while the panel is on the stack.
    pub(crate) queue: Sender<Delivery>,
}

/// Live panels, linked parent-wards from the active one.
#[derive(Debug, Default)]
pub struct PanelStack {
    links: HashMap<PanelId, PanelLink>,
    active: Option<PanelId>,
}

impl PanelStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// The top of the stack.
    pub const fn active(&self) -> Option<PanelId> {
        self.active
    }

    /// Look up a live panel.
    pub fn get(&self, id: PanelId) -> Option<&PanelLink> {
        self.links.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: PanelId) -> Option<&mut PanelLink> {
        self.links.get_mut(&id)
    }

    /// Number of live panels.
    pub fn depth(&self) -> usize {
        self.links.len()
    }

    /// Panel ids from the active panel down to the root.
    pub fn chain(&self) -> Vec<PanelId> {
        let mut chain = Vec::with_capacity(self.links.len());
        let mut cursor = self.active;
        while let Some(id) = cursor {
            // Bounded by the link count, so a corrupt link cannot spin forever.
            if chain.len() == self.links.len() {
                break;
            }
            chain.push(id);
            cursor = self.links.get(&id).and_then(|l| l.parent);
        }
        chain
    }

    pub(crate) fn queue(&self, id: PanelId) -> Result<Sender<Delivery>> {
        self.links
            .get(&id)
            .map(|l| l.queue.clone())
            .ok_or(Error::UnknownPanel(id))
    }

    /// Link `link` on top. Returns the previously active panel.
    pub(crate) fn push_link(&mut self, mut link: PanelLink) -> Option<PanelId> {
        let previous = self.active;
        link.parent = previous;
        self.active = Some(link.id);
        self.links.insert(link.id, link);
        previous
    }

    /// Check that `id` may pop. Returns its parent.
    pub(crate) fn validate_pop(&self, id: PanelId) -> Result<PanelId> {
        let link = self.links.get(&id).ok_or(Error::UnknownPanel(id))?;
        if self.active != Some(id) {
            return Err(Error::InvalidOperation("only the active panel can pop"));
        }
        link.parent
            .ok_or(Error::InvalidOperation("cannot pop the root panel"))
    }

    /// Remove every link, leaving an empty stack.
    pub(crate) fn clear(&mut self) -> Vec<PanelLink> {
        self.active = None;
        self.links.drain().map(|(_, link)| link).collect()
    }

    /// Remove `id` and make its parent active.
    pub(crate) fn unlink(&mut self, id: PanelId) -> Option<PanelLink> {
        let link = self.links.remove(&id)?;
        if self.active == Some(id) {
            self.active = link.parent;
        }
        Some(link)
    }
}

impl Dispatcher {
    /// Push a new panel and make it active.
    ///
    /// Blurs the current panel, starts the new panel's task, and returns
    /// once the task has set itself up. `entry` then runs on the new task
    /// with a freshly defaulted state block.
    pub fn push<S, F>(&self, style: PanelStyle, entry: F) -> Result<PanelId>
    where
        S: Default + 'static,
        F: FnOnce(&mut Panel<S>) -> Result<()> + Send + 'static,
    {
        if let Some(active) = self.active_panel() {
            self.emit_panel_event(PanelEvent::Blur, active);
        }
        let id = self.next_panel_id();
        task::spawn(self, id, style, entry)?;
        info!("pushed panel {id} ({style:?})");
        Ok(id)
    }

    /// Record a freshly spawned panel, start its entry transition and move
    /// the covered panel out of the way.
    pub(crate) fn attach(&self, id: PanelId, style: PanelStyle, queue: Sender<Delivery>) -> NodeId {
        let scene = self.scene();
        let config = self.config();
        let (width, height) = (config.screen_width, config.screen_height);

        let node = scene.create_group();
        scene.append_child(scene.root(), node);
        scene.set_position(node, style.entry_offset(width, height));

        let mut shared = self.lock();
        let previous = shared.stack.push_link(PanelLink {
            id,
            parent: None,
            node,
            style,
            ready: false,
            queue,
        });

        if let Some(previous) = previous {
            // A covered panel never completes its own entry.
            shared
                .transitions
                .retain(|t| !(t.panel == previous && t.kind == TransitionKind::Enter));

            if let (Some(link), Some(offset)) =
                (shared.stack.get(previous), style.covered_offset(width))
            {
                scene.stop_animations(link.node);
                if style.is_animated() {
                    scene.animate_position(link.node, offset, config.transition, Curve::EaseOut);
                } else {
                    scene.set_position(link.node, offset);
                }
            }
        }

        if style.is_animated() {
            scene.animate_position(node, Point::ZERO, config.transition, Curve::EaseOut);
            let transition = Transition::new(id, node, TransitionKind::Enter)
                .started(shared.now, config.transition);
            shared.transitions.push(transition);
        }
        node
    }

    /// Tear `id` off the stack: free its filters, restore its parent and
    /// start the exit transition.
    pub(crate) fn detach(&self, id: PanelId) -> Result<()> {
        let mut guard = self.lock();
        let shared = &mut *guard;
        let parent = shared.stack.validate_pop(id)?;

        // Nothing may be queued to this panel from here on.
        let freed = shared.table.remove_panel(id);
        let Some(link) = shared.stack.unlink(id) else {
            return Err(Error::UnknownPanel(id));
        };
        shared.transitions.retain(|t| t.panel != id);
        shared.drop_streaks.remove(&id);
        info!("popped panel {id} ({freed} filters freed), panel {parent} active");

        let scene = self.scene();
        let config = self.config();
        let parent_node = shared.stack.get(parent).map(|l| l.node);

        scene.stop_animations(link.node);
        if let Some(parent_node) = parent_node {
            scene.stop_animations(parent_node);
        }

        if link.style.is_animated() {
            let exit = link
                .style
                .entry_offset(config.screen_width, config.screen_height);
            scene.animate_position(link.node, exit, config.transition, Curve::EaseIn);
            if let Some(parent_node) = parent_node {
                if scene.position(parent_node) != Point::ZERO {
                    scene.animate_position(
                        parent_node,
                        Point::ZERO,
                        config.transition,
                        Curve::EaseOut,
                    );
                }
            }
            let transition = Transition::new(id, link.node, TransitionKind::Exit { parent })
                .started(shared.now, config.transition);
            shared.transitions.push(transition);
        } else {
            scene.remove(link.node);
            if let Some(parent_node) = parent_node {
                scene.set_position(parent_node, Point::ZERO);
            }
            self.focus_if_settled(shared, parent);
        }
        Ok(())
    }

    /// Free the filters of a panel whose task ended without popping.
    ///
    /// Returns `None` if the panel was no longer on the stack.
    pub(crate) fn abandon(&self, id: PanelId) -> Option<usize> {
        let mut shared = self.lock();
        shared.stack.get(id)?;
        shared.drop_streaks.remove(&id);
        Some(shared.table.remove_panel(id))
    }

    /// Tear down every panel.
    ///
    /// Frees all filters, removes the panels' nodes and empties the stack.
    /// Each panel task sees its queue close and exits once its current
    /// handler returns. Panels can be pushed again afterwards.
    pub fn shutdown(&self) {
        let mut guard = self.lock();
        let shared = &mut *guard;
        let scene = self.scene();

        for link in shared.stack.clear() {
            shared.table.remove_panel(link.id);
            scene.remove(link.node);
        }
        for transition in shared.transitions.drain(..) {
            scene.remove(transition.node);
        }
        shared.drop_streaks.clear();
        info!("dispatcher shut down");
    }
}
