//! In-memory scene graph for host runs and tests.
//!
//! Tracks node hierarchy and position only; there is no rasterisation.
//! Animations are interpolated whenever [`Scene::advance`] is called.

use super::{Curve, NodeId, Point, Scene};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: Point,
    to: Point,
    start: Duration,
    duration: Duration,
    curve: Curve,
}

impl Animation {
    /// Position at `now`, and whether the animation has finished.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn sample(&self, now: Duration) -> (Point, bool) {
        let elapsed = now.saturating_sub(self.start);
        if elapsed >= self.duration {
            return (self.to, true);
        }
        let t = self
            .curve
            .apply(elapsed.as_secs_f32() / self.duration.as_secs_f32());
        let lerp = |a: i32, b: i32| a + ((b - a) as f32 * t).round() as i32;
        (
            Point::new(lerp(self.from.x, self.to.x), lerp(self.from.y, self.to.y)),
            false,
        )
    }
}

#[derive(Debug, Default)]
struct SimNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Point,
    animation: Option<Animation>,
}

#[derive(Debug)]
struct SimState {
    nodes: HashMap<NodeId, SimNode>,
    next_id: u32,
    now: Duration,
}

/// A thread-safe scene graph that only tracks positions.
#[derive(Debug)]
pub struct SimScene {
    root: NodeId,
    state: Mutex<SimState>,
}

impl Default for SimScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SimScene {
    /// Create a scene holding only the root group.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, SimNode::default());
        Self {
            root,
            state: Mutex::new(SimState {
                nodes,
                next_id: 1,
                now: Duration::ZERO,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `node` is still part of the scene.
    pub fn contains(&self, node: NodeId) -> bool {
        self.lock().nodes.contains_key(&node)
    }

    /// Children of `node`, in append order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.lock()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether `node` has an animation in flight.
    pub fn is_animating(&self, node: NodeId) -> bool {
        self.lock()
            .nodes
            .get(&node)
            .is_some_and(|n| n.animation.is_some())
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }
}

impl Scene for SimScene {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_group(&self) -> NodeId {
        let mut state = self.lock();
        let id = NodeId(state.next_id);
        state.next_id += 1;
        state.nodes.insert(id, SimNode::default());
        id
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut state = self.lock();
        if !state.nodes.contains_key(&parent) {
            return;
        }
        let old_parent = match state.nodes.get_mut(&child) {
            Some(node) => node.parent.replace(parent),
            None => return,
        };
        if let Some(old) = old_parent.and_then(|p| state.nodes.get_mut(&p)) {
            old.children.retain(|&c| c != child);
        }
        if let Some(node) = state.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn position(&self, node: NodeId) -> Point {
        self.lock()
            .nodes
            .get(&node)
            .map(|n| n.position)
            .unwrap_or_default()
    }

    fn set_position(&self, node: NodeId, position: Point) {
        if let Some(node) = self.lock().nodes.get_mut(&node) {
            node.position = position;
        }
    }

    fn animate_position(&self, node: NodeId, target: Point, duration: Duration, curve: Curve) {
        let mut state = self.lock();
        let now = state.now;
        if let Some(node) = state.nodes.get_mut(&node) {
            if duration.is_zero() {
                node.position = target;
                node.animation = None;
                return;
            }
            node.animation = Some(Animation {
                from: node.position,
                to: target,
                start: now,
                duration,
                curve,
            });
        }
    }

    fn stop_animations(&self, node: NodeId) {
        if let Some(node) = self.lock().nodes.get_mut(&node) {
            node.animation = None;
        }
    }

    fn remove(&self, node: NodeId) {
        if node == self.root {
            return;
        }
        let mut state = self.lock();
        let parent = state.nodes.get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| state.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != node);
        }
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(removed) = state.nodes.remove(&id) {
                pending.extend(removed.children);
            }
        }
    }

    fn advance(&self, now: Duration) {
        let mut state = self.lock();
        state.now = now;
        for node in state.nodes.values_mut() {
            if let Some(animation) = node.animation {
                let (position, done) = animation.sample(now);
                node.position = position;
                if done {
                    node.animation = None;
                }
            }
        }
    }
}
