//! Scene graph collaborator.
//!
//! The panel runtime never renders anything itself. It creates one group
//! node per panel, positions it, and asks the scene to animate it. Any
//! scene implementation must be safe to call from several panel threads
//! at once; no call sequence is assumed to be atomic.

mod sim;

pub use sim::SimScene;

use std::time::Duration;

/// Handle to a node in the scene graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub u32);

/// A position in screen pixels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Point {
    /// Horizontal offset (positive = right).
    pub x: i32,
    /// Vertical offset (positive = down).
    pub y: i32,
}

impl Point {
    /// The origin / rest position.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point.
    pub const fn distance(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Animation easing curve.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Curve {
    /// Constant speed.
    Linear,
    /// Quadratic, fast start then decelerating.
    EaseOut,
    /// Quadratic, slow start then accelerating.
    EaseIn,
}

impl Curve {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseIn => t * t,
        }
    }
}

/// Operations the panel runtime needs from the scene graph.
pub trait Scene: Send + Sync {
    /// The root group all panel nodes hang from.
    fn root(&self) -> NodeId;

    /// Create a detached, empty group node.
    fn create_group(&self) -> NodeId;

    /// Attach `child` as the last child of `parent`.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Current position of `node`.
    fn position(&self, node: NodeId) -> Point;

    /// Move `node` immediately, cancelling nothing.
    fn set_position(&self, node: NodeId, position: Point);

    /// Animate `node` from its current position to `target`.
    fn animate_position(&self, node: NodeId, target: Point, duration: Duration, curve: Curve);

    /// Cancel any in-flight animation of `node`, leaving it where it is.
    fn stop_animations(&self, node: NodeId);

    /// Detach and free `node` and its subtree.
    fn remove(&self, node: NodeId);

    /// Advance animations to `now`. Called once per frame by the I/O driver.
    fn advance(&self, now: Duration);
}
