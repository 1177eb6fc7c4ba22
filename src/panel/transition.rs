//! Transition styles and the per-transition state machine.
//!
//! A transition moves `Idle → Animating → Completing → Idle`. The scene
//! graph animates the node; the dispatcher steps the state machine on every
//! render tick and performs the completion (focus event, node removal)
//! while in `Completing`.

use super::PanelId;
use crate::scene::{NodeId, Point};
use std::time::Duration;

/// How a panel enters and leaves the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelStyle {
    /// No animation.
    #[default]
    Instant,
    /// Slides up from below, covering the previous panel in place.
    CoverUp,
    /// Slides in from the right while the previous panel slides out left.
    SlideLeft,
}

impl PanelStyle {
    /// Whether this style animates.
    pub const fn is_animated(self) -> bool {
        !matches!(self, Self::Instant)
    }

    /// Off-screen position a panel of this style enters from and exits to.
    pub const fn entry_offset(self, width: i32, height: i32) -> Point {
        match self {
            Self::Instant => Point::ZERO,
            Self::CoverUp => Point::new(0, height),
            Self::SlideLeft => Point::new(width, 0),
        }
    }

    /// Where the panel underneath goes while covered, if it moves at all.
    pub const fn covered_offset(self, width: i32) -> Option<Point> {
        match self {
            Self::Instant | Self::SlideLeft => Some(Point::new(-width, 0)),
            Self::CoverUp => None,
        }
    }
}

/// Which way a transition runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// A pushed panel sliding into place.
    Enter,
    /// A popped panel sliding away; `parent` regains focus afterwards.
    Exit {
        /// The panel restored as active.
        parent: PanelId,
    },
}

/// Progress of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started, or finished.
    Idle,
    /// The node is animating until the given render time.
    Animating {
        /// Render time at which the animation is over.
        until: Duration,
    },
    /// Animation over; completion actions pending.
    Completing,
}

/// One panel's entry or exit animation.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    /// The panel moving.
    pub panel: PanelId,
    /// Its scene node.
    pub node: NodeId,
    /// Entry or exit.
    pub kind: TransitionKind,
    phase: Phase,
}

impl Transition {
    /// An idle transition.
    pub const fn new(panel: PanelId, node: NodeId, kind: TransitionKind) -> Self {
        Self {
            panel,
            node,
            kind,
            phase: Phase::Idle,
        }
    }

    /// Start animating at `now` for `duration`.
    #[must_use]
    pub fn started(mut self, now: Duration, duration: Duration) -> Self {
        self.phase = Phase::Animating {
            until: now + duration,
        };
        self
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the transition is finished (or never started).
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Advance to render time `now`. Returns `true` on entering `Completing`.
    pub fn step(&mut self, now: Duration) -> bool {
        match self.phase {
            Phase::Animating { until } if now >= until => {
                self.phase = Phase::Completing;
                true
            }
            _ => false,
        }
    }

    /// Mark completion actions done.
    pub fn finish(&mut self) {
        if self.phase == Phase::Completing {
            self.phase = Phase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_offsets() {
        assert_eq!(PanelStyle::Instant.entry_offset(240, 240), Point::ZERO);
        assert_eq!(PanelStyle::CoverUp.entry_offset(240, 240), Point::new(0, 240));
        assert_eq!(PanelStyle::SlideLeft.entry_offset(240, 240), Point::new(240, 0));
        assert_eq!(PanelStyle::SlideLeft.covered_offset(240), Some(Point::new(-240, 0)));
        assert_eq!(PanelStyle::CoverUp.covered_offset(240), None);
    }

    #[test]
    fn test_phases() {
        let mut t = Transition::new(PanelId(1), NodeId(1), TransitionKind::Enter);
        assert!(t.is_idle());
        assert!(!t.step(ms(1000)));

        let mut t = t.started(ms(100), ms(300));
        assert_eq!(t.phase(), Phase::Animating { until: ms(400) });
        assert!(!t.step(ms(399)));
        assert!(t.step(ms(400)));
        assert_eq!(t.phase(), Phase::Completing);
        assert!(!t.step(ms(500)));

        t.finish();
        assert!(t.is_idle());
    }
}
