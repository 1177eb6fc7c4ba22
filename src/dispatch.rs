//! Dispatcher: the shared service behind every panel.
//!
//! One mutex guards the filter table, the panel stack, the pending
//! transitions and the key history. Emitters take the lock once, scan the
//! table in slot order and enqueue onto the matching panels' queues:
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  render tick ─▶ │  FilterTable (slot order)    │ ─▶ every RenderScene filter
//!  key sample  ─▶ │  PanelStack (active panel)   │ ─▶ active panel only
//!  message     ─▶ │  Transitions                 │ ─▶ active panel only
//!  focus/blur  ─▶ │                              │ ─▶ the named panel
//!                 └──────────────────────────────┘
//! ```
//!
//! Render ticks never wait on a full queue. Key, message and lifecycle
//! deliveries wait at most [`Config::send_timeout`].

use crate::config::Config;
use crate::error::Result;
use crate::event::{
    Delivery, EventCategory, EventId, EventPayload, EventSelector, FilterTable, Keys, PanelEvent,
};
use crate::panel::{PanelId, PanelStack, Transition, TransitionKind};
use crate::scene::{NodeId, Scene};
use crossbeam_channel::{SendTimeoutError, TrySendError};
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Everything guarded by the dispatcher mutex.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) table: FilterTable,
    pub(crate) stack: PanelStack,
    pub(crate) transitions: Vec<Transition>,
    /// Key state of the previous sample.
    pub(crate) keys: Keys,
    /// Time of the latest render tick.
    pub(crate) now: Duration,
    pub(crate) frame: u64,
    /// Consecutive failed render deliveries, per panel.
    pub(crate) drop_streaks: HashMap<PanelId, u32>,
}

#[derive(Debug, Default)]
struct Counters {
    render_delivered: AtomicU64,
    render_dropped: AtomicU64,
    input_delivered: AtomicU64,
    input_dropped: AtomicU64,
    disconnected: AtomicU64,
}

/// Snapshot of delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Render ticks queued.
    pub render_delivered: u64,
    /// Render ticks dropped on a full queue.
    pub render_dropped: u64,
    /// Key, message and lifecycle events queued.
    pub input_delivered: u64,
    /// Key, message and lifecycle events dropped after the send timeout.
    pub input_dropped: u64,
    /// Sends that found the target queue already gone.
    pub disconnected: u64,
}

struct Inner {
    config: Config,
    scene: Arc<dyn Scene>,
    shared: Mutex<Shared>,
    counters: Counters,
    next_panel: AtomicU32,
}

/// Handle to the dispatch service. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher driving panels in `scene`.
    pub fn new(scene: Arc<dyn Scene>, config: Config) -> Self {
        let shared = Shared {
            table: FilterTable::new(config.filter_capacity),
            stack: PanelStack::new(),
            transitions: Vec::new(),
            keys: Keys::empty(),
            now: Duration::ZERO,
            frame: 0,
            drop_streaks: HashMap::new(),
        };
        Self {
            inner: Arc::new(Inner {
                config,
                scene,
                shared: Mutex::new(shared),
                counters: Counters::default(),
                next_panel: AtomicU32::new(1),
            }),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The scene graph panels draw into.
    pub fn scene(&self) -> &Arc<dyn Scene> {
        &self.inner.scene
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_panel_id(&self) -> PanelId {
        PanelId(self.inner.next_panel.fetch_add(1, Ordering::Relaxed))
    }

    // ------------------------------------------------------------------
    // Subscription
    // ------------------------------------------------------------------

    /// Subscribe `panel` to events matching `selector`.
    ///
    /// Fails with [`Error::ResourceExhausted`](crate::Error::ResourceExhausted)
    /// when the table is full, or [`Error::UnknownPanel`](crate::Error::UnknownPanel)
    /// when `panel` is not on the stack.
    pub fn on_event(&self, panel: PanelId, selector: EventSelector) -> Result<EventId> {
        let mut shared = self.lock();
        let queue = shared.stack.queue(panel)?;
        let id = shared.table.register(panel, selector, queue)?;
        debug!("panel {panel} subscribed {id} to {selector:?}");
        Ok(id)
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn off_event(&self, id: EventId) {
        if let Some(filter) = self.lock().table.unregister(id) {
            debug!("panel {} unsubscribed {id}", filter.panel);
        }
    }

    /// Ids of the filters currently registered by `panel`.
    pub fn filters_of(&self, panel: PanelId) -> Vec<EventId> {
        self.lock().table.owned_by(panel).map(|f| f.id).collect()
    }

    /// Number of occupied filter slots.
    pub fn filter_count(&self) -> usize {
        self.lock().table.len()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The panel receiving key and message events.
    pub fn active_panel(&self) -> Option<PanelId> {
        self.lock().stack.active()
    }

    /// Panels on the stack, active first, root last.
    pub fn stack(&self) -> Vec<PanelId> {
        self.lock().stack.chain()
    }

    /// Scene node of a live panel.
    pub fn node_of(&self, panel: PanelId) -> Option<NodeId> {
        self.lock().stack.get(panel).map(|l| l.node)
    }

    /// Keys held at the latest sample, for polling between key events.
    pub fn keys(&self) -> Keys {
        self.lock().keys
    }

    /// Whether any entry or exit animation is still running.
    pub fn is_transitioning(&self) -> bool {
        !self.lock().transitions.is_empty()
    }

    /// Delivery counters.
    pub fn stats(&self) -> DispatchStats {
        let c = &self.inner.counters;
        DispatchStats {
            render_delivered: c.render_delivered.load(Ordering::Relaxed),
            render_dropped: c.render_dropped.load(Ordering::Relaxed),
            input_delivered: c.input_delivered.load(Ordering::Relaxed),
            input_dropped: c.input_dropped.load(Ordering::Relaxed),
            disconnected: c.disconnected.load(Ordering::Relaxed),
        }
    }

    // ------------------------------------------------------------------
    // Emitters
    // ------------------------------------------------------------------

    /// Fan a render tick out to every panel subscribed to render events.
    ///
    /// Also advances pending panel transitions to `now`, firing focus
    /// events for the ones that completed.
    pub fn emit_render_tick(&self, now: Duration) {
        let mut guard = self.lock();
        let shared = &mut *guard;
        shared.now = now;
        shared.frame += 1;
        self.step_transitions(shared, now);

        let payload = EventPayload::Render {
            frame: shared.frame,
            now,
        };
        let counters = &self.inner.counters;
        let threshold = self.inner.config.drop_log_threshold.max(1);

        for filter in shared.table.iter() {
            if filter.selector.category() != EventCategory::RenderScene {
                continue;
            }
            let delivery = Delivery {
                event: filter.id,
                payload: payload.clone(),
            };
            match filter.queue.try_send(delivery) {
                Ok(()) => {
                    counters.render_delivered.fetch_add(1, Ordering::Relaxed);
                    shared.drop_streaks.remove(&filter.panel);
                }
                Err(TrySendError::Full(_)) => {
                    counters.render_dropped.fetch_add(1, Ordering::Relaxed);
                    let streak = shared.drop_streaks.entry(filter.panel).or_default();
                    *streak += 1;
                    if *streak == 1 {
                        warn!("render tick dropped: panel {} queue full", filter.panel);
                    } else if *streak >= threshold {
                        warn!(
                            "render ticks dropped {} times in a row (panel {})",
                            *streak, filter.panel
                        );
                        *streak = 0;
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    counters.disconnected.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Deliver a keypad sample to the active panel's key filters.
    pub fn emit_key_change(&self, current: Keys) {
        let mut shared = self.lock();
        let changed = current ^ shared.keys;
        shared.keys = current;
        if changed.is_empty() {
            return;
        }

        let Some(active) = shared.stack.active() else {
            return;
        };
        let payload = EventPayload::Keys {
            down: current,
            changed,
        };

        for filter in shared.table.iter() {
            let category = filter.selector.category();
            if !category.is_key() || filter.panel != active {
                continue;
            }
            if category == EventCategory::KeysPress {
                if !(filter.selector.keys() & changed).is_empty() {
                    debug!("{category:?} not implemented; {} skipped", filter.id);
                }
                continue;
            }
            if filter.selector.matches_keys(current, changed) {
                self.send_input(filter.id, &filter.queue, payload.clone());
            }
        }
    }

    /// Deliver an opaque message to the active panel.
    pub fn emit_message(&self, bytes: &[u8]) {
        let shared = self.lock();
        let Some(active) = shared.stack.active() else {
            return;
        };
        for filter in shared.table.iter() {
            if filter.selector.category() == EventCategory::Message && filter.panel == active {
                self.send_input(
                    filter.id,
                    &filter.queue,
                    EventPayload::Message(bytes.to_vec()),
                );
            }
        }
    }

    /// Deliver a focus or blur event to `panel`, active or not.
    pub fn emit_panel_event(&self, event: PanelEvent, panel: PanelId) {
        let shared = self.lock();
        self.emit_lifecycle(&shared, event, panel);
    }

    pub(crate) fn emit_lifecycle(&self, shared: &Shared, event: PanelEvent, panel: PanelId) {
        let category = match event {
            PanelEvent::Focus => EventCategory::PanelFocus,
            PanelEvent::Blur => EventCategory::PanelBlur,
        };
        for filter in shared.table.owned_by(panel) {
            if filter.selector.category() == category {
                self.send_input(
                    filter.id,
                    &filter.queue,
                    EventPayload::Panel { id: panel, event },
                );
            }
        }
    }

    fn send_input(
        &self,
        event: EventId,
        queue: &crossbeam_channel::Sender<Delivery>,
        payload: EventPayload,
    ) {
        let counters = &self.inner.counters;
        match queue.send_timeout(Delivery { event, payload }, self.inner.config.send_timeout) {
            Ok(()) => {
                counters.input_delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(SendTimeoutError::Timeout(_)) => {
                counters.input_dropped.fetch_add(1, Ordering::Relaxed);
                trace!("{event} dropped: queue full");
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                counters.disconnected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn step_transitions(&self, shared: &mut Shared, now: Duration) {
        if shared.transitions.is_empty() {
            return;
        }
        let mut transitions = std::mem::take(&mut shared.transitions);
        for transition in &mut transitions {
            if transition.step(now) {
                self.complete(shared, transition);
                transition.finish();
            }
        }
        transitions.retain(|t| !t.is_idle());
        shared.transitions = transitions;
    }

    fn complete(&self, shared: &Shared, transition: &Transition) {
        let focus = match transition.kind {
            TransitionKind::Enter => transition.panel,
            TransitionKind::Exit { parent } => {
                self.inner.scene.remove(transition.node);
                parent
            }
        };
        debug!(
            "{:?} transition of panel {} complete",
            transition.kind, transition.panel
        );
        self.focus_if_settled(shared, focus);
    }

    /// Focus `panel` if it is active and its entry function has returned.
    ///
    /// A panel covered or popped since its transition started gets no
    /// focus; one still running its entry function is focused by
    /// [`Dispatcher::entry_done`] instead.
    pub(crate) fn focus_if_settled(&self, shared: &Shared, panel: PanelId) {
        let ready = shared.stack.get(panel).is_some_and(|l| l.ready);
        if ready && shared.stack.active() == Some(panel) {
            self.emit_lifecycle(shared, PanelEvent::Focus, panel);
        }
    }

    /// Mark the entry function of `panel` as finished.
    ///
    /// Fires the entry focus now if no transition of the panel is pending,
    /// otherwise the transition's completion fires it.
    pub(crate) fn entry_done(&self, panel: PanelId) {
        let mut guard = self.lock();
        let shared = &mut *guard;
        let Some(link) = shared.stack.get_mut(panel) else {
            return;
        };
        link.ready = true;
        let pending = shared.transitions.iter().any(|t| {
            t.panel == panel || t.kind == TransitionKind::Exit { parent: panel }
        });
        if !pending {
            self.focus_if_settled(shared, panel);
        }
    }
}
