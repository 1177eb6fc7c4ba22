//! Panel tasks: one thread per panel, draining its own bounded queue.

use super::transition::PanelStyle;
use super::{Panel, PanelId};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Resource, Result};
use crate::event::Delivery;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use log::{debug, error, trace, warn};
use std::thread;

/// Start the task for panel `id` and wait until it has linked itself in.
pub(super) fn spawn<S, F>(
    dispatcher: &Dispatcher,
    id: PanelId,
    style: PanelStyle,
    entry: F,
) -> Result<()>
where
    S: Default + 'static,
    F: FnOnce(&mut Panel<S>) -> Result<()> + Send + 'static,
{
    let (ready_tx, ready_rx) = bounded::<()>(1);
    let task_dispatcher = dispatcher.clone();

    thread::Builder::new()
        .name(format!("panel-{id}"))
        .spawn(move || {
            let (queue_tx, queue_rx) = bounded(task_dispatcher.config().queue_capacity);
            let node = task_dispatcher.attach(id, style, queue_tx);
            let mut panel = Panel::<S>::new(id, node, task_dispatcher);

            // Setup done: the caller of push may continue.
            let _ = ready_tx.send(());
            drop(ready_tx);

            run(&mut panel, entry, &queue_rx);
        })
        .map_err(|e| {
            error!("failed to spawn panel {id}: {e}");
            Error::ResourceExhausted {
                resource: Resource::Task,
            }
        })?;

    ready_rx.recv().map_err(|_| {
        error!("panel {id} died during setup");
        Error::ResourceExhausted {
            resource: Resource::Task,
        }
    })
}

/// Run the entry function, then the event loop until the panel pops.
fn run<S, F>(panel: &mut Panel<S>, entry: F, queue: &Receiver<Delivery>)
where
    S: Default + 'static,
    F: FnOnce(&mut Panel<S>) -> Result<()>,
{
    if let Err(err) = entry(panel) {
        warn!("panel {} entry failed: {err}", panel.id());
        if !panel.is_popped() {
            if let Err(err) = panel.pop() {
                debug!("panel {} stays after failed entry: {err}", panel.id());
            }
        }
    }
    if !panel.is_popped() {
        panel.dispatcher().entry_done(panel.id());
    }

    let wake = panel.dispatcher().config().wake_interval;
    while !panel.is_popped() {
        match queue.recv_timeout(wake) {
            Ok(delivery) => panel.dispatch(delivery),
            Err(RecvTimeoutError::Timeout) => trace!("panel {} idle", panel.id()),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("panel {} task exiting", panel.id());
}
