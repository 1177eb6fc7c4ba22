//! Fixed-capacity event filter table.
//!
//! Slots are allocated from a free list and handed back on unregister or
//! panel teardown, so the table never grows past its configured capacity.
//! Scans run in slot order, which is also the dispatch order.

use super::payload::{Delivery, EventId};
use super::selector::EventSelector;
use crate::error::{Error, Resource, Result};
use crate::panel::PanelId;
use crossbeam_channel::Sender;

/// One registration.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Unique registration id.
    pub id: EventId,
    /// The panel that registered it.
    pub panel: PanelId,
    /// What it listens for.
    pub selector: EventSelector,
    /// The owning panel's queue.
    pub(crate) queue: Sender<Delivery>,
}

/// Slab of filters with a fixed number of slots.
#[derive(Debug)]
pub struct FilterTable {
    slots: Vec<Option<Filter>>,
    /// Free slot indices; the lowest index is popped first.
    free: Vec<usize>,
    next_id: u32,
}

impl FilterTable {
    /// Create an empty table with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            free: (0..capacity).rev().collect(),
            next_id: 1,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no filter is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a filter in a free slot and assign it a fresh id.
    pub(crate) fn register(
        &mut self,
        panel: PanelId,
        selector: EventSelector,
        queue: Sender<Delivery>,
    ) -> Result<EventId> {
        let slot = self.free.pop().ok_or(Error::ResourceExhausted {
            resource: Resource::FilterSlot,
        })?;

        let id = EventId(self.next_id);
        self.next_id += 1;

        self.slots[slot] = Some(Filter {
            id,
            panel,
            selector,
            queue,
        });
        Ok(id)
    }

    /// Free the slot holding `id`. Returns the removed filter, if any.
    pub fn unregister(&mut self, id: EventId) -> Option<Filter> {
        let slot = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|f| f.id == id))?;
        self.release(slot)
    }

    /// Free every slot owned by `panel`. Returns how many were freed.
    pub fn remove_panel(&mut self, panel: PanelId) -> usize {
        let owned: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|f| f.panel == panel))
            .map(|(i, _)| i)
            .collect();
        for &slot in &owned {
            self.release(slot);
        }
        owned.len()
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.slots.iter().flatten()
    }

    /// Filters registered by `panel`.
    pub fn owned_by(&self, panel: PanelId) -> impl Iterator<Item = &Filter> {
        self.iter().filter(move |f| f.panel == panel)
    }

    fn release(&mut self, slot: usize) -> Option<Filter> {
        let filter = self.slots[slot].take()?;
        // Keep the free list sorted descending so low slots are reused first.
        let pos = self.free.partition_point(|&s| s > slot);
        self.free.insert(pos, slot);
        Some(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Keys;
    use crossbeam_channel::bounded;
    use std::collections::HashSet;

    fn table(capacity: usize) -> (FilterTable, Sender<Delivery>) {
        let (tx, _rx) = bounded(1);
        (FilterTable::new(capacity), tx)
    }

    #[test]
    fn test_ids_unique_and_monotonic() {
        let (mut table, tx) = table(4);
        let mut seen = HashSet::new();
        let mut last = 0;
        for _ in 0..20 {
            let id = table
                .register(PanelId(1), EventSelector::render_scene(), tx.clone())
                .unwrap();
            assert!(id.get() > last);
            assert!(seen.insert(id));
            last = id.get();
            table.unregister(id);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_capacity_and_reuse() {
        let (mut table, tx) = table(3);
        let ids: Vec<_> = (0..3)
            .map(|_| {
                table
                    .register(PanelId(1), EventSelector::message(), tx.clone())
                    .unwrap()
            })
            .collect();

        let err = table
            .register(PanelId(1), EventSelector::message(), tx.clone())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ResourceExhausted {
                resource: Resource::FilterSlot
            }
        ));

        assert!(table.unregister(ids[1]).is_some());
        let again = table
            .register(PanelId(1), EventSelector::message(), tx)
            .unwrap();
        assert!(again.get() > ids[2].get());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let (mut table, tx) = table(2);
        table
            .register(PanelId(1), EventSelector::render_scene(), tx)
            .unwrap();
        assert!(table.unregister(EventId(99)).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_panel_frees_only_its_slots() {
        let (mut table, tx) = table(8);
        for panel in [1, 2, 1, 3, 1] {
            table
                .register(
                    PanelId(panel),
                    EventSelector::keys_down(Keys::OK),
                    tx.clone(),
                )
                .unwrap();
        }
        assert_eq!(table.remove_panel(PanelId(1)), 3);
        assert_eq!(table.owned_by(PanelId(1)).count(), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lowest_slot_reused_first() {
        let (mut table, tx) = table(4);
        let a = table
            .register(PanelId(1), EventSelector::message(), tx.clone())
            .unwrap();
        let b = table
            .register(PanelId(2), EventSelector::message(), tx.clone())
            .unwrap();
        table.unregister(a);
        let c = table
            .register(PanelId(3), EventSelector::message(), tx)
            .unwrap();
        let order: Vec<_> = table.iter().map(|f| f.id).collect();
        assert_eq!(order, vec![c, b]);
    }
}
