//! Indirect object slots.

use super::node::{NodeId, Owner};
use super::object_graph::ObjectGraph;
use crate::error::{PdfError, Result};
use crate::model::PDFObjRef;

/// Numbered storage owning one node tree, or free.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectSlot {
    pub(super) reference: PDFObjRef,
    pub(super) data: Option<NodeId>,
    pub(super) dirty: bool,
}

impl IndirectSlot {
    pub fn reference(&self) -> PDFObjRef {
        self.reference
    }

    /// Root node of the object, `None` when the slot is free.
    pub fn data(&self) -> Option<NodeId> {
        self.data
    }

    pub fn is_free(&self) -> bool {
        self.data.is_none()
    }

    /// Whether the object must be rewritten on the next save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl ObjectGraph {
    /// Store `id` as a new indirect object under the next free object
    /// number. The new slot starts dirty.
    pub fn add_indirect(&mut self, id: NodeId) -> Result<PDFObjRef> {
        self.get(id)?;
        let objid = match self.slots.keys().next_back() {
            Some(&last) => last.checked_add(1).ok_or(PdfError::NotSupported(
                "no object number left after the highest slot",
            ))?,
            None => 1,
        };
        let reference = PDFObjRef::new(objid, 0);
        self.slots.insert(
            objid,
            IndirectSlot {
                reference,
                data: None,
                dirty: true,
            },
        );
        let stored = match self.include(id, Owner::Slot(reference)) {
            Ok(stored) => stored,
            Err(e) => {
                self.slots.remove(&objid);
                return Err(e);
            }
        };
        if let Some(slot) = self.slots.get_mut(&objid) {
            slot.data = Some(stored);
        }
        Ok(reference)
    }

    /// Store `id` under an explicit reference, as a loader does. The slot is
    /// clean; any object previously stored there is released.
    pub fn insert_slot(&mut self, reference: PDFObjRef, id: NodeId) -> Result<()> {
        self.get(id)?;
        let previous = self.slots.insert(
            reference.objid,
            IndirectSlot {
                reference,
                data: None,
                dirty: false,
            },
        );
        let stored = self.include(id, Owner::Slot(reference))?;
        if let Some(slot) = self.slots.get_mut(&reference.objid) {
            slot.data = Some(stored);
        }
        if let Some(old) = previous.and_then(|slot| slot.data) {
            self.exclude(old);
            self.destroy(old);
        }
        Ok(())
    }

    /// Free a slot and release its node tree. The slot stays in the table,
    /// free and dirty.
    pub fn free_slot(&mut self, reference: PDFObjRef) -> Result<()> {
        let slot = self
            .slots
            .get_mut(&reference.objid)
            .filter(|slot| slot.reference == reference)
            .ok_or(PdfError::SlotNotFound(reference.objid))?;
        slot.dirty = true;
        if let Some(data) = slot.data.take() {
            tracing::debug!(object = %reference, "freeing indirect object");
            self.exclude(data);
            self.destroy(data);
        }
        Ok(())
    }

    /// Look up a slot; the generation must match.
    pub fn slot(&self, reference: PDFObjRef) -> Option<&IndirectSlot> {
        self.slots
            .get(&reference.objid)
            .filter(|slot| slot.reference == reference)
    }

    /// All slots in object number order.
    pub fn slots(&self) -> impl Iterator<Item = &IndirectSlot> {
        self.slots.values()
    }

    /// References of the slots that must be rewritten.
    pub fn dirty_slots(&self) -> Vec<PDFObjRef> {
        self.slots
            .values()
            .filter(|slot| slot.dirty)
            .map(|slot| slot.reference)
            .collect()
    }

    /// Root node stored under a reference, `None` when free or missing.
    pub fn resolve_ref(&self, reference: PDFObjRef) -> Option<NodeId> {
        self.slot(reference).and_then(|slot| slot.data)
    }
}
