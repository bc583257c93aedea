//! Node arena with single ownership and dirty tracking.

use super::node::{Node, NodeId, NodeValue, Owner};
use super::params::GraphParams;
use super::slots::IndirectSlot;
use crate::error::{PdfError, Result};
use crate::model::{PDFDict, PDFObjRef, PDFObject, PDFStream};
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Arena of data nodes plus the indirect object slot table.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    nodes: Vec<Option<Node>>,
    /// Released cells available for reuse
    free: Vec<usize>,
    pub(super) slots: BTreeMap<u32, IndirectSlot>,
    params: GraphParams,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: GraphParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &GraphParams {
        &self.params
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Look up a live node.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(PdfError::InvalidNode(id.index()))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(PdfError::InvalidNode(id.index()))
    }

    fn alloc(&mut self, value: NodeValue) -> NodeId {
        let children = value.children();
        let node = Node::new(value, self.params.default_updateable);
        let id = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId::new(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId::new(self.nodes.len() - 1)
            }
        };
        for child in children {
            if let Ok(node) = self.get_mut(child) {
                node.owner = Some(Owner::Node(id));
            }
        }
        id
    }

    /// Copy a direct value into fresh, unowned, clean nodes.
    pub fn import(&mut self, object: &PDFObject) -> NodeId {
        let value = match object {
            PDFObject::Array(items) => {
                NodeValue::Array(items.iter().map(|item| self.import(item)).collect())
            }
            PDFObject::Dict(dict) => NodeValue::Dict(self.import_entries(dict)),
            PDFObject::Stream(stream) => {
                let entries = self.import_entries(&stream.attrs);
                NodeValue::Stream {
                    header: self.alloc(NodeValue::Dict(entries)),
                    body: stream.data.clone(),
                }
            }
            scalar => scalar_value(scalar).unwrap_or(NodeValue::Null),
        };
        self.alloc(value)
    }

    fn import_entries(&mut self, dict: &PDFDict) -> IndexMap<String, NodeId> {
        dict.iter()
            .map(|(key, value)| (key.clone(), self.import(value)))
            .collect()
    }

    /// Import a value as a virtual placeholder.
    pub fn create_virtual(&mut self, object: &PDFObject) -> NodeId {
        let id = self.import(object);
        if let Ok(node) = self.get_mut(id) {
            node.is_virtual = true;
        }
        id
    }

    /// Materialize a node subtree as a direct value. References are not
    /// followed.
    pub fn export(&self, id: NodeId) -> Result<PDFObject> {
        let object = match &self.get(id)?.value {
            NodeValue::Null => PDFObject::Null,
            NodeValue::Bool(b) => PDFObject::Bool(*b),
            NodeValue::Int(n) => PDFObject::Int(*n),
            NodeValue::Real(n) => PDFObject::Real(*n),
            NodeValue::Name(name) => PDFObject::Name(name.clone()),
            NodeValue::String(s) => PDFObject::String(s.clone()),
            NodeValue::HexString(s) => PDFObject::HexString(s.clone()),
            NodeValue::Ref(r) => PDFObject::Ref(*r),
            NodeValue::Array(items) => PDFObject::Array(
                items
                    .iter()
                    .map(|&item| self.export(item))
                    .collect::<Result<_>>()?,
            ),
            NodeValue::Dict(entries) => PDFObject::Dict(self.export_entries(entries)?),
            NodeValue::Stream { header, body } => {
                let attrs = match &self.get(*header)?.value {
                    NodeValue::Dict(entries) => self.export_entries(entries)?,
                    other => {
                        return Err(PdfError::TypeError {
                            expected: "dict",
                            got: other.type_name(),
                        });
                    }
                };
                PDFObject::Stream(Box::new(PDFStream::new(attrs, body.clone())))
            }
        };
        Ok(object)
    }

    fn export_entries(&self, entries: &IndexMap<String, NodeId>) -> Result<PDFDict> {
        entries
            .iter()
            .map(|(key, &value)| Ok((key.clone(), self.export(value)?)))
            .collect()
    }

    /// Structurally equal, unowned and clean copy of a subtree.
    fn deep_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let source = self.get(id)?;
        let (updateable, is_virtual) = (source.updateable, source.is_virtual);
        let value = match source.value.clone() {
            NodeValue::Array(items) => NodeValue::Array(
                items
                    .into_iter()
                    .map(|item| self.deep_clone(item))
                    .collect::<Result<_>>()?,
            ),
            NodeValue::Dict(entries) => NodeValue::Dict(
                entries
                    .into_iter()
                    .map(|(key, value)| Ok((key, self.deep_clone(value)?)))
                    .collect::<Result<_>>()?,
            ),
            NodeValue::Stream { header, body } => NodeValue::Stream {
                header: self.deep_clone(header)?,
                body,
            },
            scalar => scalar,
        };
        let clone = self.alloc(value);
        let node = self.get_mut(clone)?;
        node.updateable = updateable;
        node.is_virtual = is_virtual;
        Ok(clone)
    }

    /// Store `id` as the object of an indirect slot, cloning it first when a
    /// different owner already holds it. The object previously stored there
    /// is released and the slot becomes dirty. Returns the node actually
    /// stored.
    ///
    /// Nodes move into arrays and dictionaries through the container
    /// mutators; a node owner is only accepted when it already holds `id`.
    pub fn reparent(&mut self, id: NodeId, new_owner: Owner) -> Result<NodeId> {
        if self.get(id)?.owner == Some(new_owner) {
            return Ok(id);
        }
        let Owner::Slot(reference) = new_owner else {
            return Err(PdfError::NotSupported(
                "reparenting under a node; use the array or dict mutators",
            ));
        };
        if self.slot(reference).is_none() {
            return Err(PdfError::SlotNotFound(reference.objid));
        }

        let stored = self.include(id, new_owner)?;
        let previous = self.slots.get_mut(&reference.objid).and_then(|slot| {
            slot.dirty = true;
            slot.data.replace(stored)
        });
        if let Some(old) = previous {
            tracing::debug!(object = %reference, node = %old, "replacing indirect object");
            self.exclude(old);
            self.destroy(old);
        }
        Ok(stored)
    }

    /// Attach `id` to `owner`. An owned node is cloned and the clone is
    /// attached instead.
    pub(crate) fn include(&mut self, id: NodeId, owner: Owner) -> Result<NodeId> {
        if let Owner::Slot(reference) = owner
            && !self.slots.contains_key(&reference.objid)
        {
            return Err(PdfError::SlotNotFound(reference.objid));
        }
        let id = if self.get(id)?.owner.is_some() {
            let clone = self.deep_clone(id)?;
            tracing::debug!(node = %id, clone = %clone, "cloning owned node on insertion");
            clone
        } else {
            id
        };
        self.check_cycle(id, owner)?;
        self.get_mut(id)?.owner = Some(owner);
        Ok(id)
    }

    /// Detach `id` from its owner.
    pub(crate) fn exclude(&mut self, id: NodeId) {
        if let Ok(node) = self.get_mut(id) {
            node.owner = None;
        }
    }

    fn check_cycle(&self, id: NodeId, owner: Owner) -> Result<()> {
        let mut current = Some(owner);
        while let Some(Owner::Node(ancestor)) = current {
            if ancestor == id {
                return Err(PdfError::OwnershipCycle);
            }
            current = self.get(ancestor)?.owner;
        }
        Ok(())
    }

    /// Mark `id` and its owner chain dirty.
    ///
    /// Stops at the first node that is already dirty or not updateable;
    /// reaching a slot marks the slot dirty.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut current = Some(Owner::Node(id));
        while let Some(owner) = current {
            match owner {
                Owner::Node(id) => {
                    let Ok(node) = self.get_mut(id) else {
                        return;
                    };
                    if !node.updateable || node.dirty {
                        return;
                    }
                    node.dirty = true;
                    node.is_virtual = false;
                    current = node.owner;
                }
                Owner::Slot(reference) => {
                    if let Some(slot) = self.slots.get_mut(&reference.objid) {
                        slot.dirty = true;
                    }
                    return;
                }
            }
        }
    }

    /// Follow a reference node through its slot. Any other node resolves to
    /// itself; a reference to a free or missing slot resolves to nothing.
    pub fn resolve(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id).ok()?.value {
            NodeValue::Ref(reference) => self.resolve_ref(reference),
            _ => Some(id),
        }
    }

    /// Enclosing indirect object of a node.
    pub fn container_of(&self, id: NodeId) -> Option<PDFObjRef> {
        let mut current = self.get(id).ok()?.owner;
        while let Some(owner) = current {
            match owner {
                Owner::Node(parent) => current = self.get(parent).ok()?.owner,
                Owner::Slot(reference) => return Some(reference),
            }
        }
        None
    }

    /// Drop a detached node and its subtree, recycling their cells.
    pub fn release(&mut self, id: NodeId) -> Result<()> {
        if self.get(id)?.owner.is_some() {
            return Err(PdfError::NodeOwned(id.index()));
        }
        self.destroy(id);
        Ok(())
    }

    pub(super) fn destroy(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
                continue;
            };
            stack.extend(node.value.children());
            self.free.push(id.index());
        }
    }

    /// Clear every dirty flag, on nodes and slots, after a persistence pass.
    pub fn mark_clean(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.dirty = false;
        }
        for slot in self.slots.values_mut() {
            slot.dirty = false;
        }
    }

    // Accessors

    pub fn value(&self, id: NodeId) -> Result<&NodeValue> {
        Ok(&self.get(id)?.value)
    }

    pub fn owner(&self, id: NodeId) -> Result<Option<Owner>> {
        Ok(self.get(id)?.owner)
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool> {
        Ok(self.get(id)?.dirty)
    }

    pub fn is_virtual(&self, id: NodeId) -> Result<bool> {
        Ok(self.get(id)?.is_virtual)
    }

    pub fn is_updateable(&self, id: NodeId) -> Result<bool> {
        Ok(self.get(id)?.updateable)
    }

    pub fn set_updateable(&mut self, id: NodeId, updateable: bool) -> Result<()> {
        self.get_mut(id)?.updateable = updateable;
        Ok(())
    }

    // Arrays

    pub fn array_items(&self, array: NodeId) -> Result<&[NodeId]> {
        match &self.get(array)?.value {
            NodeValue::Array(items) => Ok(items),
            other => Err(type_error("array", other)),
        }
    }

    pub fn array_get(&self, array: NodeId, index: usize) -> Result<Option<NodeId>> {
        Ok(self.array_items(array)?.get(index).copied())
    }

    fn array_mut(&mut self, array: NodeId) -> Result<&mut Vec<NodeId>> {
        match &mut self.get_mut(array)?.value {
            NodeValue::Array(items) => Ok(items),
            other => Err(type_error("array", other)),
        }
    }

    /// Append `item`, returning the node actually stored.
    pub fn array_push(&mut self, array: NodeId, item: NodeId) -> Result<NodeId> {
        self.array_mut(array)?;
        let item = self.include(item, Owner::Node(array))?;
        self.array_mut(array)?.push(item);
        self.mark_dirty(array);
        Ok(item)
    }

    pub fn array_insert(&mut self, array: NodeId, index: usize, item: NodeId) -> Result<NodeId> {
        let len = self.array_mut(array)?.len();
        if index > len {
            return Err(index_error(index, len));
        }
        let item = self.include(item, Owner::Node(array))?;
        self.array_mut(array)?.insert(index, item);
        self.mark_dirty(array);
        Ok(item)
    }

    /// Replace the element at `index`, returning the detached previous one.
    pub fn array_set(&mut self, array: NodeId, index: usize, item: NodeId) -> Result<NodeId> {
        let len = self.array_mut(array)?.len();
        if index >= len {
            return Err(index_error(index, len));
        }
        let item = self.include(item, Owner::Node(array))?;
        let previous = std::mem::replace(&mut self.array_mut(array)?[index], item);
        self.exclude(previous);
        self.mark_dirty(array);
        Ok(previous)
    }

    /// Remove the element at `index`, returning it detached.
    pub fn array_remove(&mut self, array: NodeId, index: usize) -> Result<NodeId> {
        let items = self.array_mut(array)?;
        if index >= items.len() {
            return Err(index_error(index, items.len()));
        }
        let removed = items.remove(index);
        self.exclude(removed);
        self.mark_dirty(array);
        Ok(removed)
    }

    // Dictionaries

    pub fn dict_entries(&self, dict: NodeId) -> Result<&IndexMap<String, NodeId>> {
        match &self.get(dict)?.value {
            NodeValue::Dict(entries) => Ok(entries),
            other => Err(type_error("dict", other)),
        }
    }

    pub fn dict_get(&self, dict: NodeId, key: &str) -> Result<Option<NodeId>> {
        Ok(self.dict_entries(dict)?.get(key).copied())
    }

    fn dict_mut(&mut self, dict: NodeId) -> Result<&mut IndexMap<String, NodeId>> {
        match &mut self.get_mut(dict)?.value {
            NodeValue::Dict(entries) => Ok(entries),
            other => Err(type_error("dict", other)),
        }
    }

    /// Set `key`, returning the detached previous value.
    pub fn dict_insert(&mut self, dict: NodeId, key: &str, item: NodeId) -> Result<Option<NodeId>> {
        self.dict_mut(dict)?;
        let item = self.include(item, Owner::Node(dict))?;
        let previous = self.dict_mut(dict)?.insert(key.to_string(), item);
        if let Some(previous) = previous {
            self.exclude(previous);
        }
        self.mark_dirty(dict);
        Ok(previous)
    }

    /// Remove `key`, returning its value detached. Entry order is kept.
    pub fn dict_remove(&mut self, dict: NodeId, key: &str) -> Result<Option<NodeId>> {
        let removed = self.dict_mut(dict)?.shift_remove(key);
        if let Some(removed) = removed {
            self.exclude(removed);
            self.mark_dirty(dict);
        }
        Ok(removed)
    }

    // Scalars and streams

    /// Overwrite a scalar node with a scalar value.
    pub fn set_value(&mut self, id: NodeId, value: &PDFObject) -> Result<()> {
        let scalar = scalar_value(value).ok_or(PdfError::TypeError {
            expected: "scalar",
            got: value.type_name(),
        })?;
        let node = self.get_mut(id)?;
        if node.value.is_container() {
            return Err(type_error("scalar", &node.value));
        }
        node.value = scalar;
        self.mark_dirty(id);
        Ok(())
    }

    pub fn stream_header(&self, stream: NodeId) -> Result<NodeId> {
        match &self.get(stream)?.value {
            NodeValue::Stream { header, .. } => Ok(*header),
            other => Err(type_error("stream", other)),
        }
    }

    pub fn stream_body(&self, stream: NodeId) -> Result<&Bytes> {
        match &self.get(stream)?.value {
            NodeValue::Stream { body, .. } => Ok(body),
            other => Err(type_error("stream", other)),
        }
    }

    pub fn stream_set_body(&mut self, stream: NodeId, data: impl Into<Bytes>) -> Result<()> {
        match &mut self.get_mut(stream)?.value {
            NodeValue::Stream { body, .. } => *body = data.into(),
            other => return Err(type_error("stream", other)),
        }
        self.mark_dirty(stream);
        Ok(())
    }
}

fn scalar_value(object: &PDFObject) -> Option<NodeValue> {
    let value = match object {
        PDFObject::Null => NodeValue::Null,
        PDFObject::Bool(b) => NodeValue::Bool(*b),
        PDFObject::Int(n) => NodeValue::Int(*n),
        PDFObject::Real(n) => NodeValue::Real(*n),
        PDFObject::Name(name) => NodeValue::Name(name.clone()),
        PDFObject::String(s) => NodeValue::String(s.clone()),
        PDFObject::HexString(s) => NodeValue::HexString(s.clone()),
        PDFObject::Ref(r) => NodeValue::Ref(*r),
        PDFObject::Array(_) | PDFObject::Dict(_) | PDFObject::Stream(_) => return None,
    };
    Some(value)
}

fn type_error(expected: &'static str, got: &NodeValue) -> PdfError {
    PdfError::TypeError {
        expected,
        got: got.type_name(),
    }
}

fn index_error(index: usize, len: usize) -> PdfError {
    PdfError::OutOfRange {
        position: index as i64,
        len: len as u64,
    }
}
