//! Arena entries of the object graph.

use crate::model::PDFObjRef;
use bytes::Bytes;
use indexmap::IndexMap;

/// Handle to a node in an `ObjectGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What holds a node: a container node or an indirect object slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Node(NodeId),
    Slot(PDFObjRef),
}

/// Value stored in a node. Containers refer to their children by id.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Name(String),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Array(Vec<NodeId>),
    Dict(IndexMap<String, NodeId>),
    /// Header dictionary node and raw (possibly encoded) body
    Stream { header: NodeId, body: Bytes },
    Ref(PDFObjRef),
}

impl NodeValue {
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Dict(_) | Self::Stream { .. })
    }

    /// Child node ids, in order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Array(items) => items.clone(),
            Self::Dict(entries) => entries.values().copied().collect(),
            Self::Stream { header, .. } => vec![*header],
            _ => Vec::new(),
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) | Self::HexString(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream { .. } => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// One arena cell.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) value: NodeValue,
    pub(crate) owner: Option<Owner>,
    /// Whether dirtiness may propagate through this node at all
    pub(crate) updateable: bool,
    /// Whether the persisted form of this node has gone stale
    pub(crate) dirty: bool,
    /// Placeholder awaiting its first real value
    pub(crate) is_virtual: bool,
}

impl Node {
    pub(crate) fn new(value: NodeValue, updateable: bool) -> Self {
        Self {
            value,
            owner: None,
            updateable,
            dirty: false,
            is_virtual: false,
        }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }

    pub fn is_updateable(&self) -> bool {
        self.updateable
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }
}
