//! Indirect object graph.
//!
//! Every structural value lives in an arena owned by `ObjectGraph` and is
//! addressed by `NodeId`. A node has at most one owner, either a container
//! node or an indirect object slot; inserting an owned node somewhere else
//! stores a deep clone instead. Mutations mark nodes dirty, and dirtiness
//! walks up the owner chain into the enclosing slot so that a writer knows
//! which indirect objects to rewrite.
//!
//! - `node` - arena cells (Node, NodeId, NodeValue, Owner)
//! - `object_graph` - the arena, ownership and container mutation (ObjectGraph)
//! - `slots` - indirect object slots (IndirectSlot)
//! - `params` - graph configuration (GraphParams)

pub mod node;
pub mod object_graph;
pub mod params;
pub mod slots;

pub use node::{Node, NodeId, NodeValue, Owner};
pub use object_graph::ObjectGraph;
pub use params::GraphParams;
pub use slots::IndirectSlot;
