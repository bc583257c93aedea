//! Content stream model.
//!
//! - `operation` - operations, operation kinds and the operator registry
//! - `objects` - the grouped content object tree
//! - `contents` - loading and flushing a content stream held in the object graph

pub mod contents;
pub mod objects;
pub mod operation;

pub use contents::Contents;
pub use objects::{
    Composite, CompositeKind, ContentObject, InlineImage, InlineImageHeader, Path, Shading,
    XObject, write_objects,
};
pub use operation::{Operation, OperationKind, OperatorRegistry};
