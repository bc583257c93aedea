//! PDF model types.
//!
//! This module contains the value types shared by the parser and the graph:
//! - `objects` - direct PDF values (PDFObject, PDFStream, PDFObjRef)
//! - `state` - domain values reduced from operands (LineDash, FontSelection)

pub mod objects;
pub mod state;

// Re-export main types for convenience
pub use objects::{PDFDict, PDFObjRef, PDFObject, PDFStream};
pub use state::{FontSelection, LineDash};
