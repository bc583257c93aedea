//! folio - PDF object graph and content stream parsing.

pub mod content;
pub mod error;
pub mod graph;
pub mod io;
pub mod model;
pub mod parser;
pub mod utils;

// Re-export model modules under their PDF names
pub use model::objects as pdftypes;
pub use model::state as pdfstate;

pub use content::{ContentObject, Contents, Operation, OperationKind, OperatorRegistry};
pub use error::{PdfError, Result};
pub use graph::{GraphParams, NodeId, ObjectGraph};
pub use io::{Buffer, ByteStream, LogicalStream};
pub use parser::{ContentParser, ParserParams};
