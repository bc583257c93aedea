//! Grouped content objects.
//!
//! The grouping parser turns a flat operation sequence into a tree: paths,
//! text objects, saved graphics states and marked-content sequences become
//! composites holding their inner objects; XObject and shading invocations
//! and inline images become dedicated leaves.

use super::operation::Operation;
use crate::error::Result;
use crate::model::PDFObject;
use bytes::Bytes;

/// A node of the content object tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentObject {
    /// A single operation that opens no group
    Operation(Operation),
    /// Path construction operations up to and including their painting
    Path(Path),
    /// Object with an implicit begin/end pair around inner objects
    Composite(Composite),
    /// `Do` invocation
    XObject(XObject),
    /// `sh` invocation
    Shading(Shading),
    /// `BI ... ID ... EI` sequence
    InlineImage(InlineImage),
}

impl ContentObject {
    /// Whether this object is a lone terminator operation (`ET`, `Q`, `EMC`, `EI`).
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Operation(op) if op.is_terminator())
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Self::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Self::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    /// Every explicit operation held by this object, in stream order.
    ///
    /// The implicit delimiters of text objects and saved graphics states are
    /// not operations of their own and are not yielded; the opening operation
    /// of a marked-content sequence is.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        let mut out = Vec::new();
        self.collect_operations(&mut out);
        out.into_iter()
    }

    fn collect_operations<'a>(&'a self, out: &mut Vec<&'a Operation>) {
        match self {
            Self::Operation(op) => out.push(op),
            Self::Path(path) => out.extend(&path.operations),
            Self::Composite(composite) => {
                if let CompositeKind::MarkedContent(begin) = &composite.kind {
                    out.push(begin);
                }
                for object in &composite.objects {
                    object.collect_operations(out);
                }
            }
            Self::XObject(xobject) => out.push(&xobject.operation),
            Self::Shading(shading) => out.push(&shading.operation),
            Self::InlineImage(_) => {}
        }
    }

    /// Serialize back to content stream syntax.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Self::Operation(op) => op.write_to(out),
            Self::Path(path) => {
                for op in &path.operations {
                    op.write_to(out);
                }
            }
            Self::Composite(composite) => composite.write_to(out),
            Self::XObject(xobject) => xobject.operation.write_to(out),
            Self::Shading(shading) => shading.operation.write_to(out),
            Self::InlineImage(image) => image.write_to(out),
        }
    }
}

/// Serialize a sequence of content objects.
pub fn write_objects(objects: &[ContentObject], out: &mut Vec<u8>) {
    for object in objects {
        object.write_to(out);
    }
}

/// Path construction and painting operations, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub operations: Vec<Operation>,
}

impl Path {
    /// Whether the path ends with a painting operation.
    pub fn is_painted(&self) -> bool {
        self.operations.last().is_some_and(Operation::is_painting)
    }
}

/// Kinds of composite objects.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeKind {
    /// `BT ... ET`
    Text,
    /// `q ... Q`
    LocalGraphicsState,
    /// `BMC`/`BDC ... EMC`, holding the opening operation
    MarkedContent(Operation),
}

/// A group of content objects between an implicit begin/end pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub kind: CompositeKind,
    pub objects: Vec<ContentObject>,
}

impl Composite {
    pub fn new(kind: CompositeKind, objects: Vec<ContentObject>) -> Self {
        Self { kind, objects }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match &self.kind {
            CompositeKind::Text => out.extend_from_slice(b"BT\n"),
            CompositeKind::LocalGraphicsState => out.extend_from_slice(b"q\n"),
            CompositeKind::MarkedContent(begin) => begin.write_to(out),
        }
        write_objects(&self.objects, out);
        match &self.kind {
            CompositeKind::Text => out.extend_from_slice(b"ET\n"),
            CompositeKind::LocalGraphicsState => out.extend_from_slice(b"Q\n"),
            CompositeKind::MarkedContent(_) => out.extend_from_slice(b"EMC\n"),
        }
    }
}

/// External object invocation (`/Name Do`).
#[derive(Debug, Clone, PartialEq)]
pub struct XObject {
    pub operation: Operation,
}

impl XObject {
    /// Resource name of the invoked XObject.
    pub fn name(&self) -> Result<&str> {
        self.operation.name_operand()
    }
}

/// Shading invocation (`/Name sh`).
#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    pub operation: Operation,
}

impl Shading {
    /// Resource name of the painted shading.
    pub fn name(&self) -> Result<&str> {
        self.operation.name_operand()
    }
}

/// Full and abbreviated inline image header keys.
const INLINE_IMAGE_KEYS: &[(&str, &str)] = &[
    ("BitsPerComponent", "BPC"),
    ("ColorSpace", "CS"),
    ("Decode", "D"),
    ("DecodeParms", "DP"),
    ("Filter", "F"),
    ("Height", "H"),
    ("ImageMask", "IM"),
    ("Interpolate", "I"),
    ("Length", "L"),
    ("Width", "W"),
];

/// Operands between `BI` and `ID`: alternating keys and values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InlineImageHeader {
    pub operands: Vec<PDFObject>,
}

impl InlineImageHeader {
    /// Key/value pairs. A trailing key without a value is ignored, as are
    /// pairs whose key is not a name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PDFObject)> {
        self.operands
            .chunks_exact(2)
            .filter_map(|pair| Some((pair[0].as_name().ok()?, &pair[1])))
    }

    /// Look up an entry by its full or abbreviated key.
    pub fn get(&self, key: &str) -> Option<&PDFObject> {
        let alias = INLINE_IMAGE_KEYS
            .iter()
            .find_map(|&(full, short)| match key {
                k if k == full => Some(short),
                k if k == short => Some(full),
                _ => None,
            });
        self.entries()
            .find(|&(k, _)| k == key || Some(k) == alias)
            .map(|(_, value)| value)
    }

    pub fn width(&self) -> Option<i64> {
        self.get("Width")?.as_int().ok()
    }

    pub fn height(&self) -> Option<i64> {
        self.get("Height")?.as_int().ok()
    }

    pub fn bits_per_component(&self) -> Option<i64> {
        self.get("BitsPerComponent")?.as_int().ok()
    }
}

/// Inline image: header operands and raw payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InlineImage {
    pub header: InlineImageHeader,
    pub data: Bytes,
}

impl InlineImage {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"BI\n");
        for operand in &self.header.operands {
            operand.write_to(out);
            out.push(b' ');
        }
        // Exactly one separator byte, then the payload runs up to `EI`
        out.extend_from_slice(b"ID ");
        out.extend_from_slice(&self.data);
        out.extend_from_slice(b"EI\n");
    }
}
