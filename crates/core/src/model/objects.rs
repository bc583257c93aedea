//! Direct PDF values.
//!
//! `PDFObject` is the owned, tree-shaped form of a PDF value. Content stream
//! operands are always direct values, and the object graph uses this type as
//! the import/export form of its node subtrees.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use indexmap::IndexMap;

/// Dictionary type: insertion-ordered name -> value mapping.
pub type PDFDict = IndexMap<String, PDFObject>;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Font)
    Name(String),
    /// Literal string `( ... )`
    String(Vec<u8>),
    /// Hexadecimal string `< ... >`
    HexString(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(PDFDict),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Shorthand for a name object.
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }

    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string (literal or hex)
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) | Self::HexString(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
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
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }

    /// Serialize this value in PDF syntax.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Self::Null => out.extend_from_slice(b"null"),
            Self::Bool(true) => out.extend_from_slice(b"true"),
            Self::Bool(false) => out.extend_from_slice(b"false"),
            Self::Int(n) => out.extend_from_slice(n.to_string().as_bytes()),
            Self::Real(n) => write_real(out, *n),
            Self::Name(name) => write_name(out, name),
            Self::String(s) => write_literal_string(out, s),
            Self::HexString(s) => {
                out.push(b'<');
                for byte in s {
                    out.extend_from_slice(format!("{byte:02X}").as_bytes());
                }
                out.push(b'>');
            }
            Self::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_to(out);
                }
                out.push(b']');
            }
            Self::Dict(dict) => write_dict(out, dict),
            Self::Stream(stream) => {
                write_dict(out, &stream.attrs);
                out.extend_from_slice(b"\nstream\n");
                out.extend_from_slice(&stream.data);
                out.extend_from_slice(b"\nendstream");
            }
            Self::Ref(r) => out.extend_from_slice(format!("{} {} R", r.objid, r.genno).as_bytes()),
        }
    }

    /// Serialize this value into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

fn write_real(out: &mut Vec<u8>, value: f64) {
    if !value.is_finite() {
        out.push(b'0');
        return;
    }
    let text = value.to_string();
    out.extend_from_slice(text.as_bytes());
    if !text.contains('.') {
        out.extend_from_slice(b".0");
    }
}

/// Names are held one char per source byte (Latin-1), so chars below 256 map
/// back to a single byte.
fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for ch in name.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(byte) => write_name_byte(out, byte),
            Err(_) => {
                let mut utf8 = [0u8; 4];
                for &byte in ch.encode_utf8(&mut utf8).as_bytes() {
                    write_name_byte(out, byte);
                }
            }
        }
    }
}

fn write_name_byte(out: &mut Vec<u8>, byte: u8) {
    let regular = (0x21..=0x7e).contains(&byte)
        && !matches!(
            byte,
            b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        );
    if regular {
        out.push(byte);
    } else {
        out.extend_from_slice(format!("#{byte:02X}").as_bytes());
    }
}

fn write_literal_string(out: &mut Vec<u8>, s: &[u8]) {
    out.push(b'(');
    for &byte in s {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(byte),
        }
    }
    out.push(b')');
}

fn write_dict(out: &mut Vec<u8>, dict: &PDFDict) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict {
        write_name(out, key);
        out.push(b' ');
        value.write_to(out);
    }
    out.extend_from_slice(b">>");
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u16,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u16) -> Self {
        Self { objid, genno }
    }
}

impl std::fmt::Display for PDFObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.objid, self.genno)
    }
}

/// PDF Stream - dictionary attributes + binary data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: PDFDict,
    /// Raw (possibly encoded) body
    pub data: Bytes,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: PDFDict, data: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            data: data.into(),
        }
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_real_keeps_decimal_point() {
        assert_eq!(PDFObject::Real(3.0).to_bytes(), b"3.0");
        assert_eq!(PDFObject::Real(0.25).to_bytes(), b"0.25");
    }

    #[test]
    fn test_write_name_escapes_delimiters() {
        assert_eq!(PDFObject::name("A B#").to_bytes(), b"/A#20B#23");
    }

    #[test]
    fn test_write_literal_string_escapes_parens() {
        assert_eq!(
            PDFObject::String(b"a(b)\\".to_vec()).to_bytes(),
            b"(a\\(b\\)\\\\)"
        );
    }

    #[test]
    fn test_write_nested_containers() {
        let mut dict = PDFDict::new();
        dict.insert("W".into(), PDFObject::Int(4));
        dict.insert("K".into(), PDFObject::Array(vec![PDFObject::Bool(true)]));
        assert_eq!(PDFObject::Dict(dict).to_bytes(), b"<</W 4/K [true]>>");
    }
}
