//! Miscellaneous routines shared by the lexer, the content parser and the
//! typed operand accessors.

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Check if byte is PDF whitespace.
#[inline]
pub const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

/// Check if byte is a PDF delimiter.
#[inline]
pub const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Check if byte ends a keyword or number.
#[inline]
pub const fn is_keyword_end(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}
