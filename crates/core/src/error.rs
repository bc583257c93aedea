//! Error types for the folio PDF core library.

use thiserror::Error;

/// Primary error type for object-graph and content-stream operations.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: u64, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("position {position} out of range (stream length {len})")]
    OutOfRange { position: i64, len: u64 },

    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("operator {operator} is missing operand {index}")]
    MissingOperand { operator: String, index: usize },

    #[error("operator {operator} does not carry {expected}")]
    UnexpectedOperator {
        expected: &'static str,
        operator: String,
    },

    #[error("invalid node handle: {0}")]
    InvalidNode(usize),

    #[error("node {0} is still owned")]
    NodeOwned(usize),

    #[error("node cannot be owned by one of its own descendants")]
    OwnershipCycle,

    #[error("indirect object not found: {0}")]
    SlotNotFound(u32),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
