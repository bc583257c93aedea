//! Content stream parsing.
//!
//! - `lexer` - byte-level tokenizer (Lexer, Token)
//! - `content` - grouping parser building content objects (ContentParser)
//! - `params` - parser configuration (ParserParams)

pub mod content;
pub mod lexer;
pub mod params;

pub use content::ContentParser;
pub use lexer::{Lexer, Token, TokenType};
pub use params::ParserParams;
