//! Content parser parameters.

use crate::content::OperatorRegistry;

/// Parameters for content stream parsing.
#[derive(Debug, Clone)]
pub struct ParserParams {
    /// Classifies operator keywords into operation kinds. Extend it to teach
    /// the parser about operators it does not know.
    pub registry: OperatorRegistry,

    /// Consume the single whitespace byte that separates `ID` from the
    /// inline image payload. When disabled, the separator becomes the first
    /// payload byte.
    pub skip_image_separator: bool,
}

impl Default for ParserParams {
    fn default() -> Self {
        Self {
            registry: OperatorRegistry::default(),
            skip_image_separator: true,
        }
    }
}

impl ParserParams {
    /// Parameters using a custom operator registry.
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }
}
