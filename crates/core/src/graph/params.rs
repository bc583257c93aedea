//! Object graph parameters.

/// Parameters for an `ObjectGraph`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphParams {
    /// `updateable` flag given to newly created nodes. Graphs loaded for
    /// read-only inspection can turn it off so that mutation never
    /// propagates dirtiness.
    pub default_updateable: bool,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            default_updateable: true,
        }
    }
}
