//! Domain values that content-stream operands reduce to.

/// Line dash pattern, as set by the `d` operator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineDash {
    /// Lengths of alternating dashes and gaps. Empty means a solid line.
    pub dash_array: Vec<f64>,
    /// Distance into the pattern at which to start the dash.
    pub phase: f64,
}

impl LineDash {
    /// Create a new dash pattern.
    pub fn new(dash_array: Vec<f64>, phase: f64) -> Self {
        Self { dash_array, phase }
    }

    /// A solid line has no dashes.
    pub fn is_solid(&self) -> bool {
        self.dash_array.is_empty()
    }
}

/// Font selection, as set by the `Tf` operator.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSelection {
    /// Resource name of the font.
    pub name: String,
    /// Font size in text space units.
    pub size: f64,
}
