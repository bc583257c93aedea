//! Content stream operations and the operator registry.
//!
//! An operation is an operator keyword together with the operands that
//! preceded it. The registry classifies operator keywords into kinds; the
//! grouping parser only ever looks at the kind, so new operators can be
//! taught to it by registering a keyword without touching the parser.

use crate::error::{PdfError, Result};
use crate::model::{FontSelection, LineDash, PDFObject};
use crate::utils::Matrix;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Operation kinds, one per operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    // Graphics state
    SaveGraphicsState,
    RestoreGraphicsState,
    ModifyCTM,
    SetLineWidth,
    SetLineCap,
    SetLineJoin,
    SetMiterLimit,
    SetLineDash,
    SetRenderingIntent,
    SetFlatness,
    ApplyExtGState,

    // Path construction
    BeginSubpath,
    DrawLine,
    DrawCurve,
    CloseSubpath,
    DrawRectangle,

    // Path painting and clipping
    PaintPath,
    ModifyClipPath,

    // Text objects and text state
    BeginText,
    EndText,
    SetCharSpace,
    SetWordSpace,
    SetTextScale,
    SetTextLead,
    SetFont,
    SetTextRenderMode,
    SetTextRise,
    TranslateTextRelative,
    SetTextMatrix,
    TranslateTextToNextLine,
    ShowSimpleText,
    ShowAdjustedText,
    ShowTextToNextLine,

    // Type 3 glyph metrics
    CharProcWidth,
    CharProcBBox,

    // Color
    SetStrokeColorSpace,
    SetFillColorSpace,
    SetStrokeColor,
    SetFillColor,
    SetDeviceStrokeColor,
    SetDeviceFillColor,

    // External objects
    PaintShading,
    PaintXObject,

    // Inline images
    BeginInlineImage,
    BeginInlineImageData,
    EndInlineImage,

    // Marked content
    MarkedContentPoint,
    BeginMarkedContent,
    EndMarkedContent,

    // Compatibility sections
    BeginCompatibility,
    EndCompatibility,

    /// Any operator the registry does not know
    Generic,
}

impl OperationKind {
    /// Whether operations of this kind paint (or discard) the current path.
    pub const fn is_painting(self) -> bool {
        matches!(self, Self::PaintPath)
    }

    /// Whether operations of this kind build path geometry or set the
    /// clipping path.
    pub const fn is_path_construction(self) -> bool {
        matches!(
            self,
            Self::BeginSubpath
                | Self::DrawLine
                | Self::DrawCurve
                | Self::CloseSubpath
                | Self::DrawRectangle
                | Self::ModifyClipPath
        )
    }

    /// Whether operations of this kind close a composite object.
    pub const fn is_terminator(self) -> bool {
        matches!(
            self,
            Self::EndText
                | Self::RestoreGraphicsState
                | Self::EndMarkedContent
                | Self::EndInlineImage
        )
    }
}

/// Standard PDF operators and their kinds.
const STANDARD_OPERATORS: &[(&str, OperationKind)] = {
    use OperationKind::*;
    &[
        ("q", SaveGraphicsState),
        ("Q", RestoreGraphicsState),
        ("cm", ModifyCTM),
        ("w", SetLineWidth),
        ("J", SetLineCap),
        ("j", SetLineJoin),
        ("M", SetMiterLimit),
        ("d", SetLineDash),
        ("ri", SetRenderingIntent),
        ("i", SetFlatness),
        ("gs", ApplyExtGState),
        ("m", BeginSubpath),
        ("l", DrawLine),
        ("c", DrawCurve),
        ("v", DrawCurve),
        ("y", DrawCurve),
        ("h", CloseSubpath),
        ("re", DrawRectangle),
        ("S", PaintPath),
        ("s", PaintPath),
        ("f", PaintPath),
        ("F", PaintPath),
        ("f*", PaintPath),
        ("B", PaintPath),
        ("B*", PaintPath),
        ("b", PaintPath),
        ("b*", PaintPath),
        ("n", PaintPath),
        ("W", ModifyClipPath),
        ("W*", ModifyClipPath),
        ("BT", BeginText),
        ("ET", EndText),
        ("Tc", SetCharSpace),
        ("Tw", SetWordSpace),
        ("Tz", SetTextScale),
        ("TL", SetTextLead),
        ("Tf", SetFont),
        ("Tr", SetTextRenderMode),
        ("Ts", SetTextRise),
        ("Td", TranslateTextRelative),
        ("TD", TranslateTextRelative),
        ("Tm", SetTextMatrix),
        ("T*", TranslateTextToNextLine),
        ("Tj", ShowSimpleText),
        ("TJ", ShowAdjustedText),
        ("'", ShowTextToNextLine),
        ("\"", ShowTextToNextLine),
        ("d0", CharProcWidth),
        ("d1", CharProcBBox),
        ("CS", SetStrokeColorSpace),
        ("cs", SetFillColorSpace),
        ("SC", SetStrokeColor),
        ("SCN", SetStrokeColor),
        ("sc", SetFillColor),
        ("scn", SetFillColor),
        ("G", SetDeviceStrokeColor),
        ("RG", SetDeviceStrokeColor),
        ("K", SetDeviceStrokeColor),
        ("g", SetDeviceFillColor),
        ("rg", SetDeviceFillColor),
        ("k", SetDeviceFillColor),
        ("sh", PaintShading),
        ("Do", PaintXObject),
        ("BI", BeginInlineImage),
        ("ID", BeginInlineImageData),
        ("EI", EndInlineImage),
        ("MP", MarkedContentPoint),
        ("DP", MarkedContentPoint),
        ("BMC", BeginMarkedContent),
        ("BDC", BeginMarkedContent),
        ("EMC", EndMarkedContent),
        ("BX", BeginCompatibility),
        ("EX", EndCompatibility),
    ]
};

static STANDARD_REGISTRY: Lazy<OperatorRegistry> = Lazy::new(|| OperatorRegistry {
    kinds: STANDARD_OPERATORS
        .iter()
        .map(|&(keyword, kind)| (SmolStr::new_static(keyword), kind))
        .collect(),
});

/// Open mapping from operator keyword to operation kind.
///
/// Unknown keywords classify as `Generic` and survive parsing and
/// serialization untouched.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    kinds: FxHashMap<SmolStr, OperationKind>,
}

impl OperatorRegistry {
    /// The registry of standard PDF operators.
    pub fn standard() -> &'static Self {
        &STANDARD_REGISTRY
    }

    /// A registry with no operators at all.
    pub fn empty() -> Self {
        Self {
            kinds: FxHashMap::default(),
        }
    }

    /// Register (or re-register) an operator keyword.
    pub fn register(&mut self, keyword: &str, kind: OperationKind) -> Option<OperationKind> {
        self.kinds.insert(SmolStr::new(keyword), kind)
    }

    /// Classify an operator keyword.
    pub fn kind_of(&self, keyword: &str) -> OperationKind {
        self.kinds
            .get(keyword)
            .copied()
            .unwrap_or(OperationKind::Generic)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.kinds.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard().clone()
    }
}

/// One operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    operator: SmolStr,
    kind: OperationKind,
    operands: Vec<PDFObject>,
}

impl Operation {
    /// Create an operation classified by the standard registry.
    pub fn new(operator: &str, operands: Vec<PDFObject>) -> Self {
        let kind = OperatorRegistry::standard().kind_of(operator);
        Self::with_kind(SmolStr::new(operator), kind, operands)
    }

    /// Create an operation with an explicit kind.
    pub fn with_kind(operator: SmolStr, kind: OperationKind, operands: Vec<PDFObject>) -> Self {
        Self {
            operator,
            kind,
            operands,
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn operands(&self) -> &[PDFObject] {
        &self.operands
    }

    pub fn operands_mut(&mut self) -> &mut Vec<PDFObject> {
        &mut self.operands
    }

    pub fn is_painting(&self) -> bool {
        self.kind.is_painting()
    }

    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }

    fn expect_kind(&self, kinds: &[OperationKind], expected: &'static str) -> Result<()> {
        if kinds.contains(&self.kind) {
            Ok(())
        } else {
            Err(PdfError::UnexpectedOperator {
                expected,
                operator: self.operator.to_string(),
            })
        }
    }

    fn operand(&self, index: usize) -> Result<&PDFObject> {
        self.operands
            .get(index)
            .ok_or_else(|| PdfError::MissingOperand {
                operator: self.operator.to_string(),
                index,
            })
    }

    fn number(&self, index: usize) -> Result<f64> {
        self.operand(index)?.as_num()
    }

    /// Matrix carried by `cm` or `Tm`.
    pub fn matrix(&self) -> Result<Matrix> {
        self.expect_kind(
            &[OperationKind::ModifyCTM, OperationKind::SetTextMatrix],
            "a matrix",
        )?;
        Ok((
            self.number(0)?,
            self.number(1)?,
            self.number(2)?,
            self.number(3)?,
            self.number(4)?,
            self.number(5)?,
        ))
    }

    /// Dash pattern carried by `d`.
    pub fn line_dash(&self) -> Result<LineDash> {
        self.expect_kind(&[OperationKind::SetLineDash], "a line dash")?;
        let dash_array = self
            .operand(0)?
            .as_array()?
            .iter()
            .map(PDFObject::as_num)
            .collect::<Result<Vec<_>>>()?;
        Ok(LineDash::new(dash_array, self.number(1)?))
    }

    /// Replace the operands of `d` with the given dash pattern.
    pub fn set_line_dash(&mut self, dash: &LineDash) -> Result<()> {
        self.expect_kind(&[OperationKind::SetLineDash], "a line dash")?;
        self.operands = vec![
            PDFObject::Array(dash.dash_array.iter().copied().map(number_object).collect()),
            number_object(dash.phase),
        ];
        Ok(())
    }

    /// Font resource name and size carried by `Tf`.
    pub fn font(&self) -> Result<FontSelection> {
        self.expect_kind(&[OperationKind::SetFont], "a font")?;
        Ok(FontSelection {
            name: self.operand(0)?.as_name()?.to_string(),
            size: self.number(1)?,
        })
    }

    /// Line width carried by `w`.
    pub fn line_width(&self) -> Result<f64> {
        self.expect_kind(&[OperationKind::SetLineWidth], "a line width")?;
        self.number(0)
    }

    /// Resource name operand of `Do`, `sh`, `gs`, `cs` and `CS`.
    pub fn name_operand(&self) -> Result<&str> {
        self.expect_kind(
            &[
                OperationKind::PaintXObject,
                OperationKind::PaintShading,
                OperationKind::ApplyExtGState,
                OperationKind::SetFillColorSpace,
                OperationKind::SetStrokeColorSpace,
            ],
            "a resource name",
        )?;
        self.operand(0)?.as_name()
    }

    /// Tag of a marked-content operator (`BMC`, `BDC`, `MP`, `DP`).
    pub fn marked_content_tag(&self) -> Result<&str> {
        self.expect_kind(
            &[
                OperationKind::BeginMarkedContent,
                OperationKind::MarkedContentPoint,
            ],
            "a marked-content tag",
        )?;
        self.operand(0)?.as_name()
    }

    /// Property list of `BDC` or `DP`: an inline dictionary or a resource
    /// name. `None` for the property-less forms.
    pub fn marked_content_properties(&self) -> Option<&PDFObject> {
        match self.kind {
            OperationKind::BeginMarkedContent | OperationKind::MarkedContentPoint => {
                self.operands.get(1)
            }
            _ => None,
        }
    }

    /// String shown by `Tj`, `'` or `"`.
    pub fn text(&self) -> Result<&[u8]> {
        self.expect_kind(
            &[
                OperationKind::ShowSimpleText,
                OperationKind::ShowTextToNextLine,
            ],
            "a text string",
        )?;
        // `"` puts its spacing operands before the string
        let index = self.operands.len().saturating_sub(1);
        self.operand(index)?.as_string()
    }

    /// Strings and adjustments shown by `TJ`.
    pub fn text_array(&self) -> Result<&[PDFObject]> {
        self.expect_kind(&[OperationKind::ShowAdjustedText], "a text array")?;
        self.operand(0)?.as_array().map(Vec::as_slice)
    }

    /// Serialize as operands followed by the operator, one line.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for operand in &self.operands {
            operand.write_to(out);
            out.push(b' ');
        }
        out.extend_from_slice(self.operator.as_bytes());
        out.push(b'\n');
    }
}

fn number_object(value: f64) -> PDFObject {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        PDFObject::Int(value as i64)
    } else {
        PDFObject::Real(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_painting_operators() {
        let registry = OperatorRegistry::standard();
        for op in ["S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n"] {
            assert!(registry.kind_of(op).is_painting(), "{op}");
        }
        assert!(!registry.kind_of("W").is_painting());
    }

    #[test]
    fn test_unknown_operator_is_generic() {
        assert_eq!(
            OperatorRegistry::standard().kind_of("zz"),
            OperationKind::Generic
        );
    }

    #[test]
    fn test_number_object_prefers_int() {
        assert_eq!(number_object(3.0), PDFObject::Int(3));
        assert_eq!(number_object(1.5), PDFObject::Real(1.5));
    }
}
