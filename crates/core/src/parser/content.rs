//! Grouping content stream parser.
//!
//! Reads operations (operands followed by an operator keyword) and groups
//! them into content objects: paths run until their painting operation, text
//! objects, saved graphics states and marked-content sequences nest until
//! their terminator, and inline images carry their raw payload.

use super::lexer::{Lexer, Token};
use super::params::ParserParams;
use crate::content::{
    Composite, CompositeKind, ContentObject, InlineImage, InlineImageHeader, Operation,
    OperationKind, Path, Shading, XObject,
};
use crate::error::{PdfError, Result};
use crate::io::ByteStream;
use crate::model::{PDFDict, PDFObject};
use bytes::Bytes;

/// Open array or dictionary while assembling an operand.
enum Context {
    Array(u64, Vec<PDFObject>),
    Dict(u64, Vec<PDFObject>),
}

/// Parser for PDF content streams.
///
/// Works over any `ByteStream`; a `LogicalStream` lets operations straddle
/// the boundaries between the content streams of a page.
pub struct ContentParser<S> {
    lexer: Lexer<S>,
    params: ParserParams,
}

impl<S: ByteStream> ContentParser<S> {
    /// Create a parser with default parameters.
    pub fn new(stream: S) -> Self {
        Self::with_params(stream, ParserParams::default())
    }

    pub fn with_params(stream: S, params: ParserParams) -> Self {
        Self {
            lexer: Lexer::new(stream),
            params,
        }
    }

    pub fn params(&self) -> &ParserParams {
        &self.params
    }

    /// Current position in the underlying stream.
    pub fn position(&self) -> u64 {
        self.lexer.position()
    }

    /// Move to an absolute position in the underlying stream.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.lexer.seek(position)
    }

    /// Whether any token remains.
    pub fn has_more(&mut self) -> bool {
        self.lexer.has_more()
    }

    pub fn into_inner(self) -> S {
        self.lexer.into_inner()
    }

    /// Parse one operation.
    ///
    /// Returns `None` at end of stream. Operands left without an operator at
    /// end of stream are dropped.
    pub fn parse_operation(&mut self) -> Result<Option<Operation>> {
        let mut operands = Vec::new();

        loop {
            let Some(next) = self.lexer.next_token() else {
                if !operands.is_empty() {
                    tracing::debug!(
                        operands = operands.len(),
                        "dropping dangling operands at end of content stream"
                    );
                }
                return Ok(None);
            };
            let (pos, token) = next?;

            match token {
                Token::Keyword(keyword) => {
                    let kind = self.params.registry.kind_of(&keyword);
                    if kind == OperationKind::Generic {
                        tracing::trace!(operator = %keyword, pos, "unknown operator");
                    }
                    return Ok(Some(Operation::with_kind(keyword, kind, operands)));
                }
                Token::ArrayEnd | Token::DictEnd => {
                    tracing::trace!(pos, "ignoring unmatched closing delimiter");
                }
                token => match self.read_operand(pos, token)? {
                    Some(operand) => operands.push(operand),
                    None => {
                        tracing::debug!(pos, "unterminated operand at end of content stream");
                        return Ok(None);
                    }
                },
            }
        }
    }

    /// Turn a token into an operand, reading further tokens when it opens an
    /// array or dictionary. `None` means the stream ended inside one.
    fn read_operand(&mut self, pos: u64, token: Token) -> Result<Option<PDFObject>> {
        let mut context_stack: Vec<Context> = Vec::new();
        let mut next = Some((pos, token));

        loop {
            let (pos, token) = match next.take() {
                Some(first) => first,
                None => match self.lexer.next_token() {
                    Some(result) => result?,
                    None => return Ok(None),
                },
            };

            let operand = match token {
                Token::Keyword(keyword) => {
                    return Err(PdfError::TokenError {
                        pos,
                        msg: format!("operator {keyword} inside array or dictionary"),
                    });
                }
                Token::ArrayStart => {
                    context_stack.push(Context::Array(pos, Vec::new()));
                    continue;
                }
                Token::DictStart => {
                    context_stack.push(Context::Dict(pos, Vec::new()));
                    continue;
                }
                Token::ArrayEnd => match context_stack.pop() {
                    Some(Context::Array(_, items)) => PDFObject::Array(items),
                    Some(Context::Dict(start, _)) => {
                        return Err(PdfError::TokenError {
                            pos,
                            msg: format!("']' closes dictionary opened at {start}"),
                        });
                    }
                    None => {
                        return Err(PdfError::TokenError {
                            pos,
                            msg: "unbalanced ']'".into(),
                        });
                    }
                },
                Token::DictEnd => match context_stack.pop() {
                    Some(Context::Dict(_, items)) => PDFObject::Dict(build_dict(items)),
                    Some(Context::Array(start, _)) => {
                        return Err(PdfError::TokenError {
                            pos,
                            msg: format!("'>>' closes array opened at {start}"),
                        });
                    }
                    None => {
                        return Err(PdfError::TokenError {
                            pos,
                            msg: "unbalanced '>>'".into(),
                        });
                    }
                },
                Token::Int(n) => PDFObject::Int(n),
                Token::Real(n) => PDFObject::Real(n),
                Token::Bool(b) => PDFObject::Bool(b),
                Token::Null => PDFObject::Null,
                Token::Name(name) => PDFObject::Name(name),
                Token::String(s) => PDFObject::String(s),
                Token::HexString(s) => PDFObject::HexString(s),
            };

            match context_stack.last_mut() {
                Some(Context::Array(_, items) | Context::Dict(_, items)) => items.push(operand),
                None => return Ok(Some(operand)),
            }
        }
    }

    /// Parse one content object, grouping as needed.
    ///
    /// Returns `None` at end of stream. A lone terminator (`ET`, `Q`, `EMC`, `EI`)
    /// comes back as a plain operation so the caller can close its group.
    pub fn parse_content_object(&mut self) -> Result<Option<ContentObject>> {
        let Some(operation) = self.parse_operation()? else {
            return Ok(None);
        };

        let object = match operation.kind() {
            OperationKind::PaintXObject => ContentObject::XObject(XObject { operation }),
            OperationKind::PaintShading => ContentObject::Shading(Shading { operation }),
            OperationKind::BeginSubpath | OperationKind::DrawRectangle => {
                ContentObject::Path(self.parse_path(operation)?)
            }
            OperationKind::BeginText => ContentObject::Composite(Composite::new(
                CompositeKind::Text,
                self.parse_content_objects()?,
            )),
            OperationKind::SaveGraphicsState => ContentObject::Composite(Composite::new(
                CompositeKind::LocalGraphicsState,
                self.parse_content_objects()?,
            )),
            OperationKind::BeginMarkedContent => {
                let objects = self.parse_content_objects()?;
                ContentObject::Composite(Composite::new(
                    CompositeKind::MarkedContent(operation),
                    objects,
                ))
            }
            OperationKind::BeginInlineImage => {
                ContentObject::InlineImage(self.parse_inline_image()?)
            }
            _ => ContentObject::Operation(operation),
        };

        Ok(Some(object))
    }

    /// Parse content objects until a terminator or end of stream.
    ///
    /// The terminator is consumed but not returned.
    pub fn parse_content_objects(&mut self) -> Result<Vec<ContentObject>> {
        let mut objects = Vec::new();
        while self.has_more() {
            let Some(object) = self.parse_content_object()? else {
                break;
            };
            if object.is_terminator() {
                return Ok(objects);
            }
            objects.push(object);
        }
        Ok(objects)
    }

    /// Parse the whole remaining stream.
    ///
    /// Unlike `parse_content_objects`, stray terminators at the top level do
    /// not stop parsing; they are dropped.
    pub fn parse_all(&mut self) -> Result<Vec<ContentObject>> {
        let mut objects = Vec::new();
        while self.has_more() {
            let position = self.lexer.position();
            objects.extend(self.parse_content_objects()?);
            if self.has_more() {
                tracing::trace!(position, "unbalanced terminator at top level");
            }
        }
        Ok(objects)
    }

    /// Collect path operations starting at `begin`.
    ///
    /// Once a painting operation has been seen, the path ends at the first
    /// operation that neither paints nor builds path geometry; that operation
    /// is pushed back for the caller.
    fn parse_path(&mut self, begin: Operation) -> Result<Path> {
        let mut operations = vec![begin];
        let mut closeable = false;

        loop {
            let position = self.lexer.position();
            let Some(operation) = self.parse_operation()? else {
                break;
            };
            if operation.is_painting() {
                closeable = true;
            } else if closeable && !operation.kind().is_path_construction() {
                tracing::trace!(operator = operation.operator(), position, "path ends, rewinding");
                self.lexer.seek(position)?;
                break;
            }
            operations.push(operation);
        }

        Ok(Path { operations })
    }

    /// Read an inline image after its `BI` operator.
    fn parse_inline_image(&mut self) -> Result<InlineImage> {
        let mut operands = Vec::new();

        loop {
            let Some(next) = self.lexer.next_token() else {
                tracing::debug!("end of stream inside inline image header");
                return Ok(InlineImage {
                    header: InlineImageHeader { operands },
                    data: Bytes::new(),
                });
            };
            let (pos, token) = next?;
            if let Token::Keyword(keyword) = &token {
                if keyword.as_str() != "ID" {
                    tracing::debug!(keyword = %keyword, pos, "inline image header ended by unexpected keyword");
                }
                break;
            }
            match self.read_operand(pos, token)? {
                Some(operand) => operands.push(operand),
                None => {
                    return Ok(InlineImage {
                        header: InlineImageHeader { operands },
                        data: Bytes::new(),
                    });
                }
            }
        }

        let stream = self.lexer.stream_mut();
        if self.params.skip_image_separator
            && stream.peek_byte().is_some_and(crate::utils::is_whitespace)
        {
            stream.read_byte();
        }

        // Scan byte pairs for the `EI` marker
        let mut data = Vec::new();
        let mut terminated = false;
        while let Some(first) = stream.read_byte() {
            let Some(second) = stream.read_byte() else {
                data.push(first);
                break;
            };
            if first == b'E' && second == b'I' {
                terminated = true;
                break;
            }
            data.push(first);
            data.push(second);
        }
        if !terminated {
            tracing::debug!(len = data.len(), "inline image payload runs to end of stream");
        }

        Ok(InlineImage {
            header: InlineImageHeader { operands },
            data: Bytes::from(data),
        })
    }
}

impl<S: ByteStream> Iterator for ContentParser<S> {
    type Item = Result<ContentObject>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parse_content_object().transpose()
    }
}

/// Build a dictionary from alternating keys and values. Pairs whose key is
/// not a name and a trailing key without a value are dropped.
fn build_dict(items: Vec<PDFObject>) -> PDFDict {
    let mut dict = PDFDict::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        let Some(value) = iter.next() else {
            break;
        };
        if let PDFObject::Name(name) = key {
            dict.insert(name, value);
        }
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Buffer;

    #[test]
    fn test_build_dict_drops_dangling_key() {
        let dict = build_dict(vec![
            PDFObject::name("A"),
            PDFObject::Int(1),
            PDFObject::name("B"),
        ]);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("A"), Some(&PDFObject::Int(1)));
    }

    #[test]
    fn test_nested_operands() {
        let mut parser = ContentParser::new(Buffer::new(&b"/P <</MCID 3 /K [1 [2]]>> BDC"[..]));
        let op = parser.parse_operation().unwrap().unwrap();
        assert_eq!(op.operator(), "BDC");
        let props = op.operands()[1].as_dict().unwrap();
        assert_eq!(props.get("MCID"), Some(&PDFObject::Int(3)));
        assert_eq!(
            props.get("K"),
            Some(&PDFObject::Array(vec![
                PDFObject::Int(1),
                PDFObject::Array(vec![PDFObject::Int(2)])
            ]))
        );
    }

    #[test]
    fn test_mismatched_close_is_error() {
        let mut parser = ContentParser::new(Buffer::new(&b"[1 >> x"[..]));
        assert!(parser.parse_operation().is_err());
    }
}
