//! Content streams held in the object graph.
//!
//! A page's `/Contents` is a stream or an array of streams. Their decoded
//! bodies form one logical stream for parsing; flushing writes the whole
//! serialized content back into the first stream and empties the rest.

use super::objects::{ContentObject, write_objects};
use crate::error::{PdfError, Result};
use crate::graph::{NodeId, NodeValue, ObjectGraph};
use crate::io::LogicalStream;
use crate::parser::{ContentParser, ParserParams};
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use rustc_hash::FxHashSet;
use std::io::Read;

/// Parsed content of a stream (or array of streams) in an object graph.
#[derive(Debug, Clone)]
pub struct Contents {
    base: NodeId,
    objects: Vec<ContentObject>,
}

impl Contents {
    /// Build a logical stream over the decoded bodies behind `base`, which
    /// may be a stream, a reference to one, or an array of references.
    pub fn open(graph: &ObjectGraph, base: NodeId) -> Result<LogicalStream> {
        let bodies = stream_nodes(graph, base)?
            .into_iter()
            .map(|stream| decode_body(graph, stream))
            .collect::<Result<Vec<_>>>()?;
        Ok(LogicalStream::new(bodies))
    }

    /// Parse the content behind `base` into content objects.
    pub fn parse(graph: &ObjectGraph, base: NodeId) -> Result<Vec<ContentObject>> {
        Self::parse_with(graph, base, ParserParams::default())
    }

    pub fn parse_with(
        graph: &ObjectGraph,
        base: NodeId,
        params: ParserParams,
    ) -> Result<Vec<ContentObject>> {
        let mut parser = ContentParser::with_params(Self::open(graph, base)?, params);
        let objects = parser.parse_all();
        parser.into_inner().close();
        objects
    }

    /// Serialize `objects` into the first stream behind `base`, clearing its
    /// filters, and empty any further streams. Marks the streams dirty.
    pub fn flush(graph: &mut ObjectGraph, base: NodeId, objects: &[ContentObject]) -> Result<()> {
        let streams = stream_nodes(graph, base)?;
        let Some((&first, rest)) = streams.split_first() else {
            return Err(PdfError::TypeError {
                expected: "content stream",
                got: "empty array",
            });
        };

        let mut data = Vec::new();
        write_objects(objects, &mut data);
        tracing::debug!(bytes = data.len(), streams = streams.len(), "flushing content");

        write_body(graph, first, Bytes::from(data))?;
        let mut written = FxHashSet::default();
        written.insert(first);
        for &stream in rest {
            // An array may refer to the same stream more than once
            if written.insert(stream) {
                write_body(graph, stream, Bytes::new())?;
            }
        }
        Ok(())
    }

    /// Load and parse the content behind `base`.
    pub fn load(graph: &ObjectGraph, base: NodeId) -> Result<Self> {
        Ok(Self {
            base,
            objects: Self::parse(graph, base)?,
        })
    }

    pub fn base(&self) -> NodeId {
        self.base
    }

    pub fn objects(&self) -> &[ContentObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut Vec<ContentObject> {
        &mut self.objects
    }

    /// Write the (possibly edited) objects back to their streams.
    pub fn save(&self, graph: &mut ObjectGraph) -> Result<()> {
        Self::flush(graph, self.base, &self.objects)
    }
}

fn resolve_stream(graph: &ObjectGraph, id: NodeId) -> Result<NodeId> {
    let target = graph.resolve(id).ok_or(PdfError::TypeError {
        expected: "content stream",
        got: "free reference",
    })?;
    match graph.value(target)? {
        NodeValue::Stream { .. } => Ok(target),
        other => Err(PdfError::TypeError {
            expected: "content stream",
            got: other.type_name(),
        }),
    }
}

fn stream_nodes(graph: &ObjectGraph, base: NodeId) -> Result<Vec<NodeId>> {
    let target = graph.resolve(base).ok_or(PdfError::TypeError {
        expected: "content stream",
        got: "free reference",
    })?;
    match graph.value(target)? {
        NodeValue::Array(items) => items
            .iter()
            .map(|&item| resolve_stream(graph, item))
            .collect(),
        _ => Ok(vec![resolve_stream(graph, target)?]),
    }
}

/// Names of the filters applied to a stream, in decoding order.
fn filters(graph: &ObjectGraph, stream: NodeId) -> Result<Vec<String>> {
    let header = graph.stream_header(stream)?;
    let Some(filter) = graph.dict_get(header, "Filter")? else {
        return Ok(Vec::new());
    };
    let name_of = |id: NodeId| -> Result<String> {
        match graph.value(id)? {
            NodeValue::Name(name) => Ok(name.clone()),
            other => Err(PdfError::TypeError {
                expected: "filter name",
                got: other.type_name(),
            }),
        }
    };
    match graph.value(filter)? {
        NodeValue::Array(items) => items.iter().map(|&item| name_of(item)).collect(),
        _ => Ok(vec![name_of(filter)?]),
    }
}

fn decode_body(graph: &ObjectGraph, stream: NodeId) -> Result<Bytes> {
    let mut body = graph.stream_body(stream)?.clone();
    for filter in filters(graph, stream)? {
        body = match filter.as_str() {
            "FlateDecode" | "Fl" => inflate(&body)?,
            _ => {
                tracing::debug!(filter = %filter, "unsupported content stream filter");
                return Err(PdfError::NotSupported("content stream filter"));
            }
        };
    }
    Ok(body)
}

fn inflate(data: &[u8]) -> Result<Bytes> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PdfError::DecodeError(format!("FlateDecode error: {e}")))?;
    Ok(Bytes::from(out))
}

fn write_body(graph: &mut ObjectGraph, stream: NodeId, body: Bytes) -> Result<()> {
    let header = graph.stream_header(stream)?;
    for key in ["Filter", "DecodeParms"] {
        if let Some(previous) = graph.dict_remove(header, key)? {
            graph.release(previous)?;
        }
    }
    let length = graph.import(&crate::model::PDFObject::Int(body.len() as i64));
    if let Some(previous) = graph.dict_insert(header, "Length", length)? {
        graph.release(previous)?;
    }
    graph.stream_set_body(stream, body)
}
