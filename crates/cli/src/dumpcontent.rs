//! dumpcontent - Show the grouped structure of PDF content streams
//!
//! Every input file is one decoded content stream body; together they form
//! a single logical stream, the way a page's `/Contents` array does.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{ArgAction, Parser};
use folio_core::content::{CompositeKind, ContentObject, Operation, write_objects};
use folio_core::io::LogicalStream;
use folio_core::parser::{ContentParser, ParserParams};
use memmap2::Mmap;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dumpcontent")]
#[command(author, version, about = "Show the grouped structure of PDF content streams", long_about = None)]
struct Args {
    /// Decoded content stream bodies, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Write JSON instead of an indented outline
    #[arg(short = 'j', long, action = ArgAction::SetTrue)]
    json: bool,

    /// Write the parsed content back out in normalized content stream syntax
    #[arg(short = 'n', long, action = ArgAction::SetTrue, conflicts_with = "json")]
    normalize: bool,

    /// Treat the byte after `ID` as the first inline image byte
    #[arg(long = "keep-image-separator", action = ArgAction::SetTrue)]
    keep_image_separator: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,
}

/// Serializable view of a content object.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Node {
    Operation {
        operator: String,
        kind: String,
        operands: Vec<String>,
    },
    Path {
        painted: bool,
        operations: Vec<Node>,
    },
    Text {
        objects: Vec<Node>,
    },
    GraphicsState {
        objects: Vec<Node>,
    },
    MarkedContent {
        tag: Option<String>,
        properties: Option<String>,
        objects: Vec<Node>,
    },
    #[serde(rename = "xobject")]
    XObject {
        name: Option<String>,
    },
    Shading {
        name: Option<String>,
    },
    InlineImage {
        header: Vec<(String, String)>,
        length: usize,
    },
}

fn syntax(object: &folio_core::model::PDFObject) -> String {
    String::from_utf8_lossy(&object.to_bytes()).into_owned()
}

fn operation_node(operation: &Operation) -> Node {
    Node::Operation {
        operator: operation.operator().to_string(),
        kind: format!("{:?}", operation.kind()),
        operands: operation.operands().iter().map(syntax).collect(),
    }
}

fn to_node(object: &ContentObject) -> Node {
    match object {
        ContentObject::Operation(operation) => operation_node(operation),
        ContentObject::Path(path) => Node::Path {
            painted: path.is_painted(),
            operations: path.operations.iter().map(operation_node).collect(),
        },
        ContentObject::Composite(composite) => {
            let objects = composite.objects.iter().map(to_node).collect();
            match &composite.kind {
                CompositeKind::Text => Node::Text { objects },
                CompositeKind::LocalGraphicsState => Node::GraphicsState { objects },
                CompositeKind::MarkedContent(begin) => Node::MarkedContent {
                    tag: begin.marked_content_tag().ok().map(str::to_string),
                    properties: begin.marked_content_properties().map(syntax),
                    objects,
                },
            }
        }
        ContentObject::XObject(xobject) => Node::XObject {
            name: xobject.name().ok().map(str::to_string),
        },
        ContentObject::Shading(shading) => Node::Shading {
            name: shading.name().ok().map(str::to_string),
        },
        ContentObject::InlineImage(image) => Node::InlineImage {
            header: image
                .header
                .entries()
                .map(|(key, value)| (key.to_string(), syntax(value)))
                .collect(),
            length: image.data.len(),
        },
    }
}

/// Write one line per operation, indenting the contents of groups.
fn dump_outline<W: Write>(out: &mut W, objects: &[ContentObject], level: usize) -> io::Result<()> {
    let indent = "  ".repeat(level);
    for object in objects {
        match object {
            ContentObject::Operation(operation) => dump_operation(out, &indent, operation)?,
            ContentObject::XObject(xobject) => dump_operation(out, &indent, &xobject.operation)?,
            ContentObject::Shading(shading) => dump_operation(out, &indent, &shading.operation)?,
            ContentObject::Path(path) => {
                let state = if path.is_painted() { "painted" } else { "open" };
                writeln!(out, "{indent}path ({state})")?;
                for operation in &path.operations {
                    dump_operation(out, &format!("{indent}  "), operation)?;
                }
            }
            ContentObject::Composite(composite) => {
                let end = match &composite.kind {
                    CompositeKind::Text => {
                        writeln!(out, "{indent}BT")?;
                        "ET"
                    }
                    CompositeKind::LocalGraphicsState => {
                        writeln!(out, "{indent}q")?;
                        "Q"
                    }
                    CompositeKind::MarkedContent(begin) => {
                        dump_operation(out, &indent, begin)?;
                        "EMC"
                    }
                };
                dump_outline(out, &composite.objects, level + 1)?;
                writeln!(out, "{indent}{end}")?;
            }
            ContentObject::InlineImage(image) => {
                let header: Vec<String> = image
                    .header
                    .entries()
                    .map(|(key, value)| format!("/{key} {}", syntax(value)))
                    .collect();
                writeln!(
                    out,
                    "{indent}inline image [{}] {} bytes",
                    header.join(" "),
                    image.data.len()
                )?;
            }
        }
    }
    Ok(())
}

fn dump_operation<W: Write>(out: &mut W, indent: &str, operation: &Operation) -> io::Result<()> {
    write!(out, "{indent}")?;
    let mut line = Vec::new();
    operation.write_to(&mut line);
    out.write_all(&line)
}

/// Map a file as one body. Empty files give an empty body.
fn load_body(path: &Path) -> Result<Bytes> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();
    if len == 0 {
        return Ok(Bytes::new());
    }
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot map {}", path.display()))?;
    Ok(Bytes::from_owner(mmap))
}

fn run(args: &Args) -> Result<()> {
    let bodies = args
        .files
        .iter()
        .map(|path| load_body(path))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(bodies = bodies.len(), "parsing content");

    let params = ParserParams {
        skip_image_separator: !args.keep_image_separator,
        ..ParserParams::default()
    };
    let mut parser = ContentParser::with_params(LogicalStream::new(bodies), params);
    let objects = parser.parse_all().context("malformed content stream")?;

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("cannot create {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    if args.json {
        let nodes: Vec<Node> = objects.iter().map(to_node).collect();
        serde_json::to_writer_pretty(&mut output, &nodes)?;
        writeln!(output)?;
    } else if args.normalize {
        let mut data = Vec::new();
        write_objects(&objects, &mut data);
        output.write_all(&data)?;
    } else {
        dump_outline(&mut output, &objects, 0)?;
    }

    output.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
