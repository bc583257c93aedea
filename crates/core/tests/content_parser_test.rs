//! Grouping behaviour of the content parser.

use bytes::Bytes;
use folio_core::PdfError;
use folio_core::content::{CompositeKind, ContentObject, OperationKind, OperatorRegistry};
use folio_core::io::{Buffer, ByteStream, LogicalStream};
use folio_core::model::PDFObject;
use folio_core::parser::{ContentParser, ParserParams};

fn parser(data: &'static [u8]) -> ContentParser<Buffer> {
    ContentParser::new(Buffer::new(data))
}

fn parse_all(data: &'static [u8]) -> Vec<ContentObject> {
    parser(data).parse_all().expect("parse")
}

fn operators(objects: &[ContentObject]) -> Vec<String> {
    objects
        .iter()
        .flat_map(ContentObject::operations)
        .map(|op| op.operator().to_string())
        .collect()
}

#[test]
fn test_path_ends_at_painting() {
    let objects = parse_all(b"0 0 m 10 0 l 10 10 l h S");
    assert_eq!(objects.len(), 1);
    let ContentObject::Path(path) = &objects[0] else {
        panic!("expected path, got {:?}", objects[0]);
    };
    let ops: Vec<&str> = path.operations.iter().map(|op| op.operator()).collect();
    assert_eq!(ops, ["m", "l", "l", "h", "S"]);
    assert!(path.is_painted());
}

#[test]
fn test_path_keeps_construction_after_paint() {
    let objects = parse_all(b"0 0 m 1 1 l S 2 2 m 3 3 l S");
    assert_eq!(objects.len(), 1);
    let ContentObject::Path(path) = &objects[0] else {
        panic!("expected path");
    };
    assert_eq!(path.operations.len(), 6);
}

#[test]
fn test_path_rolls_back_first_foreign_operation() {
    let mut parser = parser(b"0 0 m 1 1 l S BT ET");
    let first = parser.parse_content_object().unwrap().unwrap();
    let ContentObject::Path(path) = first else {
        panic!("expected path");
    };
    assert_eq!(path.operations.len(), 3);
    assert_eq!(parser.position(), 13);

    let next = parser.parse_content_object().unwrap().unwrap();
    let composite = next.as_composite().expect("text object");
    assert_eq!(composite.kind, CompositeKind::Text);
    assert!(composite.objects.is_empty());
}

#[test]
fn test_clip_path_stays_with_path() {
    let objects = parse_all(b"0 0 10 10 re W n 1 g");
    assert_eq!(objects.len(), 2);
    let ContentObject::Path(path) = &objects[0] else {
        panic!("expected path");
    };
    assert_eq!(path.operations.len(), 3);
    assert_eq!(objects[1].as_operation().unwrap().operator(), "g");
}

#[test]
fn test_unpainted_path_runs_to_end() {
    let objects = parse_all(b"0 0 m 1 1 l");
    let ContentObject::Path(path) = &objects[0] else {
        panic!("expected path");
    };
    assert_eq!(path.operations.len(), 2);
    assert!(!path.is_painted());
}

#[test]
fn test_nested_graphics_state() {
    let objects = parse_all(b"q q 1 0 0 1 5 5 Tm Q Q");
    assert_eq!(objects.len(), 1);
    let outer = objects[0].as_composite().unwrap();
    assert_eq!(outer.kind, CompositeKind::LocalGraphicsState);
    assert_eq!(outer.objects.len(), 1);
    let inner = outer.objects[0].as_composite().unwrap();
    assert_eq!(inner.kind, CompositeKind::LocalGraphicsState);
    assert_eq!(inner.objects.len(), 1);
    assert_eq!(inner.objects[0].as_operation().unwrap().operator(), "Tm");
}

#[test]
fn test_text_object_children() {
    let objects = parse_all(b"BT /F1 12 Tf 1 0 0 1 72 720 Tm (Hi) Tj ET");
    assert_eq!(objects.len(), 1);
    let text = objects[0].as_composite().unwrap();
    assert_eq!(text.kind, CompositeKind::Text);
    let ops: Vec<&str> = text
        .objects
        .iter()
        .map(|o| o.as_operation().unwrap().operator())
        .collect();
    assert_eq!(ops, ["Tf", "Tm", "Tj"]);
}

#[test]
fn test_marked_content_keeps_begin_operation() {
    let objects = parse_all(b"/Span <</MCID 0>> BDC BT ET EMC");
    let composite = objects[0].as_composite().unwrap();
    let CompositeKind::MarkedContent(begin) = &composite.kind else {
        panic!("expected marked content");
    };
    assert_eq!(begin.marked_content_tag().unwrap(), "Span");
    let props = begin.marked_content_properties().unwrap().as_dict().unwrap();
    assert_eq!(props.get("MCID"), Some(&PDFObject::Int(0)));
    assert_eq!(composite.objects.len(), 1);
}

#[test]
fn test_unterminated_composite_is_accepted() {
    let objects = parse_all(b"q BT (x) Tj");
    let outer = objects[0].as_composite().unwrap();
    let text = outer.objects[0].as_composite().unwrap();
    assert_eq!(text.objects.len(), 1);
}

#[test]
fn test_stray_terminator_at_top_level_is_dropped() {
    let objects = parse_all(b"Q 1 w ET 2 w");
    assert_eq!(operators(&objects), ["w", "w"]);
}

#[test]
fn test_xobject_and_shading_wrappers() {
    let objects = parse_all(b"/Im1 Do /Sh0 sh");
    let ContentObject::XObject(xobject) = &objects[0] else {
        panic!("expected xobject");
    };
    assert_eq!(xobject.name().unwrap(), "Im1");
    let ContentObject::Shading(shading) = &objects[1] else {
        panic!("expected shading");
    };
    assert_eq!(shading.name().unwrap(), "Sh0");
}

#[test]
fn test_inline_image_payload_and_position() {
    let data: &'static [u8] = b"BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xffEI Q";
    let mut parser = parser(data);
    let object = parser.parse_content_object().unwrap().unwrap();
    let ContentObject::InlineImage(image) = object else {
        panic!("expected inline image");
    };
    assert_eq!(image.header.width(), Some(2));
    assert_eq!(image.header.height(), Some(1));
    assert_eq!(image.header.bits_per_component(), Some(8));
    assert_eq!(image.header.get("ColorSpace"), Some(&PDFObject::name("G")));
    assert_eq!(&image.data[..], b"\x00\xff");
    // Right after the marker
    assert_eq!(parser.position(), 34);
    let next = parser.parse_content_object().unwrap().unwrap();
    assert_eq!(next.as_operation().unwrap().operator(), "Q");
}

#[test]
fn test_inline_image_without_separator_skip() {
    let params = ParserParams {
        skip_image_separator: false,
        ..ParserParams::default()
    };
    let mut parser = ContentParser::with_params(Buffer::new(&b"BI /W 1 ID abEI"[..]), params);
    let ContentObject::InlineImage(image) = parser.parse_content_object().unwrap().unwrap() else {
        panic!("expected inline image");
    };
    // The separator is scanned as payload, pairing " a" and "bE"
    assert_eq!(&image.data[..], b" abEI");
}

#[test]
fn test_inline_image_runs_to_end_of_stream() {
    let objects = parse_all(b"BI /W 1 ID abc");
    let ContentObject::InlineImage(image) = &objects[0] else {
        panic!("expected inline image");
    };
    assert_eq!(&image.data[..], b"abc");
}

#[test]
fn test_inline_image_marker_at_odd_offset_is_skipped() {
    let objects = parse_all(b"BI ID aEIbEI");
    let ContentObject::InlineImage(image) = &objects[0] else {
        panic!("expected inline image");
    };
    assert_eq!(&image.data[..], b"aEIb");
}

#[test]
fn test_unknown_operator_is_generic() {
    let objects = parse_all(b"1 2 zz");
    let op = objects[0].as_operation().unwrap();
    assert_eq!(op.kind(), OperationKind::Generic);
    assert_eq!(op.operator(), "zz");
    assert_eq!(op.operands(), [PDFObject::Int(1), PDFObject::Int(2)]);
}

#[test]
fn test_registered_operator_groups() {
    let mut registry = OperatorRegistry::default();
    registry.register("BTX", OperationKind::BeginText);
    let params = ParserParams::with_registry(registry);
    let mut parser = ContentParser::with_params(Buffer::new(&b"BTX (a) Tj ET"[..]), params);
    let objects = parser.parse_all().unwrap();
    let text = objects[0].as_composite().unwrap();
    assert_eq!(text.kind, CompositeKind::Text);
    assert_eq!(parser.params().registry.kind_of("BTX"), OperationKind::BeginText);
}

#[test]
fn test_dangling_operands_are_dropped() {
    let mut parser = parser(b"1 w 2 3");
    assert_eq!(parser.parse_operation().unwrap().unwrap().operator(), "w");
    assert!(parser.parse_operation().unwrap().is_none());
    assert!(!parser.has_more());
}

#[test]
fn test_malformed_token_is_fatal() {
    let mut parser = parser(b"1 w ) 2 w");
    assert!(parser.parse_operation().unwrap().is_some());
    assert!(matches!(
        parser.parse_operation(),
        Err(PdfError::TokenError { pos: 4, .. })
    ));
}

#[test]
fn test_parser_iterates_objects() {
    let parser = parser(b"q Q 1 w BT ET");
    let objects: Vec<ContentObject> = parser.collect::<Result<_, _>>().unwrap();
    assert_eq!(objects.len(), 3);
}

#[test]
fn test_operations_straddle_bodies() {
    let bodies = vec![
        Bytes::from_static(b"BT /F1 1"),
        Bytes::from_static(b"2 Tf (a"),
        Bytes::from_static(b"b) Tj E"),
        Bytes::from_static(b"T"),
    ];
    let mut parser = ContentParser::new(LogicalStream::new(bodies));
    let objects = parser.parse_all().unwrap();
    let text = objects[0].as_composite().unwrap();
    let font = text.objects[0].as_operation().unwrap().font().unwrap();
    assert_eq!(font.name, "F1");
    assert_eq!(font.size, 12.0);
    let shown = text.objects[1].as_operation().unwrap().text().unwrap();
    assert_eq!(shown, b"ab");
    assert!(parser.into_inner().read_byte().is_none());
}

#[test]
fn test_round_trip_through_serialization() {
    let source: &'static [u8] =
        b"q 1 0 0 1 10 10 cm 0 0 m 5 5 l S BT /F1 9 Tf [(a) -20 (b)] TJ ET /Im0 Do Q";
    let objects = parse_all(source);
    let mut out = Vec::new();
    folio_core::content::write_objects(&objects, &mut out);
    let reparsed = ContentParser::new(Buffer::new(out)).parse_all().unwrap();
    assert_eq!(objects, reparsed);
}
