//! Logical stream behaviour over several physical bodies.

use bytes::Bytes;
use folio_core::PdfError;
use folio_core::io::{Buffer, ByteStream, LogicalStream};
use proptest::prelude::*;
use proptest::sample::Index;

fn stream(parts: &[&'static [u8]]) -> LogicalStream {
    LogicalStream::new(parts.iter().map(|&p| Bytes::from_static(p)).collect())
}

/// Split `data` at the given cut points; repeated cuts give empty bodies.
fn partition(data: &[u8], cuts: &[Index]) -> Vec<Bytes> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c.index(data.len() + 1)).collect();
    points.sort_unstable();
    let mut bodies = Vec::with_capacity(points.len() + 1);
    let mut start = 0;
    for point in points {
        bodies.push(Bytes::copy_from_slice(&data[start..point]));
        start = point;
    }
    bodies.push(Bytes::copy_from_slice(&data[start..]));
    bodies
}

fn read_all(stream: &mut impl ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(b) = stream.read_byte() {
        out.push(b);
    }
    out
}

#[test]
fn test_read_across_bodies_with_empty_body() {
    let mut s = stream(&[b"ab", b"", b"cd"]);
    assert_eq!(s.len(), 4);
    assert_eq!(read_all(&mut s), b"abcd");
    assert_eq!(s.read_byte(), None);
    assert_eq!(s.position(), 4);
}

#[test]
fn test_seek_to_body_boundaries() {
    let mut s = stream(&[b"ab", b"cd", b"ef"]);
    for position in [0, 2, 4, 6] {
        s.seek(position).unwrap();
        assert_eq!(s.position(), position);
    }
    s.seek(2).unwrap();
    assert_eq!(s.read_byte(), Some(b'c'));
    s.seek(6).unwrap();
    assert_eq!(s.read_byte(), None);
}

#[test]
fn test_seek_backwards_after_exhaustion() {
    let mut s = stream(&[b"ab", b"cd"]);
    read_all(&mut s);
    s.seek(1).unwrap();
    assert_eq!(read_all(&mut s), b"bcd");
}

#[test]
fn test_seek_out_of_range() {
    let mut s = stream(&[b"ab", b"cd"]);
    assert!(matches!(
        s.seek(5),
        Err(PdfError::OutOfRange { position: 5, len: 4 })
    ));
}

#[test]
fn test_skip_both_directions() {
    let mut s = stream(&[b"ab", b"cd", b"ef"]);
    s.skip(3).unwrap();
    assert_eq!(s.position(), 3);
    assert_eq!(s.read_byte(), Some(b'd'));
    s.skip(-3).unwrap();
    assert_eq!(s.position(), 1);
    assert_eq!(s.read_byte(), Some(b'b'));
    assert!(s.skip(-3).is_err());
}

#[test]
fn test_peek_does_not_move_across_boundary() {
    let mut s = stream(&[b"a", b"b"]);
    assert_eq!(s.read_byte(), Some(b'a'));
    assert_eq!(s.peek_byte(), Some(b'b'));
    assert_eq!(s.position(), 1);
    assert_eq!(s.read_byte(), Some(b'b'));
}

#[test]
fn test_zero_bodies_is_always_eof() {
    let mut s = LogicalStream::new(Vec::new());
    assert!(s.is_empty());
    assert_eq!(s.read_byte(), None);
    s.seek(0).unwrap();
    assert!(s.seek(1).is_err());
}

#[test]
fn test_write_is_not_supported() {
    let mut s = stream(&[b"ab"]);
    assert!(matches!(s.write(b"x"), Err(PdfError::NotSupported(_))));
}

#[test]
fn test_close_releases_bodies() {
    let mut s = stream(&[b"ab", b"cd"]);
    s.close();
    assert_eq!(s.body_count(), 0);
    assert_eq!(s.read_byte(), None);
}

#[test]
fn test_from_buffers_shares_bodies() {
    let body = Buffer::new(&b"xyz"[..]);
    let mut s = LogicalStream::from_buffers(vec![body.clone(), body]);
    assert_eq!(read_all(&mut s), b"xyzxyz");
}

proptest! {
    #[test]
    fn prop_partition_reads_back_original(
        data in prop::collection::vec(any::<u8>(), 0..64),
        cuts in prop::collection::vec(any::<Index>(), 0..6),
    ) {
        let mut s = LogicalStream::new(partition(&data, &cuts));
        prop_assert_eq!(s.len(), data.len() as u64);
        prop_assert_eq!(read_all(&mut s), data);
        prop_assert_eq!(s.read_byte(), None);
    }

    #[test]
    fn prop_seek_then_position_is_identity(
        data in prop::collection::vec(any::<u8>(), 1..64),
        cuts in prop::collection::vec(any::<Index>(), 0..6),
        targets in prop::collection::vec(any::<Index>(), 1..8),
    ) {
        let mut s = LogicalStream::new(partition(&data, &cuts));
        for target in targets {
            let p = target.index(data.len() + 1);
            s.seek(p as u64).unwrap();
            prop_assert_eq!(s.position(), p as u64);
            prop_assert_eq!(s.read_byte(), data.get(p).copied());
        }
    }

    #[test]
    fn prop_skip_matches_seek(
        data in prop::collection::vec(any::<u8>(), 1..64),
        cuts in prop::collection::vec(any::<Index>(), 0..6),
        from in any::<Index>(),
        to in any::<Index>(),
    ) {
        let from = from.index(data.len() + 1);
        let to = to.index(data.len() + 1);
        let mut s = LogicalStream::new(partition(&data, &cuts));
        s.seek(from as u64).unwrap();
        s.skip(to as i64 - from as i64).unwrap();
        prop_assert_eq!(s.position(), to as u64);
        prop_assert_eq!(s.read_byte(), data.get(to).copied());
    }
}
