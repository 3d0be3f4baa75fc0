use alloc::{vec, vec::Vec};
use core::convert::Infallible;

use rstest::rstest;

use super::*;
use crate::source::SliceSource;

fn scanner(input: &[u8], dialect: Dialect) -> FieldScanner<SliceSource<'_>> {
    let mut s = FieldScanner::new(dialect).unwrap();
    s.reset(SliceSource::new(input)).unwrap();
    s
}

/// Scans every field until the stream is exhausted, keeping the boundary
/// that closed each one.
fn fields(input: &[u8], dialect: Dialect) -> Vec<(Vec<u8>, FieldEnd)> {
    let mut s = scanner(input, dialect);
    let mut out = Vec::new();
    while !s.is_exhausted() {
        let end = s.scan_field().unwrap();
        out.push((s.field().to_vec(), end));
    }
    out
}

fn f(bytes: &[u8]) -> (Vec<u8>, FieldEnd) {
    (bytes.to_vec(), FieldEnd::Field)
}

fn r(bytes: &[u8]) -> (Vec<u8>, FieldEnd) {
    (bytes.to_vec(), FieldEnd::Record)
}

#[rstest]
#[case(ScanState::Start, Lookahead::Byte(b'"'), ScanState::Quoted, Action::Skip)]
#[case(ScanState::Start, Lookahead::Byte(b'a'), ScanState::Unquoted, Action::Hold)]
#[case(ScanState::Start, Lookahead::Byte(b','), ScanState::Unquoted, Action::Hold)]
#[case(ScanState::Start, Lookahead::End, ScanState::EndOfStream, Action::Finish)]
#[case(ScanState::Unquoted, Lookahead::Byte(b'a'), ScanState::Unquoted, Action::Append)]
#[case(ScanState::Unquoted, Lookahead::Byte(b'"'), ScanState::Unquoted, Action::Append)]
#[case(ScanState::Unquoted, Lookahead::Byte(b','), ScanState::Start, Action::EndField)]
#[case(ScanState::Unquoted, Lookahead::Byte(b'\n'), ScanState::Start, Action::EndRecord)]
#[case(ScanState::Unquoted, Lookahead::Byte(b'\r'), ScanState::Start, Action::EndRecordCr)]
#[case(ScanState::Unquoted, Lookahead::End, ScanState::EndOfStream, Action::Finish)]
#[case(ScanState::Quoted, Lookahead::Byte(b','), ScanState::Quoted, Action::Append)]
#[case(ScanState::Quoted, Lookahead::Byte(b'\n'), ScanState::Quoted, Action::Append)]
#[case(ScanState::Quoted, Lookahead::Byte(b'"'), ScanState::ClosingQuote, Action::Skip)]
#[case(ScanState::Quoted, Lookahead::End, ScanState::EndOfStream, Action::Finish)]
#[case(ScanState::ClosingQuote, Lookahead::Byte(b'"'), ScanState::Quoted, Action::Append)]
#[case(ScanState::ClosingQuote, Lookahead::Byte(b','), ScanState::AfterClosingQuote, Action::Hold)]
#[case(ScanState::ClosingQuote, Lookahead::Byte(b'x'), ScanState::AfterClosingQuote, Action::Hold)]
#[case(ScanState::ClosingQuote, Lookahead::End, ScanState::EndOfStream, Action::Finish)]
#[case(ScanState::AfterClosingQuote, Lookahead::Byte(b'x'), ScanState::AfterClosingQuote, Action::Skip)]
#[case(ScanState::AfterClosingQuote, Lookahead::Byte(b'"'), ScanState::AfterClosingQuote, Action::Skip)]
#[case(ScanState::AfterClosingQuote, Lookahead::Byte(b','), ScanState::Start, Action::EndField)]
#[case(ScanState::AfterClosingQuote, Lookahead::Byte(b'\r'), ScanState::Start, Action::EndRecordCr)]
#[case(ScanState::SeekNextRecord, Lookahead::Byte(b'\n'), ScanState::SeekNextRecord, Action::Skip)]
#[case(ScanState::SeekNextRecord, Lookahead::Byte(b'\r'), ScanState::SeekNextRecord, Action::Skip)]
#[case(ScanState::SeekNextRecord, Lookahead::Byte(b'a'), ScanState::Start, Action::Hold)]
#[case(ScanState::SeekNextRecord, Lookahead::End, ScanState::EndOfStream, Action::Finish)]
#[case(ScanState::EndOfStream, Lookahead::Byte(b'a'), ScanState::EndOfStream, Action::Finish)]
fn transition_table(
    #[case] state: ScanState,
    #[case] input: Lookahead,
    #[case] next: ScanState,
    #[case] action: Action,
) {
    assert_eq!(transition(state, input, &Dialect::default()), (next, action));
}

#[test]
fn transition_follows_dialect() {
    let d = Dialect {
        separator: b'\t',
        quote: b'\'',
        ..Dialect::default()
    };
    assert_eq!(
        transition(ScanState::Unquoted, Lookahead::Byte(b','), &d),
        (ScanState::Unquoted, Action::Append)
    );
    assert_eq!(
        transition(ScanState::Unquoted, Lookahead::Byte(b'\t'), &d),
        (ScanState::Start, Action::EndField)
    );
    assert_eq!(
        transition(ScanState::Start, Lookahead::Byte(b'\''), &d),
        (ScanState::Quoted, Action::Skip)
    );
    assert_eq!(
        transition(ScanState::Start, Lookahead::Byte(b'"'), &d),
        (ScanState::Unquoted, Action::Hold)
    );
}

#[test]
fn unquoted_fields_and_records() {
    assert_eq!(
        fields(b"a,b\n1,2\n", Dialect::default()),
        vec![f(b"a"), r(b"b"), f(b"1"), r(b"2")]
    );
}

#[test]
fn quoted_separator_and_newline_are_data() {
    assert_eq!(
        fields(b"\"c,d\",\"x\ny\"\n", Dialect::default()),
        vec![f(b"c,d"), r(b"x\ny")]
    );
}

#[test]
fn doubled_quote_is_literal() {
    assert_eq!(
        fields(b"\"he said \"\"hi\"\"\",2\n", Dialect::default()),
        vec![f(b"he said \"hi\""), r(b"2")]
    );
    assert_eq!(fields(b"\"\"\"\"", Dialect::default()), vec![r(b"\"")]);
}

#[test]
fn crlf_and_lone_cr_end_records() {
    assert_eq!(
        fields(b"a,b\r\nc\rd\n", Dialect::default()),
        vec![f(b"a"), r(b"b"), r(b"c"), r(b"d")]
    );
}

#[test]
fn empty_fields() {
    assert_eq!(
        fields(b",,\n\"\",x", Dialect::default()),
        vec![f(b""), f(b""), r(b""), f(b""), r(b"x")]
    );
}

#[test]
fn trailing_separator_at_end_of_stream_yields_empty_field() {
    assert_eq!(fields(b"a,", Dialect::default()), vec![f(b"a")]);

    let mut s = scanner(b"a,", Dialect::default());
    assert_eq!(s.scan_field().unwrap(), FieldEnd::Field);
    assert!(s.is_exhausted());
    assert_eq!(s.scan_field().unwrap(), FieldEnd::Record);
    assert_eq!(s.field(), b"");
}

#[test]
fn unterminated_quote_is_accepted() {
    assert_eq!(
        fields(b"x,\"never closed,\nstill", Dialect::default()),
        vec![f(b"x"), r(b"never closed,\nstill")]
    );
}

#[test]
fn bytes_after_closing_quote_are_dropped() {
    assert_eq!(
        fields(b"\"ab\"junk,c\n\"d\"  \r\n", Dialect::default()),
        vec![f(b"ab"), r(b"c"), r(b"d")]
    );
}

#[test]
fn nul_is_data() {
    assert_eq!(
        fields(b"a\0b,\0\n", Dialect::default()),
        vec![f(b"a\0b"), r(b"\0")]
    );
}

#[test]
fn blank_lines_are_kept_by_default() {
    assert_eq!(
        fields(b"a\n\n\r\nb", Dialect::default()),
        vec![r(b"a"), r(b""), r(b""), r(b"b")]
    );
}

#[test]
fn seek_record_skips_blank_lines() {
    let d = Dialect {
        skip_blank_lines: true,
        ..Dialect::default()
    };
    let mut s = scanner(b"\n\r\n\rab\n\n", d);
    s.seek_record().unwrap();
    assert_eq!(s.lookahead(), Lookahead::Byte(b'a'));
    assert_eq!(s.scan_field().unwrap(), FieldEnd::Record);
    assert_eq!(s.field(), b"ab");
    s.seek_record().unwrap();
    assert!(s.is_exhausted());
}

#[test]
fn seek_record_is_inert_without_skip_blank_lines() {
    let mut s = scanner(b"\nab", Dialect::default());
    s.seek_record().unwrap();
    assert_eq!(s.lookahead(), Lookahead::Byte(b'\n'));
}

#[test]
fn exhausted_scanner_keeps_ending_records() {
    let mut s = scanner(b"", Dialect::default());
    assert!(s.is_exhausted());
    for _ in 0..3 {
        assert_eq!(s.scan_field().unwrap(), FieldEnd::Record);
        assert_eq!(s.field(), b"");
    }
}

#[test]
fn field_buffer_is_reused_across_fields() {
    let mut s = scanner(b"abcdefgh,x\n", Dialect::default());
    s.scan_field().unwrap();
    let cap = s.field.capacity();
    assert_eq!(cap, 8);
    s.scan_field().unwrap();
    assert_eq!(s.field(), b"x");
    assert_eq!(s.field.capacity(), cap);
}

#[test]
fn close_releases_once_and_reset_recovers() {
    let mut s = scanner(b"a,b", Dialect::default());
    assert!(s.close());
    assert!(!s.close());
    assert!(s.is_exhausted());

    s.reset(SliceSource::new(b"z")).unwrap();
    assert_eq!(s.scan_field().unwrap(), FieldEnd::Record);
    assert_eq!(s.field(), b"z");
}

struct FailingSource {
    left: usize,
}

#[derive(Debug, PartialEq)]
struct Broken;

impl ByteSource for FailingSource {
    type Error = Broken;

    fn read_byte(&mut self) -> Result<Option<u8>, Broken> {
        if self.left == 0 {
            return Err(Broken);
        }
        self.left -= 1;
        Ok(Some(b'a'))
    }
}

#[test]
fn read_errors_surface_and_end_the_stream() {
    let mut s = FieldScanner::new(Dialect::default()).unwrap();
    s.reset(FailingSource { left: 2 }).unwrap();
    let err = s.scan_field().unwrap_err();
    assert!(matches!(err, CsvError::Read(Broken)));
    assert!(s.is_exhausted());
}

#[test]
fn first_read_error_surfaces_on_reset() {
    let mut s = FieldScanner::new(Dialect::default()).unwrap();
    let err = s.reset(FailingSource { left: 0 }).unwrap_err();
    assert!(matches!(err, CsvError::Read(Broken)));
}

#[test]
fn scanner_without_source_is_exhausted() {
    let mut s: FieldScanner<SliceSource<'_>> = FieldScanner::new(Dialect::default()).unwrap();
    assert!(s.is_exhausted());
    let end: Result<FieldEnd, CsvError<Infallible>> = s.scan_field();
    assert!(matches!(end, Ok(FieldEnd::Record)));
}
