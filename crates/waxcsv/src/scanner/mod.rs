//! Field scanner: a byte-at-a-time state machine over a [`ByteSource`].
//!
//! What it does
//! - Holds exactly one unconsumed byte of lookahead between calls
//!   ([`Lookahead`]). End of stream is its own variant, so NUL bytes are
//!   ordinary data.
//! - [`FieldScanner::scan_field`] clears the field buffer, then drives
//!   [`transition`] until a separator, a line ending or the end of the stream
//!   closes the field. The bytes stay readable through
//!   [`FieldScanner::field`] until the next scan.
//! - `\n`, `\r` and `\r\n` all end a record; none of them reach the field.
//!
//! Tolerated input
//! - A quoted field that never closes ends the field and the record at the
//!   end of the stream.
//! - Bytes between a closing quote and the next delimiter are dropped.
//!
//! Both are logged at `debug` level and never reported as errors.
//!
//! Example
//! ```rust
//! use waxcsv::{Dialect, FieldEnd, FieldScanner, SliceSource};
//!
//! let mut s = FieldScanner::new(Dialect::default())?;
//! s.reset(SliceSource::new(b"\"he said \"\"hi\"\"\",2\n"))?;
//! assert_eq!(s.scan_field()?, FieldEnd::Field);
//! assert_eq!(s.field(), b"he said \"hi\"");
//! assert_eq!(s.scan_field()?, FieldEnd::Record);
//! assert_eq!(s.field(), b"2");
//! assert!(s.is_exhausted());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![allow(clippy::enum_glob_use)]

use crate::{
    buffer::Buffer,
    dialect::Dialect,
    error::{BufferError, CsvError},
    source::ByteSource,
};

/// The next unconsumed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    Byte(u8),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// At the first byte of a field.
    Start,
    Unquoted,
    Quoted,
    /// A quote was consumed inside a quoted field; the lookahead decides
    /// whether it was an escape or the closing quote.
    ClosingQuote,
    /// Dropping bytes until the delimiter that follows a closing quote.
    AfterClosingQuote,
    /// Consuming line-ending bytes before a record.
    SeekNextRecord,
    EndOfStream,
}

/// What the driver does with the lookahead after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append the lookahead to the field and advance.
    Append,
    /// Advance without keeping the lookahead.
    Skip,
    /// Keep the lookahead; the new state examines it again.
    Hold,
    /// Consume the separator. The field ended, more fields follow.
    EndField,
    /// Consume `\n`. The record ended.
    EndRecord,
    /// Consume `\r` and a `\n` right after it. The record ended.
    EndRecordCr,
    /// Nothing left to consume. The record and the stream ended.
    Finish,
}

/// How the last scanned field was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEnd {
    /// More fields follow in the same record.
    Field,
    /// The field was the last of its record.
    Record,
}

#[inline]
fn delimiter(b: u8, dialect: Dialect) -> Option<Action> {
    if b == dialect.separator {
        Some(Action::EndField)
    } else if b == b'\n' {
        Some(Action::EndRecord)
    } else if b == b'\r' {
        Some(Action::EndRecordCr)
    } else {
        None
    }
}

/// One step of the scanner: the next state and what to do with `input`.
#[must_use]
pub fn transition(state: ScanState, input: Lookahead, dialect: &Dialect) -> (ScanState, Action) {
    use Action::*;
    use ScanState::*;

    let b = match (state, input) {
        (EndOfStream, _) | (_, Lookahead::End) => return (EndOfStream, Finish),
        (_, Lookahead::Byte(b)) => b,
    };

    match state {
        Start if b == dialect.quote => (Quoted, Skip),
        Start => (Unquoted, Hold),
        SeekNextRecord if b == b'\r' || b == b'\n' => (SeekNextRecord, Skip),
        SeekNextRecord => (Start, Hold),
        Unquoted => match delimiter(b, *dialect) {
            Some(action) => (Start, action),
            None => (Unquoted, Append),
        },
        Quoted if b == dialect.quote => (ClosingQuote, Skip),
        Quoted => (Quoted, Append),
        ClosingQuote if b == dialect.quote => (Quoted, Append),
        ClosingQuote => (AfterClosingQuote, Hold),
        AfterClosingQuote => match delimiter(b, *dialect) {
            Some(action) => (Start, action),
            None => (AfterClosingQuote, Skip),
        },
        EndOfStream => (EndOfStream, Finish),
    }
}

/// Owner of the source, the lookahead byte and the reusable field buffer.
#[derive(Debug)]
pub struct FieldScanner<S> {
    source: Option<S>,
    lookahead: Lookahead,
    dialect: Dialect,
    field: Buffer<u8>,
}

impl<S: ByteSource> FieldScanner<S> {
    /// Creates a scanner with no source attached.
    ///
    /// # Errors
    ///
    /// When the field buffer cannot be allocated.
    pub fn new(dialect: Dialect) -> Result<Self, BufferError> {
        Ok(Self {
            source: None,
            lookahead: Lookahead::End,
            dialect,
            field: Buffer::new(1)?,
        })
    }

    /// Replaces the source and reads its first byte into the lookahead.
    ///
    /// # Errors
    ///
    /// [`CsvError::Read`] when that first read fails.
    pub fn reset(&mut self, source: S) -> Result<(), CsvError<S::Error>> {
        self.source = Some(source);
        self.field.clear();
        self.advance()
    }

    #[inline]
    fn advance(&mut self) -> Result<(), CsvError<S::Error>> {
        let Some(source) = self.source.as_mut() else {
            self.lookahead = Lookahead::End;
            return Ok(());
        };
        match source.read_byte() {
            Ok(Some(b)) => self.lookahead = Lookahead::Byte(b),
            Ok(None) => self.lookahead = Lookahead::End,
            Err(e) => {
                self.lookahead = Lookahead::End;
                return Err(CsvError::Read(e));
            }
        }
        Ok(())
    }

    /// The next unconsumed input.
    #[inline]
    #[must_use]
    pub fn lookahead(&self) -> Lookahead {
        self.lookahead
    }

    /// Whether every byte of the source has been consumed.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.lookahead == Lookahead::End
    }

    #[must_use]
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Bytes of the last scanned field.
    #[inline]
    #[must_use]
    pub fn field(&self) -> &[u8] {
        self.field.as_slice()
    }

    /// Consumes blank lines before a record when the dialect asks for it.
    ///
    /// # Errors
    ///
    /// [`CsvError::Read`] when the source fails.
    pub fn seek_record(&mut self) -> Result<(), CsvError<S::Error>> {
        if !self.dialect.skip_blank_lines {
            return Ok(());
        }
        let mut state = ScanState::SeekNextRecord;
        while state == ScanState::SeekNextRecord {
            let (next, action) = transition(state, self.lookahead, &self.dialect);
            if action == Action::Skip {
                self.advance()?;
            }
            state = next;
        }
        Ok(())
    }

    /// Scans one field into the field buffer.
    ///
    /// At the end of the stream this keeps returning an empty field that
    /// ends its record.
    ///
    /// # Errors
    ///
    /// [`CsvError::Read`] when the source fails, [`CsvError::Buffer`] when
    /// the field cannot grow. The field content is unspecified afterwards.
    pub fn scan_field(&mut self) -> Result<FieldEnd, CsvError<S::Error>> {
        self.field.clear();
        let mut state = ScanState::Start;
        loop {
            let (next, action) = transition(state, self.lookahead, &self.dialect);
            #[cfg(trace_scanner)]
            tracing::trace!(?state, ?next, ?action, lookahead = ?self.lookahead, "scan");

            match action {
                Action::Append => {
                    if let Lookahead::Byte(b) = self.lookahead {
                        self.field.push(b)?;
                    }
                    self.advance()?;
                }
                Action::Skip => {
                    if state == ScanState::AfterClosingQuote {
                        tracing::debug!(lookahead = ?self.lookahead, "dropping byte after closing quote");
                    }
                    self.advance()?;
                }
                Action::Hold => {}
                Action::EndField => {
                    self.advance()?;
                    return Ok(FieldEnd::Field);
                }
                Action::EndRecord => {
                    self.advance()?;
                    return Ok(FieldEnd::Record);
                }
                Action::EndRecordCr => {
                    self.advance()?;
                    if self.lookahead == Lookahead::Byte(b'\n') {
                        self.advance()?;
                    }
                    return Ok(FieldEnd::Record);
                }
                Action::Finish => {
                    if state == ScanState::Quoted {
                        tracing::debug!(len = self.field.len(), "unterminated quoted field");
                    }
                    return Ok(FieldEnd::Record);
                }
            }
            state = next;
        }
    }

    /// Drops the source and frees the field buffer. Returns `false` when
    /// there was nothing left to release.
    pub fn close(&mut self) -> bool {
        let released = self.source.take().is_some() || self.field.is_allocated();
        self.field.free();
        self.lookahead = Lookahead::End;
        released
    }
}

#[cfg(test)]
mod tests;
