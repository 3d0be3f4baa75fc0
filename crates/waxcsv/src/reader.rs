//! The record handle.
//!
//! A [`CsvReader`] owns a [`SourceProvider`], one [`FieldScanner`] and the
//! column keys of the last named pass. Every call to [`CsvReader::lists`] or
//! one of the `records*` methods reopens the source from its beginning and
//! returns an iterator that borrows the reader, so a pass in flight cannot
//! outlive the next rewind.
//!
//! # Examples
//!
//! ```rust
//! use waxcsv::{BStr, CsvReader};
//!
//! let mut reader = CsvReader::new(&b"name,age\nAlice,30\nBob,25\n"[..])?;
//!
//! let rows: Vec<_> = reader.lists()?.collect::<Result<_, _>>()?;
//! assert_eq!(rows.len(), 3);
//!
//! let people: Vec<_> = reader.records()?.collect::<Result<_, _>>()?;
//! assert_eq!(people[0][BStr::new("name")], "Alice");
//! assert_eq!(people[1][BStr::new("age")], "25");
//! assert_eq!(reader.keys(), ["name", "age"]);
//!
//! assert!(reader.close());
//! assert!(!reader.close());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
use alloc::vec::Vec;
use core::{fmt, iter::FusedIterator};

use bstr::BString;

use crate::{
    buffer::Buffer,
    dialect::Dialect,
    error::{BufferError, CsvError},
    factory::{RecordFactory, StdFactory},
    scanner::{FieldEnd, FieldScanner},
    source::{ByteSource, SourceProvider},
};

/// Handle over a record source.
pub struct CsvReader<P: SourceProvider> {
    provider: P,
    scanner: FieldScanner<P::Source>,
    /// Header keys of the last inferred pass. Freed on every rewind.
    keys: Buffer<BString>,
}

impl<P: SourceProvider + fmt::Debug> fmt::Debug for CsvReader<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvReader")
            .field("provider", &self.provider)
            .field("dialect", self.scanner.dialect())
            .field("keys", &self.keys.as_slice())
            .finish_non_exhaustive()
    }
}

impl<P: SourceProvider> CsvReader<P> {
    /// Creates a reader with the default [`Dialect`]. Nothing is opened
    /// until the first pass.
    ///
    /// # Errors
    ///
    /// [`CsvError::Buffer`] when the field buffer cannot be allocated.
    pub fn new(provider: P) -> Result<Self, CsvError<P::Error>> {
        Self::with_dialect(provider, Dialect::default())
    }

    /// Creates a reader with a custom [`Dialect`].
    ///
    /// # Errors
    ///
    /// [`CsvError::Dialect`] for an unusable dialect, [`CsvError::Buffer`]
    /// when the field buffer cannot be allocated.
    pub fn with_dialect(provider: P, dialect: Dialect) -> Result<Self, CsvError<P::Error>> {
        dialect.validate()?;
        Ok(Self {
            provider,
            scanner: FieldScanner::new(dialect)?,
            keys: Buffer::unallocated(),
        })
    }

    #[must_use]
    pub fn dialect(&self) -> &Dialect {
        self.scanner.dialect()
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Column keys read from the header row by the last
    /// [`records`](Self::records) pass. Empty after any other pass.
    #[must_use]
    pub fn keys(&self) -> &[BString] {
        self.keys.as_slice()
    }

    fn rewind(&mut self) -> Result<(), CsvError<P::Error>> {
        self.keys.free();
        let source = self.provider.open().map_err(CsvError::Open)?;
        tracing::debug!("record source rewound");
        self.scanner.reset(source)
    }

    /// Iterates records as lists of fields.
    ///
    /// # Errors
    ///
    /// [`CsvError::Open`] when the source cannot be reopened,
    /// [`CsvError::Read`] when its first byte cannot be read.
    pub fn lists(&mut self) -> Result<Lists<'_, P::Source>, CsvError<P::Error>> {
        self.lists_with(StdFactory)
    }

    /// [`lists`](Self::lists) with caller-chosen collection types.
    ///
    /// # Errors
    ///
    /// Same as [`lists`](Self::lists).
    pub fn lists_with<F: RecordFactory>(
        &mut self,
        factory: F,
    ) -> Result<Lists<'_, P::Source, F>, CsvError<P::Error>> {
        self.rewind()?;
        Ok(Lists {
            scanner: &mut self.scanner,
            factory,
            done: false,
        })
    }

    /// Iterates records as mappings keyed by the fields of the first row.
    ///
    /// # Errors
    ///
    /// Same as [`lists`](Self::lists), plus read and allocation failures
    /// while the header row is scanned.
    pub fn records(&mut self) -> Result<Records<'_, P::Source>, CsvError<P::Error>> {
        self.records_with(StdFactory)
    }

    /// [`records`](Self::records) with caller-chosen collection types.
    ///
    /// # Errors
    ///
    /// Same as [`records`](Self::records).
    pub fn records_with<F: RecordFactory>(
        &mut self,
        factory: F,
    ) -> Result<Records<'_, P::Source, BString, F>, CsvError<P::Error>> {
        self.rewind()?;
        self.keys = Buffer::new(2)?;
        if let Err(err) = infer_keys(&mut self.scanner, &mut self.keys) {
            self.keys.free();
            return Err(err);
        }
        Ok(Records {
            scanner: &mut self.scanner,
            keys: KeySet::Inferred(&self.keys),
            factory,
            done: false,
        })
    }

    /// Iterates records as mappings keyed by `keys`, in order. The first row
    /// is data. `keys` is borrowed for the whole pass, never copied.
    ///
    /// # Errors
    ///
    /// Same as [`lists`](Self::lists).
    pub fn records_with_keys<'a, K: AsRef<[u8]>>(
        &'a mut self,
        keys: &'a [K],
    ) -> Result<Records<'a, P::Source, K>, CsvError<P::Error>> {
        self.records_with_keys_with(StdFactory, keys)
    }

    /// [`records_with_keys`](Self::records_with_keys) with caller-chosen
    /// collection types.
    ///
    /// # Errors
    ///
    /// Same as [`lists`](Self::lists).
    pub fn records_with_keys_with<'a, K: AsRef<[u8]>, F: RecordFactory>(
        &'a mut self,
        factory: F,
        keys: &'a [K],
    ) -> Result<Records<'a, P::Source, K, F>, CsvError<P::Error>> {
        self.rewind()?;
        Ok(Records {
            scanner: &mut self.scanner,
            keys: KeySet::Supplied(keys),
            factory,
            done: false,
        })
    }

    /// Drops the open source and frees the field and key buffers.
    ///
    /// Returns `false` when there was nothing left to release. A closed
    /// reader can still start a new pass.
    pub fn close(&mut self) -> bool {
        let released = self.scanner.close() || self.keys.is_allocated();
        self.keys.free();
        tracing::debug!(released, "record source closed");
        released
    }
}

#[cfg(feature = "std")]
impl CsvReader<crate::source::FileProvider> {
    /// Reader over the file at `path` with the default [`Dialect`]. The file
    /// is opened by each pass, not here.
    ///
    /// # Errors
    ///
    /// Same as [`CsvReader::new`].
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, CsvError<std::io::Error>> {
        Self::new(crate::source::FileProvider::new(path))
    }

    /// [`open`](Self::open) with a custom [`Dialect`].
    ///
    /// # Errors
    ///
    /// Same as [`CsvReader::with_dialect`].
    pub fn open_with(
        path: impl AsRef<std::path::Path>,
        dialect: Dialect,
    ) -> Result<Self, CsvError<std::io::Error>> {
        Self::with_dialect(crate::source::FileProvider::new(path), dialect)
    }
}

fn infer_keys<S: ByteSource>(
    scanner: &mut FieldScanner<S>,
    keys: &mut Buffer<BString>,
) -> Result<(), CsvError<S::Error>> {
    scanner.seek_record()?;
    if scanner.is_exhausted() {
        return Ok(());
    }
    loop {
        let end = scanner.scan_field()?;
        let mut key = Vec::new();
        key.try_reserve_exact(scanner.field().len())
            .map_err(BufferError::from)?;
        key.extend_from_slice(scanner.field());
        keys.push(BString::from(key))?;
        if end == FieldEnd::Record {
            break;
        }
    }
    tracing::debug!(count = keys.len(), "column keys taken from header row");
    Ok(())
}

/// Column keys of a named pass.
#[derive(Debug)]
pub enum KeySet<'a, K> {
    /// Copied out of the header row into the reader's own buffer.
    Inferred(&'a Buffer<BString>),
    /// Borrowed from the caller.
    Supplied(&'a [K]),
}

impl<K> Clone for KeySet<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for KeySet<'_, K> {}

impl<K: AsRef<[u8]>> KeySet<'_, K> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Inferred(keys) => keys.len(),
            Self::Supplied(keys) => keys.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        match self {
            Self::Inferred(keys) => keys.get(index).map(|k| k.as_slice()),
            Self::Supplied(keys) => keys.get(index).map(AsRef::<[u8]>::as_ref),
        }
    }

    #[must_use]
    pub fn is_inferred(&self) -> bool {
        matches!(self, Self::Inferred(_))
    }
}

/// Iterator over records as lists of fields. See [`CsvReader::lists`].
#[derive(Debug)]
pub struct Lists<'a, S, F = StdFactory> {
    scanner: &'a mut FieldScanner<S>,
    factory: F,
    done: bool,
}

impl<S: ByteSource, F: RecordFactory> Lists<'_, S, F> {
    fn read_list(&mut self) -> Result<Option<F::List>, CsvError<S::Error>> {
        self.scanner.seek_record()?;
        if self.scanner.is_exhausted() {
            return Ok(None);
        }
        let mut list = self.factory.new_list();
        let mut count = 0usize;
        loop {
            let end = self.scanner.scan_field()?;
            let field = self.factory.new_field(self.scanner.field());
            self.factory.push_list(&mut list, field);
            count += 1;
            if end == FieldEnd::Record {
                break;
            }
        }
        tracing::trace!(fields = count, "list");
        Ok(Some(list))
    }
}

impl<S: ByteSource, F: RecordFactory> Iterator for Lists<'_, S, F> {
    type Item = Result<F::List, CsvError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.read_list().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

impl<S: ByteSource, F: RecordFactory> FusedIterator for Lists<'_, S, F> {}

/// Iterator over records as keyed mappings. See [`CsvReader::records`] and
/// [`CsvReader::records_with_keys`].
///
/// Fields past the last key are scanned and dropped; records shorter than
/// the key list produce partial mappings.
#[derive(Debug)]
pub struct Records<'a, S, K = BString, F = StdFactory> {
    scanner: &'a mut FieldScanner<S>,
    keys: KeySet<'a, K>,
    factory: F,
    done: bool,
}

impl<S: ByteSource, K: AsRef<[u8]>, F: RecordFactory> Records<'_, S, K, F> {
    /// The keys fields are zipped against.
    #[must_use]
    pub fn keys(&self) -> KeySet<'_, K> {
        self.keys
    }

    fn read_record(&mut self) -> Result<Option<F::Record>, CsvError<S::Error>> {
        self.scanner.seek_record()?;
        if self.scanner.is_exhausted() {
            return Ok(None);
        }
        let mut record = self.factory.new_record();
        let mut index = 0usize;
        loop {
            let end = self.scanner.scan_field()?;
            if let Some(key) = self.keys.get(index) {
                let field = self.factory.new_field(self.scanner.field());
                self.factory.insert_record(&mut record, key, field);
            }
            index += 1;
            if end == FieldEnd::Record {
                break;
            }
        }
        tracing::trace!(fields = index, keys = self.keys.len(), "record");
        Ok(Some(record))
    }
}

impl<S: ByteSource, K: AsRef<[u8]>, F: RecordFactory> Iterator for Records<'_, S, K, F> {
    type Item = Result<F::Record, CsvError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.read_record().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

impl<S: ByteSource, K: AsRef<[u8]>, F: RecordFactory> FusedIterator for Records<'_, S, K, F> {}
