//! Sequential byte sources and the providers that (re)open them.
//!
//! The scanner never seeks: every pass over the records asks its
//! [`SourceProvider`] for a fresh [`ByteSource`] and reads it one byte at a
//! time until [`ByteSource::read_byte`] reports the end with `Ok(None)`.
use alloc::sync::Arc;
use core::convert::Infallible;

/// Something that yields one byte at a time.
pub trait ByteSource {
    /// Failure reported by a read.
    type Error;

    /// Reads the next byte. `Ok(None)` marks the end of the stream and must
    /// keep being returned by later calls.
    ///
    /// # Errors
    ///
    /// Whatever the underlying medium reports.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// Opens a [`ByteSource`] positioned at the start of the data.
pub trait SourceProvider {
    /// The source handed to the scanner for one pass.
    type Source: ByteSource<Error = Self::Error>;
    /// Failure reported while opening or reading.
    type Error;

    /// Opens the data from its beginning.
    ///
    /// # Errors
    ///
    /// When the data cannot be reached (missing file, permissions, ...).
    fn open(&mut self) -> Result<Self::Source, Self::Error>;
}

/// In-memory source over a byte slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Starts reading at the first byte of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    type Error = Infallible;

    #[inline]
    fn read_byte(&mut self) -> Result<Option<u8>, Infallible> {
        let b = self.bytes.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }
}

impl<'a> SourceProvider for &'a [u8] {
    type Source = SliceSource<'a>;
    type Error = Infallible;

    fn open(&mut self) -> Result<SliceSource<'a>, Infallible> {
        let &mut bytes = self;
        Ok(SliceSource::new(bytes))
    }
}

/// Shared in-memory data, read from the beginning on every pass.
#[derive(Debug, Clone)]
pub struct SharedSource {
    bytes: Arc<[u8]>,
    pos: usize,
}

impl ByteSource for SharedSource {
    type Error = Infallible;

    #[inline]
    fn read_byte(&mut self) -> Result<Option<u8>, Infallible> {
        let b = self.bytes.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }
}

impl SourceProvider for Arc<[u8]> {
    type Source = SharedSource;
    type Error = Infallible;

    fn open(&mut self) -> Result<SharedSource, Infallible> {
        Ok(SharedSource {
            bytes: Arc::clone(self),
            pos: 0,
        })
    }
}

/// Provider backed by a closure, for sources the crate does not know about.
///
/// ```rust
/// use waxcsv::{CsvReader, OpenWith, SliceSource};
///
/// let mut reader = CsvReader::new(OpenWith(|| {
///     Ok::<_, core::convert::Infallible>(SliceSource::new(b"a,b\n"))
/// }))?;
/// assert_eq!(reader.lists()?.count(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OpenWith<F>(pub F);

impl<F, S> SourceProvider for OpenWith<F>
where
    F: FnMut() -> Result<S, S::Error>,
    S: ByteSource,
{
    type Source = S;
    type Error = S::Error;

    fn open(&mut self) -> Result<S, S::Error> {
        (self.0)()
    }
}

#[cfg(feature = "std")]
pub use self::io::{FileProvider, ReadSource};

#[cfg(feature = "std")]
mod io {
    use std::{
        fs::File,
        io::{self, BufReader, ErrorKind, Read},
        path::{Path, PathBuf},
    };

    use super::{ByteSource, SourceProvider};

    /// Adapts any [`Read`] into a [`ByteSource`], reading through a
    /// [`BufReader`] so single-byte reads stay cheap.
    #[derive(Debug)]
    pub struct ReadSource<R> {
        inner: BufReader<R>,
    }

    impl<R: Read> ReadSource<R> {
        /// Wraps `reader`.
        pub fn new(reader: R) -> Self {
            Self {
                inner: BufReader::new(reader),
            }
        }
    }

    impl<R: Read> ByteSource for ReadSource<R> {
        type Error = io::Error;

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            let mut byte = 0u8;
            loop {
                match self.inner.read(core::slice::from_mut(&mut byte)) {
                    Ok(0) => return Ok(None),
                    Ok(_) => return Ok(Some(byte)),
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }
        }
    }

    /// Opens a file read-only at the start of every pass.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FileProvider {
        path: PathBuf,
    }

    impl FileProvider {
        /// Remembers `path`; nothing is opened until the first pass.
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// The file this provider opens.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl SourceProvider for FileProvider {
        type Source = ReadSource<File>;
        type Error = io::Error;

        fn open(&mut self) -> io::Result<ReadSource<File>> {
            tracing::debug!(path = %self.path.display(), "opening record source");
            File::open(&self.path).map(ReadSource::new)
        }
    }
}
