//! A byte-at-a-time reader for delimited records (CSV and friends).
//!
//! The crate is built from two pieces:
//!
//! - [`Buffer`], a growable array with explicit capacity bookkeeping and
//!   fallible, doubling growth.
//! - [`FieldScanner`], a state machine that pulls one byte at a time from a
//!   [`ByteSource`] and splits it into fields and records.
//!
//! [`CsvReader`] ties them together and hands records out either as lists
//! of fields or as mappings keyed by a header row or caller-supplied keys.
//! Every pass reopens its source, so a reader can be iterated any number of
//! times.
//!
//! ```rust
//! let mut reader = waxcsv::from_bytes(&b"a,b,\"c,d\",e\n1,2,3,4\n"[..])?;
//! let rows: Vec<_> = reader.lists()?.collect::<Result<_, _>>()?;
//! assert_eq!(rows, [["a", "b", "c,d", "e"], ["1", "2", "3", "4"]]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod buffer;
mod dialect;
mod error;
mod factory;
mod reader;
mod scanner;
mod source;

#[cfg(test)]
mod tests;

use alloc::sync::Arc;
use core::convert::Infallible;

pub use bstr::{BStr, BString};
pub use buffer::Buffer;
pub use dialect::Dialect;
pub use error::{BufferError, CsvError, DialectError};
pub use factory::{List, Record, RecordFactory, StdFactory};
pub use reader::{CsvReader, KeySet, Lists, Records};
pub use scanner::{Action, FieldEnd, FieldScanner, Lookahead, ScanState, transition};
#[cfg(feature = "std")]
pub use source::{FileProvider, ReadSource};
pub use source::{ByteSource, OpenWith, SharedSource, SliceSource, SourceProvider};

/// Reader over in-memory data with the default [`Dialect`].
///
/// # Errors
///
/// [`CsvError::Buffer`] when the field buffer cannot be allocated.
pub fn from_bytes(
    bytes: impl Into<Arc<[u8]>>,
) -> Result<CsvReader<Arc<[u8]>>, CsvError<Infallible>> {
    CsvReader::new(bytes.into())
}

/// Reader over the file at `path`. The file is opened by each pass.
///
/// # Errors
///
/// [`CsvError::Buffer`] when the field buffer cannot be allocated.
#[cfg(feature = "std")]
pub fn open(
    path: impl AsRef<std::path::Path>,
) -> Result<CsvReader<FileProvider>, CsvError<std::io::Error>> {
    CsvReader::open(path)
}

/// [`open`] with a custom [`Dialect`].
///
/// # Errors
///
/// [`CsvError::Dialect`] for an unusable dialect, [`CsvError::Buffer`] when
/// the field buffer cannot be allocated.
#[cfg(feature = "std")]
pub fn open_with(
    path: impl AsRef<std::path::Path>,
    dialect: Dialect,
) -> Result<CsvReader<FileProvider>, CsvError<std::io::Error>> {
    CsvReader::open_with(path, dialect)
}
