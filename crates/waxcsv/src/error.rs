use alloc::collections::TryReserveError;

use thiserror::Error;

/// Failure to grow or create a [`Buffer`](crate::Buffer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("allocation failure: {0}")]
    Allocation(#[from] TryReserveError),
    #[error("capacity overflow: cannot fit {additional} more slots after {len}")]
    CapacityOverflow { len: usize, additional: usize },
}

/// A [`Dialect`](crate::Dialect) the scanner cannot work with.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DialectError {
    #[error("separator and quote are both {0:?}")]
    SeparatorIsQuote(char),
    #[error("line terminator {0:?} cannot be used as separator or quote")]
    LineTerminator(char),
}

/// Errors surfaced while scanning records from a source whose failures are
/// described by `E`.
#[derive(Debug, Error)]
pub enum CsvError<E> {
    /// The source could not be (re)opened at the start of a pass.
    #[error("cannot open source: {0}")]
    Open(E),
    /// Reading the next byte failed mid-pass.
    #[error("cannot read source: {0}")]
    Read(E),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Dialect(#[from] DialectError),
}
