use crate::error::DialectError;

/// Configuration for the field scanner.
///
/// # Examples
///
/// ```rust
/// use waxcsv::{CsvReader, Dialect};
///
/// let dialect = Dialect {
///     separator: b';',
///     quote: b'\'',
///     ..Default::default()
/// };
/// let mut reader = CsvReader::with_dialect(&b"a;'b;c'\n"[..], dialect)?;
/// let rows: Vec<_> = reader.lists()?.collect::<Result<_, _>>()?;
/// assert_eq!(rows, vec![vec!["a", "b;c"]]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Default
///
/// Comma separated, double-quote quoted, blank lines kept.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(any(test, feature = "serde"), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Byte that ends a field without ending the record.
    ///
    /// # Default
    ///
    /// `b','`
    pub separator: u8,

    /// Byte that opens and closes a quoted field. Inside a quoted field a
    /// doubled quote stands for one literal quote.
    ///
    /// # Default
    ///
    /// `b'"'`
    pub quote: u8,

    /// Whether runs of `\r`/`\n` before a record are consumed instead of
    /// producing records with a single empty field.
    ///
    /// # Default
    ///
    /// `false`
    pub skip_blank_lines: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            separator: b',',
            quote: b'"',
            skip_blank_lines: false,
        }
    }
}

impl Dialect {
    /// Checks that the separator and quote can be told apart from each other
    /// and from line endings.
    ///
    /// # Errors
    ///
    /// [`DialectError`] naming the offending byte.
    pub fn validate(&self) -> Result<(), DialectError> {
        for b in [self.separator, self.quote] {
            if b == b'\n' || b == b'\r' {
                return Err(DialectError::LineTerminator(b as char));
            }
        }
        if self.separator == self.quote {
            return Err(DialectError::SeparatorIsQuote(self.separator as char));
        }
        Ok(())
    }
}
