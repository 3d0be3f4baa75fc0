use alloc::vec::Vec;
use core::convert::Infallible;

use bstr::BString;

use crate::{ByteSource, CsvError, CsvReader, Dialect, List, Record};

pub fn lists(input: &[u8]) -> Vec<List> {
    lists_with(input, Dialect::default())
}

pub fn lists_with(input: &[u8], dialect: Dialect) -> Vec<List> {
    let mut reader = CsvReader::with_dialect(input, dialect).unwrap();
    reader
        .lists()
        .unwrap()
        .collect::<Result<_, CsvError<Infallible>>>()
        .unwrap()
}

pub fn records(input: &[u8]) -> Vec<Record> {
    let mut reader = CsvReader::new(input).unwrap();
    reader
        .records()
        .unwrap()
        .collect::<Result<_, CsvError<Infallible>>>()
        .unwrap()
}

/// Builds a list from anything byte-like.
pub fn list<B: AsRef<[u8]>>(fields: &[B]) -> List {
    fields.iter().map(|f| BString::from(f.as_ref())).collect()
}

pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (BString::from(*k), BString::from(*v)))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub struct Broken;

/// Yields `good` and then fails every read.
#[derive(Debug)]
pub struct FailAfter<'a> {
    pub good: &'a [u8],
}

impl ByteSource for FailAfter<'_> {
    type Error = Broken;

    fn read_byte(&mut self) -> Result<Option<u8>, Broken> {
        match self.good.split_first() {
            Some((&b, rest)) => {
                self.good = rest;
                Ok(Some(b))
            }
            None => Err(Broken),
        }
    }
}
