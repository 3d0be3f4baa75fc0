use std::fmt;

use pyo3::prelude::*;
use pyo3::types::PyString;
use waxcsv::RecordFactory;

/// Factory that turns scanned fields into Python strings.
///
/// Lists and records stay plain Rust vectors until a whole record is read,
/// so building the final `list`/`dict` can report Python errors.
#[derive(Copy, Clone)]
pub struct PyFactory<'py> {
    py: Python<'py>,
}

impl fmt::Debug for PyFactory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PyFactory").finish_non_exhaustive()
    }
}

impl<'py> PyFactory<'py> {
    pub fn new(py: Python<'py>) -> Self {
        Self { py }
    }

    fn string(&self, bytes: &[u8]) -> Bound<'py, PyString> {
        PyString::new(self.py, &String::from_utf8_lossy(bytes))
    }
}

pub type PyFields<'py> = Vec<Bound<'py, PyString>>;
pub type PyPairs<'py> = Vec<(Bound<'py, PyString>, Bound<'py, PyString>)>;

impl<'py> RecordFactory for PyFactory<'py> {
    type Field = Bound<'py, PyString>;
    type List = PyFields<'py>;
    type Record = PyPairs<'py>;

    fn new_field(&mut self, bytes: &[u8]) -> Self::Field {
        self.string(bytes)
    }

    fn new_list(&mut self) -> Self::List {
        Vec::new()
    }
    fn push_list(&mut self, list: &mut Self::List, field: Self::Field) {
        list.push(field);
    }

    fn new_record(&mut self) -> Self::Record {
        Vec::new()
    }
    fn insert_record(&mut self, record: &mut Self::Record, key: &[u8], field: Self::Field) {
        record.push((self.string(key), field));
    }
}
