mod pyfactory;

pub use pyfactory::{PyFactory, PyFields, PyPairs};

use std::{io, path::PathBuf};

use ::waxcsv::{CsvError, CsvReader, Dialect};
use pyo3::exceptions::{PyMemoryError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

type CsvResult<T> = Result<T, CsvError<io::Error>>;

fn to_py_err(err: CsvError<io::Error>) -> PyErr {
    match err {
        CsvError::Open(e) | CsvError::Read(e) => e.into(),
        CsvError::Buffer(e) => PyMemoryError::new_err(e.to_string()),
        CsvError::Dialect(e) => PyValueError::new_err(e.to_string()),
    }
}

fn single_byte(name: &str, value: &str) -> PyResult<u8> {
    match value.as_bytes() {
        [b] => Ok(*b),
        _ => Err(PyValueError::new_err(format!(
            "{name} must be a single byte, got {value:?}"
        ))),
    }
}

fn dialect(separator: &str, quote: &str, skip_blank_lines: bool) -> PyResult<Dialect> {
    Ok(Dialect {
        separator: single_byte("separator", separator)?,
        quote: single_byte("quote", quote)?,
        skip_blank_lines,
    })
}

/// Reads every record of the file at `path` as a list of strings.
#[pyfunction]
#[pyo3(signature = (path, separator = ",", quote = "\"", skip_blank_lines = false))]
pub fn read_lists<'py>(
    py: Python<'py>,
    path: PathBuf,
    separator: &str,
    quote: &str,
    skip_blank_lines: bool,
) -> PyResult<Bound<'py, PyList>> {
    let dialect = dialect(separator, quote, skip_blank_lines)?;
    let mut reader = CsvReader::open_with(path, dialect).map_err(to_py_err)?;
    let rows = PyList::empty(py);
    for fields in reader.lists_with(PyFactory::new(py)).map_err(to_py_err)? {
        let fields = fields.map_err(to_py_err)?;
        rows.append(PyList::new(py, fields)?)?;
    }
    reader.close();
    Ok(rows)
}

/// Reads every record of the file at `path` as a dict. Keys come from
/// `keys` when given, otherwise from the first row.
#[pyfunction]
#[pyo3(signature = (path, keys = None, separator = ",", quote = "\"", skip_blank_lines = false))]
pub fn read_records<'py>(
    py: Python<'py>,
    path: PathBuf,
    keys: Option<Vec<String>>,
    separator: &str,
    quote: &str,
    skip_blank_lines: bool,
) -> PyResult<Bound<'py, PyList>> {
    let dialect = dialect(separator, quote, skip_blank_lines)?;
    let mut reader = CsvReader::open_with(path, dialect).map_err(to_py_err)?;
    let factory = PyFactory::new(py);
    let rows = match &keys {
        Some(keys) => dicts(
            py,
            reader
                .records_with_keys_with(factory, keys)
                .map_err(to_py_err)?,
        ),
        None => dicts(py, reader.records_with(factory).map_err(to_py_err)?),
    }?;
    reader.close();
    Ok(rows)
}

fn dicts<'py>(
    py: Python<'py>,
    records: impl Iterator<Item = CsvResult<PyPairs<'py>>>,
) -> PyResult<Bound<'py, PyList>> {
    let rows = PyList::empty(py);
    for pairs in records {
        let dict = PyDict::new(py);
        for (key, field) in pairs.map_err(to_py_err)? {
            dict.set_item(key, field)?;
        }
        rows.append(dict)?;
    }
    Ok(rows)
}

#[pymodule]
pub fn waxcsv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(read_lists, m)?)?;
    m.add_function(wrap_pyfunction!(read_records, m)?)?;
    Ok(())
}
