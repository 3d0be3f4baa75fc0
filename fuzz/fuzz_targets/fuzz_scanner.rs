#![no_main]
use std::cell::RefCell;

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use waxcsv::{Buffer, CsvReader, Dialect};

const HEADER: usize = 3; // flags, separator, quote

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// A table of raw fields, written out with a random mix of quoting and line
/// endings so most inputs look like real delimited text.
#[derive(Debug, Arbitrary)]
struct Table(Vec<Vec<Vec<u8>>>);

fn write_table(table: &Table, dialect: &Dialect, out: &mut Vec<u8>) {
    for row in &table.0 {
        for (i, field) in row.iter().enumerate() {
            if i > 0 {
                out.push(dialect.separator);
            }
            let quoted = with_rng(|rng| rng.random_bool(0.5));
            if quoted {
                out.push(dialect.quote);
                for &b in field {
                    if b == dialect.quote {
                        out.push(b);
                    }
                    out.push(b);
                }
                out.push(dialect.quote);
            } else {
                out.extend_from_slice(field);
            }
        }
        let ending: &[u8] = match with_rng(|rng| rng.random_range(0..4)) {
            0 => b"\r\n",
            1 => b"\r",
            2 => b"\n\n",
            _ => b"\n",
        };
        out.extend_from_slice(ending);
    }
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size <= HEADER || !(size < HEADER || seed.is_multiple_of(10)) {
        return fuzzer_mutate(data, size, max_size);
    }

    let mut header = [0u8; HEADER];
    with_rng(|rng| rng.fill_bytes(&mut header));
    header[1] = [b',', b';', b'\t', header[1]][usize::from(header[1] & 3)];
    header[2] = [b'"', b'\'', b'"', header[2]][usize::from(header[2] & 3)];
    data[..HEADER].copy_from_slice(&header);

    let raw: Vec<u8> = with_rng(|rng| {
        let n = rng.random_range(0..(max_size * 2).max(1));
        (0..n).map(|_| rng.random::<u8>()).collect()
    });
    let Ok(table) = Table::arbitrary(&mut Unstructured::new(&raw)) else {
        return HEADER;
    };
    let mut text = Vec::new();
    write_table(&table, &dialect(&header), &mut text);

    let len = text.len().min(max_size - HEADER);
    data[HEADER..HEADER + len].copy_from_slice(&text[..len]);
    HEADER + len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

fn dialect(header: &[u8]) -> Dialect {
    Dialect {
        separator: header[1],
        quote: header[2],
        skip_blank_lines: header[0] & 1 != 0,
    }
}

fn scan(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let dialect = dialect(&data[..HEADER]);
    let input = &data[HEADER..];

    let Ok(mut reader) = CsvReader::with_dialect(input, dialect) else {
        assert!(dialect.validate().is_err());
        return;
    };

    let first: Vec<_> = reader.lists().unwrap().map(Result::unwrap).collect();
    assert!(first.iter().all(|list| !list.is_empty()));
    let second: Vec<_> = reader.lists().unwrap().map(Result::unwrap).collect();
    assert_eq!(first, second, "passes must not depend on each other");

    let records: Vec<_> = reader.records().unwrap().map(Result::unwrap).collect();
    let keys = reader.keys().len();
    assert_eq!(records.len(), first.len().saturating_sub(1));
    assert!(records.iter().all(|r| r.len() <= keys));

    assert!(reader.close());
    assert!(!reader.close());

    // Replay the input as buffer operations: even bytes push, odd bytes pop.
    let mut buffer = Buffer::<u8>::new(usize::from(data[0] & 7)).unwrap();
    let mut model = Vec::new();
    for &b in input {
        if b & 1 == 0 {
            buffer.push(b).unwrap();
            model.push(b);
        } else {
            assert_eq!(buffer.pop(1), model.pop().unwrap_or(1));
        }
        assert!(buffer.check_invariants());
    }
    assert_eq!(buffer.as_slice(), model.as_slice());
}

fuzz_target!(|data: &[u8]| scan(data));
