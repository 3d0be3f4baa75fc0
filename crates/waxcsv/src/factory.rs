use alloc::{collections::BTreeMap, vec::Vec};

use bstr::BString;

/// Abstraction over the collections scanned fields are delivered into.
///
/// The reader only ever hands over plain bytes; a factory decides what a
/// field, a list of fields and a keyed record look like for the caller.
pub trait RecordFactory {
    type Field;
    type List;
    type Record;

    fn new_field(&mut self, bytes: &[u8]) -> Self::Field;

    fn new_list(&mut self) -> Self::List;
    fn push_list(&mut self, list: &mut Self::List, field: Self::Field);

    fn new_record(&mut self) -> Self::Record;
    /// Stores `field` under `key`. A key seen twice keeps the later field.
    fn insert_record(&mut self, record: &mut Self::Record, key: &[u8], field: Self::Field);
}

/// One record in list mode.
pub type List = Vec<BString>;
/// One record in named mode.
pub type Record = BTreeMap<BString, BString>;

/// Factory producing byte strings, [`List`]s and [`Record`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFactory;

impl RecordFactory for StdFactory {
    type Field = BString;
    type List = List;
    type Record = Record;

    #[inline]
    fn new_field(&mut self, bytes: &[u8]) -> BString {
        BString::from(bytes)
    }

    #[inline]
    fn new_list(&mut self) -> List {
        Vec::new()
    }

    #[inline]
    fn push_list(&mut self, list: &mut List, field: BString) {
        list.push(field);
    }

    #[inline]
    fn new_record(&mut self) -> Record {
        BTreeMap::new()
    }

    #[inline]
    fn insert_record(&mut self, record: &mut Record, key: &[u8], field: BString) {
        record.insert(BString::from(key), field);
    }
}
