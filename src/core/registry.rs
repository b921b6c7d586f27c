use super::value::PdfObject;

/// One indirect object: number, generation, file offset of its header (0 if
/// synthesized), stream-data offset (0 if it has no stream), and its value.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub number: u32,
    pub generation: u16,
    pub offset: u64,
    pub stream_offset: u64,
    pub value: PdfObject,
}

/// The set of object records for one file: fast lookup by object number,
/// stable iteration by insertion ordinal.
#[derive(Default)]
pub struct ObjectRegistry {
    /// Kept sorted by `number`.
    sorted: Vec<ObjectRecord>,
    /// Insertion order, as indices into `sorted`'s *current* positions is
    /// unstable across re-sorts, so this tracks insertion order by object
    /// number instead and is resolved through `find` at `get` time.
    insertion_order: Vec<u32>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        ObjectRegistry {
            sorted: Vec::new(),
            insertion_order: Vec::new(),
        }
    }

    /// Appends a new record, re-sorting if the monotone tail invariant is
    /// violated. Returns `None` if `number` is already present (callers use
    /// `find` first when first-write-wins semantics matter).
    pub fn add(&mut self, number: u32, generation: u16, offset: u64) -> Option<&ObjectRecord> {
        if self.find(number).is_some() {
            return None;
        }
        self.push(ObjectRecord {
            number,
            generation,
            offset,
            stream_offset: 0,
            value: PdfObject::Null,
        })
    }

    /// Same as `add`, but with an already-parsed value attached (used by the
    /// object-stream decoder, which materializes both the record and its
    /// value in one step).
    pub fn add_with_value(
        &mut self,
        number: u32,
        generation: u16,
        offset: u64,
        value: PdfObject,
    ) -> Option<&ObjectRecord> {
        if self.find(number).is_some() {
            return None;
        }
        self.push(ObjectRecord {
            number,
            generation,
            offset,
            stream_offset: 0,
            value,
        })
    }

    fn push(&mut self, record: ObjectRecord) -> Option<&ObjectRecord> {
        let number = record.number;
        let violates_monotone = self
            .sorted
            .last()
            .map(|tail| number < tail.number)
            .unwrap_or(false);

        self.sorted.push(record);
        if violates_monotone {
            self.sorted.sort_by_key(|r| r.number);
        }
        self.insertion_order.push(number);
        self.find(number)
    }

    /// Records a value onto an already-`add`ed record (used when the xref
    /// loader seeds a placeholder offset first and the value is parsed on
    /// demand later, and by the object-stream decoder attaching a
    /// stream-data offset after the fact).
    pub fn set_value(&mut self, number: u32, value: PdfObject) {
        if let Ok(idx) = self.sorted.binary_search_by_key(&number, |r| r.number) {
            self.sorted[idx].value = value;
        }
    }

    pub fn find(&self, number: u32) -> Option<&ObjectRecord> {
        self.sorted
            .binary_search_by_key(&number, |r| r.number)
            .ok()
            .map(|idx| &self.sorted[idx])
    }

    pub fn find_mut(&mut self, number: u32) -> Option<&mut ObjectRecord> {
        match self.sorted.binary_search_by_key(&number, |r| r.number) {
            Ok(idx) => Some(&mut self.sorted[idx]),
            Err(_) => None,
        }
    }

    /// Positional access by insertion ordinal (informational only; not
    /// stable across loader revisions).
    pub fn get(&self, index: usize) -> Option<&ObjectRecord> {
        let number = *self.insertion_order.get(index)?;
        self.find(number)
    }

    pub fn count(&self) -> usize {
        self.sorted.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.sorted.iter()
    }
}
