use super::{FixedRecordFile, MappedFile};
use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};
use std::marker::PhantomData;
use std::path::Path;

/// Location of one record inside the data blob.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct IndexEntry {
    pub offset: u64,
    pub len: u64,
}

/// A record type stored in an indexed blob, decoded as a borrowed view.
pub trait BlobRecord {
    type View<'a>;

    /// Build a view over exactly the bytes the index entry describes.
    fn view<'a>(bytes: &'a [u8]) -> Result<Self::View<'a>>;
}

impl<T: Pod> BlobRecord for [T] {
    type View<'a> = &'a [T];

    fn view<'a>(bytes: &'a [u8]) -> Result<&'a [T]> {
        if bytes.is_empty() {
            return Ok(&[]);
        }
        bytemuck::try_cast_slice(bytes).map_err(|e| Error::Corrupt(format!("blob record: {e}")))
    }
}

/// Variable-size records addressed by a dense index.
///
/// The index file is the authority on how many records exist: the blob may
/// already hold part of a record whose index entry is not written yet.
#[derive(Debug)]
pub struct IndexedRecordFile<T: BlobRecord + ?Sized> {
    index: FixedRecordFile<IndexEntry>,
    data: MappedFile,
    _marker: PhantomData<T>,
}

impl<T: BlobRecord + ?Sized> IndexedRecordFile<T> {
    pub fn open(index_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let index = FixedRecordFile::open(index_path)?;
        let data = MappedFile::open(data_path)?;
        Ok(Self {
            index,
            data,
            _marker: PhantomData,
        })
    }

    /// Name used for this container in out-of-range errors.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.index = self.index.with_label(label);
        self
    }

    /// Remap both files. The blob is mapped after the index so every entry
    /// counted has its bytes in view.
    pub fn remap(&mut self) -> Result<()> {
        self.index.remap()?;
        self.data.remap()
    }

    pub fn count(&self) -> usize {
        self.index.count()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn entry(&self, index: usize) -> Result<&IndexEntry> {
        self.index.get(index)
    }

    pub fn get(&self, index: usize) -> Result<T::View<'_>> {
        let entry = self.entry(index)?;
        T::view(self.record_bytes(index, entry)?)
    }

    fn record_bytes(&self, index: usize, entry: &IndexEntry) -> Result<&[u8]> {
        let blob = self.data.bytes();
        let end = entry.offset.checked_add(entry.len);
        match end {
            Some(end) if end <= blob.len() as u64 => {
                Ok(&blob[entry.offset as usize..end as usize])
            }
            _ => Err(Error::Corrupt(format!(
                "{:?}: record {} spans {}+{} past the {} byte blob",
                self.data.path(),
                index,
                entry.offset,
                entry.len,
                blob.len()
            ))),
        }
    }
}
