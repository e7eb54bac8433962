use super::MappedFile;
use crate::error::{Error, Result};
use bytemuck::Pod;
use std::marker::PhantomData;
use std::mem::size_of;
use std::path::Path;

/// A file of back-to-back fixed-size `T` records, exposed as an array.
#[derive(Debug)]
pub struct FixedRecordFile<T> {
    file: MappedFile,
    // Names the container in out-of-range errors
    label: &'static str,
    _marker: PhantomData<T>,
}

impl<T: Pod> FixedRecordFile<T> {
    /// Map `path`. Fails if the file is missing or its size is not a whole
    /// number of records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if size_of::<T>() == 0 {
            return Err(Error::Corrupt(
                "zero-sized record type cannot be mapped".to_string(),
            ));
        }
        let file = MappedFile::open(path)?;
        if file.len() % size_of::<T>() != 0 {
            return Err(Error::Corrupt(format!(
                "{:?} is {} bytes, not a multiple of the {} byte record size",
                file.path(),
                file.len(),
                size_of::<T>()
            )));
        }
        Ok(Self {
            file,
            label: "record",
            _marker: PhantomData,
        })
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Pick up records appended since the last map. A trailing partial
    /// record (writer mid-append) is left out of `count()`.
    pub fn remap(&mut self) -> Result<()> {
        self.file.remap()?;
        let partial = self.file.len() % size_of::<T>();
        if partial != 0 {
            log::debug!(
                "{:?}: ignoring {} trailing bytes of a partially written record",
                self.file.path(),
                partial
            );
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.file.len() / size_of::<T>()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        let records = self.as_slice()?;
        records
            .get(index)
            .ok_or_else(|| Error::out_of_range(self.label, index as i128, records.len() as u64))
    }

    /// All complete records as one slice.
    pub fn as_slice(&self) -> Result<&[T]> {
        let bytes = self.file.bytes();
        if bytes.is_empty() {
            return Ok(&[]);
        }
        let whole = self.count() * size_of::<T>();
        bytemuck::try_cast_slice(&bytes[..whole])
            .map_err(|e| Error::Corrupt(format!("{:?}: {e}", self.file.path())))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
