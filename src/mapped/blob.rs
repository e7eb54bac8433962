use super::MappedFile;
use crate::error::{Error, Result};
use std::path::Path;

const LEN_PREFIX: usize = std::mem::size_of::<u32>();

/// Append-only byte file addressed by byte offset.
///
/// Records are a little-endian `u32` length followed by that many bytes.
#[derive(Debug)]
pub struct BlobFile {
    file: MappedFile,
}

impl BlobFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: MappedFile::open(path)?,
        })
    }

    pub fn remap(&mut self) -> Result<()> {
        self.file.remap()
    }

    pub fn len(&self) -> usize {
        self.file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }

    /// Raw bytes in `offset..offset + len`.
    pub fn slice(&self, offset: u64, len: usize) -> Result<&[u8]> {
        let bytes = self.file.bytes();
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start <= bytes.len())
            .ok_or_else(|| Error::out_of_range("blob offset", offset as i128, bytes.len() as u64))?;
        start
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .map(|end| &bytes[start..end])
            .ok_or_else(|| {
                Error::Corrupt(format!(
                    "{:?}: {} bytes at offset {} run past the {} byte file",
                    self.file.path(),
                    len,
                    offset,
                    bytes.len()
                ))
            })
    }

    /// The length-prefixed record starting at `offset`.
    pub fn read_prefixed(&self, offset: u64) -> Result<&[u8]> {
        if offset >= self.len() as u64 {
            return Err(Error::out_of_range(
                "blob offset",
                offset as i128,
                self.len() as u64,
            ));
        }
        let prefix = self.slice(offset, LEN_PREFIX)?;
        let mut len = [0u8; LEN_PREFIX];
        len.copy_from_slice(prefix);
        let len = u32::from_le_bytes(len) as usize;
        self.slice(offset + LEN_PREFIX as u64, len)
    }
}
