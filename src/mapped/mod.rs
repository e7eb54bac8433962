//! Read-only memory-mapped containers over files that an external process
//! appends to.
//!
//! Every container owns its mapping. Views handed out borrow the container,
//! so `remap` (which takes `&mut self`) cannot run while any view is alive.

pub mod blob;
pub mod fixed;
pub mod indexed;

pub use blob::BlobFile;
pub use fixed::FixedRecordFile;
pub use indexed::{BlobRecord, IndexEntry, IndexedRecordFile};

use crate::error::Result;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};

/// A file mapped read-only, re-mappable after the writer grows it.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    // Zero-length files cannot be mapped
    mmap: Option<Mmap>,
}

impl MappedFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mmap = map_file(&path)?;
        log::debug!(
            "Mapped {:?} ({} bytes)",
            path,
            mmap.as_ref().map_or(0, |m| m.len())
        );
        Ok(Self { path, mmap })
    }

    /// Replace the mapping with a fresh one covering the file's current size.
    pub fn remap(&mut self) -> Result<()> {
        let mmap = map_file(&self.path)?;
        let old_len = self.len();
        self.mmap = mmap;
        if self.len() != old_len {
            log::debug!("Remapped {:?}: {} -> {} bytes", self.path, old_len, self.len());
        }
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    // SAFETY: the writer only appends to these files or overwrites bytes in
    // place during a reorg; it never truncates them, so the mapped range stays
    // backed by the file for the lifetime of the mapping.
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    Ok(Some(mmap))
}
