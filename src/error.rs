use crate::types::Hash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chain reorganized since last reload: expected tip {expected}, found {actual}")]
    Reorg { expected: Hash, actual: Hash },

    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: i128,
        len: u64,
    },

    #[error("Corrupt data file: {0}")]
    Corrupt(String),
}

impl Error {
    pub(crate) fn out_of_range(what: &'static str, index: i128, len: u64) -> Self {
        Error::OutOfRange { what, index, len }
    }

    /// The writer replaced the tip; reload and retry.
    pub fn is_reorg(&self) -> bool {
        matches!(self, Error::Reorg { .. })
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
