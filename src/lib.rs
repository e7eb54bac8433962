pub mod chain;
pub mod error;
pub mod mapped;
pub mod types;

// Re-export main types
pub use chain::{ChainAccess, ChainConfig, ChainPaths};
pub use error::{Error, Result};
pub use mapped::{BlobFile, BlobRecord, FixedRecordFile, IndexEntry, IndexedRecordFile};
pub use types::{BlockHeight, Hash, RawBlock, RawInput, RawOutput, RawTransaction, TxHeader};
