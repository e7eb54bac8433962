use std::path::{Path, PathBuf};

pub const BLOCKS_FILE: &str = "blocks.dat";
pub const COINBASE_FILE: &str = "coinbase.dat";
pub const TX_INDEX_FILE: &str = "tx_index.dat";
pub const TX_DATA_FILE: &str = "tx_data.dat";
pub const SEQUENCE_INDEX_FILE: &str = "sequence_index.dat";
pub const SEQUENCE_DATA_FILE: &str = "sequence_data.dat";
pub const TX_HASHES_FILE: &str = "tx_hashes.dat";

/// Location of every file the writer produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPaths {
    pub blocks: PathBuf,
    pub coinbase: PathBuf,
    pub tx_index: PathBuf,
    pub tx_data: PathBuf,
    pub sequence_index: PathBuf,
    pub sequence_data: PathBuf,
    pub tx_hashes: PathBuf,
}

impl ChainPaths {
    /// Default layout: all files side by side in `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            blocks: dir.join(BLOCKS_FILE),
            coinbase: dir.join(COINBASE_FILE),
            tx_index: dir.join(TX_INDEX_FILE),
            tx_data: dir.join(TX_DATA_FILE),
            sequence_index: dir.join(SEQUENCE_INDEX_FILE),
            sequence_data: dir.join(SEQUENCE_DATA_FILE),
            tx_hashes: dir.join(TX_HASHES_FILE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub paths: ChainPaths,

    // When false the tip-hash comparison is skipped and stale tip data may
    // be served without detection
    pub error_on_reorg: bool,

    // Newest blocks hidden from readers, along with their transactions
    pub blocks_ignored: u32,
}

impl ChainConfig {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_paths(ChainPaths::in_dir(dir))
    }

    pub fn with_paths(paths: ChainPaths) -> Self {
        ChainConfig {
            paths,
            error_on_reorg: true,
            blocks_ignored: 0,
        }
    }

    pub fn error_on_reorg(mut self, enabled: bool) -> Self {
        self.error_on_reorg = enabled;
        self
    }

    pub fn blocks_ignored(mut self, count: u32) -> Self {
        self.blocks_ignored = count;
        self
    }
}
