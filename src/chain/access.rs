use super::config::ChainConfig;
use crate::error::{Error, Result};
use crate::mapped::{BlobFile, FixedRecordFile, IndexedRecordFile};
use crate::types::{BlockHeight, Hash, RawBlock, RawTransaction, TxHeader};
use std::ops::Range;

/// Consistent, reorg-aware view over the five files of a chain directory.
///
/// Watermarks (`block_count`, `tx_count`) and the cached tip hash are fixed
/// at construction and only move on [`ChainAccess::reload`]. Everything
/// returned borrows `self`, so no view can survive a reload.
#[derive(Debug)]
pub struct ChainAccess {
    config: ChainConfig,

    block_file: FixedRecordFile<RawBlock>,
    coinbase_file: BlobFile,
    tx_file: IndexedRecordFile<TxHeader>,
    sequence_file: IndexedRecordFile<[u32]>,
    tx_hashes_file: FixedRecordFile<Hash>,

    // Hash of the block at `max_height - 1` when last loaded
    last_block_hash: Option<Hash>,
    max_height: BlockHeight,
    max_loaded_tx: u32,
}

/// Watermarks computed from the current mappings.
struct Watermarks {
    max_height: BlockHeight,
    max_loaded_tx: u32,
    last_block_hash: Option<Hash>,
}

impl ChainAccess {
    pub fn open(config: ChainConfig) -> Result<Self> {
        let paths = &config.paths;
        let block_file = FixedRecordFile::open(&paths.blocks)?.with_label("block");
        let coinbase_file = BlobFile::open(&paths.coinbase)?;
        let tx_file =
            IndexedRecordFile::open(&paths.tx_index, &paths.tx_data)?.with_label("transaction");
        let sequence_file =
            IndexedRecordFile::open(&paths.sequence_index, &paths.sequence_data)?
                .with_label("sequence");
        let tx_hashes_file = FixedRecordFile::open(&paths.tx_hashes)?.with_label("tx hash");

        let mut chain = Self {
            config,
            block_file,
            coinbase_file,
            tx_file,
            sequence_file,
            tx_hashes_file,
            last_block_hash: None,
            max_height: 0,
            max_loaded_tx: 0,
        };
        chain.setup()?;
        Ok(chain)
    }

    fn setup(&mut self) -> Result<()> {
        let marks = self.compute_watermarks()?;
        self.max_height = marks.max_height;
        self.max_loaded_tx = marks.max_loaded_tx;
        self.last_block_hash = marks.last_block_hash;

        log::debug!(
            "Loaded chain: {} blocks, {} transactions, tip {}",
            self.max_height,
            self.max_loaded_tx,
            self.last_block_hash
                .map_or_else(|| "<none>".to_string(), |h| h.to_string())
        );
        Ok(())
    }

    fn compute_watermarks(&self) -> Result<Watermarks> {
        let on_disk = self.block_file.count();
        let retained = on_disk.saturating_sub(self.config.blocks_ignored as usize);
        let max_height = BlockHeight::try_from(retained).map_err(|_| {
            Error::Corrupt(format!("{} blocks exceed the block height range", retained))
        })?;

        let tip = match retained {
            0 => None,
            n => Some(*self.block_file.get(n - 1)?),
        };

        // A transaction is loaded once its body, hash and sequences all are
        let tx_entries = self.tx_file.count();
        let hash_entries = self.tx_hashes_file.count();
        let sequence_entries = self.sequence_file.count();
        let complete = tx_entries.min(hash_entries).min(sequence_entries);
        if tx_entries != hash_entries || tx_entries != sequence_entries {
            tracing::warn!(
                "Transaction index has {} entries, hash file {}, sequence index {}, using {}",
                tx_entries,
                hash_entries,
                sequence_entries,
                complete
            );
        }
        let mut max_loaded_tx = u32::try_from(complete).map_err(|_| {
            Error::Corrupt(format!(
                "{} transactions exceed the transaction index range",
                complete
            ))
        })?;

        if self.config.blocks_ignored > 0 {
            // Transactions of hidden blocks stay hidden too
            let bound = tip.map_or(0, |block| block.end_tx_index());
            if bound < max_loaded_tx {
                log::debug!(
                    "Ignoring {} newest blocks hides {} transactions",
                    self.config.blocks_ignored,
                    max_loaded_tx - bound
                );
                max_loaded_tx = bound;
            }
        }

        Ok(Watermarks {
            max_height,
            max_loaded_tx,
            last_block_hash: tip.map(|block| block.hash),
        })
    }

    /// Remap every file and recompute watermarks and the cached tip hash.
    ///
    /// This is the only way writer activity (growth or a rewritten tip)
    /// becomes visible. On error the previous watermarks stay in place.
    pub fn reload(&mut self) -> Result<()> {
        self.block_file.remap()?;
        self.coinbase_file.remap()?;
        self.tx_file.remap()?;
        self.sequence_file.remap()?;
        self.tx_hashes_file.remap()?;
        self.setup()
    }

    /// Fails with [`Error::Reorg`] if the block at the loaded tip no longer
    /// carries the hash seen at the last reload.
    pub fn reorg_check(&self) -> Result<()> {
        if !self.config.error_on_reorg {
            return Ok(());
        }
        let Some(expected) = self.last_block_hash else {
            return Ok(());
        };
        let actual = self.block_file.get(self.max_height as usize - 1)?.hash;
        log::trace!("Reorg check: cached {} on disk {}", expected, actual);
        if actual != expected {
            return Err(Error::Reorg { expected, actual });
        }
        Ok(())
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn block_count(&self) -> BlockHeight {
        self.max_height
    }

    /// Transaction watermark, not the live file size.
    pub fn tx_count(&self) -> usize {
        self.max_loaded_tx as usize
    }

    pub fn max_loaded_tx(&self) -> u32 {
        self.max_loaded_tx
    }

    pub fn last_block_hash(&self) -> Option<Hash> {
        self.last_block_hash
    }

    // Every accessor checks its index against the watermark before the
    // reorg check, so a bad index is reported as such even mid-reorg
    pub fn get_block(&self, height: BlockHeight) -> Result<&RawBlock> {
        if height < 0 || height >= self.max_height {
            return Err(Error::out_of_range(
                "block height",
                height as i128,
                self.max_height as u64,
            ));
        }
        self.reorg_check()?;
        self.block_file.get(height as usize)
    }

    pub fn block_tx_range(&self, height: BlockHeight) -> Result<Range<u32>> {
        Ok(self.get_block(height)?.tx_range())
    }

    /// Height of the block containing transaction `tx_index`.
    pub fn get_block_height(&self, tx_index: u32) -> Result<BlockHeight> {
        self.check_tx_index(tx_index)?;
        self.reorg_check()?;

        let blocks = &self.block_file.as_slice()?[..self.max_height as usize];
        // Last block starting at or before the transaction; empty blocks
        // sharing that start sort before it
        let after = blocks.partition_point(|block| block.first_tx_index <= tx_index);
        let block = match after {
            0 => {
                return Err(Error::Corrupt(format!(
                    "no block starts at or before transaction {}",
                    tx_index
                )))
            }
            n => &blocks[n - 1],
        };
        if tx_index >= block.end_tx_index() {
            return Err(Error::out_of_range(
                "transaction index",
                tx_index as i128,
                block.end_tx_index() as u64,
            ));
        }
        Ok((after - 1) as BlockHeight)
    }

    pub fn get_tx_hash(&self, index: u32) -> Result<&Hash> {
        self.check_tx_index(index)?;
        self.reorg_check()?;
        self.tx_hashes_file.get(index as usize)
    }

    // Transaction bodies below the watermark are not reorg-checked
    pub fn get_tx(&self, index: u32) -> Result<RawTransaction<'_>> {
        self.check_tx_index(index)?;
        self.tx_file.get(index as usize)
    }

    /// nSequence values for the inputs of transaction `index`.
    pub fn get_sequence_numbers(&self, index: u32) -> Result<&[u32]> {
        self.check_tx_index(index)?;
        self.sequence_file.get(index as usize)
    }

    /// Coinbase payload whose length prefix starts at byte `offset`.
    pub fn get_coinbase(&self, offset: u64) -> Result<&[u8]> {
        self.coinbase_file.read_prefixed(offset)
    }

    fn check_tx_index(&self, index: u32) -> Result<()> {
        if index >= self.max_loaded_tx {
            return Err(Error::out_of_range(
                "transaction index",
                index as i128,
                self.max_loaded_tx as u64,
            ));
        }
        Ok(())
    }
}
