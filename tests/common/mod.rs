// Test-side stand-in for the external writer process. Produces the same
// on-disk layout the writer contract describes, appending one file at a
// time so tests can stop it half way.
#![allow(dead_code)]

use chainmap::{ChainConfig, Hash, IndexEntry, RawBlock, RawInput, RawOutput, TxHeader};
use std::collections::hash_map::DefaultHasher;
use std::fs::OpenOptions;
use std::hash::Hasher;
use std::io::{Seek, SeekFrom, Write};
use std::mem::size_of;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const FILES: [&str; 7] = [
    "blocks.dat",
    "coinbase.dat",
    "tx_index.dat",
    "tx_data.dat",
    "sequence_index.dat",
    "sequence_data.dat",
    "tx_hashes.dat",
];

#[derive(Debug, Clone)]
pub struct TestTx {
    pub header: TxHeader,
    pub inputs: Vec<RawInput>,
    pub sequences: Vec<u32>,
    pub outputs: Vec<RawOutput>,
}

impl TestTx {
    pub fn new(seed: u32, inputs: usize, outputs: usize) -> Self {
        let inputs: Vec<RawInput> = (0..inputs as u32)
            .map(|i| RawInput {
                prev_tx_index: seed.wrapping_add(i),
                prev_output: i,
                script_len: 100 + i,
            })
            .collect();
        let sequences = (0..inputs.len() as u32)
            .map(|i| 0xffff_fffe_u32.wrapping_sub(i).wrapping_sub(seed))
            .collect();
        let outputs = (0..outputs as u32)
            .map(|i| RawOutput::new(1_000 * (seed as u64 + 1) + i as u64, 25, i % 3))
            .collect();
        let mut tx = Self {
            header: TxHeader {
                real_size: 0,
                base_size: 0,
                version: 1 + (seed % 2) as i32,
                locktime: seed,
                input_count: 0,
                output_count: 0,
            },
            inputs,
            sequences,
            outputs,
        };
        tx.header.input_count = tx.inputs.len() as u16;
        tx.header.output_count = tx.outputs.len() as u16;
        let size = tx.serialize().len() as u32;
        tx.header.real_size = size;
        tx.header.base_size = size;
        tx
    }

    pub fn serialize(&self) -> Vec<u8> {
        serialize_parts(&self.header, &self.inputs, &self.outputs)
    }
}

pub fn serialize_parts(header: &TxHeader, inputs: &[RawInput], outputs: &[RawOutput]) -> Vec<u8> {
    let mut out = bytemuck::bytes_of(header).to_vec();
    out.extend_from_slice(bytemuck::cast_slice(inputs));
    out.extend_from_slice(bytemuck::cast_slice(outputs));
    out
}

/// Deterministic 32-byte digest, standing in for the writer's hash.
pub fn digest(bytes: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    for (lane, chunk) in out.chunks_mut(8).enumerate() {
        let mut hasher = DefaultHasher::new();
        hasher.write_u8(lane as u8);
        hasher.write(bytes);
        chunk.copy_from_slice(&hasher.finish().to_le_bytes());
    }
    Hash(out)
}

pub struct ChainWriter {
    dir: TempDir,
    blocks: Vec<RawBlock>,
    next_tx: u32,
    // Header whose second half has not been written yet
    pending_block: Option<RawBlock>,
}

impl ChainWriter {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for name in FILES {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        Self {
            dir,
            blocks: Vec::new(),
            next_tx: 0,
            pending_block: None,
        }
    }

    /// Writer holding one block per entry, with that many simple transactions.
    pub fn with_blocks(tx_counts: &[usize]) -> Self {
        let mut writer = Self::new();
        for &count in tx_counts {
            writer.append_simple_block(count);
        }
        writer
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self) -> ChainConfig {
        ChainConfig::new(self.dir.path())
    }

    pub fn blocks(&self) -> &[RawBlock] {
        &self.blocks
    }

    pub fn tx_written(&self) -> u32 {
        self.next_tx
    }

    fn append(&self, name: &str, bytes: &[u8]) -> u64 {
        let path = self.file(name);
        let offset = std::fs::metadata(&path).unwrap().len();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        offset
    }

    fn overwrite(&self, name: &str, offset: u64, bytes: &[u8]) {
        let mut file = OpenOptions::new().write(true).open(self.file(name)).unwrap();
        file.seek(SeekFrom::Start(offset)).unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
    }

    /// Transaction records only, with no block yet covering them.
    pub fn append_txs(&mut self, txs: &[TestTx]) {
        for tx in txs {
            self.append_tx_body(tx);
            self.append_tx_sequences(tx);
        }
    }

    /// Body, index entry and hash of one transaction; sequences come later.
    pub fn append_tx_body(&mut self, tx: &TestTx) {
        let body = tx.serialize();
        let offset = self.append("tx_data.dat", &body);
        let entry = IndexEntry {
            offset,
            len: body.len() as u64,
        };
        self.append("tx_index.dat", bytemuck::bytes_of(&entry));
        self.append("tx_hashes.dat", digest(&body).as_bytes());
        self.next_tx += 1;
    }

    pub fn append_tx_sequences(&self, tx: &TestTx) {
        let sequences: &[u8] = bytemuck::cast_slice(&tx.sequences);
        let offset = self.append("sequence_data.dat", sequences);
        let entry = IndexEntry {
            offset,
            len: sequences.len() as u64,
        };
        self.append("sequence_index.dat", bytemuck::bytes_of(&entry));
    }

    /// Coinbase plus a header for the `tx_count` most recently written
    /// transactions; the header itself is not written.
    fn build_block_header(&mut self, tx_count: u32) -> RawBlock {
        let height = self.blocks.len() as i32;
        let payload = format!("coinbase for block {}", height);
        let mut coinbase = (payload.len() as u32).to_le_bytes().to_vec();
        coinbase.extend_from_slice(payload.as_bytes());
        let coinbase_offset = self.append("coinbase.dat", &coinbase);

        let mut block = RawBlock {
            hash: Hash::ZERO,
            coinbase_offset,
            height,
            first_tx_index: self.next_tx - tx_count,
            tx_count,
            input_count: 0,
            output_count: 0,
            version: 0x2000_0000,
            timestamp: 1_600_000_000 + 600 * height as u32,
            bits: 0x1d00_ffff,
            nonce: height as u32 * 7919,
            real_size: 80,
            base_size: 80,
            reserved: 0,
        };
        block.hash = digest(bytemuck::bytes_of(&block));
        block
    }

    pub fn append_block_header(&mut self, tx_count: u32) -> RawBlock {
        let block = self.build_block_header(tx_count);
        self.append("blocks.dat", bytemuck::bytes_of(&block));
        self.blocks.push(block);
        block
    }

    pub fn append_block(&mut self, txs: &[TestTx]) -> RawBlock {
        self.append_txs(txs);
        self.append_block_header(txs.len() as u32)
    }

    pub fn append_simple_block(&mut self, tx_count: usize) -> RawBlock {
        let txs: Vec<TestTx> = (0..tx_count)
            .map(|i| {
                let seed = self.next_tx + i as u32;
                TestTx::new(seed, 1 + (seed % 3) as usize, 1 + (seed % 2) as usize)
            })
            .collect();
        self.append_block(&txs)
    }

    /// Overwrite the stored hash of block `height`, as a reorg would.
    pub fn rewrite_block_hash(&mut self, height: usize, hash: Hash) {
        self.overwrite(
            "blocks.dat",
            (height * size_of::<RawBlock>()) as u64,
            hash.as_bytes(),
        );
        self.blocks[height].hash = hash;
    }

    /// First half of a block header, as if the writer stopped mid-append.
    pub fn append_partial_block(&mut self, tx_count: u32) {
        let block = self.build_block_header(tx_count);
        let bytes = bytemuck::bytes_of(&block);
        self.append("blocks.dat", &bytes[..bytes.len() / 2]);
        self.pending_block = Some(block);
    }

    /// Full body, but only half of the index entry and hash.
    pub fn append_partial_tx(&self, tx: &TestTx) {
        let body = tx.serialize();
        let offset = self.append("tx_data.dat", &body);
        let entry = IndexEntry {
            offset,
            len: body.len() as u64,
        };
        self.append("tx_index.dat", &bytemuck::bytes_of(&entry)[..8]);
        self.append("tx_hashes.dat", &digest(&body).as_bytes()[..16]);
    }

    /// Complete what `append_partial_block` started.
    pub fn finish_partial_block(&mut self) -> RawBlock {
        let block = self.pending_block.take().expect("no partial block pending");
        let bytes = bytemuck::bytes_of(&block);
        self.append("blocks.dat", &bytes[bytes.len() / 2..]);
        self.blocks.push(block);
        block
    }

    /// Complete what `append_partial_tx` started.
    pub fn finish_partial_tx(&mut self, tx: &TestTx) {
        let body = tx.serialize();
        let offset = std::fs::metadata(self.file("tx_data.dat")).unwrap().len() - body.len() as u64;
        let entry = IndexEntry {
            offset,
            len: body.len() as u64,
        };
        self.append("tx_index.dat", &bytemuck::bytes_of(&entry)[8..]);
        self.append("tx_hashes.dat", &digest(&body).as_bytes()[16..]);
        self.append_tx_sequences(tx);
        self.next_tx += 1;
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
