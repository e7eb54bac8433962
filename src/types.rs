use crate::error::{Error, Result};
use crate::mapped::BlobRecord;
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::mem::size_of;
use std::ops::Range;

/// Logical block index. Signed to match the writer's layout.
pub type BlockHeight = i32;

/// 32-byte block or transaction hash, stored exactly as written to disk.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

// Zero-copy block header read directly from the block file mapping
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct RawBlock {
    pub hash: Hash,
    /// Byte offset of this block's coinbase payload in the coinbase file
    pub coinbase_offset: u64,
    pub height: BlockHeight,
    pub first_tx_index: u32,
    pub tx_count: u32,
    pub input_count: u32,
    pub output_count: u32,
    pub version: i32,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub real_size: u32,
    pub base_size: u32,
    pub reserved: u32,
}

impl RawBlock {
    /// Global transaction indices covered by this block.
    pub fn tx_range(&self) -> Range<u32> {
        self.first_tx_index..self.end_tx_index()
    }

    pub fn end_tx_index(&self) -> u32 {
        self.first_tx_index.saturating_add(self.tx_count)
    }
}

// Fixed header at the start of every transaction record in the tx blob
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct TxHeader {
    pub real_size: u32,
    pub base_size: u32,
    pub version: i32,
    pub locktime: u32,
    pub input_count: u16,
    pub output_count: u16,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct RawInput {
    /// Global index of the transaction whose output is spent
    pub prev_tx_index: u32,
    pub prev_output: u32,
    pub script_len: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct RawOutput {
    // Kept as bytes so the record stays 4-byte aligned inside the blob
    value: [u8; 8],
    pub script_len: u32,
    pub script_type: u32,
}

impl RawOutput {
    pub fn new(value: u64, script_len: u32, script_type: u32) -> Self {
        Self {
            value: value.to_le_bytes(),
            script_len,
            script_type,
        }
    }

    pub fn value(&self) -> u64 {
        u64::from_le_bytes(self.value)
    }
}

/// Borrowed view over one variable-size transaction record.
///
/// The view points straight into the transaction blob mapping, so it
/// cannot outlive the `ChainAccess` (or `IndexedRecordFile`) it came from
/// and is invalidated by the next reload.
#[derive(Debug, Clone, Copy)]
pub struct RawTransaction<'a> {
    header: &'a TxHeader,
    inputs: &'a [RawInput],
    outputs: &'a [RawOutput],
}

impl<'a> RawTransaction<'a> {
    /// Interpret `bytes` as a transaction record. The slice may carry
    /// trailing bytes past the declared inputs and outputs.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header_len = size_of::<TxHeader>();
        if bytes.len() < header_len {
            return Err(Error::Corrupt(format!(
                "transaction record of {} bytes is shorter than its {} byte header",
                bytes.len(),
                header_len
            )));
        }
        let header: &TxHeader = bytemuck::try_from_bytes(&bytes[..header_len])
            .map_err(|e| Error::Corrupt(format!("transaction header: {e}")))?;

        let inputs_len = header.input_count as usize * size_of::<RawInput>();
        let outputs_len = header.output_count as usize * size_of::<RawOutput>();
        let needed = header_len + inputs_len + outputs_len;
        if bytes.len() < needed {
            return Err(Error::Corrupt(format!(
                "transaction with {} inputs and {} outputs needs {} bytes, record has {}",
                header.input_count,
                header.output_count,
                needed,
                bytes.len()
            )));
        }

        let inputs_end = header_len + inputs_len;
        let inputs = bytemuck::try_cast_slice(&bytes[header_len..inputs_end])
            .map_err(|e| Error::Corrupt(format!("transaction inputs: {e}")))?;
        let outputs = bytemuck::try_cast_slice(&bytes[inputs_end..needed])
            .map_err(|e| Error::Corrupt(format!("transaction outputs: {e}")))?;

        Ok(Self {
            header,
            inputs,
            outputs,
        })
    }

    pub fn header(&self) -> &'a TxHeader {
        self.header
    }

    pub fn inputs(&self) -> &'a [RawInput] {
        self.inputs
    }

    pub fn outputs(&self) -> &'a [RawOutput] {
        self.outputs
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn locktime(&self) -> u32 {
        self.header.locktime
    }

    pub fn size_bytes(&self) -> u32 {
        self.header.real_size
    }
}

impl BlobRecord for TxHeader {
    type View<'a> = RawTransaction<'a>;

    fn view<'a>(bytes: &'a [u8]) -> Result<RawTransaction<'a>> {
        RawTransaction::parse(bytes)
    }
}
