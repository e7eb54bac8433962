use chainmap::{BlockHeight, ChainAccess, ChainConfig};
use chrono::{TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;

/// Print watermarks and sample records from a chain data directory
#[derive(Parser, Debug)]
#[command(name = "chain-stats")]
struct Args {
    /// Directory holding the writer's data files
    data_dir: PathBuf,

    /// Hide this many of the newest blocks
    #[arg(long, default_value_t = 0)]
    blocks_ignored: u32,

    /// Serve tip data even if the writer rewrote it
    #[arg(long)]
    no_reorg_check: bool,

    /// Number of tip blocks to print
    #[arg(long, default_value_t = 5)]
    tail: u32,

    /// Look up the block containing this transaction
    #[arg(long)]
    tx: Option<u32>,
}

struct ChainStats {
    blocks: BlockHeight,
    transactions: usize,
    tip: String,
}

impl std::fmt::Display for ChainStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Chain Statistics ===")?;
        writeln!(f, "Blocks: {}", self.blocks)?;
        writeln!(f, "Transactions: {}", self.transactions)?;
        writeln!(f, "Tip hash: {}", self.tip)?;
        Ok(())
    }
}

fn print_tail(chain: &ChainAccess, count: u32) -> chainmap::Result<()> {
    println!("=== Last {} blocks ===", count);
    let start = (chain.block_count() - count.min(i32::MAX as u32) as i32).max(0);
    for height in start..chain.block_count() {
        let block = chain.get_block(height)?;
        let time = Utc
            .timestamp_opt(block.timestamp as i64, 0)
            .single()
            .map_or_else(|| "?".to_string(), |t| t.to_rfc3339());
        let coinbase = chain.get_coinbase(block.coinbase_offset)?;
        println!(
            "Block {}: hash={} txs={} time={} coinbase={} bytes",
            block.height,
            block.hash,
            block.tx_count,
            time,
            coinbase.len()
        );
    }
    Ok(())
}

fn print_tx(chain: &ChainAccess, index: u32) -> chainmap::Result<()> {
    let height = chain.get_block_height(index)?;
    let hash = chain.get_tx_hash(index)?;
    let tx = chain.get_tx(index)?;
    let sequences = chain.get_sequence_numbers(index)?;
    println!("\n=== Transaction {} ===", index);
    println!("Block: {}", height);
    println!("Hash: {}", hash);
    println!(
        "Version {} locktime {}: {} inputs, {} outputs, {} bytes",
        tx.version(),
        tx.locktime(),
        tx.input_count(),
        tx.output_count(),
        tx.size_bytes()
    );
    for (input, sequence) in tx.inputs().iter().zip(sequences) {
        println!(
            "  in  <- tx {} output {} (sequence {:#010x})",
            input.prev_tx_index, input.prev_output, sequence
        );
    }
    for output in tx.outputs() {
        println!("  out -> {} (type {})", output.value(), output.script_type);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = ChainConfig::new(&args.data_dir)
        .error_on_reorg(!args.no_reorg_check)
        .blocks_ignored(args.blocks_ignored);
    let chain = ChainAccess::open(config)?;

    let stats = ChainStats {
        blocks: chain.block_count(),
        transactions: chain.tx_count(),
        tip: chain
            .last_block_hash()
            .map_or_else(|| "<empty>".to_string(), |h| h.to_string()),
    };
    println!("{}", stats);

    print_tail(&chain, args.tail)?;
    if let Some(index) = args.tx {
        print_tx(&chain, index)?;
    }
    Ok(())
}
