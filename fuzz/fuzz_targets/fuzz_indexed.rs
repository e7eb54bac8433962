#![no_main]

use chainmap::{IndexedRecordFile, TxHeader};
use libfuzzer_sys::fuzz_target;
use tempfile::TempDir;

// Arbitrary index and blob contents must surface as errors, never panics
fuzz_target!(|data: &[u8]| {
    let _ = env_logger::builder().is_test(true).try_init();
    if data.len() < 2 {
        return;
    }

    // First byte picks where the index file ends and the blob begins
    let split = (data[0] as usize * 16).min(data.len() - 1);
    let (index, blob) = data[1..].split_at(split);

    let dir = TempDir::new().unwrap();
    let index_path = dir.path().join("index.dat");
    let data_path = dir.path().join("data.dat");
    std::fs::write(&index_path, index).unwrap();
    std::fs::write(&data_path, blob).unwrap();

    let txs = match IndexedRecordFile::<TxHeader>::open(&index_path, &data_path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("Rejected at open: {}", e);
            return;
        }
    };
    for i in 0..=txs.count() {
        if let Ok(tx) = txs.get(i) {
            assert!(i < txs.count());
            let _ = tx.inputs().len() + tx.outputs().len();
        }
    }

    if let Ok(sequences) = IndexedRecordFile::<[u32]>::open(&index_path, &data_path) {
        for i in 0..sequences.count() {
            let _ = sequences.get(i);
        }
    }
});
