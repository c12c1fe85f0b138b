//! Inspect command implementation.

use super::open_raw;
use sealstore_crypto::{CipherAlgorithm, Envelope};
use sealstore_storage::{FileProvider, ReadContext, StorageProvider};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Log file size in bytes.
    pub file_size: u64,
    /// Number of live records.
    pub entry_count: usize,
    /// Live records per cipher algorithm id.
    pub algorithms: BTreeMap<String, usize>,
    /// Live records whose bytes are not an envelope.
    pub unrecognized: usize,
}

/// Runs the inspect command.
pub async fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let provider = open_raw(path).await?;
    let result = inspect(&provider).await;
    provider.close().await?;
    let result = result?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects statistics from an open raw log. Nothing is decrypted.
pub async fn inspect(provider: &FileProvider) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut result = InspectResult {
        path: provider.path().display().to_string(),
        file_size: provider.file_size()?,
        entry_count: provider.entry_count()?,
        algorithms: BTreeMap::new(),
        unrecognized: 0,
    };

    let ctx = provider.read_only_context()?;
    for key in provider.keys()? {
        let Some(bytes) = ctx.get(&key).await? else {
            continue;
        };
        match Envelope::peek_algorithm(&bytes) {
            Ok(algorithm) => *result.algorithms.entry(algorithm.id().to_string()).or_default() += 1,
            Err(_) => result.unrecognized += 1,
        }
    }

    Ok(result)
}

fn print_text_output(result: &InspectResult) {
    println!("Store: {}", result.path);
    println!();
    println!("File size: {} bytes", result.file_size);
    println!("Records:   {}", result.entry_count);
    println!();
    println!("Envelopes by algorithm:");
    for algorithm in CipherAlgorithm::ALL {
        let count = result.algorithms.get(algorithm.id()).copied().unwrap_or(0);
        println!("  {:<12} {}", algorithm.id(), count);
    }
    if result.unrecognized > 0 {
        println!("  {:<12} {}", "unrecognized", result.unrecognized);
    }
}
