//! Compact command implementation.

use super::open_raw;
use sealstore_storage::StorageProvider;
use std::path::Path;

/// Runs the compact command.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let provider = open_raw(path).await?;
    let before = provider.file_size()?;
    provider.compact()?;
    let after = provider.file_size()?;
    let records = provider.entry_count()?;
    provider.close().await?;

    println!("Compacted {:?}", path);
    println!("  Records:  {records}");
    println!("  Size:     {before} -> {after} bytes");
    println!("  Reclaimed {} bytes", before.saturating_sub(after));

    Ok(())
}
