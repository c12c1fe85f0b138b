//! Verify command implementation.

use super::{close, open, Store};
use sealstore_core::ProviderConfig;
use sealstore_storage::{ReadContext, StorageProvider};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of records that decrypted.
    pub valid_records: usize,
    /// Records that failed, with the error.
    pub failures: Vec<(String, String)>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the verify command.
pub async fn run(
    path: &Path,
    passphrase: &str,
    config: ProviderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }
    println!("Verifying store at {:?} with {}", path, config.algorithm);
    println!();

    let store = open(path, passphrase, config).await?;
    let result = verify(&store).await;
    close(store).await?;
    let result = result?;

    println!("Checked: {}", result.records_checked);
    println!("Valid:   {}", result.valid_records);
    for (key, error) in &result.failures {
        println!("  {key:?}: {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err("Verification failed".into())
    }
}

/// Decrypts every record, collecting failures instead of stopping at the
/// first.
pub async fn verify(store: &Store) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::default();
    let ctx = store.read_only_context()?;

    for key in store.backend().keys()? {
        result.records_checked += 1;
        match ctx.get(&key).await {
            Ok(_) => result.valid_records += 1,
            Err(err) if err.is_decryption_failure() => {
                result.failures.push((key, err.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(result)
}
