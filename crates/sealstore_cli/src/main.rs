//! sealstore CLI
//!
//! Command-line tools for file-backed encrypted stores.
//!
//! # Commands
//!
//! - `put`, `get`, `delete`, `clear` - Read and write records
//! - `inspect` - Display store statistics without decrypting
//! - `verify` - Decrypt every record and report failures
//! - `compact` - Rewrite the log keeping only live records
//! - `algorithms` - List cipher algorithms

mod commands;

use clap::{Parser, Subcommand};
use sealstore_core::ProviderConfig;
use sealstore_crypto::CipherAlgorithm;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sealstore command-line tools.
#[derive(Parser)]
#[command(name = "sealstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Cipher algorithm (aes-256-cbc, 3des-cbc, rabbit, aes-256-gcm)
    #[arg(global = true, short, long)]
    cipher: Option<CipherAlgorithm>,

    /// Passphrase the store key is derived from
    #[arg(global = true, long, env = "SEALSTORE_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value under a key
    Put {
        /// Record key
        key: String,
        /// Value to store
        value: String,
    },

    /// Print the value stored under a key
    Get {
        /// Record key
        key: String,
    },

    /// Remove a key
    Delete {
        /// Record key
        key: String,
    },

    /// Remove every record
    Clear,

    /// Display store statistics without decrypting
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Decrypt every record and report failures
    Verify,

    /// Rewrite the log keeping only live records
    Compact,

    /// List cipher algorithms and whether they are available
    Algorithms,

    /// Show version information
    Version,
}

impl Cli {
    fn path(&self, command: &str) -> Result<PathBuf, String> {
        self.path
            .clone()
            .ok_or_else(|| format!("Store path required for {command}"))
    }

    fn passphrase(&self, command: &str) -> Result<String, String> {
        self.passphrase.clone().ok_or_else(|| {
            format!("Passphrase required for {command} (--passphrase or SEALSTORE_PASSPHRASE)")
        })
    }

    fn config(&self) -> Result<ProviderConfig, Box<dyn std::error::Error>> {
        let config = ProviderConfig::from_env()?;
        Ok(match self.cipher {
            Some(cipher) => config.algorithm(cipher),
            None => config,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Put { key, value } => {
            let store = commands::open(&cli.path("put")?, &cli.passphrase("put")?, cli.config()?).await?;
            commands::kv::put(&store, key, value.as_bytes()).await?;
            commands::close(store).await?;
        }
        Commands::Get { key } => {
            let store = commands::open(&cli.path("get")?, &cli.passphrase("get")?, cli.config()?).await?;
            let value = commands::kv::get(&store, key).await?;
            commands::close(store).await?;
            match value {
                Some(bytes) => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&bytes)?;
                    stdout.write_all(b"\n")?;
                }
                None => return Err(format!("Key {key:?} not found").into()),
            }
        }
        Commands::Delete { key } => {
            let store =
                commands::open(&cli.path("delete")?, &cli.passphrase("delete")?, cli.config()?).await?;
            commands::kv::delete(&store, key).await?;
            commands::close(store).await?;
        }
        Commands::Clear => {
            let store =
                commands::open(&cli.path("clear")?, &cli.passphrase("clear")?, cli.config()?).await?;
            commands::kv::clear(&store).await?;
            commands::close(store).await?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&cli.path("inspect")?, format).await?;
        }
        Commands::Verify => {
            commands::verify::run(&cli.path("verify")?, &cli.passphrase("verify")?, cli.config()?)
                .await?;
        }
        Commands::Compact => {
            commands::compact::run(&cli.path("compact")?).await?;
        }
        Commands::Algorithms => {
            commands::algorithms::run();
        }
        Commands::Version => {
            println!("sealstore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("envelope format v{}", sealstore_crypto::ENVELOPE_VERSION);
            println!("log format v{}", sealstore_storage::log::LOG_VERSION);
        }
    }

    Ok(())
}
