//! raftlog CLI - inspect and repair a Raft store on disk
//!
//! Opens the store directly, so the owning node must be stopped first.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use raftlog_common::{LogEntry, StoreConfig};
use raftlog_store::{LogStore, RaftStore, StableStore};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "raftlog-cli")]
#[command(about = "raftlog store inspection CLI")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Store data directory (overrides the config file)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show log boundaries
    Info,
    /// Print a log entry as JSON
    GetLog {
        /// Log index
        index: u64,
    },
    /// Print a stable store value
    Get {
        /// Key
        key: String,
    },
    /// Print a stable store u64 value
    GetU64 {
        /// Key
        key: String,
    },
    /// Set a stable store value
    Set {
        /// Key
        key: String,
        /// Value (stored as UTF-8 bytes)
        value: String,
    },
    /// Set a stable store u64 value
    SetU64 {
        /// Key
        key: String,
        /// Value
        value: u64,
    },
    /// Delete log entries in [min, max]
    DeleteRange {
        /// First index to delete
        min: u64,
        /// Last index to delete (inclusive)
        max: u64,
    },
}

/// Build the store config from the optional file, `RAFTLOG_*` env vars and `--dir`.
fn load_config(file: Option<&str>, dir: Option<PathBuf>) -> Result<StoreConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(config::File::with_name(path));
    }
    builder = builder.add_source(config::Environment::with_prefix("RAFTLOG"));

    let mut store_config: StoreConfig = builder
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    if let Some(dir) = dir {
        store_config.dir = dir;
    }
    Ok(store_config)
}

/// Render bytes as text when they are UTF-8, hex otherwise.
fn format_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.chars().any(char::is_control) => s.to_string(),
        _ => format!("0x{}", hex::encode(bytes)),
    }
}

fn entry_json(entry: &LogEntry) -> serde_json::Value {
    json!({
        "index": entry.index,
        "term": entry.term,
        "kind": entry.kind.as_str(),
        "data": format_bytes(&entry.data),
        "extensions": format_bytes(&entry.extensions),
        "appended_at": entry.appended_at,
    })
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(args.config.as_deref(), args.dir)?;
    info!("Opening store at {:?}", config.dir);
    let store = RaftStore::open(&config)
        .with_context(|| format!("Failed to open store at {}", config.dir.display()))?;

    match args.command {
        Commands::Info => {
            println!("Store");
            println!("=====");
            println!("Directory:   {}", config.dir.display());
            println!("First index: {}", store.first_index()?);
            println!("Last index:  {}", store.last_index()?);
        }
        Commands::GetLog { index } => {
            let entry = store.get_log(index)?;
            println!("{}", serde_json::to_string_pretty(&entry_json(&entry))?);
        }
        Commands::Get { key } => {
            let value = store.get(key.as_bytes())?;
            println!("{}", format_bytes(&value));
        }
        Commands::GetU64 { key } => {
            println!("{}", store.get_u64(key.as_bytes())?);
        }
        Commands::Set { key, value } => {
            store.set(key.as_bytes(), value.as_bytes())?;
            println!("Set '{key}'");
        }
        Commands::SetU64 { key, value } => {
            store.set_u64(key.as_bytes(), value)?;
            println!("Set '{key}' = {value}");
        }
        Commands::DeleteRange { min, max } => {
            store.delete_range(min, max)?;
            println!("Deleted log entries {min}..={max}");
        }
    }

    store.close()?;
    Ok(())
}
