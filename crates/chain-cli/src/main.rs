use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chain_core::{compute_hash, Block, Chain};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_PAYLOADS: [&str; 4] = ["second block", "third block", "fourth block", "fifth block"];

#[derive(Parser, Debug)]
#[command(name = "chain-cli")]
#[command(about = "Build and check a hash-linked block chain")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed a chain, append blocks and print it as JSON
    Demo {
        /// Payload of a block to append; repeat for several blocks
        #[arg(long = "payload")]
        payloads: Vec<String>,
    },
    /// Print the digest of a block's fields
    Hash {
        #[arg(long)]
        index: u64,
        #[arg(long, default_value = "")]
        previous_hash: String,
        #[arg(long)]
        timestamp: u64,
        #[arg(long)]
        payload: String,
    },
    /// Check a JSON array of blocks exported by `demo`
    Verify {
        /// Path to the JSON file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo { payloads } => {
            let mut chain = Chain::new();
            let payloads = if payloads.is_empty() {
                DEFAULT_PAYLOADS.iter().map(|p| p.to_string()).collect()
            } else {
                payloads
            };
            for payload in payloads {
                chain.create_block(payload)?;
            }
            info!(len = chain.len(), "demo chain built");
            println!("{}", serde_json::to_string_pretty(chain.blocks())?);
        }
        Command::Hash {
            index,
            previous_hash,
            timestamp,
            payload,
        } => {
            println!("{}", compute_hash(index, &previous_hash, timestamp, &payload));
        }
        Command::Verify { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let values: Vec<Value> =
                serde_json::from_str(&raw).context("expected a JSON array of blocks")?;
            let blocks = values
                .iter()
                .enumerate()
                .map(|(i, v)| Block::from_value(v).with_context(|| format!("block {i}")))
                .collect::<Result<Vec<_>>>()?;
            let chain = Chain::from_blocks(blocks).context("chain rejected")?;
            println!("ok: {} blocks", chain.len());
        }
    }
    Ok(())
}
