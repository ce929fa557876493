// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ripple-codec
//!
//! Entry point for the `ripple-codec` binary. Parses CLI arguments,
//! initializes logging, and runs one codec or signing command.
//!
//! - `encode`  : JSON transaction to canonical hex
//! - `decode`  : canonical hex to JSON
//! - `sign`    : assemble, sign and encode a JSON transaction
//! - `verify`  : check the signatures on a blob
//! - `hash`    : transaction ID of a blob
//! - `keypair` : public key and address for a seed

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;

use ripple_codec::codec::{decode, encode, from_json, to_json};
use ripple_codec::crypto::{derive_keypair_from_seed, KeyPair, Seed};
use ripple_codec::transaction::{check_signed, sign_transaction, transaction_hash, TransactionBuilder};

use cli::{Commands, RippleCodecCli};

fn main() -> Result<()> {
    let cli = RippleCodecCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Encode(args) => {
            let json = read_json(args.input.as_deref())?;
            let tx = from_json(&json).context("invalid transaction JSON")?;
            let bytes = encode(&tx, args.signing).context("failed to encode transaction")?;
            println!("{}", hex::encode_upper(bytes));
        }
        Commands::Decode(args) => {
            let tx = decode(&parse_blob(&args.blob)?).context("failed to decode blob")?;
            print_json(&to_json(&tx))?;
        }
        Commands::Sign(args) => {
            let json = read_json(args.input.as_deref())?;
            let keypair = load_keypair(&args.key.seed)?;
            let tx = TransactionBuilder::from_json(&json)
                .and_then(TransactionBuilder::build)
                .context("failed to assemble transaction")?;
            let signed = sign_transaction(&tx, &keypair).context("failed to sign transaction")?;
            tracing::info!(hash = %signed.hash_hex(), account = %keypair.account_id(), "signed");
            print_json(&json!({
                "tx_blob": signed.blob_hex(),
                "hash": signed.hash_hex(),
                "tx_json": to_json(&signed.tx),
            }))?;
        }
        Commands::Verify(args) => {
            let tx = decode(&parse_blob(&args.blob)?).context("failed to decode blob")?;
            match check_signed(&tx) {
                Ok(()) => println!("valid"),
                Err(e) => bail!("invalid: {}", e),
            }
        }
        Commands::Hash(args) => {
            let tx = decode(&parse_blob(&args.blob)?).context("failed to decode blob")?;
            let hash = transaction_hash(&tx).context("failed to re-encode transaction")?;
            println!("{}", hex::encode_upper(hash));
        }
        Commands::Keypair(args) => {
            let keypair = load_keypair(&args.seed)?;
            print_json(&json!({
                "key_type": keypair.algorithm(),
                "public_key": keypair.public_key().to_hex(),
                "account_id": keypair.account_id().to_address(),
            }))?;
        }
    }
    Ok(())
}

fn read_json(path: Option<&Path>) -> Result<Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn parse_blob(blob: &str) -> Result<Vec<u8>> {
    hex::decode(blob.trim()).context("blob is not valid hex")
}

fn load_keypair(seed: &str) -> Result<KeyPair> {
    let seed = Seed::from_base58(seed.trim()).context("invalid seed")?;
    derive_keypair_from_seed(&seed).context("key derivation failed")
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
