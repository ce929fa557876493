// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ripple-codec
//!
//! Canonical binary encoding and deterministic signing for XRP Ledger
//! transactions.
//!
//! A transaction is a map of named fields. Encoding looks every field up
//! in a fixed registry, sorts by `(type code, field code)`, and writes
//! self-describing headers followed by the value bytes. The same bytes,
//! minus non-signing fields and behind a hash prefix, are what a key signs.
//! Two implementations that agree on the registry produce identical bytes,
//! and therefore identical signatures and transaction hashes.
//!
//! ## Architecture
//!
//! - **config**: protocol constants (hash prefixes, version bytes, limits).
//! - **address**: account IDs and the ledger's base58 alphabet.
//! - **crypto**: seeds, secp256k1 and Ed25519 key derivation, signatures.
//! - **definitions**: the field registry and transaction formats.
//! - **codec**: amounts, field headers, length prefixes, binary and JSON forms.
//! - **transaction**: assembly, single and multi-signing, verification.
//!
//! ## Guarantees
//!
//! 1. `decode(encode(tx)) == tx` for every encodable transaction.
//! 2. Encoding is independent of field insertion order.
//! 3. Signing is deterministic for both algorithms.
//! 4. Failed operations produce no partial output.

pub mod address;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod definitions;
pub mod transaction;
