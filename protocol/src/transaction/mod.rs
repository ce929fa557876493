//! # Transaction Module
//!
//! Assembly, signing, and verification of ledger transactions. A transaction
//! is a [`TransactionObject`](crate::codec::TransactionObject); this module
//! adds the rules that sit on top of the codec.
//!
//! ## Architecture
//!
//! ```text
//! builder.rs      : assemble() and TransactionBuilder, required-field checks
//! signing.rs      : single signing (STX\0 prefix) and transaction hashes
//! multisign.rs    : Signer entries (SMT\0 prefix) and Signers assembly
//! verification.rs : checking attached signatures, from objects or blobs
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Assemble**: [`assemble`] or [`TransactionBuilder`] fills in
//!    `TransactionType` and `Flags` and checks required fields.
//! 2. **Sign**: [`sign_transaction`] attaches `SigningPubKey` and
//!    `TxnSignature`, or [`multisign`] + [`combine_signers`] build `Signers`.
//! 3. **Encode**: the result carries its final blob and hash.
//! 4. **Verify**: [`verify_signed`] / [`verify_blob`] recompute the signed
//!    bytes and check every signature.

pub mod builder;
pub mod multisign;
pub mod signing;
pub mod verification;

pub use builder::{assemble, assemble_with, AssembleError, ProtocolSchema, TransactionBuilder, TransactionSchema};
pub use multisign::{combine_signers, multisign, multisigning_data, verify_multisigned};
pub use signing::{sign, sign_transaction, signing_data, transaction_hash, verify, SignError, SignedTransaction};
pub use verification::{check_signed, verify_blob, verify_signed, VerifyError};
