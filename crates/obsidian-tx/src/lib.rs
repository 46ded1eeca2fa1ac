//! Obsidian transfer construction and signing.
//!
//! Provides the typed transfer payload, a builder that validates and routes
//! a transfer by the address families involved, signing for both families,
//! and the shielded note sealing primitive used whenever a shielded address
//! is on either end of a transfer.

pub mod builder;
pub mod shielded;
pub mod sign;
pub mod types;

pub use builder::{TransactionBuilder, UnsignedTransfer};
pub use shielded::{NoteEncryption, NotePlaintext, NoteRequest, ShieldedProver};
pub use sign::{sign_transfer, verify_transfer, SigningKey};
pub use types::{Authorization, SealedNote, SignedTransaction, TransferKind, TransferPayload};

use obsidian_types::AddressError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("memo is {len} bytes, maximum is {max}")]
    MemoTooLarge { len: usize, max: usize },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("signing key does not match source address: {0}")]
    KeyMismatch(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("signature verification failed: {0}")]
    Verification(String),

    #[error("note encryption error: {0}")]
    Encryption(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),
}
