//! Wallet error types.
//!
//! Callers branch on the variant; lower-level errors from the address,
//! RPC and transaction crates are folded into the kinds below.

use obsidian_rpc::RpcError;
use obsidian_tx::TxError;
use obsidian_types::{AddressError, AddressKind, Amount, AmountError, MnemonicError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] MnemonicError),

    #[error("address {0} does not belong to this wallet")]
    UnknownAddress(String),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid memo: {0}")]
    InvalidMemo(String),

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Amount, have: Amount },

    #[error("node unavailable: {0}")]
    RpcUnavailable(String),

    #[error("node did not respond in time: {0}")]
    RpcTimeout(String),

    #[error("node rejected the request: {0}")]
    RpcRejected(String),

    #[error("wallet file I/O error: {0}")]
    PersistenceIo(#[from] std::io::Error),

    #[error("invalid wallet file: {0}")]
    PersistenceFormat(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("{kind} index {index} does not follow the registry (next is {expected})")]
    IndexConflict {
        kind: AddressKind,
        index: u32,
        expected: u32,
    },

    #[error("no wallet is open")]
    NoWallet,

    #[error("revealing the recovery phrase requires explicit confirmation")]
    RevealNotConfirmed,

    #[error("transaction construction failed: {0}")]
    Transaction(String),

    #[error("wallet state lock poisoned: {0}")]
    Lock(String),
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Timeout { .. } => WalletError::RpcTimeout(err.to_string()),
            RpcError::Rpc { message, .. } => WalletError::RpcRejected(message),
            other => WalletError::RpcUnavailable(other.to_string()),
        }
    }
}

impl From<TxError> for WalletError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::ZeroAmount => WalletError::InvalidAmount(err.to_string()),
            TxError::InvalidAddress(e) => WalletError::InvalidAddress(e),
            TxError::MemoTooLarge { .. } => WalletError::InvalidMemo(err.to_string()),
            other => WalletError::Transaction(other.to_string()),
        }
    }
}

impl From<AmountError> for WalletError {
    fn from(err: AmountError) -> Self {
        WalletError::InvalidAmount(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::PersistenceFormat(err.to_string())
    }
}
