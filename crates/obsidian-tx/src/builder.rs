//! Transfer builder.
//!
//! Validates the endpoints, amount, and memo of a transfer and routes it to
//! the right [`TransferKind`]. The result is an [`UnsignedTransfer`] that
//! `sign_transfer` turns into a broadcastable transaction.

use crate::shielded::check_memo;
use crate::types::TransferKind;
use crate::TxError;
use obsidian_types::address::parse_address;
use obsidian_types::{Amount, ParsedAddress};
use std::time::{SystemTime, UNIX_EPOCH};

/// A validated transfer awaiting a signature.
#[derive(Debug, Clone)]
pub struct UnsignedTransfer {
    pub kind: TransferKind,
    pub from: ParsedAddress,
    pub to: ParsedAddress,
    pub amount: Amount,
    pub memo: String,
    /// Unix seconds.
    pub timestamp: u64,
}

impl UnsignedTransfer {
    pub fn from_address(&self) -> String {
        self.from.to_address_string()
    }

    pub fn to_address(&self) -> String {
        self.to.to_address_string()
    }
}

/// Builder for constructing Obsidian transfers.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    source: Option<String>,
    destination: Option<String>,
    amount: Amount,
    memo: String,
    timestamp: Option<u64>,
}

impl TransactionBuilder {
    /// Create a new transaction builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spending address.
    pub fn set_source(mut self, address: &str) -> Self {
        self.source = Some(address.to_string());
        self
    }

    /// Set the receiving address.
    pub fn set_destination(mut self, address: &str) -> Self {
        self.destination = Some(address.to_string());
        self
    }

    pub fn set_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    /// Attach a memo. Encrypted unless both ends are transparent.
    pub fn set_memo(mut self, memo: &str) -> Self {
        self.memo = memo.to_string();
        self
    }

    /// Override the creation time (defaults to now).
    pub fn set_timestamp(mut self, unix_secs: u64) -> Self {
        self.timestamp = Some(unix_secs);
        self
    }

    /// Validate and route the transfer.
    pub fn build(self) -> Result<UnsignedTransfer, TxError> {
        if self.amount.is_zero() {
            return Err(TxError::ZeroAmount);
        }
        let from = parse_address(
            self.source
                .as_deref()
                .ok_or(TxError::MissingField("source address"))?,
        )?;
        let to = parse_address(
            self.destination
                .as_deref()
                .ok_or(TxError::MissingField("destination address"))?,
        )?;
        check_memo(&self.memo)?;

        Ok(UnsignedTransfer {
            kind: TransferKind::route(from.kind, to.kind),
            from,
            to,
            amount: self.amount,
            memo: self.memo,
            timestamp: self.timestamp.unwrap_or_else(unix_now),
        })
    }
}

/// Current time as unix seconds; a clock before 1970 reads as zero.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
