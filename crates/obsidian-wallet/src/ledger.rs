//! Append-only transaction history.

use obsidian_tx::TransferKind;
use obsidian_types::Amount;
use serde::{Deserialize, Serialize};

/// One submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unix seconds, from the local clock at submission.
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: TransferKind,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Records in submission order. Entries are never reordered or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<TransactionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: TransactionRecord) {
        log::debug!("ledger: {} {} -> {}", record.kind, record.amount, record.txid);
        self.records.push(record);
    }

    /// Oldest first.
    pub fn all(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
