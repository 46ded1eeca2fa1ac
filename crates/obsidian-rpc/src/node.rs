//! Node RPC client.
//!
//! Typed async methods for the parts of the Obsidian node RPC a wallet
//! needs: per-address balances, raw transaction submission, and chain height.

use crate::client::{RpcClient, RpcConfig};
use crate::error::RpcError;
use async_trait::async_trait;
use obsidian_types::address::address_kind;
use obsidian_types::{AddressKind, Amount};
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Response Types
// =============================================================================

/// `getbalance` / `z_getbalance` response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceInfo {
    pub address: String,
    /// Atomic units.
    pub balance: u64,
    #[serde(default)]
    pub balance_obs: f64,
}

/// `sendrawtransaction` accepts either a bare txid or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SubmitResult {
    Txid(String),
    Object { txid: String },
}

// =============================================================================
// Node API seam
// =============================================================================

/// The node operations the wallet depends on.
///
/// `NodeRpc` is the production implementation; tests drive the wallet with
/// an in-memory node instead.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Confirmed balance of `address`. Addresses the node has never seen
    /// report zero.
    async fn get_balance(&self, address: &str) -> Result<Amount, RpcError>;

    /// Submit a hex-encoded signed transaction and return its id.
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, RpcError>;

    /// Current chain height.
    async fn block_count(&self) -> Result<u64, RpcError>;
}

/// Node RPC client.
pub struct NodeRpc {
    client: RpcClient,
}

impl NodeRpc {
    /// Create a node client for `host:port` or a URL.
    pub fn new(endpoint: &str) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::new(endpoint)?,
        })
    }

    /// Create with full configuration.
    pub fn with_config(config: RpcConfig) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::with_config(config)?,
        })
    }

    /// Get the underlying RPC client for custom calls.
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    // =========================================================================
    // Balances
    // =========================================================================

    /// Query the balance of an address, routing shielded addresses to
    /// `z_getbalance`.
    pub async fn get_address_balance(&self, address: &str) -> Result<BalanceInfo, RpcError> {
        let method = match address_kind(address) {
            Some(AddressKind::Shielded) => "z_getbalance",
            _ => "getbalance",
        };
        let val = self.client.call(method, serde_json::json!([address])).await?;
        serde_json::from_value(val).map_err(|e| RpcError::UnexpectedResponse {
            method: method.to_string(),
            detail: e.to_string(),
        })
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Submit a signed transaction (hex) and return the txid.
    pub async fn send_raw_transaction(&self, tx_as_hex: &str) -> Result<String, RpcError> {
        let val = self
            .client
            .call("sendrawtransaction", serde_json::json!([tx_as_hex]))
            .await?;
        parse_txid(val)
    }

    // =========================================================================
    // Network Information
    // =========================================================================

    /// Get current blockchain height.
    pub async fn get_block_count(&self) -> Result<u64, RpcError> {
        let val = self.client.call("getblockcount", serde_json::json!([])).await?;
        val.as_u64().ok_or(RpcError::NoResult {
            context: "getblockcount".into(),
        })
    }

    /// Simple connectivity check.
    pub async fn is_connected(&self) -> bool {
        self.get_block_count().await.is_ok()
    }
}

fn parse_txid(val: Value) -> Result<String, RpcError> {
    let txid = match serde_json::from_value::<SubmitResult>(val) {
        Ok(SubmitResult::Txid(txid)) | Ok(SubmitResult::Object { txid }) => txid,
        Err(e) => {
            return Err(RpcError::UnexpectedResponse {
                method: "sendrawtransaction".into(),
                detail: e.to_string(),
            })
        }
    };
    if txid.is_empty() {
        return Err(RpcError::NoResult {
            context: "sendrawtransaction".into(),
        });
    }
    Ok(txid)
}

#[async_trait]
impl NodeApi for NodeRpc {
    async fn get_balance(&self, address: &str) -> Result<Amount, RpcError> {
        match self.get_address_balance(address).await {
            Ok(info) => Ok(Amount::from_atomic(info.balance)),
            Err(e) if e.is_unknown_address() => {
                log::debug!("node has no record of {}, reporting zero", address);
                Ok(Amount::ZERO)
            }
            Err(e) => Err(e),
        }
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, RpcError> {
        let txid = self.send_raw_transaction(raw_tx_hex).await?;
        log::info!("node accepted transaction {}", txid);
        Ok(txid)
    }

    async fn block_count(&self) -> Result<u64, RpcError> {
        self.get_block_count().await
    }
}
