//! Wallet service.
//!
//! The operation contract presentation layers (CLI, GUI) consume. Owns the
//! single lock-protected [`WalletState`]; network and file I/O always run
//! with the lock released.

use crate::error::WalletError;
use crate::ledger::TransactionRecord;
use crate::seed::SeedArtifact;
use crate::state::WalletState;
use crate::storage;
use futures::future::join_all;
use obsidian_rpc::{NodeApi, NodeRpc};
use obsidian_tx::builder::unix_now;
use obsidian_tx::{sign_transfer, NoteEncryption, ShieldedProver, TransactionBuilder};
use obsidian_types::address::parse_address;
use obsidian_types::{AddressKind, Amount};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Builds a node handle for an endpoint.
pub type NodeFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn NodeApi>, WalletError> + Send + Sync>;

/// Single-identity wallet service.
///
/// All operations take `&self`; share it behind an `Arc` across tasks.
pub struct WalletService {
    state: Mutex<Option<WalletState>>,
    node_factory: NodeFactory,
    node: Mutex<Option<(String, Arc<dyn NodeApi>)>>,
    prover: Arc<dyn ShieldedProver>,
}

impl Default for WalletService {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletService {
    /// Service talking to the node over JSON-RPC.
    pub fn new() -> Self {
        Self::with_node_factory(Arc::new(
            |endpoint: &str| -> Result<Arc<dyn NodeApi>, WalletError> {
                Ok(Arc::new(NodeRpc::new(endpoint)?))
            },
        ))
    }

    /// Service using a caller-supplied node implementation.
    pub fn with_node_factory(node_factory: NodeFactory) -> Self {
        Self {
            state: Mutex::new(None),
            node_factory,
            node: Mutex::new(None),
            prover: Arc::new(NoteEncryption),
        }
    }

    /// Replace the shielded note primitive.
    pub fn with_prover(mut self, prover: Arc<dyn ShieldedProver>) -> Self {
        self.prover = prover;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<WalletState>>, WalletError> {
        self.state.lock().map_err(|e| WalletError::Lock(e.to_string()))
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&WalletState) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let guard = self.lock()?;
        f(guard.as_ref().ok_or(WalletError::NoWallet)?)
    }

    fn with_state_mut<T>(
        &self,
        f: impl FnOnce(&mut WalletState) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let mut guard = self.lock()?;
        f(guard.as_mut().ok_or(WalletError::NoWallet)?)
    }

    fn node(&self) -> Result<Arc<dyn NodeApi>, WalletError> {
        let endpoint = self.endpoint()?;
        let mut cache = self.node.lock().map_err(|e| WalletError::Lock(e.to_string()))?;
        if let Some((cached, node)) = cache.as_ref() {
            if *cached == endpoint {
                return Ok(node.clone());
            }
        }
        let node = (self.node_factory)(&endpoint)?;
        *cache = Some((endpoint, node.clone()));
        Ok(node)
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Start a new wallet identity and return its recovery phrase.
    ///
    /// Replaces any open wallet. The first address of each family is
    /// derived immediately.
    pub fn create_wallet(&self, endpoint: &str) -> Result<String, WalletError> {
        let seed = SeedArtifact::generate()?;
        let phrase = seed.phrase().to_string();
        let state = WalletState::new(seed, endpoint)?;
        *self.lock()? = Some(state);
        log::info!("created new wallet (node {})", endpoint);
        Ok(phrase)
    }

    /// Restore from a recovery phrase. Returns false, leaving the service
    /// untouched, when the phrase is invalid.
    pub fn restore_wallet(&self, endpoint: &str, phrase: &str) -> bool {
        match self.try_restore_wallet(endpoint, phrase) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("restore rejected: {}", e);
                false
            }
        }
    }

    /// Like [`restore_wallet`](Self::restore_wallet), but reports why.
    pub fn try_restore_wallet(&self, endpoint: &str, phrase: &str) -> Result<(), WalletError> {
        let seed = SeedArtifact::from_phrase(phrase)?;
        let state = WalletState::new(seed, endpoint)?;
        *self.lock()? = Some(state);
        log::info!("restored wallet from recovery phrase (node {})", endpoint);
        Ok(())
    }

    /// Persist the open wallet to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), WalletError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let snapshot = self.with_state(|s| Ok(s.clone()))?;
        tokio::task::spawn_blocking(move || storage::save(&snapshot, &path))
            .await
            .map_err(|e| WalletError::PersistenceIo(std::io::Error::other(e)))?
    }

    /// Replace the open wallet with the one stored at `path`.
    ///
    /// On any failure the currently open wallet is kept.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<(), WalletError> {
        let path = path.as_ref().to_path_buf();
        let state = tokio::task::spawn_blocking(move || storage::load(&path))
            .await
            .map_err(|e| WalletError::PersistenceIo(std::io::Error::other(e)))??;
        *self.lock()? = Some(state);
        Ok(())
    }

    // ── Addresses ───────────────────────────────────────────────────────────

    /// Derive the next address of `kind`.
    pub fn generate_address(&self, kind: AddressKind) -> Result<String, WalletError> {
        let address = self.with_state_mut(|s| s.derive_next(kind))?;
        log::info!("new {} address {}", kind, address);
        Ok(address)
    }

    /// Addresses of `kind` in derivation order.
    pub fn list_addresses(&self, kind: AddressKind) -> Result<Vec<String>, WalletError> {
        self.with_state(|s| Ok(s.registry.list(kind)))
    }

    /// Classify a well-formed address; `None` if it does not parse.
    pub fn validate_address(&self, address: &str) -> Option<AddressKind> {
        parse_address(address).ok().map(|p| p.kind)
    }

    // ── Node ────────────────────────────────────────────────────────────────

    pub fn endpoint(&self) -> Result<String, WalletError> {
        self.with_state(|s| Ok(s.endpoint.clone()))
    }

    /// Point the wallet at another node. Persisted on the next save.
    pub fn set_endpoint(&self, endpoint: &str) -> Result<(), WalletError> {
        self.with_state_mut(|s| {
            s.endpoint = endpoint.to_string();
            Ok(())
        })
    }

    pub async fn get_balance(&self, address: &str) -> Result<Amount, WalletError> {
        let node = self.node()?;
        Ok(node.get_balance(address).await?)
    }

    /// Balances of every address of `kind`, queried concurrently.
    pub async fn balances(&self, kind: AddressKind) -> Result<Vec<(String, Amount)>, WalletError> {
        let addresses = self.list_addresses(kind)?;
        let node = self.node()?;
        let results = join_all(addresses.iter().map(|a| node.get_balance(a))).await;
        addresses
            .into_iter()
            .zip(results)
            .map(|(a, r)| r.map(|b| (a, b)).map_err(WalletError::from))
            .collect()
    }

    /// Sum over all addresses of both families.
    pub async fn total_balance(&self) -> Result<Amount, WalletError> {
        let (t, z) = futures::try_join!(
            self.balances(AddressKind::Transparent),
            self.balances(AddressKind::Shielded)
        )?;
        t.iter()
            .chain(z.iter())
            .try_fold(Amount::ZERO, |acc, (_, b)| acc.checked_add(*b))
            .ok_or_else(|| WalletError::InvalidAmount("balance total overflows".into()))
    }

    /// Current chain height reported by the node.
    pub async fn node_status(&self) -> Result<u64, WalletError> {
        let node = self.node()?;
        Ok(node.block_count().await?)
    }

    // ── Transfers ───────────────────────────────────────────────────────────

    /// Send `amount` OBS from an owned address. Returns the transaction id.
    pub async fn send(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        memo: &str,
    ) -> Result<String, WalletError> {
        let amount = Amount::from_obs_f64(amount)?;
        self.send_amount(from, to, amount, memo).await
    }

    /// Send an exact atomic amount. Returns the transaction id.
    ///
    /// The ledger gains exactly one record on success and none on failure.
    pub async fn send_amount(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
        memo: &str,
    ) -> Result<String, WalletError> {
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount("amount must be greater than zero".into()));
        }

        let signing_key = self.with_state(|s| s.registry.lookup_signing_material(from))?;
        let node = self.node()?;

        // Best effort; the node has the final say at broadcast.
        let balance = node.get_balance(from).await?;
        if amount > balance {
            return Err(WalletError::InsufficientBalance { need: amount, have: balance });
        }

        let unsigned = TransactionBuilder::new()
            .set_source(from)
            .set_destination(to)
            .set_amount(amount)
            .set_memo(memo)
            .set_timestamp(unix_now())
            .build()?;
        let signed = sign_transfer(&unsigned, &signing_key, self.prover.as_ref())?;
        let raw = signed.to_hex()?;

        let txid = node.broadcast(&raw).await?;
        log::info!("broadcast {} transfer of {} OBS: {}", unsigned.kind, amount, txid);

        let record = TransactionRecord {
            timestamp: unsigned.timestamp,
            kind: unsigned.kind,
            from: unsigned.from_address(),
            to: unsigned.to_address(),
            amount,
            txid: txid.clone(),
            memo: (!memo.is_empty()).then(|| memo.to_string()),
        };
        let mut guard = self.lock()?;
        match guard.as_mut() {
            Some(state) if state.registry.contains(from) => state.ledger.append(record),
            _ => log::warn!("wallet changed during send; {} not recorded", txid),
        }
        Ok(txid)
    }

    /// Submitted transfers, oldest first.
    pub fn history(&self) -> Result<Vec<TransactionRecord>, WalletError> {
        self.with_state(|s| Ok(s.ledger.all().to_vec()))
    }

    /// The recovery phrase. Requires `confirmed` to be set by the caller
    /// after an explicit user acknowledgement.
    pub fn reveal_recovery_phrase(&self, confirmed: bool) -> Result<String, WalletError> {
        if !confirmed {
            return Err(WalletError::RevealNotConfirmed);
        }
        self.with_state(|s| Ok(s.seed.phrase().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> WalletService {
        WalletService::with_node_factory(Arc::new(
            |_: &str| -> Result<Arc<dyn NodeApi>, WalletError> {
                Err(WalletError::RpcUnavailable("offline".into()))
            },
        ))
    }

    #[test]
    fn test_operations_require_open_wallet() {
        let svc = offline();
        assert!(!svc.is_open());
        assert!(matches!(
            svc.generate_address(AddressKind::Transparent),
            Err(WalletError::NoWallet)
        ));
        assert!(matches!(svc.history(), Err(WalletError::NoWallet)));
        assert!(matches!(svc.reveal_recovery_phrase(true), Err(WalletError::NoWallet)));
    }

    #[test]
    fn test_reveal_requires_confirmation() {
        let svc = offline();
        let phrase = svc.create_wallet("localhost:8545").unwrap();
        assert!(matches!(
            svc.reveal_recovery_phrase(false),
            Err(WalletError::RevealNotConfirmed)
        ));
        assert_eq!(svc.reveal_recovery_phrase(true).unwrap(), phrase);
    }

    #[test]
    fn test_validate_address() {
        let svc = offline();
        svc.create_wallet("localhost:8545").unwrap();
        let t = svc.list_addresses(AddressKind::Transparent).unwrap().remove(0);
        let z = svc.list_addresses(AddressKind::Shielded).unwrap().remove(0);
        assert_eq!(svc.validate_address(&t), Some(AddressKind::Transparent));
        assert_eq!(svc.validate_address(&z), Some(AddressKind::Shielded));
        assert_eq!(svc.validate_address("external_addr"), None);
    }

    #[test]
    fn test_set_endpoint() {
        let svc = offline();
        svc.create_wallet("localhost:8545").unwrap();
        svc.set_endpoint("http://10.0.0.2:8545").unwrap();
        assert_eq!(svc.endpoint().unwrap(), "http://10.0.0.2:8545");
    }
}
