//! Wallet file persistence.
//!
//! The wallet is a single JSON document. Saves go through a temporary file in
//! the target directory which is fsynced and then renamed over the target, so
//! a crash mid-write leaves the previous file in place.
//!
//! Loading never trusts stored keys: every entry is re-derived from the
//! recovery phrase at its positional index and must match exactly.

use crate::error::WalletError;
use crate::keys::{derive_shielded, derive_transparent, DerivedKey};
use crate::ledger::{Ledger, TransactionRecord};
use crate::registry::AddressRegistry;
use crate::seed::SeedArtifact;
use crate::state::WalletState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use zeroize::Zeroize;

/// Current wallet file format.
pub const WALLET_FILE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct WalletFile {
    version: u32,
    mnemonic: String,
    transparent_keys: Vec<TransparentEntry>,
    shielded_keys: Vec<ShieldedEntry>,
    transaction_history: Vec<TransactionRecord>,
    rpc_endpoint: String,
}

#[derive(Serialize, Deserialize)]
struct TransparentEntry {
    private_key: String,
    public_key: String,
    address: String,
}

#[derive(Serialize, Deserialize)]
struct ShieldedEntry {
    spending_key: String,
    viewing_key: String,
    address: String,
}

impl Drop for WalletFile {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
        for e in &mut self.transparent_keys {
            e.private_key.zeroize();
        }
        for e in &mut self.shielded_keys {
            e.spending_key.zeroize();
            e.viewing_key.zeroize();
        }
    }
}

/// Serialize the full state to the wallet file format.
pub fn to_json(state: &WalletState) -> Result<Vec<u8>, WalletError> {
    let file = WalletFile {
        version: WALLET_FILE_VERSION,
        mnemonic: state.seed.phrase().to_string(),
        transparent_keys: state
            .registry
            .transparent_keys()
            .iter()
            .map(|k| TransparentEntry {
                private_key: k.private_key_wif(),
                public_key: k.public_key_hex(),
                address: k.address.clone(),
            })
            .collect(),
        shielded_keys: state
            .registry
            .shielded_keys()
            .iter()
            .map(|k| ShieldedEntry {
                spending_key: k.spending_key_hex(),
                viewing_key: k.viewing_key_hex(),
                address: k.address.clone(),
            })
            .collect(),
        transaction_history: state.ledger.all().to_vec(),
        rpc_endpoint: state.endpoint.clone(),
    };
    Ok(serde_json::to_vec_pretty(&file)?)
}

/// Rebuild and verify a state from wallet file bytes.
pub fn from_json(bytes: &[u8]) -> Result<WalletState, WalletError> {
    let file: WalletFile = serde_json::from_slice(bytes)?;
    if file.version != WALLET_FILE_VERSION {
        return Err(WalletError::PersistenceFormat(format!(
            "unsupported wallet file version {}",
            file.version
        )));
    }

    let seed = SeedArtifact::from_phrase(&file.mnemonic)
        .map_err(|e| WalletError::PersistenceFormat(format!("stored recovery phrase: {}", e)))?;

    let mut registry = AddressRegistry::new();
    for (i, entry) in file.transparent_keys.iter().enumerate() {
        let key = derive_transparent(seed.seed(), i as u32)?;
        if key.address != entry.address
            || key.public_key_hex() != entry.public_key
            || key.private_key_wif() != entry.private_key
        {
            return Err(mismatch("transparent", i, &entry.address));
        }
        registry.add(DerivedKey::Transparent(key))?;
    }
    for (i, entry) in file.shielded_keys.iter().enumerate() {
        let key = derive_shielded(seed.seed(), i as u32)?;
        if key.address != entry.address
            || key.spending_key_hex() != entry.spending_key
            || key.viewing_key_hex() != entry.viewing_key
        {
            return Err(mismatch("shielded", i, &entry.address));
        }
        registry.add(DerivedKey::Shielded(key))?;
    }

    Ok(WalletState {
        seed,
        registry,
        ledger: Ledger::from_records(file.transaction_history.clone()),
        endpoint: file.rpc_endpoint.clone(),
    })
}

fn mismatch(family: &str, index: usize, address: &str) -> WalletError {
    WalletError::PersistenceFormat(format!(
        "{} key #{} ({}) does not match the recovery phrase",
        family, index, address
    ))
}

/// Atomically replace `path` with `bytes`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WalletError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    // The rename already happened; only its durability is in doubt.
    if let Err(e) = sync_dir(dir) {
        log::warn!("could not fsync {} after saving wallet: {}", dir.display(), e);
    }
    Ok(())
}

fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

/// Save `state` to `path`.
pub fn save(state: &WalletState, path: &Path) -> Result<(), WalletError> {
    let mut bytes = to_json(state)?;
    let result = write_atomic(path, &bytes);
    bytes.zeroize();
    result?;
    log::info!("wallet saved to {}", path.display());
    Ok(())
}

/// Load and verify the wallet at `path`.
pub fn load(path: &Path) -> Result<WalletState, WalletError> {
    let mut bytes = fs::read(path)?;
    let result = from_json(&bytes);
    bytes.zeroize();
    let state = result?;
    log::info!(
        "wallet loaded from {} ({} transparent, {} shielded, {} records)",
        path.display(),
        state.registry.transparent_keys().len(),
        state.registry.shielded_keys().len(),
        state.ledger.len()
    );
    Ok(state)
}
