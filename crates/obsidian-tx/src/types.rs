//! Transfer types and wire encoding.
//!
//! A signed transfer travels to the node as the hex encoding of its
//! canonical JSON form. The signature covers SHA256d of the canonical JSON
//! of the unsigned payload.

use crate::TxError;
use bitcoin::hashes::{sha256d, Hash};
use obsidian_types::AddressKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current payload format version.
pub const PAYLOAD_VERSION: u8 = 1;

// =============================================================================
// Transfer kind
// =============================================================================

/// Direction of a transfer between the two address families.
///
/// Also used as the type tag of a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// transparent -> transparent
    Transparent,
    /// transparent -> shielded
    Shield,
    /// shielded -> transparent
    Unshield,
    /// shielded -> shielded
    Shielded,
}

impl TransferKind {
    pub fn route(from: AddressKind, to: AddressKind) -> Self {
        match (from, to) {
            (AddressKind::Transparent, AddressKind::Transparent) => TransferKind::Transparent,
            (AddressKind::Transparent, AddressKind::Shielded) => TransferKind::Shield,
            (AddressKind::Shielded, AddressKind::Transparent) => TransferKind::Unshield,
            (AddressKind::Shielded, AddressKind::Shielded) => TransferKind::Shielded,
        }
    }

    /// Whether the memo and value must travel inside a sealed note.
    pub fn is_private(self) -> bool {
        self != TransferKind::Transparent
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferKind::Transparent => "transparent",
            TransferKind::Shield => "shield",
            TransferKind::Unshield => "unshield",
            TransferKind::Shielded => "shielded",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferKind {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transparent" => Ok(TransferKind::Transparent),
            "shield" => Ok(TransferKind::Shield),
            "unshield" => Ok(TransferKind::Unshield),
            "shielded" => Ok(TransferKind::Shielded),
            other => Err(TxError::Parse(format!("unknown transfer kind \"{}\"", other))),
        }
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Encrypted note attached to any transfer touching a shielded address.
///
/// All byte fields are lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedNote {
    /// Compressed ephemeral public key for the ECDH exchange.
    pub ephemeral_public_key: String,
    /// 12-byte nonce followed by the AES-256-GCM ciphertext.
    pub ciphertext: String,
    /// SHA256 of the note plaintext.
    pub commitment: String,
    /// Present when a shielded address spends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullifier: Option<String>,
}

/// The unsigned transfer as covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub version: u8,
    pub kind: TransferKind,
    pub from: String,
    pub to: String,
    /// Atomic units.
    pub amount: u64,
    /// Unix seconds.
    pub timestamp: u64,
    /// Cleartext memo, only ever set on transparent transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<SealedNote>,
}

impl TransferPayload {
    /// Canonical bytes the signature commits to.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, TxError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// SHA256d of the canonical bytes.
    pub fn signing_hash(&self) -> Result<[u8; 32], TxError> {
        Ok(sha256d::Hash::hash(&self.signing_bytes()?).to_byte_array())
    }
}

// =============================================================================
// Signed transaction
// =============================================================================

/// Spending authorization, matching the source address family.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum Authorization {
    /// Compact ECDSA signature and compressed public key (transparent source).
    Ecdsa { public_key: String, signature: String },
    /// BIP340 signature and x-only spending public key (shielded source).
    Schnorr { public_key: String, signature: String },
}

/// A transfer ready for broadcast.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub payload: TransferPayload,
    pub authorization: Authorization,
}

impl SignedTransaction {
    /// Wire encoding passed to `sendrawtransaction`.
    pub fn to_hex(&self) -> Result<String, TxError> {
        Ok(hex::encode(serde_json::to_vec(self)?))
    }

    pub fn from_hex(raw: &str) -> Result<Self, TxError> {
        let bytes = hex::decode(raw.trim()).map_err(|e| TxError::Parse(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// Signatures stay out of logs.
impl fmt::Debug for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.authorization {
            Authorization::Ecdsa { .. } => "ecdsa",
            Authorization::Schnorr { .. } => "schnorr",
        };
        f.debug_struct("SignedTransaction")
            .field("kind", &self.payload.kind)
            .field("from", &self.payload.from)
            .field("to", &self.payload.to)
            .field("amount", &self.payload.amount)
            .field("authorization", &format_args!("{} <redacted>", scheme))
            .finish()
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authorization::Ecdsa { .. } => f.write_str("Ecdsa(<redacted>)"),
            Authorization::Schnorr { .. } => f.write_str("Schnorr(<redacted>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TransferPayload {
        TransferPayload {
            version: PAYLOAD_VERSION,
            kind: TransferKind::Transparent,
            from: "obs1from".into(),
            to: "obs1to".into(),
            amount: 5,
            timestamp: 1_700_000_000,
            memo: None,
            note: None,
        }
    }

    #[test]
    fn test_route_all_directions() {
        use AddressKind::*;
        assert_eq!(TransferKind::route(Transparent, Transparent), TransferKind::Transparent);
        assert_eq!(TransferKind::route(Transparent, Shielded), TransferKind::Shield);
        assert_eq!(TransferKind::route(Shielded, Transparent), TransferKind::Unshield);
        assert_eq!(TransferKind::route(Shielded, Shielded), TransferKind::Shielded);
        assert!(!TransferKind::Transparent.is_private());
        assert!(TransferKind::Unshield.is_private());
    }

    #[test]
    fn test_kind_string_forms_agree() {
        for kind in [
            TransferKind::Transparent,
            TransferKind::Shield,
            TransferKind::Unshield,
            TransferKind::Shielded,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            assert_eq!(kind.as_str().parse::<TransferKind>().unwrap(), kind);
        }
        assert!("sideways".parse::<TransferKind>().is_err());
    }

    #[test]
    fn test_signing_hash_covers_fields() {
        let a = payload();
        let mut b = payload();
        b.amount = 6;
        assert_ne!(a.signing_hash().unwrap(), b.signing_hash().unwrap());
        assert_eq!(a.signing_hash().unwrap(), payload().signing_hash().unwrap());
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let json = serde_json::to_value(payload()).unwrap();
        assert!(json.get("memo").is_none());
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_debug_redacts_signature() {
        let tx = SignedTransaction {
            payload: payload(),
            authorization: Authorization::Ecdsa {
                public_key: "02aa".into(),
                signature: "feedfacefeedface".into(),
            },
        };
        let dbg = format!("{:?}", tx);
        assert!(!dbg.contains("feedface"));
        assert!(dbg.contains("redacted"));

        let hex = tx.to_hex().unwrap();
        assert_eq!(SignedTransaction::from_hex(&hex).unwrap(), tx);
    }
}
