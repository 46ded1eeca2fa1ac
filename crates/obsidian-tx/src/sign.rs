//! Transfer signing and verification.
//!
//! Transparent sources sign with ECDSA over SHA256d of the payload.
//! Shielded sources sign with BIP340 Schnorr using the spending key, and
//! attach a nullifier through the sealed note. The x-only spending key must
//! hash to the spend commitment carried in the `zobs` address.

use crate::builder::UnsignedTransfer;
use crate::shielded::{NoteRequest, ShieldedProver};
use crate::types::{Authorization, SignedTransaction, TransferPayload, PAYLOAD_VERSION};
use crate::TxError;
use bitcoin::secp256k1::{
    ecdsa, schnorr, Keypair, Message, PublicKey, Secp256k1, SecretKey, Signing, XOnlyPublicKey,
};
use obsidian_types::address::{parse_address, spend_commitment, transparent_address};
use obsidian_types::{AddressKind, ParsedAddress};
use std::fmt;

/// Secret material that authorizes spending from one address.
#[derive(Clone)]
pub enum SigningKey {
    /// Private key of a transparent address.
    Transparent(SecretKey),
    /// Spending key of a shielded address.
    Shielded(SecretKey),
}

impl SigningKey {
    pub fn kind(&self) -> AddressKind {
        match self {
            SigningKey::Transparent(_) => AddressKind::Transparent,
            SigningKey::Shielded(_) => AddressKind::Shielded,
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey::{}(<redacted>)", self.kind())
    }
}

/// Seal (when private) and sign a validated transfer.
pub fn sign_transfer(
    unsigned: &UnsignedTransfer,
    key: &SigningKey,
    prover: &dyn ShieldedProver,
) -> Result<SignedTransaction, TxError> {
    if key.kind() != unsigned.from.kind {
        return Err(TxError::KeyMismatch(format!(
            "{} key cannot spend from a {} address",
            key.kind(),
            unsigned.from.kind
        )));
    }

    let secp = Secp256k1::new();
    check_ownership(&secp, key, &unsigned.from)?;

    let (memo, note) = if unsigned.kind.is_private() {
        // Sealed to the shielded recipient, or back to the shielded sender
        // when unshielding.
        let vk_bytes = unsigned
            .to
            .viewing_public_key()
            .or_else(|| unsigned.from.viewing_public_key())
            .ok_or(TxError::MissingField("viewing key"))?;
        let viewing_public_key =
            PublicKey::from_slice(&vk_bytes).map_err(|e| TxError::Parse(e.to_string()))?;
        let spending_key = match key {
            SigningKey::Shielded(sk) => Some(sk),
            SigningKey::Transparent(_) => None,
        };
        let note = prover.seal(&NoteRequest {
            value: unsigned.amount.atomic(),
            memo: &unsigned.memo,
            viewing_public_key: &viewing_public_key,
            spending_key,
        })?;
        (None, Some(note))
    } else {
        let memo = (!unsigned.memo.is_empty()).then(|| unsigned.memo.clone());
        (memo, None)
    };

    let payload = TransferPayload {
        version: PAYLOAD_VERSION,
        kind: unsigned.kind,
        from: unsigned.from_address(),
        to: unsigned.to_address(),
        amount: unsigned.amount.atomic(),
        timestamp: unsigned.timestamp,
        memo,
        note,
    };
    let msg = Message::from_digest(payload.signing_hash()?);

    let authorization = match key {
        SigningKey::Transparent(sk) => {
            let pk = PublicKey::from_secret_key(&secp, sk).serialize();
            let sig = secp.sign_ecdsa(&msg, sk);
            Authorization::Ecdsa {
                public_key: hex::encode(pk),
                signature: hex::encode(sig.serialize_compact()),
            }
        }
        SigningKey::Shielded(sk) => {
            let keypair = Keypair::from_secret_key(&secp, sk);
            let (xonly, _parity) = keypair.x_only_public_key();
            let sig = secp.sign_schnorr_no_aux_rand(&msg, &keypair);
            Authorization::Schnorr {
                public_key: hex::encode(xonly.serialize()),
                signature: sig.to_string(),
            }
        }
    };

    Ok(SignedTransaction {
        payload,
        authorization,
    })
}

/// The key must be the one the source address was derived from.
fn check_ownership<C: Signing>(
    secp: &Secp256k1<C>,
    key: &SigningKey,
    from: &ParsedAddress,
) -> Result<(), TxError> {
    match key {
        SigningKey::Transparent(sk) => {
            let pk = PublicKey::from_secret_key(secp, sk).serialize();
            if transparent_address(&pk) != from.to_address_string() {
                return Err(TxError::KeyMismatch(
                    "private key does not hash to the source address".into(),
                ));
            }
        }
        SigningKey::Shielded(sk) => {
            let (xonly, _parity) = Keypair::from_secret_key(secp, sk).x_only_public_key();
            if from.spend_commitment() != Some(spend_commitment(&xonly.serialize())) {
                return Err(TxError::KeyMismatch(
                    "spending key is not committed to by the source address".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Check a signed transfer's authorization against its payload.
pub fn verify_transfer(tx: &SignedTransaction) -> Result<(), TxError> {
    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest(tx.payload.signing_hash()?);
    let source = parse_address(&tx.payload.from)?;
    let decode = |s: &str| hex::decode(s).map_err(|e| TxError::Parse(e.to_string()));

    match &tx.authorization {
        Authorization::Ecdsa { public_key, signature } => {
            if source.kind != AddressKind::Transparent {
                return Err(TxError::Verification(
                    "ECDSA authorization on a shielded source".into(),
                ));
            }
            let pk_bytes = decode(public_key)?;
            let pk = PublicKey::from_slice(&pk_bytes)
                .map_err(|e| TxError::Verification(e.to_string()))?;
            if transparent_address(&pk.serialize()) != tx.payload.from {
                return Err(TxError::Verification(
                    "public key does not match source address".into(),
                ));
            }
            let sig = ecdsa::Signature::from_compact(&decode(signature)?)
                .map_err(|e| TxError::Verification(e.to_string()))?;
            secp.verify_ecdsa(&msg, &sig, &pk)
                .map_err(|e| TxError::Verification(e.to_string()))
        }
        Authorization::Schnorr { public_key, signature } => {
            if source.kind != AddressKind::Shielded {
                return Err(TxError::Verification(
                    "Schnorr authorization on a transparent source".into(),
                ));
            }
            if tx.payload.note.as_ref().and_then(|n| n.nullifier.as_ref()).is_none() {
                return Err(TxError::Verification("shielded spend without nullifier".into()));
            }
            let xonly = XOnlyPublicKey::from_slice(&decode(public_key)?)
                .map_err(|e| TxError::Verification(e.to_string()))?;
            if source.spend_commitment() != Some(spend_commitment(&xonly.serialize())) {
                return Err(TxError::Verification(
                    "spending key does not match source address".into(),
                ));
            }
            let sig = schnorr::Signature::from_slice(&decode(signature)?)
                .map_err(|e| TxError::Verification(e.to_string()))?;
            secp.verify_schnorr(&sig, &msg, &xonly)
                .map_err(|e| TxError::Verification(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::shielded::NoteEncryption;
    use crate::types::TransferKind;
    use obsidian_types::address::shielded_address;
    use obsidian_types::Amount;

    struct Fixture {
        t_key: SecretKey,
        t_addr: String,
        z_spend: SecretKey,
        z_view: SecretKey,
        z_addr: String,
    }

    fn xonly(sk: &SecretKey) -> [u8; 32] {
        let secp = Secp256k1::new();
        Keypair::from_secret_key(&secp, sk).x_only_public_key().0.serialize()
    }

    fn fixture() -> Fixture {
        let secp = Secp256k1::new();
        let t_key = SecretKey::from_slice(&[1u8; 32]).unwrap();
        let z_spend = SecretKey::from_slice(&[2u8; 32]).unwrap();
        let z_view = SecretKey::from_slice(&[3u8; 32]).unwrap();
        let view_pk = PublicKey::from_secret_key(&secp, &z_view).serialize();
        Fixture {
            t_addr: transparent_address(&PublicKey::from_secret_key(&secp, &t_key).serialize()),
            z_addr: shielded_address(&view_pk, &xonly(&z_spend)),
            t_key,
            z_spend,
            z_view,
        }
    }

    fn unsigned(from: &str, to: &str, memo: &str) -> UnsignedTransfer {
        TransactionBuilder::new()
            .set_source(from)
            .set_destination(to)
            .set_amount(Amount::from_atomic(5_000))
            .set_memo(memo)
            .set_timestamp(1_700_000_000)
            .build()
            .unwrap()
    }

    #[test]
    fn test_transparent_transfer_signs_and_verifies() {
        let f = fixture();
        let u = unsigned(&f.t_addr, &f.t_addr, "rent");
        let tx = sign_transfer(&u, &SigningKey::Transparent(f.t_key), &NoteEncryption).unwrap();

        assert_eq!(tx.payload.kind, TransferKind::Transparent);
        assert_eq!(tx.payload.memo.as_deref(), Some("rent"));
        assert!(tx.payload.note.is_none());
        verify_transfer(&tx).unwrap();
    }

    #[test]
    fn test_shield_hides_memo() {
        let f = fixture();
        let u = unsigned(&f.t_addr, &f.z_addr, "private note");
        let tx = sign_transfer(&u, &SigningKey::Transparent(f.t_key), &NoteEncryption).unwrap();

        assert_eq!(tx.payload.kind, TransferKind::Shield);
        assert!(tx.payload.memo.is_none());
        let hex = tx.to_hex().unwrap();
        assert!(!String::from_utf8(hex::decode(hex).unwrap()).unwrap().contains("private note"));

        let note = tx.payload.note.as_ref().unwrap();
        let opened = NoteEncryption.open(note, &f.z_view).unwrap();
        assert_eq!(opened.memo, "private note");
        assert_eq!(opened.value, 5_000);
        verify_transfer(&tx).unwrap();
    }

    #[test]
    fn test_shielded_memo_opens_unchanged() {
        let f = fixture();
        let full = "z".repeat(512);
        for memo in ["ref\0code", "grüße 🎁", full.as_str()] {
            let u = unsigned(&f.z_addr, &f.z_addr, memo);
            let tx = sign_transfer(&u, &SigningKey::Shielded(f.z_spend), &NoteEncryption).unwrap();
            let note = tx.payload.note.as_ref().unwrap();
            assert_eq!(NoteEncryption.open(note, &f.z_view).unwrap().memo, memo);
        }
    }

    #[test]
    fn test_unshield_seals_to_sender_and_signs_schnorr() {
        let f = fixture();
        let u = unsigned(&f.z_addr, &f.t_addr, "change");
        let tx = sign_transfer(&u, &SigningKey::Shielded(f.z_spend), &NoteEncryption).unwrap();

        assert_eq!(tx.payload.kind, TransferKind::Unshield);
        assert!(matches!(tx.authorization, Authorization::Schnorr { .. }));
        let note = tx.payload.note.as_ref().unwrap();
        assert!(note.nullifier.is_some());
        assert_eq!(NoteEncryption.open(note, &f.z_view).unwrap().memo, "change");
        verify_transfer(&tx).unwrap();
    }

    #[test]
    fn test_wrong_key_family_rejected() {
        let f = fixture();
        let u = unsigned(&f.t_addr, &f.t_addr, "");
        let err = sign_transfer(&u, &SigningKey::Shielded(f.z_spend), &NoteEncryption).unwrap_err();
        assert!(matches!(err, TxError::KeyMismatch(_)));
    }

    #[test]
    fn test_foreign_transparent_key_rejected() {
        let f = fixture();
        let u = unsigned(&f.t_addr, &f.t_addr, "");
        let other = SecretKey::from_slice(&[9u8; 32]).unwrap();
        let err = sign_transfer(&u, &SigningKey::Transparent(other), &NoteEncryption).unwrap_err();
        assert!(matches!(err, TxError::KeyMismatch(_)));
    }

    #[test]
    fn test_foreign_spending_key_rejected() {
        let f = fixture();
        let u = unsigned(&f.z_addr, &f.t_addr, "");
        let stranger = SecretKey::from_slice(&[0x42; 32]).unwrap();
        for key in [stranger, f.z_view] {
            let err = sign_transfer(&u, &SigningKey::Shielded(key), &NoteEncryption).unwrap_err();
            assert!(matches!(err, TxError::KeyMismatch(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_schnorr_by_stranger_fails_verification() {
        let f = fixture();
        let u = unsigned(&f.z_addr, &f.z_addr, "");
        let mut tx = sign_transfer(&u, &SigningKey::Shielded(f.z_spend), &NoteEncryption).unwrap();
        verify_transfer(&tx).unwrap();

        // Valid BIP340 signature over the same payload, by a key the address
        // does not commit to.
        let secp = Secp256k1::new();
        let stranger_key = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let stranger = Keypair::from_secret_key(&secp, &stranger_key);
        let msg = Message::from_digest(tx.payload.signing_hash().unwrap());
        let sig = secp.sign_schnorr_no_aux_rand(&msg, &stranger);
        tx.authorization = Authorization::Schnorr {
            public_key: hex::encode(stranger.x_only_public_key().0.serialize()),
            signature: sig.to_string(),
        };
        assert!(matches!(verify_transfer(&tx), Err(TxError::Verification(_))));
    }

    #[test]
    fn test_tampered_amount_fails_verification() {
        let f = fixture();
        let u = unsigned(&f.t_addr, &f.t_addr, "");
        let mut tx = sign_transfer(&u, &SigningKey::Transparent(f.t_key), &NoteEncryption).unwrap();
        tx.payload.amount += 1;
        assert!(matches!(verify_transfer(&tx), Err(TxError::Verification(_))));
    }

    #[test]
    fn test_signing_key_debug_is_redacted() {
        let f = fixture();
        let dbg = format!("{:?}", SigningKey::Transparent(f.t_key));
        assert_eq!(dbg, "SigningKey::transparent(<redacted>)");
    }
}
