//! Ed25519 keypair wrapper over strkey-encoded Stellar keys.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use stellar_strkey::Strkey;

use lumen_xdr::Address;

/// Errors from key decoding and signing.
#[derive(Debug, Clone)]
pub enum KeyError {
    /// Not a valid `S...` secret seed
    InvalidSecretKey(String),
    /// Not a valid `G...` public key
    InvalidPublicKey(String),
    /// Signing was requested but only the public half is held
    MissingPrivateKey,
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidSecretKey(msg) => write!(f, "invalid secret key: {}", msg),
            KeyError::InvalidPublicKey(msg) => write!(f, "invalid public key: {}", msg),
            KeyError::MissingPrivateKey => {
                write!(f, "keypair holds no private key; cannot sign")
            }
        }
    }
}

impl std::error::Error for KeyError {}

/// An ed25519 keypair that may or may not include its private half.
///
/// Public-only keypairs can identify an account and verify signatures;
/// signing requires the secret seed.
#[derive(Debug, Clone)]
pub struct Keypair {
    verifying: VerifyingKey,
    signing: Option<SigningKey>,
}

impl Keypair {
    /// Decode a Stellar secret seed (`S...` format) into a full keypair.
    pub fn from_secret_seed(secret: &str) -> Result<Self, KeyError> {
        match Strkey::from_string(secret) {
            Ok(Strkey::PrivateKeyEd25519(sk)) => Ok(Keypair::from_raw_seed(sk.0)),
            Ok(_) => Err(KeyError::InvalidSecretKey(
                "expected S... secret key, got different key type".into(),
            )),
            Err(e) => Err(KeyError::InvalidSecretKey(format!(
                "invalid secret key format: {:?}",
                e
            ))),
        }
    }

    /// Build a full keypair from 32 raw seed bytes.
    pub fn from_raw_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        Keypair {
            verifying: signing.verifying_key(),
            signing: Some(signing),
        }
    }

    /// Decode a public account address (`G...` format) into a verify-only
    /// keypair.
    pub fn from_public_key(account_id: &str) -> Result<Self, KeyError> {
        match Strkey::from_string(account_id) {
            Ok(Strkey::PublicKeyEd25519(pk)) => {
                let verifying = VerifyingKey::from_bytes(&pk.0).map_err(|e| {
                    KeyError::InvalidPublicKey(format!("not a valid ed25519 point: {}", e))
                })?;
                Ok(Keypair {
                    verifying,
                    signing: None,
                })
            }
            Ok(_) => Err(KeyError::InvalidPublicKey(
                "expected G... account address, got different key type".into(),
            )),
            Err(e) => Err(KeyError::InvalidPublicKey(format!(
                "invalid account address format: {:?}",
                e
            ))),
        }
    }

    /// Raw public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.verifying.to_bytes()
    }

    /// The `G...` text form of the public key.
    pub fn account_id(&self) -> String {
        Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(self.public_key()))
            .to_string()
    }

    /// This keypair's identity as a ledger address.
    pub fn address(&self) -> Address {
        Address::Account(self.public_key())
    }

    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }

    /// Sign a message, failing when only the public half is held.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; 64], KeyError> {
        let signing = self.signing.as_ref().ok_or(KeyError::MissingPrivateKey)?;
        Ok(signing.sign(message).to_bytes())
    }

    /// Verify a signature made by this key.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying.verify(message, &sig).is_ok()
    }

    /// Signature hint: the last four bytes of the public key.
    pub fn signature_hint(&self) -> [u8; 4] {
        let pk = self.public_key();
        [pk[28], pk[29], pk[30], pk[31]]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A valid Stellar test secret key (S... format), generated from seed
    /// bytes [1u8; 32].
    fn test_secret_key_str() -> String {
        Strkey::PrivateKeyEd25519(stellar_strkey::ed25519::PrivateKey([1u8; 32])).to_string()
    }

    #[test]
    fn decode_valid_secret_key() {
        let kp = Keypair::from_secret_seed(&test_secret_key_str()).unwrap();
        assert!(kp.can_sign());
        assert!(kp.account_id().starts_with('G'));
    }

    #[test]
    fn decode_invalid_secret_key() {
        let err = Keypair::from_secret_seed("INVALID_KEY").unwrap_err();
        match err {
            KeyError::InvalidSecretKey(msg) => {
                assert!(msg.contains("invalid secret key format"), "msg: {}", msg);
            }
            other => panic!("expected InvalidSecretKey, got {:?}", other),
        }
    }

    #[test]
    fn decode_g_address_as_secret_key_fails() {
        let err = Keypair::from_secret_seed(
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF",
        )
        .unwrap_err();
        match err {
            KeyError::InvalidSecretKey(msg) => {
                assert!(msg.contains("expected S... secret key"), "msg: {}", msg);
            }
            other => panic!("expected InvalidSecretKey, got {:?}", other),
        }
    }

    #[test]
    fn public_keypair_round_trips_account_id() {
        let full = Keypair::from_raw_seed([1u8; 32]);
        let public = Keypair::from_public_key(&full.account_id()).unwrap();
        assert_eq!(public.public_key(), full.public_key());
        assert!(!public.can_sign());
    }

    #[test]
    fn public_keypair_cannot_sign() {
        let full = Keypair::from_raw_seed([1u8; 32]);
        let public = Keypair::from_public_key(&full.account_id()).unwrap();
        match public.sign(b"payload").unwrap_err() {
            KeyError::MissingPrivateKey => {}
            other => panic!("expected MissingPrivateKey, got {:?}", other),
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let sig = kp.sign(b"hello").unwrap();
        assert!(kp.verify(b"hello", &sig));
        assert!(!kp.verify(b"other", &sig));
    }

    #[test]
    fn signature_hint_is_key_tail() {
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let pk = kp.public_key();
        assert_eq!(kp.signature_hint(), [pk[28], pk[29], pk[30], pk[31]]);
    }

    #[test]
    fn address_matches_account_id() {
        let kp = Keypair::from_raw_seed([1u8; 32]);
        assert_eq!(kp.address().to_strkey(), kp.account_id());
    }
}
