//! Authorization-entry signing and inspection.
//!
//! An address credential signs `sha256(preimage)` where the preimage binds
//! the network id, the credential's replay nonce and expiration ledger, and
//! the authorized invocation tree. The resulting signature is appended to the
//! credential as a `{public_key, signature}` wire map; the host verifies the
//! same construction on-chain, so any layout drift makes the entry unusable.

use std::fmt;

use sha2::{Digest, Sha256};

use lumen_xdr::codec::WriteXdr;
use lumen_xdr::tx::{AuthorizationEntry, Credentials, HashIdPreimage};
use lumen_xdr::{Address, WireValue};

use crate::keys::Keypair;

/// How many ledgers past "latest" a freshly stamped signature stays valid
/// when the caller does not supply an expiration.
pub const DEFAULT_EXPIRATION_LOOKAHEAD: u32 = 100;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from authorization-entry signing.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Only address-scoped credentials are individually signable; the source
    /// account authorizes through the transaction envelope instead.
    NotAddressCredentials,
    /// The signing keypair holds no private key.
    MissingPrivateKey,
    /// The freshly produced signature failed verification against the
    /// signer's public key.
    VerificationFailed,
    /// The credential's signature field held something other than void or a
    /// signature vector.
    MalformedSignatureList,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotAddressCredentials => {
                write!(f, "entry has source-account credentials; nothing to sign")
            }
            AuthError::MissingPrivateKey => {
                write!(f, "signing keypair holds no private key")
            }
            AuthError::VerificationFailed => {
                write!(f, "produced signature failed verification")
            }
            AuthError::MalformedSignatureList => {
                write!(f, "credential signature field is neither void nor a vector")
            }
        }
    }
}

impl std::error::Error for AuthError {}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Network id: sha256 of the network passphrase, the domain-separation input
/// to every hash below.
pub fn network_id(network_passphrase: &str) -> [u8; 32] {
    Sha256::digest(network_passphrase.as_bytes()).into()
}

/// The 32-byte payload an address credential signs for `entry`, with the
/// given expiration ledger stamped in.
pub fn signature_payload(
    entry: &AuthorizationEntry,
    network_passphrase: &str,
    expiration_ledger: u32,
) -> Result<[u8; 32], AuthError> {
    let creds = match &entry.credentials {
        Credentials::Address(creds) => creds,
        Credentials::SourceAccount => return Err(AuthError::NotAddressCredentials),
    };
    let preimage = HashIdPreimage::SorobanAuthorization {
        network_id: network_id(network_passphrase),
        nonce: creds.nonce,
        signature_expiration_ledger: expiration_ledger,
        invocation: entry.root_invocation.clone(),
    };
    Ok(Sha256::digest(preimage.to_xdr()).into())
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Sign an authorization entry in place: stamp the expiration ledger, sign
/// the payload, verify, and append the signature map to the credential's
/// signature list.
pub fn sign_authorization_entry(
    entry: &mut AuthorizationEntry,
    keypair: &Keypair,
    network_passphrase: &str,
    expiration_ledger: u32,
) -> Result<(), AuthError> {
    if !keypair.can_sign() {
        return Err(AuthError::MissingPrivateKey);
    }
    if !matches!(entry.credentials, Credentials::Address(_)) {
        return Err(AuthError::NotAddressCredentials);
    }

    // Stamp the expiration before hashing so payload and entry agree.
    if let Credentials::Address(creds) = &mut entry.credentials {
        creds.signature_expiration_ledger = expiration_ledger;
    }
    let payload = signature_payload(entry, network_passphrase, expiration_ledger)?;

    let signature = keypair
        .sign(&payload)
        .map_err(|_| AuthError::MissingPrivateKey)?;
    if !keypair.verify(&payload, &signature) {
        return Err(AuthError::VerificationFailed);
    }

    let sig_map = WireValue::Map(vec![
        (
            WireValue::symbol("public_key"),
            WireValue::Bytes(keypair.public_key().to_vec()),
        ),
        (
            WireValue::symbol("signature"),
            WireValue::Bytes(signature.to_vec()),
        ),
    ]);

    if let Credentials::Address(creds) = &mut entry.credentials {
        match &mut creds.signature {
            WireValue::Void => creds.signature = WireValue::Vec(vec![sig_map]),
            WireValue::Vec(signatures) => signatures.push(sig_map),
            _ => return Err(AuthError::MalformedSignatureList),
        }
    }
    Ok(())
}

/// Whether an entry's address credential has no signatures yet.
pub fn entry_is_unsigned(entry: &AuthorizationEntry) -> bool {
    match &entry.credentials {
        Credentials::Address(creds) => match &creds.signature {
            WireValue::Void => true,
            WireValue::Vec(signatures) => signatures.is_empty(),
            _ => false,
        },
        Credentials::SourceAccount => false,
    }
}

/// Distinct addresses that still need to sign (or all address signers when
/// `include_already_signed`). Source-account credentials are excluded: that
/// authorization is satisfied by the envelope signature.
pub fn needs_non_invoker_signing_by(
    entries: &[AuthorizationEntry],
    include_already_signed: bool,
) -> Vec<Address> {
    let mut out: Vec<Address> = Vec::new();
    for entry in entries {
        let creds = match &entry.credentials {
            Credentials::Address(creds) => creds,
            Credentials::SourceAccount => continue,
        };
        if !include_already_signed && !entry_is_unsigned(entry) {
            continue;
        }
        if !out.contains(&creds.address) {
            out.push(creds.address);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Signer capability
// ---------------------------------------------------------------------------

/// Capability that can authorize entries for one address. A local keypair is
/// one implementation; delegated/remote signers implement the same trait
/// without ever exposing a private key to this crate.
pub trait AuthorizationSigner {
    /// The address whose credentials this signer can satisfy.
    fn address(&self) -> Address;

    /// Return a signed copy of `entry` with `expiration_ledger` stamped in.
    fn authorize(
        &self,
        entry: AuthorizationEntry,
        network_passphrase: &str,
        expiration_ledger: u32,
    ) -> Result<AuthorizationEntry, AuthError>;
}

impl AuthorizationSigner for Keypair {
    fn address(&self) -> Address {
        Keypair::address(self)
    }

    fn authorize(
        &self,
        mut entry: AuthorizationEntry,
        network_passphrase: &str,
        expiration_ledger: u32,
    ) -> Result<AuthorizationEntry, AuthError> {
        sign_authorization_entry(&mut entry, self, network_passphrase, expiration_ledger)?;
        Ok(entry)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
