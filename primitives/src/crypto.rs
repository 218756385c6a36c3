//! Cryptographic operations for the Strata ledger.
//!
//! - Ed25519 for transaction and validator signatures
//! - SHA-256 for address derivation and transaction hashes
//! - BLAKE3 for the state root Merkle tree
//!
//! All crypto used during block processing is deterministic.

use sha2::Digest;

use crate::types::{Address, Hash, PubKey, ADDRESS_LEN};

/// Compute BLAKE3 hash of the input data.
pub fn hash_blake3(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Compute SHA-256 hash of the input data.
pub fn hash_sha256(data: &[u8]) -> Hash {
    let result = sha2::Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Derive an account address: the first 20 bytes of SHA-256(pubkey).
///
/// The same derivation is used for consensus validator addresses, so a
/// validator key maps to one address in both the ledger and vote lists.
pub fn address_from_pubkey(pubkey: &PubKey) -> Address {
    let digest = hash_sha256(pubkey.as_bytes());
    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&digest[..ADDRESS_LEN]);
    Address::new(out)
}

/// Hash of raw transaction bytes, used by the replay index.
pub fn tx_hash(raw: &[u8]) -> Hash {
    hash_sha256(raw)
}

/// Verify an Ed25519 signature.
///
/// Returns `true` if the signature is valid for the given message and
/// public key, `false` otherwise (including malformed keys).
pub fn verify_ed25519(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig = Signature::from_bytes(signature);
    verifying_key.verify(message, &sig).is_ok()
}

/// Sign a message with an Ed25519 private key.
///
/// Used by clients and tests; the ledger itself never signs.
#[cfg(feature = "std")]
pub fn sign_ed25519(message: &[u8], secret_key: &ed25519_dalek::SigningKey) -> [u8; 64] {
    use ed25519_dalek::Signer;
    secret_key.sign(message).to_bytes()
}

/// Generate an Ed25519 keypair from OS randomness.
///
/// NEVER used during block processing (determinism violation).
#[cfg(feature = "std")]
pub fn generate_keypair() -> (ed25519_dalek::VerifyingKey, ed25519_dalek::SigningKey) {
    use ed25519_dalek::SigningKey;
    let mut rng = rand::rngs::OsRng;
    let signing_key = SigningKey::generate(&mut rng);
    let verifying_key = signing_key.verifying_key();
    (verifying_key, signing_key)
}
