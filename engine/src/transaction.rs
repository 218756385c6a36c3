//! Transaction envelope: parsing, signing bytes and signature verification.
//!
//! ## Wire Format (JSON)
//!
//! ```text
//! {
//!   "type":        "transfer",
//!   "sender":      "<20-byte address, hex>",
//!   "last_height": 42,
//!   "payload":     { ... operation specific ... },
//!   "signature":   { "pubkey": "<32 bytes hex>", "sig_bytes": "<64 bytes hex>" }
//! }
//! ```
//!
//! The signature covers the envelope with the `signature` field removed,
//! serialized canonically: object keys in lexicographic order, no
//! whitespace. `sender` must equal the address derived from `pubkey`.

use serde::{Deserialize, Serialize};
use strata_primitives::crypto::{address_from_pubkey, tx_hash, verify_ed25519};
use strata_primitives::types::hex_bytes;
use strata_primitives::{Address, BlockHeight, Hash, PubKey, ResultCode};

/// Ed25519 signature attached to an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature {
    pub pubkey: PubKey,
    #[serde(with = "hex_bytes")]
    pub sig_bytes: Vec<u8>,
}

/// A decoded transaction envelope. The payload stays untyped until the
/// active protocol maps it to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub sender: Address,
    /// Height the sender bound the transaction to.
    pub last_height: BlockHeight,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub signature: TxSignature,
}

impl Envelope {
    /// Decode raw wire bytes. Any malformed input is `BadParam`.
    pub fn parse(raw: &[u8]) -> Result<Self, ResultCode> {
        serde_json::from_slice(raw).map_err(|e| {
            tracing::debug!(error = %e, "malformed transaction envelope");
            ResultCode::BadParam
        })
    }

    /// Canonical bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, ResultCode> {
        unsigned_bytes(&self.tx_type, &self.sender, self.last_height, &self.payload)
    }

    /// Check the sender binding and the signature.
    pub fn verify(&self) -> Result<(), ResultCode> {
        if address_from_pubkey(&self.signature.pubkey) != self.sender {
            return Err(ResultCode::BadSignature);
        }
        let sig: [u8; 64] = self
            .signature
            .sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| ResultCode::BadSignature)?;
        let message = self.signing_bytes()?;
        if verify_ed25519(&message, &sig, self.signature.pubkey.as_bytes()) {
            Ok(())
        } else {
            Err(ResultCode::BadSignature)
        }
    }
}

/// Canonical signing bytes for an envelope's unsigned fields.
///
/// `serde_json::Value` keeps object keys sorted, so serializing through it
/// yields the canonical form regardless of how the payload was built.
pub fn unsigned_bytes(
    tx_type: &str,
    sender: &Address,
    last_height: BlockHeight,
    payload: &serde_json::Value,
) -> Result<Vec<u8>, ResultCode> {
    let unsigned = serde_json::json!({
        "type": tx_type,
        "sender": sender,
        "last_height": last_height,
        "payload": payload,
    });
    serde_json::to_vec(&unsigned).map_err(|_| ResultCode::BadParam)
}

/// Hash identifying a transaction in the replay index.
pub fn hash_of(raw: &[u8]) -> Hash {
    tx_hash(raw)
}

/// Build and sign a wire transaction. Used by clients and tests.
#[cfg(feature = "std")]
pub fn encode_tx(
    tx_type: &str,
    last_height: BlockHeight,
    payload: serde_json::Value,
    signing_key: &ed25519_dalek::SigningKey,
) -> Vec<u8> {
    let pubkey = PubKey::new(signing_key.verifying_key().to_bytes());
    let sender = address_from_pubkey(&pubkey);
    let message = unsigned_bytes(tx_type, &sender, last_height, &payload).unwrap_or_default();
    let sig = strata_primitives::crypto::sign_ed25519(&message, signing_key);
    let envelope = Envelope {
        tx_type: tx_type.to_string(),
        sender,
        last_height,
        payload,
        signature: TxSignature {
            pubkey,
            sig_bytes: sig.to_vec(),
        },
    };
    serde_json::to_vec(&envelope).unwrap_or_default()
}
