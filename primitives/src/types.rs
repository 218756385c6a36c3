//! Core type aliases, identifiers, and constants for the Strata ledger.
//!
//! These types are shared by the store, the transaction engine, and the
//! application orchestrator.

use core::fmt;
use core::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// 32-byte hash used for state roots and transaction hashes.
pub type Hash = [u8; 32];

/// Block height (monotonically increasing, genesis state is height 0).
pub type BlockHeight = u64;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of an Ed25519 public key in bytes.
pub const PUBKEY_LEN: usize = 32;

/// A zero-valued hash (32 zero bytes).
pub const ZERO_HASH: Hash = [0u8; 32];

/// Error returned when parsing a hex-encoded identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },
}

/// Fixed-size account address.
///
/// Derived from an Ed25519 public key as the first 20 bytes of its SHA-256
/// digest (see [`crate::crypto::address_from_pubkey`]). Serialized as an
/// upper-case hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice, failing unless it is exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdParseError> {
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| IdParseError::BadLength {
            expected: ADDRESS_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Ed25519 validator/account public key, serialized as upper-case hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PubKey([u8; PUBKEY_LEN]);

impl PubKey {
    pub const fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdParseError> {
        let arr: [u8; PUBKEY_LEN] = bytes.try_into().map_err(|_| IdParseError::BadLength {
            expected: PUBKEY_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl FromStr for PubKey {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", self.to_hex())
    }
}

impl Serialize for PubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Serde adapter for `Vec<u8>` fields carried as upper-case hex strings.
///
/// Use with `#[serde(with = "strata_primitives::types::hex_bytes")]`.
pub mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(de::Error::custom)
    }
}

/// Convert a `Hash` to an upper-case hex string for display and indexing.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode_upper(hash)
}

/// Encode a u64 as big-endian bytes.
///
/// Big-endian is used for every integer embedded in a store key so that
/// prefix iteration visits heights in ascending order.
pub fn u64_to_be_bytes(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

/// Decode a u64 from the first 8 bytes of a big-endian slice.
pub fn u64_from_be_bytes(bytes: &[u8]) -> Option<u64> {
    let buf: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(u64::from_be_bytes(buf))
}

/// Concatenate byte slices into a single Vec.
pub fn concat_bytes(slices: &[&[u8]]) -> Vec<u8> {
    let total: usize = slices.iter().map(|s| s.len()).sum();
    let mut out = Vec::with_capacity(total);
    for s in slices {
        out.extend_from_slice(s);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::new([0xab; ADDRESS_LEN]);
        let hex = addr.to_hex();
        assert_eq!(hex.len(), 40);
        assert_eq!(hex.parse::<Address>().unwrap(), addr);
        // Lower-case input is accepted too
        assert_eq!(hex.to_lowercase().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_bad_length() {
        let err = "ABCD".parse::<Address>().unwrap_err();
        assert_eq!(err, IdParseError::BadLength { expected: 20, got: 2 });
    }

    #[test]
    fn test_address_bad_hex() {
        assert!(matches!("zz".parse::<Address>(), Err(IdParseError::InvalidHex(_))));
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr = Address::new([1u8; ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_pubkey_serde() {
        let pk = PubKey::new([0xcd; PUBKEY_LEN]);
        let json = serde_json::to_string(&pk).unwrap();
        let back: PubKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn test_u64_be_roundtrip_and_ordering() {
        let val = 0xDEAD_BEEF_CAFE_BABE_u64;
        assert_eq!(u64_from_be_bytes(&u64_to_be_bytes(val)), Some(val));
        // Byte-wise ordering matches numeric ordering
        assert!(u64_to_be_bytes(255) < u64_to_be_bytes(256));
    }

    #[test]
    fn test_u64_from_short_slice() {
        assert_eq!(u64_from_be_bytes(&[0, 1, 2]), None);
    }

    #[test]
    fn test_concat_bytes() {
        let result = concat_bytes(&[b"hello", b" ", b"world"]);
        assert_eq!(result, b"hello world");
    }

    #[test]
    fn test_hash_to_hex() {
        let hex = hash_to_hex(&[0xab; 32]);
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c == 'A' || c == 'B'));
    }
}
