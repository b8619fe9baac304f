//! Newtype wire types shared across every registry component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte content digest. Hex-encoded with a `0x` prefix on the wire (§6).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a hex string, with or without the `0x` prefix, normalizing internally.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// Lowercase hex, `0x`-prefixed — the canonical wire form (§6).
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// Opaque stable handle of the form `<method>:<method-specific-id>` (§3, §4.4).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Validate and construct. Rejects anything without a `method:id` shape.
    pub fn parse(raw: impl Into<String>) -> Result<Self, crate::error::PohwError> {
        let raw = raw.into();
        match raw.split_once(':') {
            Some((method, id)) if !method.is_empty() && !id.is_empty() => Ok(Self(raw)),
            _ => Err(crate::error::PohwError::Validation(format!(
                "identifier '{raw}' does not match <method>:<method-id>"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn method(&self) -> &str {
        self.0.split_once(':').map(|(m, _)| m).unwrap_or("")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

/// Algorithm tag for `KeyMaterial` (§3). ed25519 is the canonical case (§4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    Ed25519,
}

/// Public key bytes plus algorithm tag (§3).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub algorithm: KeyAlgorithm,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?}, {} bytes)", self.algorithm, self.bytes.len())
    }
}

/// A detached signature. Opaque bytes; shape is algorithm-dependent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// Unix seconds. Kept as a plain alias rather than a newtype — every component
/// treats timestamps as opaque comparable integers (§5 ordering, §4.6 windows).
pub type Timestamp = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_hex_roundtrip() {
        let h = ContentHash::from_bytes([0x11; 32]);
        assert_eq!(h.to_hex(), format!("0x{}", "11".repeat(32)));
        let parsed = ContentHash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn content_hash_accepts_unprefixed() {
        let hex_str = "22".repeat(32);
        let parsed = ContentHash::from_hex(&hex_str).unwrap();
        assert_eq!(parsed, ContentHash::from_bytes([0x22; 32]));
    }

    #[test]
    fn identifier_requires_method_shape() {
        assert!(Identifier::parse("did:pohw:alice").is_ok());
        assert!(Identifier::parse("no-colon-here").is_err());
        assert!(Identifier::parse(":missing-method").is_err());
    }

    #[test]
    fn identifier_method_extraction() {
        let id = Identifier::parse("did:pohw:alice").unwrap();
        assert_eq!(id.method(), "did");
    }
}
