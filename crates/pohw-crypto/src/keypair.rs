use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

use pohw_core::{KeyAlgorithm, PohwError, PublicKey, Signature};

/// An ed25519 signing keypair. The secret scalar is held in a `Zeroizing`
/// buffer and wiped on drop — mirrors the host repo's `KeyPair` for its
/// post-quantum scheme, adapted to ed25519 (§4.1 canonical case).
pub struct KeyPair {
    pub public_key: PublicKey,
    secret_key: Zeroizing<[u8; 32]>,
}

impl KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = PublicKey {
            algorithm: KeyAlgorithm::Ed25519,
            bytes: signing_key.verifying_key().to_bytes().to_vec(),
        };
        Self {
            public_key,
            secret_key: Zeroizing::new(signing_key.to_bytes()),
        }
    }

    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&secret);
        let public_key = PublicKey {
            algorithm: KeyAlgorithm::Ed25519,
            bytes: signing_key.verifying_key().to_bytes().to_vec(),
        };
        Self {
            public_key,
            secret_key: Zeroizing::new(secret),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let signing_key = SigningKey::from_bytes(&self.secret_key);
        Signature(signing_key.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Verify `signature` over `message` under `public_key` (§4.1 `verify`).
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> Result<(), PohwError> {
    let KeyAlgorithm::Ed25519 = public_key.algorithm;

    let key_bytes: [u8; 32] = public_key
        .bytes
        .as_slice()
        .try_into()
        .map_err(|_| PohwError::InvalidSignature)?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| PohwError::InvalidSignature)?;

    let sig_bytes: [u8; 64] = signature
        .0
        .as_slice()
        .try_into()
        .map_err(|_| PohwError::InvalidSignature)?;
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify_strict(message, &sig)
        .map_err(|_| PohwError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let kp = KeyPair::generate();
        let msg = b"hello registry";
        let sig = kp.sign(msg);
        assert!(verify(&kp.public_key, msg, &sig).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"original");
        assert!(verify(&kp.public_key, b"tampered", &sig).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.sign(b"hello");
        assert!(verify(&kp2.public_key, b"hello", &sig).is_err());
    }
}
