//! secp256k1 keys and ECDSA signatures.
//!
//! Addresses are the hex encoding of the uncompressed SEC1 public key
//! (`04 || x || y`), so an address doubles as the verification key.
//! Signatures travel as hex-encoded DER.

use crate::error::CryptoError;
use crate::Hash;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, All, Message, PublicKey, Secp256k1, SecretKey};

static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(secret_hex)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| CryptoError::SecretKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// The ledger address owned by this key.
    pub fn address(&self) -> String {
        hex::encode(self.public_key.serialize_uncompressed())
    }

    /// Signs a 32-byte digest, returning the DER signature as hex.
    pub fn sign_digest(&self, digest: &Hash) -> String {
        let message = Message::from_digest(*digest);
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        hex::encode(&signature.serialize_der()[..])
    }
}

/// Checks a hex DER signature over `digest` against a hex-encoded public key.
pub fn verify_digest(address: &str, digest: &Hash, signature_hex: &str) -> Result<(), CryptoError> {
    let key_bytes = hex::decode(address)?;
    let public_key =
        PublicKey::from_slice(&key_bytes).map_err(|e| CryptoError::PublicKey(e.to_string()))?;

    let sig_bytes = hex::decode(signature_hex)?;
    let mut signature =
        Signature::from_der(&sig_bytes).map_err(|e| CryptoError::Signature(e.to_string()))?;
    // libsecp256k1 only verifies low-S; other signers may emit either form.
    signature.normalize_s();

    let message = Message::from_digest(*digest);
    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| CryptoError::Verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    fn digest_of(msg: &[u8]) -> Hash {
        Sha256::digest(msg).into()
    }

    #[test]
    fn address_is_uncompressed_public_key_hex() {
        let kp = KeyPair::generate();
        let addr = kp.address();
        assert_eq!(addr.len(), 130);
        assert!(addr.starts_with("04"));
    }

    #[test]
    fn secret_hex_restores_same_key() {
        let kp = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&kp.secret_hex()).unwrap();
        assert_eq!(kp, restored);
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn sign_then_verify() {
        let kp = KeyPair::generate();
        let digest = digest_of(b"alice pays bob");
        let sig = kp.sign_digest(&digest);
        assert!(verify_digest(&kp.address(), &digest, &sig).is_ok());
    }

    /// Rewrites a DER signature into its high-S twin `(r, n - s)`.
    fn to_high_s(signature_hex: &str) -> String {
        let sig = Signature::from_der(&hex::decode(signature_hex).unwrap()).unwrap();
        let mut compact = sig.serialize_compact();
        let order = secp256k1::constants::CURVE_ORDER;
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let diff = order[i] as i16 - compact[32 + i] as i16 - borrow;
            borrow = i16::from(diff < 0);
            compact[32 + i] = diff.rem_euclid(256) as u8;
        }
        let high = Signature::from_compact(&compact).unwrap();
        hex::encode(&high.serialize_der()[..])
    }

    #[test]
    fn verify_accepts_high_s_signature() {
        let kp = KeyPair::generate();
        let digest = digest_of(b"foreign signer");
        let low = kp.sign_digest(&digest);
        let high = to_high_s(&low);
        assert_ne!(low, high);
        assert!(verify_digest(&kp.address(), &digest, &high).is_ok());
    }

    #[test]
    fn verify_rejects_other_digest() {
        let kp = KeyPair::generate();
        let sig = kp.sign_digest(&digest_of(b"one"));
        let err = verify_digest(&kp.address(), &digest_of(b"two"), &sig).unwrap_err();
        assert!(matches!(err, CryptoError::Verification));
    }

    #[test]
    fn verify_rejects_other_key() {
        let alice = KeyPair::generate();
        let eve = KeyPair::generate();
        let digest = digest_of(b"payload");
        let sig = eve.sign_digest(&digest);
        assert!(verify_digest(&alice.address(), &digest, &sig).is_err());
    }

    #[test]
    fn malformed_inputs_are_errors() {
        let kp = KeyPair::generate();
        let digest = digest_of(b"payload");
        let sig = kp.sign_digest(&digest);
        assert!(matches!(
            verify_digest("not-hex", &digest, &sig),
            Err(CryptoError::Hex(_))
        ));
        assert!(matches!(
            verify_digest("0badc0de", &digest, &sig),
            Err(CryptoError::PublicKey(_))
        ));
        assert!(matches!(
            verify_digest(&kp.address(), &digest, "deadbeef"),
            Err(CryptoError::Signature(_))
        ));
        assert!(KeyPair::from_secret_hex("00").is_err());
    }
}
