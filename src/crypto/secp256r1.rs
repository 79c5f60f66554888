//! Secp256r1 (P-256/NIST) Curve Implementation
//!
//! NEO signs transactions with ECDSA over P-256 and SHA-256.
//!
//! Features:
//! - Deterministic (RFC 6979) signing
//! - Compressed, uncompressed and raw-coordinate public keys
//! - DER conversion for hardware wallet responses

use p256::{
    ecdsa::{
        signature::{Signer, Verifier},
        Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey, SecretKey,
};
use rand::rngs::OsRng;

use crate::error::{NeoError, NeoResult};

/// Compressed SEC1 public key length
pub const COMPRESSED_KEY_LEN: usize = 33;
/// Raw `r || s` signature length
pub const SIGNATURE_LEN: usize = 64;

/// Secp256r1 (P-256) curve operations
pub struct Secp256r1Curve;

impl Secp256r1Curve {
    /// Derive the compressed public key from a 32-byte private key
    pub fn public_key_from_private(private_key: &[u8]) -> NeoResult<[u8; 33]> {
        let secret_key = Self::parse_secret_key(private_key)?;
        Ok(Self::compressed(&secret_key.public_key()))
    }

    /// Sign a message (hashed internally with SHA-256)
    pub fn sign(private_key: &[u8], message: &[u8]) -> NeoResult<[u8; 64]> {
        if private_key.len() != 32 {
            return Err(NeoError::invalid_key(format!(
                "Private key must be 32 bytes, got {}",
                private_key.len()
            )));
        }

        let signing_key = SigningKey::from_slice(private_key)
            .map_err(|e| NeoError::invalid_key(format!("Invalid signing key: {:?}", e)))?;

        let signature: Signature = signing_key.sign(message);

        Ok(Self::raw_bytes(&signature))
    }

    pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> NeoResult<bool> {
        if signature.len() != SIGNATURE_LEN {
            return Err(NeoError::malformed_signature(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            )));
        }

        let verifying_key = Self::parse_verifying_key(public_key)?;

        let sig = Signature::from_slice(signature)
            .map_err(|e| NeoError::malformed_signature(format!("Invalid signature: {:?}", e)))?;

        Ok(verifying_key.verify(message, &sig).is_ok())
    }

    /// Compress a public key given as 33, 64 or 65 bytes
    pub fn compress_public_key(public_key: &[u8]) -> NeoResult<[u8; 33]> {
        let pk = Self::parse_public_key(public_key)?;
        Ok(Self::compressed(&pk))
    }

    /// Convert a DER signature to fixed `r || s` form
    pub fn signature_from_der(der: &[u8]) -> NeoResult<[u8; 64]> {
        let sig = Signature::from_der(der)
            .map_err(|e| NeoError::malformed_signature(format!("Invalid DER signature: {:?}", e)))?;
        Ok(Self::raw_bytes(&sig))
    }

    /// Generate a keypair using secure random
    pub fn generate_keypair_random() -> ([u8; 32], [u8; 33]) {
        let secret_key = SecretKey::random(&mut OsRng);
        let sk_bytes: [u8; 32] = secret_key.to_bytes().into();
        (sk_bytes, Self::compressed(&secret_key.public_key()))
    }

    fn parse_secret_key(private_key: &[u8]) -> NeoResult<SecretKey> {
        if private_key.len() != 32 {
            return Err(NeoError::invalid_key(format!(
                "Private key must be 32 bytes, got {}",
                private_key.len()
            )));
        }

        SecretKey::from_slice(private_key)
            .map_err(|e| NeoError::invalid_key(format!("Invalid private key: {:?}", e)))
    }

    fn parse_public_key(public_key: &[u8]) -> NeoResult<PublicKey> {
        match public_key.len() {
            33 | 65 => PublicKey::from_sec1_bytes(public_key)
                .map_err(|e| NeoError::invalid_key(format!("Invalid P-256 public key: {:?}", e))),
            64 => {
                // Raw coordinates (X || Y)
                let mut uncompressed = [0u8; 65];
                uncompressed[0] = 0x04;
                uncompressed[1..].copy_from_slice(public_key);

                PublicKey::from_sec1_bytes(&uncompressed)
                    .map_err(|e| NeoError::invalid_key(format!("Invalid P-256 public key: {:?}", e)))
            }
            _ => Err(NeoError::invalid_key(format!(
                "Public key must be 33, 64, or 65 bytes, got {}",
                public_key.len()
            ))),
        }
    }

    fn parse_verifying_key(public_key: &[u8]) -> NeoResult<VerifyingKey> {
        let pk = Self::parse_public_key(public_key)?;
        Ok(VerifyingKey::from(pk))
    }

    fn raw_bytes(signature: &Signature) -> [u8; 64] {
        let mut raw = [0u8; 64];
        raw.copy_from_slice(&signature.to_bytes());
        raw
    }

    fn compressed(public_key: &PublicKey) -> [u8; 33] {
        let point = public_key.to_encoded_point(true);
        let mut pk_bytes = [0u8; 33];
        pk_bytes.copy_from_slice(point.as_bytes());
        pk_bytes
    }
}

// MARK: - Tests

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [42u8; 32];

    #[test]
    fn test_secp256r1_public_key() {
        let pk = Secp256r1Curve::public_key_from_private(&KEY).unwrap();
        assert!(pk[0] == 0x02 || pk[0] == 0x03); // Compressed prefix
    }

    #[test]
    fn test_secp256r1_sign_verify() {
        let pk = Secp256r1Curve::public_key_from_private(&KEY).unwrap();

        let message = b"Hello, P-256!";
        let signature = Secp256r1Curve::sign(&KEY, message).unwrap();

        assert!(Secp256r1Curve::verify(&pk, message, &signature).unwrap());
        assert!(!Secp256r1Curve::verify(&pk, b"Wrong message", &signature).unwrap());
    }

    #[test]
    fn test_secp256r1_signing_is_deterministic() {
        let a = Secp256r1Curve::sign(&KEY, b"tx").unwrap();
        let b = Secp256r1Curve::sign(&KEY, b"tx").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_secp256r1_rejects_bad_keys() {
        assert!(Secp256r1Curve::sign(&[0u8; 31], b"tx").is_err());
        // Zero is not a valid scalar
        let err = Secp256r1Curve::sign(&[0u8; 32], b"tx").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidKey);
    }

    #[test]
    fn test_secp256r1_compress_roundtrip() {
        let secret = SecretKey::from_slice(&KEY).unwrap();
        let uncompressed = secret.public_key().to_encoded_point(false);
        let compressed = Secp256r1Curve::compress_public_key(uncompressed.as_bytes()).unwrap();
        assert_eq!(compressed, Secp256r1Curve::public_key_from_private(&KEY).unwrap());

        // Raw X || Y
        let raw = &uncompressed.as_bytes()[1..];
        assert_eq!(Secp256r1Curve::compress_public_key(raw).unwrap(), compressed);
    }

    #[test]
    fn test_secp256r1_der_conversion() {
        let signing_key = SigningKey::from_slice(&KEY).unwrap();
        let sig: Signature = signing_key.sign(b"der");
        let der = sig.to_der();
        let raw = Secp256r1Curve::signature_from_der(der.as_bytes()).unwrap();
        assert_eq!(&raw[..], &sig.to_bytes()[..]);
        assert!(Secp256r1Curve::signature_from_der(&[0x30, 0x01]).is_err());
    }

    #[test]
    fn test_random_keypair() {
        let (sk, pk) = Secp256r1Curve::generate_keypair_random();
        assert_eq!(Secp256r1Curve::public_key_from_private(&sk).unwrap(), pk);
    }
}
