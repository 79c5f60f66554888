//! Cryptographic primitives for NEO
//!
//! - ECDSA over secp256r1 (P-256) with SHA-256
//! - SHA-256, double SHA-256 and RIPEMD160 helpers

pub mod hash;
pub mod secp256r1;

pub use hash::{checksum, hash160, sha256, sha256d};
pub use secp256r1::{Secp256r1Curve, COMPRESSED_KEY_LEN, SIGNATURE_LEN};
