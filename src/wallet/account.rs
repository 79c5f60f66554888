//! NEO Accounts and Key Encoding
//!
//! Address and WIF encodings for NEO v2 plus the credential an account
//! signs with: either a local private key or a hardware device that only
//! exposes its public key.
//!
//! SECURITY: Local private keys are zeroized on drop.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::crypto::{checksum, hash160, Secp256r1Curve, COMPRESSED_KEY_LEN};
use crate::error::{NeoError, NeoResult};
use crate::types::ScriptHash;

/// Address version byte (addresses start with `A`)
pub const ADDRESS_VERSION: u8 = 0x17;
/// WIF prefix byte
pub const WIF_PREFIX: u8 = 0x80;
/// WIF compressed-key flag
pub const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// PUSHBYTES33
const OP_PUSHBYTES33: u8 = 0x21;
/// CHECKSIG
const OP_CHECKSIG: u8 = 0xAC;

// =============================================================================
// Account
// =============================================================================

/// Public identity of a signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    #[serde(with = "crate::serde_bytes::hex33")]
    pub public_key: [u8; 33],
    pub public_key_hex: String,
    pub script_hash: ScriptHash,
}

impl Account {
    pub fn from_public_key(public_key: [u8; 33]) -> Self {
        let script_hash = script_hash_from_public_key(&public_key);
        Self {
            address: encode_address(&script_hash),
            public_key,
            public_key_hex: hex::encode(public_key),
            script_hash,
        }
    }

    pub fn verification_script(&self) -> Vec<u8> {
        verification_script(&self.public_key)
    }
}

/// `0x21 || pubkey || 0xAC`
pub fn verification_script(public_key: &[u8; 33]) -> Vec<u8> {
    let mut script = Vec::with_capacity(COMPRESSED_KEY_LEN + 2);
    script.push(OP_PUSHBYTES33);
    script.extend_from_slice(public_key);
    script.push(OP_CHECKSIG);
    script
}

pub fn script_hash_from_public_key(public_key: &[u8; 33]) -> ScriptHash {
    ScriptHash::from_bytes(hash160(&verification_script(public_key)))
}

/// Base58check(0x17 || script_hash)
pub fn encode_address(script_hash: &ScriptHash) -> String {
    let mut data = Vec::with_capacity(25);
    data.push(ADDRESS_VERSION);
    data.extend_from_slice(script_hash.as_bytes());
    let check = checksum(&data);
    data.extend_from_slice(&check);
    bs58::encode(data).into_string()
}

/// Recover the script hash from an address, checking version and checksum
pub fn decode_address(address: &str) -> NeoResult<ScriptHash> {
    let data = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| NeoError::invalid_address(format!("Invalid base58: {}", e)))?;

    if data.len() != 25 {
        return Err(NeoError::invalid_address(format!(
            "Address must decode to 25 bytes, got {}",
            data.len()
        )));
    }
    if data[0] != ADDRESS_VERSION {
        return Err(NeoError::invalid_address(format!(
            "Unexpected address version 0x{:02x}",
            data[0]
        )));
    }
    if checksum(&data[..21]) != data[21..] {
        return Err(NeoError::invalid_address("Address checksum mismatch"));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&data[1..21]);
    Ok(ScriptHash::from_bytes(hash))
}

pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

// =============================================================================
// Keys
// =============================================================================

/// Locally held P-256 private key
#[derive(Clone)]
pub struct PrivateKey(Zeroizing<[u8; 32]>);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> NeoResult<Self> {
        // Validates the scalar
        Secp256r1Curve::public_key_from_private(bytes)?;
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn from_hex(hex_key: &str) -> NeoResult<Self> {
        let bytes = Zeroizing::new(
            hex::decode(hex_key.trim().trim_start_matches("0x"))
                .map_err(|e| NeoError::invalid_key(format!("Invalid key hex: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Decode `base58(0x80 || key || 0x01 || checksum)`
    pub fn from_wif(wif: &str) -> NeoResult<Self> {
        let data = Zeroizing::new(
            bs58::decode(wif.trim())
                .into_vec()
                .map_err(|e| NeoError::invalid_key(format!("Invalid WIF: {}", e)))?,
        );

        if data.len() != 38 {
            return Err(NeoError::invalid_key(format!(
                "WIF must decode to 38 bytes, got {}",
                data.len()
            )));
        }
        if data[0] != WIF_PREFIX || data[33] != WIF_COMPRESSED_FLAG {
            return Err(NeoError::invalid_key("Unexpected WIF prefix or compression flag"));
        }
        if checksum(&data[..34]) != data[34..] {
            return Err(NeoError::invalid_key("WIF checksum mismatch"));
        }

        Self::from_bytes(&data[1..33])
    }

    pub fn to_wif(&self) -> String {
        let mut data = Zeroizing::new(Vec::with_capacity(38));
        data.push(WIF_PREFIX);
        data.extend_from_slice(&self.0[..]);
        data.push(WIF_COMPRESSED_FLAG);
        let check = checksum(&data);
        data.extend_from_slice(&check);
        bs58::encode(data.as_slice()).into_string()
    }

    pub fn generate() -> Self {
        let (secret, _) = Secp256r1Curve::generate_keypair_random();
        Self(Zeroizing::new(secret))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn public_key(&self) -> NeoResult<[u8; 33]> {
        Secp256r1Curve::public_key_from_private(&self.0[..])
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// Public key reported by a signing device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePublicKey([u8; 33]);

impl DevicePublicKey {
    /// Accepts compressed (33), raw (64) or uncompressed (65) encodings
    pub fn from_bytes(bytes: &[u8]) -> NeoResult<Self> {
        Ok(Self(Secp256r1Curve::compress_public_key(bytes)?))
    }

    pub fn from_hex(hex_key: &str) -> NeoResult<Self> {
        let bytes = hex::decode(hex_key.trim().trim_start_matches("0x"))
            .map_err(|e| NeoError::invalid_key(format!("Invalid public key hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

// =============================================================================
// Credential
// =============================================================================

/// How a signing session obtains its signature
#[derive(Debug, Clone)]
pub enum Credential {
    Local(PrivateKey),
    Device(DevicePublicKey),
}

impl Credential {
    pub fn account(&self) -> NeoResult<Account> {
        let public_key = match self {
            Credential::Local(key) => key.public_key()?,
            Credential::Device(public_key) => *public_key.as_bytes(),
        };
        Ok(Account::from_public_key(public_key))
    }

    pub fn is_device(&self) -> bool {
        matches!(self, Credential::Device(_))
    }
}

// =============================================================================
// Tests
// =============================================================================
