//! Witness Attachment
//!
//! Appends the single-signature witness to unsigned bytes:
//! `01 41 40 <sig64> 23 21 <pubkey33> AC`

use serde::{Deserialize, Serialize};

use super::builder::{calculate_txid, write_var_bytes, write_var_int, TransactionKind, UnsignedTransaction};
use super::signer::Signature;
use crate::crypto::{COMPRESSED_KEY_LEN, SIGNATURE_LEN};
use crate::error::{NeoError, NeoResult};
use crate::wallet::verification_script;

/// PUSHBYTES64
const OP_PUSHBYTES64: u8 = 0x40;

/// Invocation and verification scripts of one signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub invocation: Vec<u8>,
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub verification: Vec<u8>,
}

impl Witness {
    pub fn single_signature(signature: &[u8; 64], public_key: &[u8; 33]) -> Self {
        let mut invocation = Vec::with_capacity(SIGNATURE_LEN + 1);
        invocation.push(OP_PUSHBYTES64);
        invocation.extend_from_slice(signature);
        Self {
            invocation,
            verification: verification_script(public_key),
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        write_var_bytes(&self.invocation, buf);
        write_var_bytes(&self.verification, buf);
    }
}

/// Unsigned bytes followed by the witness list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    kind: TransactionKind,
    bytes: Vec<u8>,
    unsigned_len: usize,
    txid: String,
}

impl SignedTransaction {
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == TransactionKind::Placeholder
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn unsigned_bytes(&self) -> &[u8] {
        &self.bytes[..self.unsigned_len]
    }

    pub fn witness_bytes(&self) -> &[u8] {
        &self.bytes[self.unsigned_len..]
    }

    pub fn txid(&self) -> &str {
        &self.txid
    }

    /// Hex payload for `sendrawtransaction`
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// Attach the witness for `signature` and `public_key` to `unsigned`
pub fn attach_witness(
    unsigned: UnsignedTransaction,
    signature: &Signature,
    public_key: &[u8],
) -> NeoResult<SignedTransaction> {
    let signature: &[u8; 64] = signature.as_bytes().try_into().map_err(|_| {
        NeoError::malformed_signature(format!(
            "Signature must be {} bytes, got {}",
            SIGNATURE_LEN,
            signature.as_bytes().len()
        ))
    })?;
    let public_key: &[u8; 33] = public_key.try_into().map_err(|_| {
        NeoError::invalid_key(format!(
            "Public key must be {} bytes compressed, got {}",
            COMPRESSED_KEY_LEN,
            public_key.len()
        ))
    })?;

    let witness = Witness::single_signature(signature, public_key);

    let kind = unsigned.kind();
    let txid = unsigned.txid();
    let mut bytes = unsigned.into_bytes();
    let unsigned_len = bytes.len();

    write_var_int(1, &mut bytes);
    witness.write(&mut bytes);

    Ok(SignedTransaction {
        kind,
        bytes,
        unsigned_len,
        txid,
    })
}
