//! Transaction Builder
//!
//! Serializes unsigned NEO v2 transactions: asset transfers
//! (`ContractTransaction`) and GAS claims (`ClaimTransaction`).

use crate::crypto::sha256d;
use crate::error::{NeoError, NeoResult};
use crate::types::{ClaimSet, Fixed8, Hash256, ScriptHash};
use crate::wallet::Selection;

/// Canonical placeholder payload, used only to exercise the signing path
pub const PLACEHOLDER_PAYLOAD: [u8; 13] = [0u8; 13];

const TX_VERSION: u8 = 0x00;

/// Transaction types this crate produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Contract,
    Claim,
    Placeholder,
}

impl TransactionKind {
    /// Wire type byte; the placeholder has none
    pub fn type_byte(&self) -> Option<u8> {
        match self {
            TransactionKind::Contract => Some(0x80),
            TransactionKind::Claim => Some(0x02),
            TransactionKind::Placeholder => None,
        }
    }
}

/// Unsigned transaction bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    kind: TransactionKind,
    bytes: Vec<u8>,
}

impl UnsignedTransaction {
    pub fn placeholder() -> Self {
        Self {
            kind: TransactionKind::Placeholder,
            bytes: PLACEHOLDER_PAYLOAD.to_vec(),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == TransactionKind::Placeholder
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Transaction id: SHA256(SHA256(unsigned)), displayed reversed
    pub fn txid(&self) -> String {
        calculate_txid(&self.bytes)
    }
}

/// Recipient, sender and amount of an asset transfer
#[derive(Debug, Clone)]
pub struct TransferOutputs {
    pub asset_id: Hash256,
    pub recipient: ScriptHash,
    pub sender: ScriptHash,
    pub amount: Fixed8,
}

/// Build a `ContractTransaction` spending `selection`
///
/// Output 0 pays the recipient; output 1 returns change when there is any.
pub fn build_transfer(
    selection: &Selection,
    outputs: &TransferOutputs,
) -> NeoResult<UnsignedTransaction> {
    if !outputs.amount.is_positive() {
        return Err(NeoError::invalid_input(format!(
            "Transfer amount must be positive, got {}",
            outputs.amount
        )));
    }
    if selection.inputs.is_empty() {
        return Err(NeoError::invalid_input("Transfer has no inputs"));
    }
    if selection.inputs.iter().any(|i| i.asset_id != outputs.asset_id) {
        return Err(NeoError::invalid_input("Input asset does not match transfer asset"));
    }
    if selection.total.checked_sub(outputs.amount) != Some(selection.change)
        || selection.change.raw() < 0
    {
        return Err(NeoError::invalid_input(format!(
            "Selection total {} does not cover amount {} with change {}",
            selection.total, outputs.amount, selection.change
        )));
    }

    let output_count = if selection.has_change() { 2 } else { 1 };
    let mut buf = Vec::with_capacity(6 + selection.inputs.len() * 34 + output_count * 60);

    buf.push(0x80);
    buf.push(TX_VERSION);
    // No exclusive data; zero attributes
    write_var_int(0, &mut buf);

    write_var_int(selection.inputs.len() as u64, &mut buf);
    for input in &selection.inputs {
        write_outpoint(&input.txid, input.index, &mut buf);
    }

    write_var_int(output_count as u64, &mut buf);
    write_output(&outputs.asset_id, outputs.amount, &outputs.recipient, &mut buf);
    if selection.has_change() {
        write_output(&outputs.asset_id, selection.change, &outputs.sender, &mut buf);
    }

    Ok(UnsignedTransaction {
        kind: TransactionKind::Contract,
        bytes: buf,
    })
}

/// Build a `ClaimTransaction` crediting the claimed total to `claimant`
pub fn build_claim(
    claims: &ClaimSet,
    gas_asset_id: &Hash256,
    claimant: &ScriptHash,
) -> NeoResult<UnsignedTransaction> {
    if claims.claims.is_empty() {
        return Err(NeoError::invalid_input("Nothing to claim"));
    }
    if !claims.total.is_positive() {
        return Err(NeoError::invalid_input(format!(
            "Claim total must be positive, got {}",
            claims.total
        )));
    }

    let mut buf = Vec::with_capacity(8 + claims.claims.len() * 34 + 60);

    buf.push(0x02);
    buf.push(TX_VERSION);

    write_var_int(claims.claims.len() as u64, &mut buf);
    for claim in &claims.claims {
        write_outpoint(&claim.txid, claim.index, &mut buf);
    }

    // Attributes, inputs
    write_var_int(0, &mut buf);
    write_var_int(0, &mut buf);

    write_var_int(1, &mut buf);
    write_output(gas_asset_id, claims.total, claimant, &mut buf);

    Ok(UnsignedTransaction {
        kind: TransactionKind::Claim,
        bytes: buf,
    })
}

/// Write Bitcoin-style variable length integer
pub fn write_var_int(value: u64, buf: &mut Vec<u8>) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffffffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// Length-prefixed byte string
pub fn write_var_bytes(data: &[u8], buf: &mut Vec<u8>) {
    write_var_int(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

pub(crate) fn calculate_txid(unsigned: &[u8]) -> String {
    let mut txid_bytes = sha256d(unsigned);
    txid_bytes.reverse();
    hex::encode(txid_bytes)
}

fn write_outpoint(txid: &Hash256, index: u16, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&txid.to_wire());
    buf.extend_from_slice(&index.to_le_bytes());
}

fn write_output(asset_id: &Hash256, value: Fixed8, script_hash: &ScriptHash, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&asset_id.to_wire());
    buf.extend_from_slice(&value.to_le_bytes());
    buf.extend_from_slice(script_hash.as_bytes());
}
