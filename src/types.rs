//! Shared types for the dispatch pipeline
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{NeoError, NeoResult};

// =============================================================================
// Network / Asset Types
// =============================================================================

/// Ledger environments a pipeline can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    MainNet,
    TestNet,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::MainNet => "MainNet",
            Network::TestNet => "TestNet",
        }
    }

    pub fn all() -> [Network; 2] {
        [Network::MainNet, Network::TestNet]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Native assets of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "NEO", alias = "Neo")]
    Neo,
    #[serde(rename = "GAS", alias = "Gas")]
    Gas,
}

impl AssetKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssetKind::Neo => "NEO",
            AssetKind::Gas => "GAS",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for AssetKind {
    type Err = NeoError;

    fn from_str(s: &str) -> NeoResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NEO" => Ok(AssetKind::Neo),
            "GAS" => Ok(AssetKind::Gas),
            _ => Err(NeoError::invalid_input(format!("Unknown asset: {}", s))),
        }
    }
}

// =============================================================================
// Hashes
// =============================================================================

/// 32-byte identifier (transaction hash, asset id)
///
/// Held in display order (big-endian); the wire form is byte-reversed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from little-endian wire bytes
    pub fn from_wire(mut bytes: [u8; 32]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Serialized (little-endian) form
    pub fn to_wire(&self) -> [u8; 32] {
        let mut wire = self.0;
        wire.reverse();
        wire
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Hash256 {
    type Err = NeoError;

    fn from_str(s: &str) -> NeoResult<Self> {
        let trimmed = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed)?;
        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            NeoError::parse_error(format!("Hash must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// 20-byte script hash (`RIPEMD160(SHA256(script))`), kept in wire order
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHash([u8; 20]);

impl ScriptHash {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ScriptHash {
    type Err = NeoError;

    fn from_str(s: &str) -> NeoResult<Self> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))?;
        let array: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            NeoError::parse_error(format!("Script hash must be 20 bytes, got {}", b.len()))
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash({})", self.to_hex())
    }
}

impl Serialize for ScriptHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ScriptHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Amounts
// =============================================================================

/// Ledger amount: signed 64-bit integer scaled by 10^8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed8(i64);

impl Fixed8 {
    pub const DECIMALS: u32 = 8;
    pub const ONE: Fixed8 = Fixed8(100_000_000);
    pub const ZERO: Fixed8 = Fixed8(0);

    /// Wrap an already-scaled integer
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Whole units, e.g. `Fixed8::from_units(5)` is 5 GAS
    pub fn from_units(units: i64) -> NeoResult<Self> {
        units
            .checked_mul(Self::ONE.0)
            .map(Self)
            .ok_or_else(|| NeoError::invalid_input("Amount overflows Fixed8"))
    }

    pub const fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Fixed8) -> Option<Fixed8> {
        self.0.checked_add(other.0).map(Fixed8)
    }

    pub fn checked_sub(self, other: Fixed8) -> Option<Fixed8> {
        self.0.checked_sub(other.0).map(Fixed8)
    }

    /// Little-endian wire encoding
    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl FromStr for Fixed8 {
    type Err = NeoError;

    fn from_str(s: &str) -> NeoResult<Self> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(NeoError::invalid_input(format!("Invalid amount: {:?}", s)));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NeoError::invalid_input(format!("Invalid amount: {:?}", s)));
        }
        if frac_part.len() > Self::DECIMALS as usize {
            return Err(NeoError::invalid_input(format!(
                "Amount {:?} has more than {} decimals",
                s,
                Self::DECIMALS
            )));
        }

        let overflow = || NeoError::invalid_input(format!("Amount {:?} overflows Fixed8", s));
        let int: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{:0<8}", frac_part);
            padded.parse().map_err(|_| overflow())?
        };

        let value = int
            .checked_mul(Self::ONE.0)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Self(if negative { -value } else { value }))
    }
}

impl fmt::Display for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let int = abs / Self::ONE.0 as u64;
        let frac = abs % Self::ONE.0 as u64;
        if frac == 0 {
            write!(f, "{}{}", sign, int)
        } else {
            let frac_str = format!("{:08}", frac);
            write!(f, "{}{}.{}", sign, int, frac_str.trim_end_matches('0'))
        }
    }
}

impl Serialize for Fixed8 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts decimal strings and JSON numbers (`5`, `0.1`, `"12.5"`)
impl<'de> Deserialize<'de> for Fixed8 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecimalVisitor;

        impl<'de> de::Visitor<'de> for DecimalVisitor {
            type Value = Fixed8;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount as number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Fixed8, E> {
                let units = i64::try_from(v).map_err(E::custom)?;
                Fixed8::from_units(units).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Fixed8, E> {
                Fixed8::from_units(v).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Fixed8, E> {
                if !v.is_finite() {
                    return Err(E::custom(format!("Amount {} is not finite", v)));
                }
                // Round off binary residue at the eighth decimal
                format!("{:.8}", v).parse().map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Fixed8, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}

// =============================================================================
// Ledger Inputs
// =============================================================================

/// Spendable output observed on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub asset_id: Hash256,
    pub txid: Hash256,
    pub index: u16,
    pub value: Fixed8,
}

/// Selector input: all unspent outputs of one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinSet {
    pub asset_id: Hash256,
    pub kind: AssetKind,
    pub list: Vec<UnspentOutput>,
    pub balance: Fixed8,
}

impl CoinSet {
    /// Sum of listed output values; `None` on overflow
    pub fn available(&self) -> Option<Fixed8> {
        self.list
            .iter()
            .try_fold(Fixed8::ZERO, |acc, utxo| acc.checked_add(utxo.value))
    }
}

/// Output reference whose accrued GAS can be claimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableOutput {
    pub txid: Hash256,
    pub index: u16,
    pub value: Fixed8,
}

/// Serializer input for claim transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSet {
    pub claims: Vec<ClaimableOutput>,
    pub total: Fixed8,
}

/// Claimable (spent) and not-yet-claimable (unspent) GAS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAmounts {
    pub available: Fixed8,
    pub unavailable: Fixed8,
}

/// Per-asset spendable balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBalance {
    pub balance: Fixed8,
    pub unspent: Vec<UnspentOutput>,
}

/// Balance snapshot for one address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub address: String,
    pub neo: AssetBalance,
    pub gas: AssetBalance,
}

impl AccountBalance {
    /// Consume the snapshot into the selector input for one asset
    pub fn into_coin_set(self, kind: AssetKind, asset_id: Hash256) -> CoinSet {
        let asset = match kind {
            AssetKind::Neo => self.neo,
            AssetKind::Gas => self.gas,
        };
        CoinSet {
            asset_id,
            kind,
            list: asset.unspent,
            balance: asset.balance,
        }
    }
}

// =============================================================================
// Broadcast Result
// =============================================================================

/// Acknowledgment of an accepted broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub network: Network,
    pub txid: String,
    pub accepted: bool,
    pub endpoint: String,
    pub detail: serde_json::Value,
}
