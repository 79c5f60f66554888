//! Serde helpers for byte arrays and raw ledger amounts
//!
//! Provides serialization/deserialization for fixed-size byte arrays
//! that are not natively supported by serde.

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize [u8; 33] (compressed public key) as hex string
pub mod hex33 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 33], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 33], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 33 bytes"))
    }
}

/// Serialize/deserialize [u8; 64] as hex string
pub mod hex64 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 64], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64 bytes"))
    }
}

/// Serialize/deserialize Vec<u8> as hex string
pub mod hex_vec {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// Fixed8 given as already-scaled integer units (claim totals)
pub mod fixed8_raw {
    use super::*;
    use crate::types::Fixed8;

    pub fn serialize<S>(value: &Fixed8, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.raw())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUnits {
        Int(i64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match RawUnits::deserialize(deserializer)? {
            RawUnits::Int(raw) => raw,
            RawUnits::Text(text) => text.trim().parse().map_err(serde::de::Error::custom)?,
        };
        Ok(Fixed8::from_raw(raw))
    }
}
