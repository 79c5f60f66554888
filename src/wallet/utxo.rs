//! Unspent Output Selection
//!
//! Greedy coin selection over a NEO/GAS coin set. Outputs are consumed in the
//! order the balance source supplied them unless a strategy says otherwise.

use crate::error::{NeoError, NeoResult};
use crate::types::{CoinSet, Fixed8, UnspentOutput};
use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// Order in which outputs are considered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoSelectionStrategy {
    #[default]
    SuppliedOrder,
    /// Largest value first, fewer inputs
    LargestFirst,
}

/// Result of unspent output selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub inputs: Vec<UnspentOutput>,
    pub total: Fixed8,
    pub change: Fixed8,
}

impl Selection {
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn has_change(&self) -> bool {
        self.change.is_positive()
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Select outputs covering `amount`, walking the coin set in supplied order
pub fn select_unspent(coins: &CoinSet, amount: Fixed8) -> NeoResult<Selection> {
    select_unspent_with(coins, amount, UtxoSelectionStrategy::SuppliedOrder)
}

pub fn select_unspent_with(
    coins: &CoinSet,
    amount: Fixed8,
    strategy: UtxoSelectionStrategy,
) -> NeoResult<Selection> {
    if !amount.is_positive() {
        return Err(NeoError::invalid_input(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }

    let available = coins
        .available()
        .ok_or_else(|| NeoError::invalid_input("Unspent output values overflow"))?;
    if available < amount {
        return Err(NeoError::insufficient_funds(format!(
            "Need {} {}, have {}",
            amount, coins.kind, available
        )));
    }

    let mut candidates: Vec<&UnspentOutput> = coins.list.iter().collect();
    if strategy == UtxoSelectionStrategy::LargestFirst {
        // Stable sort keeps supplied order among equal values
        candidates.sort_by(|a, b| b.value.cmp(&a.value));
    }

    let mut inputs = Vec::new();
    let mut total = Fixed8::ZERO;

    for utxo in candidates {
        if total >= amount {
            break;
        }
        total = total
            .checked_add(utxo.value)
            .ok_or_else(|| NeoError::invalid_input("Unspent output values overflow"))?;
        inputs.push(utxo.clone());
    }

    let change = total
        .checked_sub(amount)
        .ok_or_else(|| NeoError::internal("Change underflow"))?;

    Ok(Selection {
        inputs,
        total,
        change,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetKind, Hash256};

    fn utxo(n: u8, units: i64) -> UnspentOutput {
        UnspentOutput {
            asset_id: Hash256::from_bytes([0xaa; 32]),
            txid: Hash256::from_bytes([n; 32]),
            index: n as u16,
            value: Fixed8::from_units(units).unwrap(),
        }
    }

    fn coins(values: &[i64]) -> CoinSet {
        let list: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| utxo(i as u8, *v))
            .collect();
        let balance = list
            .iter()
            .fold(Fixed8::ZERO, |acc, u| acc.checked_add(u.value).unwrap());
        CoinSet {
            asset_id: Hash256::from_bytes([0xaa; 32]),
            kind: AssetKind::Gas,
            list,
            balance,
        }
    }

    #[test]
    fn test_single_output_with_change() {
        let selection = select_unspent(&coins(&[5]), Fixed8::from_units(3).unwrap()).unwrap();
        assert_eq!(selection.input_count(), 1);
        assert_eq!(selection.change, Fixed8::from_units(2).unwrap());
        assert!(selection.has_change());
    }

    #[test]
    fn test_exact_amount_has_no_change() {
        let selection = select_unspent(&coins(&[2, 3]), Fixed8::from_units(5).unwrap()).unwrap();
        assert_eq!(selection.input_count(), 2);
        assert_eq!(selection.change, Fixed8::ZERO);
        assert!(!selection.has_change());
    }

    #[test]
    fn test_supplied_order_is_preserved() {
        let selection = select_unspent(&coins(&[1, 10, 2]), Fixed8::from_units(3).unwrap()).unwrap();
        let indexes: Vec<u16> = selection.inputs.iter().map(|u| u.index).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(selection.total, Fixed8::from_units(11).unwrap());
    }

    #[test]
    fn test_largest_first_strategy() {
        let selection = select_unspent_with(
            &coins(&[1, 10, 2]),
            Fixed8::from_units(3).unwrap(),
            UtxoSelectionStrategy::LargestFirst,
        )
        .unwrap();
        assert_eq!(selection.input_count(), 1);
        assert_eq!(selection.inputs[0].index, 1);
    }

    #[test]
    fn test_insufficient_funds() {
        let err = select_unspent(&coins(&[1]), Fixed8::from_units(5).unwrap()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InsufficientFunds);

        let err = select_unspent(&coins(&[]), Fixed8::ONE).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InsufficientFunds);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let err = select_unspent(&coins(&[5]), Fixed8::ZERO).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
        let err = select_unspent(&coins(&[5]), Fixed8::from_raw(-1)).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }
}
