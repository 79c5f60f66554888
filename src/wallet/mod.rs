//! Wallet Module
//!
//! Account encoding, credentials and unspent output selection.

pub mod account;
pub mod utxo;

pub use account::*;
pub use utxo::{select_unspent, select_unspent_with, Selection, UtxoSelectionStrategy};
