// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoding of the raw `recoverAddressFromSignature` return data.
//!
//! The enclave is queried with a plain `eth_call` and its output is read as
//! consecutive 32-byte words. This is coupled to the contract's return layout:
//!
//! | word | content |
//! |------|---------|
//! | 0 | recovered address (low 20 bytes) |
//! | 1 | transaction count, also the next meta-transaction nonce |
//! | 2 | available balance in wei |
//! | 3 | approved address count (optional) |
//! | 4 | origin address (optional) |

use alloy::primitives::{Address, U256};

use super::types::AccountSnapshot;

const WORD: usize = 32;

/// Errors raised when the enclave output does not have the expected layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Snapshot word {index} does not fit in {bits} bits")]
    Overflow { index: usize, bits: u32 },
}

fn word(data: &[u8], index: usize) -> Option<&[u8]> {
    data.get(index * WORD..(index + 1) * WORD)
}

fn word_u64(data: &[u8], index: usize) -> Result<Option<u64>, SnapshotError> {
    word(data, index)
        .map(|w| {
            let value = U256::from_be_slice(w);
            u64::try_from(value).map_err(|_| SnapshotError::Overflow { index, bits: 64 })
        })
        .transpose()
}

fn word_address(data: &[u8], index: usize) -> Option<Address> {
    word(data, index).map(|w| Address::from_slice(&w[WORD - 20..]))
}

/// Decode an account snapshot from raw call output.
pub fn decode_snapshot(data: &[u8]) -> Result<AccountSnapshot, SnapshotError> {
    let required = 3 * WORD;
    if data.len() < required {
        return Err(SnapshotError::TooShort {
            expected: required,
            actual: data.len(),
        });
    }

    let recovered_address = word_address(data, 0).unwrap_or_default();
    let txn_count = word_u64(data, 1)?.unwrap_or_default();
    let balance = word(data, 2).map(U256::from_be_slice).unwrap_or_default();

    Ok(AccountSnapshot {
        recovered_address,
        txn_count,
        balance,
        approved_address_count: word_u64(data, 3)?,
        origin_address: word_address(data, 4),
    })
}
