// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response types of the relay service. Query and body field
//! names follow what deployed CoinStir clients already send, so the relay
//! route accepts the same `?result&numString&gasPrice&feeRate` query as the
//! hosted withdrawal endpoint.

use std::str::FromStr;

use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::format::parse_ether;

/// Largest fee rate the service relays, in tenths of a percent (100%).
pub const MAX_FEE_RATE: u64 = 1000;

/// Query of `POST /v1/relay`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RelayQuery {
    /// Hex-encoded meta-transaction returned by `createmetaTXN`
    pub result: String,
    /// Amount in ether exactly as the user signed it (e.g. `0.01`)
    #[serde(rename = "numString")]
    pub num_string: String,
    /// Relay gas charge in wei, decimal
    #[serde(rename = "gasPrice")]
    pub gas_price: String,
    /// Service fee in tenths of a percent
    #[serde(rename = "feeRate")]
    pub fee_rate: u64,
}

/// Validated relay parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayParams {
    pub meta_txn: Bytes,
    pub num_string: String,
    pub gas_price: U256,
    pub fee_rate: u64,
}

impl RelayQuery {
    pub fn validate(self) -> Result<RelayParams, String> {
        let meta_txn =
            Bytes::from_str(self.result.trim()).map_err(|e| format!("result is not hex: {e}"))?;
        if meta_txn.is_empty() {
            return Err("result is empty".to_string());
        }
        let amount = parse_ether(&self.num_string).map_err(|e| format!("numString: {e}"))?;
        if amount.is_zero() {
            return Err("numString must be greater than zero".to_string());
        }
        let gas_price = U256::from_str_radix(self.gas_price.trim(), 10)
            .map_err(|_| format!("gasPrice is not a decimal integer: {}", self.gas_price))?;
        if self.fee_rate > MAX_FEE_RATE {
            return Err(format!("feeRate must be at most {MAX_FEE_RATE}"));
        }
        Ok(RelayParams {
            meta_txn,
            num_string: self.num_string,
            gas_price,
            fee_rate: self.fee_rate,
        })
    }
}

/// Response of the relay and approval routes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SubmissionResponse {
    /// Service-assigned submission id
    pub id: String,
    /// `confirmed` once the relayed transaction is mined
    pub status: String,
    pub tx_hash: Option<String>,
    /// RFC 3339 timestamp of acceptance
    pub submitted_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> RelayQuery {
        RelayQuery {
            result: "0xabcd".to_string(),
            num_string: "0.01".to_string(),
            gas_price: "30000000000000".to_string(),
            fee_rate: 10,
        }
    }

    #[test]
    fn valid_query_is_parsed() {
        let params = query().validate().unwrap();
        assert_eq!(params.meta_txn, Bytes::from(vec![0xab, 0xcd]));
        assert_eq!(params.gas_price, U256::from(30_000_000_000_000u64));
        assert_eq!(params.num_string, "0.01");
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let mut q = query();
        q.result = "zz".to_string();
        assert!(q.validate().unwrap_err().contains("result"));

        let mut q = query();
        q.num_string = "0".to_string();
        assert!(q.validate().is_err());

        let mut q = query();
        q.gas_price = "0x10".to_string();
        assert!(q.validate().unwrap_err().contains("gasPrice"));

        let mut q = query();
        q.fee_rate = 1001;
        assert!(q.validate().unwrap_err().contains("feeRate"));
    }

    #[test]
    fn query_uses_client_field_names() {
        let q: RelayQuery = serde_json::from_value(serde_json::json!({
            "result": "0x01",
            "numString": "1",
            "gasPrice": "0",
            "feeRate": 0
        }))
        .unwrap();
        assert_eq!(q.num_string, "1");
    }
}
