// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the off-chain relay endpoint.
//!
//! The endpoint takes the enclave-signed meta-transaction and the amount
//! string as query parameters on an empty POST and answers `{"status": ...}`.

use alloy::primitives::{Bytes, U256};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{http_client, ProviderError};

#[derive(Debug, Clone)]
pub struct WithdrawEndpoint {
    http: Client,
    url: String,
}

impl WithdrawEndpoint {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit a signed meta-transaction; returns the endpoint's `status` field.
    pub async fn submit(
        &self,
        result: &Bytes,
        num_string: &str,
        gas_price: U256,
        fee_rate: u64,
    ) -> Result<String, ProviderError> {
        let result_hex = result.to_string();
        let gas_price = gas_price.to_string();
        let fee_rate = fee_rate.to_string();

        let response = self
            .http
            .post(&self.url)
            .query(&[
                ("result", result_hex.as_str()),
                ("numString", num_string),
                ("gasPrice", gas_price.as_str()),
                ("feeRate", fee_rate.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("relay endpoint request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "relay endpoint returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid relay JSON: {e}")))?;

        let status = match &body["status"] {
            Value::String(s) => s.clone(),
            Value::Null => {
                return Err(ProviderError::InvalidResponse(format!(
                    "missing status in {body}"
                )))
            }
            other => other.to_string(),
        };
        info!(status = %status, "Relay endpoint accepted meta-transaction");
        Ok(status)
    }
}
