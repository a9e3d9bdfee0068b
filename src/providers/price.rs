// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ETH/USD price lookup through the Etherscan stats API.

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use super::{http_client, ProviderError};
use crate::config::ETH_PRICE_API_URL;

/// Etherscan `stats/ethprice` client.
#[derive(Debug, Clone)]
pub struct EthPriceClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl EthPriceClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(ETH_PRICE_API_URL, api_key)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Current ETH price in USD.
    pub async fn fetch(&self) -> Result<f64, ProviderError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("module", "stats"),
                ("action", "ethprice"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("price request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::Request(format!(
                "price request returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid price JSON: {e}")))?;

        parse_eth_usd(&body)
    }

    /// Like [`fetch`](Self::fetch), but logs failures and yields `None`.
    pub async fn eth_usd(&self) -> Option<f64> {
        match self.fetch().await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(error = %e, "Failed to fetch ETH price");
                None
            }
        }
    }
}

fn parse_eth_usd(body: &Value) -> Result<f64, ProviderError> {
    let raw = &body["result"]["ethusd"];
    let parsed = match raw {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ProviderError::InvalidResponse(format!("missing result.ethusd in {body}"))
    })
}
