// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Off-chain HTTP services: the ETH price feed, the withdrawal relay endpoint
//! and the approval route of the relay service.

pub mod price;
pub mod relay_service;
pub mod withdraw;

use std::time::Duration;

use reqwest::Client;

pub use price::EthPriceClient;
pub use relay_service::RelayServiceClient;
pub use withdraw::WithdrawEndpoint;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors raised by the off-chain HTTP services.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

pub(crate) fn http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))
}
