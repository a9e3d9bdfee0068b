// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::format::format_eth_amount;
use crate::state::AppState;

/// Relay service readiness.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when a relayer key is loaded and its node answers, else `degraded`.
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// `ok` or `missing`.
    pub relayer: String,
    /// Address relaying meta-transactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relayer_address: Option<String>,
    /// Relayer gas balance in ETH (4 decimals).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relayer_balance: Option<String>,
    /// Enclave RPC reachability, present when a relayer is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl HealthChecks {
    fn ready(&self) -> bool {
        self.relayer == "ok" && self.chain.as_deref() == Some("ok")
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Relayer loaded and enclave RPC reachable", body = HealthResponse),
        (status = 503, description = "No relayer key or RPC unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = HealthChecks {
        service: "ok".to_string(),
        relayer: "missing".to_string(),
        relayer_address: None,
        relayer_balance: None,
        chain: None,
        block_number: None,
    };

    if let Ok(relayer) = state.relayer() {
        checks.relayer = "ok".to_string();
        checks.relayer_address = relayer.address().map(|a| a.to_string());
        match relayer.chain().get_block_number().await {
            Ok(block) => {
                checks.chain = Some("ok".to_string());
                checks.block_number = Some(block);
                if let Some(address) = relayer.address() {
                    match relayer.chain().get_native_balance(address).await {
                        Ok(wei) => checks.relayer_balance = Some(format_eth_amount(wei)),
                        Err(e) => tracing::warn!(error = %e, "Relayer balance unavailable"),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Enclave RPC unreachable");
                checks.chain = Some("unavailable".to_string());
            }
        }
    }

    let (code, status) = if checks.ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            checks,
        }),
    )
}
