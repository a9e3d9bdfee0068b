// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relay endpoints: submit enclave-signed meta-transactions as the relayer.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{info, warn};

use crate::{
    blockchain::approvals::ApprovalTicket,
    error::ApiError,
    models::{RelayQuery, SubmissionResponse},
    state::AppState,
};

fn confirmed(tx_hash: String) -> SubmissionResponse {
    SubmissionResponse {
        id: uuid::Uuid::new_v4().to_string(),
        status: "confirmed".to_string(),
        tx_hash: Some(tx_hash),
        submitted_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Relay a transfer or withdrawal.
///
/// Accepts the query the hosted withdrawal endpoint takes and records the
/// meta-transaction with `_trackTxn`.
#[utoipa::path(
    post,
    path = "/v1/relay",
    tag = "Relay",
    params(RelayQuery),
    responses(
        (status = 200, description = "Meta-transaction relayed", body = SubmissionResponse),
        (status = 400, description = "Malformed query"),
        (status = 422, description = "Enclave rejected the meta-transaction"),
        (status = 502, description = "Enclave RPC failure"),
        (status = 503, description = "Relayer key not configured")
    )
)]
pub async fn relay(
    State(state): State<AppState>,
    Query(query): Query<RelayQuery>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let relayer = state.relayer()?;
    let params = query.validate().map_err(ApiError::bad_request)?;

    let receipt = relayer
        .track_txn(
            params.meta_txn,
            &params.num_string,
            params.gas_price,
            params.fee_rate,
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Relay failed");
            ApiError::from(e)
        })?;

    info!(tx_hash = %receipt.tx_hash, amount = %params.num_string, "Relay confirmed");
    Ok(Json(confirmed(receipt.tx_hash)))
}

/// Submit an approval, confirmation or revocation.
#[utoipa::path(
    post,
    path = "/v1/approvals",
    tag = "Relay",
    request_body = ApprovalTicket,
    responses(
        (status = 200, description = "Approval relayed", body = SubmissionResponse),
        (status = 400, description = "Phrase does not match the request kind"),
        (status = 422, description = "Enclave rejected the meta-transaction"),
        (status = 503, description = "Relayer key not configured")
    )
)]
pub async fn submit_approval(
    State(state): State<AppState>,
    Json(ticket): Json<ApprovalTicket>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let relayer = state.relayer()?;
    ticket.validate()?;
    if ticket.meta_txn.is_empty() {
        return Err(ApiError::bad_request("meta_txn is empty"));
    }

    let receipt = relayer
        .submit_approval(ticket.kind, ticket.meta_txn, &ticket.phrase)
        .await
        .map_err(|e| {
            warn!(error = %e, kind = ticket.kind.as_str(), "Approval relay failed");
            ApiError::from(e)
        })?;

    info!(tx_hash = %receipt.tx_hash, kind = ticket.kind.as_str(), "Approval confirmed");
    Ok(Json(confirmed(receipt.tx_hash)))
}
