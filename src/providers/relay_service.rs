// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for this crate's own relay service (`coinstir serve`).

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{http_client, ProviderError};
use crate::blockchain::approvals::ApprovalTicket;

/// Body returned by the relay service for accepted submissions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceReceipt {
    pub status: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelayServiceClient {
    http: Client,
    base_url: String,
}

impl RelayServiceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn submit_approval(
        &self,
        ticket: &ApprovalTicket,
    ) -> Result<ServiceReceipt, ProviderError> {
        let url = format!("{}/v1/approvals", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(ticket)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("relay service request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "relay service returned {status}: {body}"
            )));
        }

        let receipt: ServiceReceipt = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid relay service JSON: {e}")))?;
        info!(status = %receipt.status, kind = ticket.kind.as_str(), "Relay service accepted approval");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::approvals::ApprovalKind;
    use crate::config::messages;
    use alloy::primitives::Bytes;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn ticket() -> ApprovalTicket {
        ApprovalTicket {
            kind: ApprovalKind::Propose,
            meta_txn: Bytes::from(vec![0xde, 0xad]),
            phrase: messages::APPROVE.to_string(),
        }
    }

    #[tokio::test]
    async fn posts_ticket_as_json() {
        let router = Router::new().route(
            "/v1/approvals",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["kind"], "propose");
                assert_eq!(body["meta_txn"], "0xdead");
                Json(json!({"status": "confirmed", "tx_hash": "0xabc", "submitted_at": "now"}))
            }),
        );
        let client = RelayServiceClient::new(spawn(router).await).unwrap();
        let receipt = client.submit_approval(&ticket()).await.unwrap();
        assert_eq!(receipt.status, "confirmed");
        assert_eq!(receipt.tx_hash.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn rejection_carries_body() {
        let router = Router::new().route(
            "/v1/approvals",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({"error": "phrase mismatch"})),
                )
            }),
        );
        let client = RelayServiceClient::new(spawn(router).await).unwrap();
        match client.submit_approval(&ticket()).await {
            Err(ProviderError::Request(msg)) => assert!(msg.contains("phrase mismatch")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
