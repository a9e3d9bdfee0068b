// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Approved-address management.
//!
//! Granting a second wallet access to an enclave account takes two signed
//! steps: the owner proposes the new wallet, then the new wallet confirms
//! with the owner as counterparty. Revocation is a single owner step. Each
//! step signs `{recipiant: counterparty, value: phrase}`, has the enclave
//! wrap it with `createMetaTxnAddr`, and is submitted by a relayer.

use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use utoipa::ToSchema;

use super::client::ChainError;
use super::contracts::IStirEnclave;
use super::eip712::MessageBuilder;
use super::enclave::EnclaveClient;
use super::relayer::RelayerAccount;
use super::types::TxReceipt;
use super::wallet::{request_signature, WalletError, WalletProvider};
use crate::config::{messages, Settings};
use crate::providers::{ProviderError, RelayServiceClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalKind {
    /// Owner proposes a new wallet.
    Propose,
    /// Proposed wallet accepts, naming the owner.
    Confirm,
    /// Owner removes a previously approved wallet.
    Revoke,
}

impl ApprovalKind {
    /// Phrase the signer agrees to for this step.
    pub fn phrase(self) -> &'static str {
        match self {
            ApprovalKind::Propose | ApprovalKind::Confirm => messages::APPROVE,
            ApprovalKind::Revoke => messages::REVOKE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalKind::Propose => "propose",
            ApprovalKind::Confirm => "confirm",
            ApprovalKind::Revoke => "revoke",
        }
    }
}

/// A signed approval step ready for a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApprovalTicket {
    pub kind: ApprovalKind,
    /// Enclave-signed `createMetaTxnAddr` output
    #[schema(value_type = String)]
    pub meta_txn: Bytes,
    pub phrase: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("Counterparty must differ from the signing account")]
    SelfApproval,

    #[error("Counterparty address is zero")]
    ZeroAddress,

    #[error("Phrase does not match a {0} request")]
    PhraseMismatch(&'static str),

    #[error("No relayer key or relay service configured")]
    NoRelayer,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Service(#[from] ProviderError),
}

impl ApprovalTicket {
    /// Reject tickets whose phrase does not belong to their kind.
    pub fn validate(&self) -> Result<(), ApprovalError> {
        if self.phrase != self.kind.phrase() {
            return Err(ApprovalError::PhraseMismatch(self.kind.as_str()));
        }
        Ok(())
    }
}

/// Sign one approval step as `signer` and have the enclave wrap it.
pub async fn prepare<W: WalletProvider>(
    wallet: &W,
    enclave: &EnclaveClient,
    settings: &Settings,
    signer: Address,
    counterparty: Address,
    kind: ApprovalKind,
    cancel: &CancellationToken,
) -> Result<ApprovalTicket, ApprovalError> {
    if counterparty.is_zero() {
        return Err(ApprovalError::ZeroAddress);
    }
    if counterparty == signer {
        return Err(ApprovalError::SelfApproval);
    }

    let phrase = kind.phrase();
    let builder = MessageBuilder::new(settings.enclave_network.chain_id, settings.contracts.enclave);
    let payload = builder.approval(counterparty, phrase);
    let signature = request_signature(
        wallet.sign_typed_data(signer, &payload),
        settings.signing_timeout,
        cancel,
    )
    .await?;

    let meta_txn = enclave
        .create_meta_txn_addr(
            IStirEnclave::AddrTxn {
                _walletB: counterparty,
                _signature: signature,
            },
            signer,
        )
        .await?;

    info!(kind = kind.as_str(), signer = %signer, counterparty = %counterparty, "Approval signed");
    Ok(ApprovalTicket {
        kind,
        meta_txn,
        phrase: phrase.to_string(),
    })
}

/// Where a signed ticket goes.
pub enum ApprovalSubmitter<'a> {
    Relayer(&'a RelayerAccount),
    Service(&'a RelayServiceClient),
}

/// Result of a submitted ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub tx_hash: Option<String>,
    pub status: String,
}

impl ApprovalSubmitter<'_> {
    pub async fn submit(&self, ticket: &ApprovalTicket) -> Result<ApprovalOutcome, ApprovalError> {
        ticket.validate()?;
        match self {
            ApprovalSubmitter::Relayer(relayer) => {
                let TxReceipt { tx_hash, .. } = relayer
                    .submit_approval(ticket.kind, ticket.meta_txn.clone(), &ticket.phrase)
                    .await?;
                Ok(ApprovalOutcome {
                    tx_hash: Some(tx_hash),
                    status: "confirmed".to_string(),
                })
            }
            ApprovalSubmitter::Service(service) => {
                let receipt = service.submit_approval(ticket).await?;
                Ok(ApprovalOutcome {
                    tx_hash: receipt.tx_hash,
                    status: receipt.status,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{
        signing::signer_from_hex, wallet::LocalWallet, ChainClient, SAPPHIRE_TESTNET,
        TESTNET_CONTRACTS,
    };

    fn fixtures() -> (Settings, EnclaveClient, LocalWallet) {
        let settings = Settings::from_lookup(|_| None).unwrap();
        let chain = ChainClient::new(SAPPHIRE_TESTNET, "http://127.0.0.1:9").unwrap();
        let enclave = EnclaveClient::new(chain, TESTNET_CONTRACTS);
        let wallet = LocalWallet::new(
            signer_from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap(),
            SAPPHIRE_TESTNET,
            "http://127.0.0.1:9",
        )
        .unwrap();
        (settings, enclave, wallet)
    }

    #[test]
    fn phrases_follow_kind() {
        assert_eq!(ApprovalKind::Propose.phrase(), messages::APPROVE);
        assert_eq!(ApprovalKind::Confirm.phrase(), messages::APPROVE);
        assert_eq!(ApprovalKind::Revoke.phrase(), messages::REVOKE);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ApprovalKind::Confirm).unwrap(), "\"confirm\"");
        let kind: ApprovalKind = serde_json::from_str("\"revoke\"").unwrap();
        assert_eq!(kind, ApprovalKind::Revoke);
    }

    #[test]
    fn mismatched_phrase_is_rejected() {
        let ticket = ApprovalTicket {
            kind: ApprovalKind::Revoke,
            meta_txn: Bytes::from(vec![1u8]),
            phrase: messages::APPROVE.to_string(),
        };
        assert!(matches!(
            ticket.validate(),
            Err(ApprovalError::PhraseMismatch("revoke"))
        ));
    }

    #[tokio::test]
    async fn self_and_zero_counterparties_are_rejected() {
        let (settings, enclave, wallet) = fixtures();
        let me = wallet.address();
        let cancel = CancellationToken::new();

        let err = prepare(&wallet, &enclave, &settings, me, me, ApprovalKind::Propose, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::SelfApproval));

        let err = prepare(
            &wallet,
            &enclave,
            &settings,
            me,
            Address::ZERO,
            ApprovalKind::Revoke,
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApprovalError::ZeroAddress));
    }

    #[tokio::test]
    async fn enclave_failure_is_reported_after_signing() {
        let (settings, enclave, wallet) = fixtures();
        let err = prepare(
            &wallet,
            &enclave,
            &settings,
            wallet.address(),
            Address::repeat_byte(0x42),
            ApprovalKind::Propose,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApprovalError::Chain(_)));
    }
}
