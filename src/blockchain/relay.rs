// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer and withdrawal relay pipeline.
//!
//! A relay goes through these steps:
//! 1. Sign the transfer message (recipient, amount string, nonce) with the wallet.
//! 2. Check the enclave balance covers amount, service fee and relay gas.
//! 3. Ask the enclave to wrap the signature into a meta-transaction (`createmetaTXN`).
//! 4. Submit it, either through the on-chain relayer contract
//!    (`format` → `preflightCheck` → `makeProxyTx` → raw broadcast) or by
//!    POSTing it to the off-chain relay endpoint.
//! 5. On success, refresh the session snapshot.
//!
//! Failures are classified but never retried.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::{map_contract_error, ChainError};
use super::contracts::{IRelayer, IStirEnclave};
use super::eip712::MessageBuilder;
use super::enclave::EnclaveClient;
use super::wallet::{request_signature, WalletError, WalletProvider};
use crate::config::{messages, Settings};
use crate::format::{format_number_string, parse_ether, FormatError};
use crate::providers::{ProviderError, WithdrawEndpoint};
use crate::session::Session;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Idle,
    Signing,
    Submitted,
    Confirmed,
    Failed,
}

/// What is being relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayKind {
    /// Transfer to any address; `internal` marks a transfer to another enclave account.
    Transfer { recipient: Address, internal: bool },
    /// Withdrawal to the signed-in account.
    Withdraw,
}

/// How the signed meta-transaction reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayRoute {
    OnChain,
    Endpoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub kind: RelayKind,
    /// Amount in ether as typed by the user (e.g. ".01").
    pub amount: String,
    pub route: RelayRoute,
}

/// Successful relay result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub route: RelayRoute,
    pub tx_hash: Option<String>,
    pub explorer_url: Option<String>,
    /// Status string reported by the off-chain endpoint
    pub endpoint_status: Option<String>,
}

/// Why a relay failed.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Insufficient funds: balance {balance} wei, required {required} wei")]
    InsufficientFunds { balance: U256, required: U256 },

    #[error("Pre-flight check failed: {0}")]
    PreflightFailed(String),

    #[error("Relayer account is out of gas funds: {0}")]
    RelayerUnderfunded(String),

    #[error("Signature rejected by the enclave: {0}")]
    BadSignature(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] FormatError),

    #[error("No relay endpoint configured")]
    EndpointUnavailable,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Endpoint(#[from] ProviderError),

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// Classify a chain-side failure by its revert reason or message.
    pub fn classify(err: ChainError) -> Self {
        let message = err.to_string();
        if message.contains("TransactionWillFail") {
            RelayError::PreflightFailed(message)
        } else if message.contains("insufficient funds") {
            RelayError::RelayerUnderfunded(message)
        } else if message.contains("bad sig") {
            RelayError::BadSignature(message)
        } else {
            RelayError::Other(message)
        }
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            RelayError::InsufficientFunds { .. } => messages::INSUFFICIENT_FUNDS,
            _ => messages::TRANSFER_FAILED,
        }
    }
}

/// Minimum enclave balance for relaying `value`:
/// `value + value * fee_rate / 1000 + gas_price`.
pub fn required_funds(value: U256, fee_rate: u64, gas_price: U256) -> U256 {
    let fee = value.saturating_mul(U256::from(fee_rate)) / U256::from(1000u64);
    value.saturating_add(fee).saturating_add(gas_price)
}

/// Drives one relay at a time and records its phase.
pub struct RelayPipeline<'a> {
    enclave: &'a EnclaveClient,
    endpoint: Option<&'a WithdrawEndpoint>,
    settings: &'a Settings,
    phase: RelayPhase,
}

impl<'a> RelayPipeline<'a> {
    pub fn new(
        enclave: &'a EnclaveClient,
        endpoint: Option<&'a WithdrawEndpoint>,
        settings: &'a Settings,
    ) -> Self {
        Self {
            enclave,
            endpoint,
            settings,
            phase: RelayPhase::Idle,
        }
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    fn set_phase(&mut self, phase: RelayPhase) {
        info!(from = ?self.phase, to = ?phase, "Relay phase changed");
        self.phase = phase;
    }

    /// Run the full pipeline for `request` on behalf of the session's account.
    pub async fn submit<W: WalletProvider>(
        &mut self,
        session: &mut Session,
        wallet: &W,
        request: &RelayRequest,
        cancel: &CancellationToken,
    ) -> Result<RelayOutcome, RelayError> {
        let result = self.run(session, wallet, request, cancel).await;
        match &result {
            Ok(_) => {
                self.set_phase(RelayPhase::Confirmed);
                if let Err(e) = session.refresh(self.enclave).await {
                    warn!(error = %e, "Relay confirmed but session refresh failed");
                }
            }
            Err(e) => {
                warn!(error = %e, "Relay failed");
                self.set_phase(RelayPhase::Failed);
            }
        }
        result
    }

    async fn run<W: WalletProvider>(
        &mut self,
        session: &Session,
        wallet: &W,
        request: &RelayRequest,
        cancel: &CancellationToken,
    ) -> Result<RelayOutcome, RelayError> {
        let num_string = format_number_string(request.amount.trim());
        let value = parse_ether(&num_string)?;

        let (recipient, fee_rate, internal) = match &request.kind {
            RelayKind::Transfer {
                recipient,
                internal,
            } => (*recipient, self.settings.fee_rate, *internal),
            RelayKind::Withdraw => (session.account(), 0, false),
        };
        let gas_price = self.settings.gas_price_wei;

        let required = required_funds(value, fee_rate, gas_price);
        if session.balance() < required {
            return Err(RelayError::InsufficientFunds {
                balance: session.balance(),
                required,
            });
        }

        self.set_phase(RelayPhase::Signing);
        let nonce = session.nonce();
        let builder = MessageBuilder::new(
            self.settings.enclave_network.chain_id,
            self.settings.contracts.enclave,
        );
        // Withdrawals are verified against the transfer shape with the
        // account itself as recipient.
        let payload = builder.transfer(recipient, &num_string, nonce);
        let signature = request_signature(
            wallet.sign_typed_data(session.account(), &payload),
            self.settings.signing_timeout,
            cancel,
        )
        .await?;

        let meta = IStirEnclave::MetaTxn {
            _payload: value,
            _dest: recipient,
            _signature: signature,
            nonce: U256::from(nonce),
        };
        let signed = self
            .enclave
            .create_meta_txn(meta, session.account())
            .await
            .map_err(RelayError::classify)?;

        match request.route {
            RelayRoute::OnChain => {
                self.relay_on_chain(signed, &num_string, gas_price, fee_rate, internal)
                    .await
            }
            RelayRoute::Endpoint => {
                let endpoint = self.endpoint.ok_or(RelayError::EndpointUnavailable)?;
                self.set_phase(RelayPhase::Submitted);
                let status = endpoint
                    .submit(&signed, &num_string, gas_price, fee_rate)
                    .await?;
                Ok(RelayOutcome {
                    route: RelayRoute::Endpoint,
                    tx_hash: None,
                    explorer_url: None,
                    endpoint_status: Some(status),
                })
            }
        }
    }

    async fn relay_on_chain(
        &mut self,
        signed: Bytes,
        num_string: &str,
        gas_price: U256,
        fee_rate: u64,
        internal: bool,
    ) -> Result<RelayOutcome, RelayError> {
        settle(self.settings.settle_delay).await;

        let chain = self.enclave.chain();
        let relayer = IRelayer::new(self.settings.contracts.relayer, chain.provider().clone());

        let innercall = relayer
            .format(
                signed,
                num_string.to_string(),
                gas_price,
                U256::from(fee_rate),
                internal,
            )
            .call()
            .await
            .map_err(|e| RelayError::classify(map_contract_error(e)))?;

        let preflight = relayer
            .preflightCheck(innercall.clone())
            .call()
            .await
            .map_err(|e| RelayError::classify(map_contract_error(e)))?;
        if !preflight.success {
            return Err(RelayError::PreflightFailed(preflight.reason));
        }

        let raw_tx = relayer
            .makeProxyTx(innercall)
            .call()
            .await
            .map_err(|e| RelayError::classify(map_contract_error(e)))?;

        self.set_phase(RelayPhase::Submitted);
        let receipt = chain
            .send_raw_and_confirm(&raw_tx)
            .await
            .map_err(RelayError::classify)?;

        if !receipt.success {
            return Err(RelayError::Reverted {
                tx_hash: receipt.tx_hash,
            });
        }
        info!(
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "Relay transaction confirmed"
        );
        Ok(RelayOutcome {
            route: RelayRoute::OnChain,
            explorer_url: Some(chain.explorer_tx_url(&receipt.tx_hash)),
            tx_hash: Some(receipt.tx_hash),
            endpoint_status: None,
        })
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{
        signing::signer_from_hex, wallet::LocalWallet, AccountSnapshot, ChainClient,
        SAPPHIRE_TESTNET, TESTNET_CONTRACTS,
    };
    use crate::blockchain::rpc_stub::{serve, uint_word, RpcStub};
    use alloy::primitives::hex;
    use alloy::sol_types::{SolCall, SolValue};
    use axum::{extract::Query, routing::post, Json};
    use serde_json::json;
    use std::collections::HashMap;

    fn eth(s: &str) -> U256 {
        parse_ether(s).unwrap()
    }

    #[test]
    fn required_funds_adds_fee_and_gas() {
        // 1 ETH at 1% fee plus .00003 gas
        assert_eq!(
            required_funds(eth("1"), 10, eth(".00003")),
            eth("1.01003")
        );
        assert_eq!(required_funds(eth("1"), 0, eth(".00003")), eth("1.00003"));
        assert_eq!(required_funds(U256::ZERO, 10, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn classification_by_reason() {
        assert!(matches!(
            RelayError::classify(ChainError::Reverted("TransactionWillFail: nope".into())),
            RelayError::PreflightFailed(_)
        ));
        assert!(matches!(
            RelayError::classify(ChainError::RpcError("insufficient funds for gas".into())),
            RelayError::RelayerUnderfunded(_)
        ));
        assert!(matches!(
            RelayError::classify(ChainError::ContractError("execution reverted: bad sig".into())),
            RelayError::BadSignature(_)
        ));
        assert!(matches!(
            RelayError::classify(ChainError::RpcError("timeout".into())),
            RelayError::Other(_)
        ));
    }

    #[test]
    fn user_messages() {
        let insufficient = RelayError::InsufficientFunds {
            balance: U256::ZERO,
            required: U256::from(1u64),
        };
        assert_eq!(insufficient.user_message(), messages::INSUFFICIENT_FUNDS);
        assert_eq!(
            RelayError::BadSignature("x".into()).user_message(),
            messages::TRANSFER_FAILED
        );
        assert_eq!(
            RelayError::Wallet(WalletError::Rejected).user_message(),
            messages::TRANSFER_FAILED
        );
    }

    fn fixtures(balance: &str) -> (Settings, EnclaveClient, Session, LocalWallet) {
        fixtures_at(balance, "http://127.0.0.1:9")
    }

    fn fixtures_at(balance: &str, rpc_url: &str) -> (Settings, EnclaveClient, Session, LocalWallet) {
        let settings = Settings::from_lookup(|name| {
            HashMap::from([("ENCLAVE_RPC_URL", rpc_url)])
                .get(name)
                .map(|v| v.to_string())
        })
        .unwrap();
        let chain = ChainClient::new(SAPPHIRE_TESTNET, rpc_url).unwrap();
        let enclave = EnclaveClient::new(chain, TESTNET_CONTRACTS);
        let wallet = LocalWallet::new(
            signer_from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap(),
            SAPPHIRE_TESTNET,
            rpc_url,
        )
        .unwrap();
        let session = Session::from_parts(
            wallet.address(),
            Bytes::from(vec![0u8; 65]),
            1,
            AccountSnapshot {
                recovered_address: wallet.address(),
                txn_count: 0,
                balance: eth(balance),
                approved_address_count: None,
                origin_address: None,
            },
            5,
        );
        (settings, enclave, session, wallet)
    }

    #[tokio::test]
    async fn insufficient_balance_stops_before_signing() {
        let (settings, enclave, mut session, wallet) = fixtures("0.01");
        let mut pipeline = RelayPipeline::new(&enclave, None, &settings);
        let request = RelayRequest {
            kind: RelayKind::Transfer {
                recipient: Address::repeat_byte(0x33),
                internal: false,
            },
            amount: ".01".to_string(),
            route: RelayRoute::OnChain,
        };

        let err = pipeline
            .submit(&mut session, &wallet, &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InsufficientFunds { .. }));
        assert_eq!(err.user_message(), messages::INSUFFICIENT_FUNDS);
        assert_eq!(pipeline.phase(), RelayPhase::Failed);
    }

    #[tokio::test]
    async fn malformed_amount_is_rejected() {
        let (settings, enclave, mut session, wallet) = fixtures("1");
        let mut pipeline = RelayPipeline::new(&enclave, None, &settings);
        let request = RelayRequest {
            kind: RelayKind::Withdraw,
            amount: "1.2.3".to_string(),
            route: RelayRoute::Endpoint,
        };
        let err = pipeline
            .submit(&mut session, &wallet, &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn endpoint_withdraw_confirms_and_refreshes_session() {
        let account = signer_from_hex(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap()
        .address();

        // The enclave echoes the signed destination and nonce as its
        // meta-transaction; after the relay the account has one transaction.
        let stub = RpcStub::new(SAPPHIRE_TESTNET.chain_id, move |input| {
            if input.starts_with(IStirEnclave::createmetaTXNCall::SELECTOR.as_slice()) {
                let call = IStirEnclave::createmetaTXNCall::abi_decode(input).ok()?;
                let mut echoed = call.data._dest.to_vec();
                echoed.extend_from_slice(&call.data.nonce.to_be_bytes::<32>());
                Some((Bytes::from(echoed),).abi_encode_params())
            } else if input
                .starts_with(IStirEnclave::recoverAddressFromSignatureCall::SELECTOR.as_slice())
            {
                let mut out = account.into_word().to_vec();
                out.extend_from_slice(&uint_word(1));
                out.extend_from_slice(&uint_word(740_000_000_000_000_000));
                Some(out)
            } else {
                None
            }
        });
        let router = stub.router().route(
            "/relay",
            post(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "status": format!("{}|{}|{}", q["result"], q["numString"], q["feeRate"])
                }))
            }),
        );
        let url = serve(router).await;

        let (settings, enclave, mut session, wallet) = fixtures_at("1", &url);
        let endpoint = WithdrawEndpoint::new(format!("{url}/relay")).unwrap();
        let mut pipeline = RelayPipeline::new(&enclave, Some(&endpoint), &settings);
        let request = RelayRequest {
            kind: RelayKind::Withdraw,
            amount: ".25".to_string(),
            route: RelayRoute::Endpoint,
        };

        let outcome = pipeline
            .submit(&mut session, &wallet, &request, &CancellationToken::new())
            .await
            .unwrap();

        let mut signed = account.to_vec();
        signed.extend_from_slice(&uint_word(0));
        assert_eq!(
            outcome.endpoint_status,
            Some(format!("{}|0.25|0", hex::encode_prefixed(signed)))
        );
        assert_eq!(outcome.route, RelayRoute::Endpoint);
        assert_eq!(outcome.tx_hash, None);
        assert_eq!(pipeline.phase(), RelayPhase::Confirmed);

        assert_eq!(session.nonce(), 1);
        assert_eq!(session.balance(), eth("0.74"));
        assert_eq!(session.paginator().total_pages(), 1);
    }

    #[tokio::test]
    async fn endpoint_route_without_endpoint_fails() {
        let stub = RpcStub::new(SAPPHIRE_TESTNET.chain_id, |input| {
            input
                .starts_with(IStirEnclave::createmetaTXNCall::SELECTOR.as_slice())
                .then(|| (Bytes::from(vec![1u8]),).abi_encode_params())
        });
        let url = serve(stub.router()).await;
        let (settings, enclave, mut session, wallet) = fixtures_at("1", &url);
        let mut pipeline = RelayPipeline::new(&enclave, None, &settings);
        let request = RelayRequest {
            kind: RelayKind::Withdraw,
            amount: ".1".to_string(),
            route: RelayRoute::Endpoint,
        };
        let err = pipeline
            .submit(&mut session, &wallet, &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::EndpointUnavailable));
        assert_eq!(pipeline.phase(), RelayPhase::Failed);
        assert_eq!(session.nonce(), 0);
    }
}
