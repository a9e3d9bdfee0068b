// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC client shared by the enclave and host chains.

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::{Revert, SolError},
};

use super::contracts::IRelayer;
use super::types::*;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection to one EVM chain.
///
/// The provider is type-erased so read-only and signer-backed clients share
/// one type.
#[derive(Clone)]
pub struct ChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: DynProvider,
    /// Default sender when the provider carries a wallet
    signer_address: Option<Address>,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("network", &self.network.name)
            .field("signer_address", &self.signer_address)
            .finish()
    }
}

impl ChainClient {
    /// Create a read-only client.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, ChainError> {
        let url = parse_rpc_url(rpc_url)?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self {
            network,
            provider,
            signer_address: None,
        })
    }

    /// Create a client that signs and sends transactions with `signer`.
    pub fn with_signer(
        network: NetworkConfig,
        rpc_url: &str,
        signer: PrivateKeySigner,
    ) -> Result<Self, ChainError> {
        let url = parse_rpc_url(rpc_url)?;
        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        Ok(Self {
            network,
            provider,
            signer_address: Some(signer_address),
        })
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    /// Get the current block number.
    pub async fn get_block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    /// Get the chain id reported by the node.
    pub async fn get_chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    /// Get the native balance of an address, in wei.
    pub async fn get_native_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    /// Plain `eth_call` returning the raw output bytes.
    pub async fn call_raw(
        &self,
        to: Address,
        from: Option<Address>,
        input: Vec<u8>,
    ) -> Result<Bytes, ChainError> {
        let mut tx = TransactionRequest::default().to(to).input(input.into());
        if let Some(from) = from {
            tx = tx.from(from);
        }
        self.provider
            .call(tx)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    /// Broadcast an already-signed transaction and wait for its receipt.
    pub async fn send_raw_and_confirm(&self, raw_tx: &[u8]) -> Result<TxReceipt, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw_tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {}", e)))?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, network = self.network.name, "Raw transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get receipt: {}", e)))?;

        Ok(receipt_summary(&receipt))
    }

    /// Sign and send a transaction from the configured signer, returning its hash.
    pub async fn send_transaction(
        &self,
        to: Address,
        input: Bytes,
        value: U256,
    ) -> Result<B256, ChainError> {
        let from = self.signer_address.ok_or_else(|| {
            ChainError::TransactionFailed("Client has no signer".to_string())
        })?;
        let tx = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(input.into())
            .value(value);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(map_send_error)?;
        Ok(*pending.tx_hash())
    }

    /// Poll for a receipt until it appears or `timeout` elapses.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        timeout: Duration,
    ) -> Result<TxReceipt, ChainError> {
        let started = tokio::time::Instant::now();
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ChainError::RpcError(format!("Failed to get receipt: {}", e)))?;
            if let Some(receipt) = receipt {
                return Ok(receipt_summary(&receipt));
            }
            if started.elapsed() >= timeout {
                return Err(ChainError::TransactionFailed(format!(
                    "No receipt for {tx_hash} after {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.network.explorer_url, tx_hash)
    }
}

pub(crate) fn receipt_summary(receipt: &alloy::rpc::types::TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: format!("{:?}", receipt.transaction_hash),
        block_number: receipt.block_number.unwrap_or(0),
        gas_used: receipt.gas_used,
        success: receipt.status(),
    }
}

fn parse_rpc_url(rpc_url: &str) -> Result<url::Url, ChainError> {
    rpc_url
        .parse()
        .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))
}

/// Map a contract call error, decoding known revert payloads.
///
/// `TransactionWillFail(string)` and `Error(string)` reverts become
/// [`ChainError::Reverted`] carrying the reason; anything else keeps the
/// provider's message.
pub fn map_contract_error(err: alloy::contract::Error) -> ChainError {
    if let Some(data) = err.as_revert_data() {
        if let Some(reason) = decode_revert_reason(&data) {
            return ChainError::Reverted(reason);
        }
    }
    ChainError::ContractError(err.to_string())
}

/// Map a failed `eth_sendTransaction`, keeping a decodable revert reason.
fn map_send_error(err: alloy::transports::TransportError) -> ChainError {
    let reason = err
        .as_error_resp()
        .and_then(|payload| payload.as_revert_data())
        .and_then(|data| decode_revert_reason(&data));
    match reason {
        Some(reason) => ChainError::Reverted(reason),
        None => ChainError::TransactionFailed(format!("Failed to send: {}", err)),
    }
}

/// Decode a revert reason from raw revert data.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if let Ok(err) = IRelayer::TransactionWillFail::abi_decode(data) {
        return Some(format!("TransactionWillFail: {}", err.reason));
    }
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    if data.starts_with(IRelayer::SubcallError::SELECTOR.as_slice()) {
        return Some("SubcallError".to_string());
    }
    None
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Decode error: {0}")]
    Decode(String),
}
