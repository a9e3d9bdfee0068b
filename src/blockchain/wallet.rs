// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet providers: where accounts, chain switching and signatures come from.
//!
//! Two implementations exist. [`LocalWallet`] holds a private key and talks to
//! chain RPC endpoints directly. [`RpcWallet`] forwards the browser-wallet
//! JSON-RPC methods (`eth_requestAccounts`, `wallet_switchEthereumChain`,
//! `eth_signTypedData_v4`, `personal_sign`, ...) to a remote signer endpoint.
//!
//! Every signature request goes through [`request_signature`], which bounds
//! it by a timeout and a [`CancellationToken`].

use std::{future::Future, time::Duration};

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, Signer},
    transports::TransportError,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::client::{ChainClient, ChainError};
use super::eip712::TypedPayload;
use super::types::NetworkConfig;

/// Wallet error code for "unrecognized chain".
pub const CHAIN_NOT_ADDED_CODE: i64 = 4902;

/// EIP-1193 code for a request the user rejected.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors raised by wallet providers.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("User rejected the request")]
    Rejected,

    #[error("Signing request timed out after {0}s")]
    Timeout(u64),

    #[error("Signing request cancelled")]
    Cancelled,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Wallet RPC error ({code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Wallet transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl WalletError {
    fn from_rpc(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) if payload.code == USER_REJECTED_CODE => WalletError::Rejected,
            Some(payload) => WalletError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => WalletError::Transport(err.to_string()),
        }
    }
}

/// Source of accounts, chain state and signatures.
pub trait WalletProvider: Send + Sync {
    /// Accounts the wallet exposes; the first is the active one.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<u64, WalletError>> + Send;

    /// Make `network` the active chain, registering it with the wallet first
    /// when the wallet does not know it.
    fn switch_chain(
        &mut self,
        network: &NetworkConfig,
        rpc_url: &str,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn block_number(&self) -> impl Future<Output = Result<u64, WalletError>> + Send;

    /// 65-byte signature over an EIP-712 payload.
    fn sign_typed_data(
        &self,
        account: Address,
        payload: &TypedPayload,
    ) -> impl Future<Output = Result<Bytes, WalletError>> + Send;

    /// 65-byte `personal_sign` signature over `message`.
    fn sign_message(
        &self,
        account: Address,
        message: &[u8],
    ) -> impl Future<Output = Result<Bytes, WalletError>> + Send;

    /// Send a transaction from `account` on the active chain.
    fn send_transaction(
        &self,
        account: Address,
        to: Address,
        input: Bytes,
        value: U256,
    ) -> impl Future<Output = Result<B256, WalletError>> + Send;

    /// Read-only client for the active chain, used for receipts and views.
    fn active_chain(&self) -> &ChainClient;
}

/// Run a wallet request bounded by `timeout` and `cancel`.
pub async fn request_signature<T, F>(
    request: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, WalletError>
where
    F: Future<Output = Result<T, WalletError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(WalletError::Cancelled),
        result = tokio::time::timeout(timeout, request) => {
            result.map_err(|_| WalletError::Timeout(timeout.as_secs()))?
        }
    }
}

/// Wallet backed by a local private key.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    active: ChainClient,
}

impl LocalWallet {
    pub fn new(
        signer: PrivateKeySigner,
        network: NetworkConfig,
        rpc_url: &str,
    ) -> Result<Self, WalletError> {
        let active = ChainClient::with_signer(network, rpc_url, signer.clone())?;
        Ok(Self { signer, active })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.signer.address()])
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.active.get_chain_id().await?)
    }

    async fn switch_chain(
        &mut self,
        network: &NetworkConfig,
        rpc_url: &str,
    ) -> Result<(), WalletError> {
        if self.active.network() == network {
            return Ok(());
        }
        self.active = ChainClient::with_signer(network.clone(), rpc_url, self.signer.clone())?;
        tracing::debug!(network = network.name, "Local wallet switched chain");
        Ok(())
    }

    async fn block_number(&self) -> Result<u64, WalletError> {
        Ok(self.active.get_block_number().await?)
    }

    async fn sign_typed_data(
        &self,
        _account: Address,
        payload: &TypedPayload,
    ) -> Result<Bytes, WalletError> {
        let signature = self
            .signer
            .sign_hash(&payload.digest)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }

    async fn sign_message(&self, _account: Address, message: &[u8]) -> Result<Bytes, WalletError> {
        let signature = self
            .signer
            .sign_message(message)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }

    async fn send_transaction(
        &self,
        _account: Address,
        to: Address,
        input: Bytes,
        value: U256,
    ) -> Result<B256, WalletError> {
        Ok(self.active.send_transaction(to, input, value).await?)
    }

    fn active_chain(&self) -> &ChainClient {
        &self.active
    }
}

/// Wallet reached over JSON-RPC, speaking the browser-wallet method set.
#[derive(Debug, Clone)]
pub struct RpcWallet {
    endpoint: String,
    wallet: WalletEndpoint,
    active: ChainClient,
}

#[derive(Clone)]
struct WalletEndpoint(DynProvider);

impl std::fmt::Debug for WalletEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WalletEndpoint")
    }
}

impl RpcWallet {
    /// `endpoint` is the wallet; `network`/`rpc_url` is the chain it starts on.
    pub fn new(endpoint: &str, network: NetworkConfig, rpc_url: &str) -> Result<Self, WalletError> {
        let url: url::Url = endpoint
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        let wallet = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url)
            .erased();
        Ok(Self {
            endpoint: endpoint.to_string(),
            wallet: WalletEndpoint(wallet),
            active: ChainClient::new(network, rpc_url)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn add_chain(&self, network: &NetworkConfig, rpc_url: &str) -> Result<(), WalletError> {
        let params = json!([{
            "chainId": network.chain_id_hex(),
            "chainName": network.name,
            "rpcUrls": [rpc_url],
            "blockExplorerUrls": [network.explorer_url],
        }]);
        self.wallet
            .0
            .raw_request::<_, serde_json::Value>("wallet_addEthereumChain".into(), params)
            .await
            .map_err(WalletError::from_rpc)?;
        Ok(())
    }

    async fn request_switch(&self, network: &NetworkConfig) -> Result<(), WalletError> {
        let params = json!([{ "chainId": network.chain_id_hex() }]);
        self.wallet
            .0
            .raw_request::<_, serde_json::Value>("wallet_switchEthereumChain".into(), params)
            .await
            .map_err(WalletError::from_rpc)?;
        Ok(())
    }
}

impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let accounts: Vec<Address> = self
            .wallet
            .0
            .raw_request("eth_requestAccounts".into(), ())
            .await
            .map_err(WalletError::from_rpc)?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let id: alloy::primitives::U64 = self
            .wallet
            .0
            .raw_request("eth_chainId".into(), ())
            .await
            .map_err(WalletError::from_rpc)?;
        Ok(id.to::<u64>())
    }

    async fn switch_chain(
        &mut self,
        network: &NetworkConfig,
        rpc_url: &str,
    ) -> Result<(), WalletError> {
        if self.chain_id().await? == network.chain_id {
            tracing::debug!(network = network.name, "Wallet already on requested chain");
            self.active = ChainClient::new(network.clone(), rpc_url)?;
            return Ok(());
        }
        match self.request_switch(network).await {
            Ok(()) => {}
            Err(WalletError::Rpc { code, .. }) if code == CHAIN_NOT_ADDED_CODE => {
                tracing::info!(network = network.name, "Chain unknown to wallet, adding it");
                self.add_chain(network, rpc_url).await?;
                self.request_switch(network).await?;
            }
            Err(e) => return Err(e),
        }
        self.active = ChainClient::new(network.clone(), rpc_url)?;
        Ok(())
    }

    async fn block_number(&self) -> Result<u64, WalletError> {
        Ok(self.active.get_block_number().await?)
    }

    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &TypedPayload,
    ) -> Result<Bytes, WalletError> {
        self.wallet
            .0
            .raw_request(
                "eth_signTypedData_v4".into(),
                (account, payload.to_json_string()),
            )
            .await
            .map_err(WalletError::from_rpc)
    }

    async fn sign_message(&self, account: Address, message: &[u8]) -> Result<Bytes, WalletError> {
        self.wallet
            .0
            .raw_request(
                "personal_sign".into(),
                (Bytes::copy_from_slice(message), account),
            )
            .await
            .map_err(WalletError::from_rpc)
    }

    async fn send_transaction(
        &self,
        account: Address,
        to: Address,
        input: Bytes,
        value: U256,
    ) -> Result<B256, WalletError> {
        let tx = TransactionRequest::default()
            .from(account)
            .to(to)
            .input(input.into())
            .value(value);
        self.wallet
            .0
            .raw_request("eth_sendTransaction".into(), [tx])
            .await
            .map_err(WalletError::from_rpc)
    }

    fn active_chain(&self) -> &ChainClient {
        &self.active
    }
}
