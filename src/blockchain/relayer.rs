// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relayer-role account.
//!
//! Holds the key the enclave recognises as a relayer and submits the
//! enclave-signed meta-transactions that only a relayer may send:
//! `_trackTxn` for transfers and withdrawals, and the three address
//! approval calls.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::DynProvider;
use alloy::sol_types::SolCall;
use tracing::info;

use super::approvals::ApprovalKind;
use super::client::{map_contract_error, ChainClient, ChainError};
use super::contracts::IStirEnclave;
use super::types::TxReceipt;
use crate::config::{DEPOSIT_GAS_PRICE_WEI, RECEIPT_TIMEOUT};

#[derive(Debug, Clone)]
pub struct RelayerAccount {
    chain: ChainClient,
    enclave: Address,
    receipt_timeout: Duration,
}

impl RelayerAccount {
    /// `chain` must carry the relayer signer.
    pub fn new(chain: ChainClient, enclave: Address) -> Result<Self, ChainError> {
        if chain.signer_address().is_none() {
            return Err(ChainError::InvalidPrivateKey(
                "relayer client has no signer".to_string(),
            ));
        }
        Ok(Self {
            chain,
            enclave,
            receipt_timeout: RECEIPT_TIMEOUT,
        })
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn chain(&self) -> &ChainClient {
        &self.chain
    }

    pub fn address(&self) -> Option<Address> {
        self.chain.signer_address()
    }

    fn instance(&self) -> IStirEnclave::IStirEnclaveInstance<DynProvider> {
        IStirEnclave::new(self.enclave, self.chain.provider().clone())
    }

    /// Record a transfer or withdrawal (`_trackTxn`).
    pub async fn track_txn(
        &self,
        meta_txn: Bytes,
        num_string: &str,
        gas_price: U256,
        fee_rate: u64,
    ) -> Result<TxReceipt, ChainError> {
        let pending = self
            .instance()
            ._trackTxn(meta_txn, num_string.to_string(), gas_price, U256::from(fee_rate))
            .send()
            .await
            .map_err(map_contract_error)?;
        let tx_hash = *pending.tx_hash();
        info!(tx_hash = %tx_hash, amount = %num_string, fee_rate, "Submitted _trackTxn");
        self.confirm(tx_hash).await
    }

    /// Gas charged per approval relay, as currently set on the enclave.
    ///
    /// An unset (zero) price falls back to [`DEPOSIT_GAS_PRICE_WEI`].
    pub async fn deposit_gas_price(&self) -> Result<U256, ChainError> {
        let price = self
            .instance()
            .depositGasPrice()
            .call()
            .await
            .map_err(map_contract_error)?;
        if price.is_zero() {
            return Ok(U256::from(DEPOSIT_GAS_PRICE_WEI));
        }
        Ok(price)
    }

    /// Calldata for an approval-family call at the enclave's deposit gas price.
    pub async fn approval_calldata(
        &self,
        kind: ApprovalKind,
        meta_txn: Bytes,
        phrase: &str,
    ) -> Result<Bytes, ChainError> {
        let gas_price = self.deposit_gas_price().await?;
        Ok(approval_call(kind, meta_txn, phrase, gas_price))
    }

    /// Submit an approval-family meta-transaction at the deposit gas price.
    pub async fn submit_approval(
        &self,
        kind: ApprovalKind,
        meta_txn: Bytes,
        phrase: &str,
    ) -> Result<TxReceipt, ChainError> {
        let calldata = self.approval_calldata(kind, meta_txn, phrase).await?;
        let tx_hash = self
            .chain
            .send_transaction(self.enclave, calldata, U256::ZERO)
            .await?;
        info!(tx_hash = %tx_hash, kind = kind.as_str(), "Submitted approval transaction");
        self.confirm(tx_hash).await
    }

    async fn confirm(&self, tx_hash: B256) -> Result<TxReceipt, ChainError> {
        let receipt = self
            .chain
            .wait_for_receipt(tx_hash, self.receipt_timeout)
            .await?;
        if !receipt.success {
            return Err(ChainError::Reverted(format!(
                "transaction {} reverted",
                receipt.tx_hash
            )));
        }
        Ok(receipt)
    }
}

fn approval_call(kind: ApprovalKind, meta_txn: Bytes, phrase: &str, gas_price: U256) -> Bytes {
    let phrase = phrase.to_string();
    match kind {
        ApprovalKind::Propose => IStirEnclave::proposeAddressCall {
            metaTxn: meta_txn,
            phrase,
            gasPrice: gas_price,
        }
        .abi_encode(),
        ApprovalKind::Confirm => IStirEnclave::confirmApprovalCall {
            metaTxn: meta_txn,
            phrase,
            gasPrice: gas_price,
        }
        .abi_encode(),
        ApprovalKind::Revoke => IStirEnclave::revokeAddressCall {
            metaTxn: meta_txn,
            phrase,
            gasPrice: gas_price,
        }
        .abi_encode(),
    }
    .into()
}
