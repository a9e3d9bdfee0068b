// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read access to the StirEnclave contract.
//!
//! Signature-gated views are called with `from` set to the relayer contract,
//! matching how the enclave expects confidential reads to arrive.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};

use super::client::{map_contract_error, ChainClient, ChainError};
use super::contracts::IStirEnclave;
use super::snapshot::decode_snapshot;
use super::types::{AccountSnapshot, ContractAddresses};
use crate::config::messages;
use crate::pagination::PageWindow;

/// Client for the enclave contract on the confidential chain.
#[derive(Debug, Clone)]
pub struct EnclaveClient {
    chain: ChainClient,
    contracts: ContractAddresses,
}

impl EnclaveClient {
    pub fn new(chain: ChainClient, contracts: ContractAddresses) -> Self {
        Self { chain, contracts }
    }

    pub fn chain(&self) -> &ChainClient {
        &self.chain
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub(crate) fn instance(&self) -> IStirEnclave::IStirEnclaveInstance<alloy::providers::DynProvider> {
        IStirEnclave::new(self.contracts.enclave, self.chain.provider().clone())
    }

    /// Fetch the account snapshot for a login signature.
    pub async fn account_snapshot(
        &self,
        signature: &[u8],
        deadline: u64,
    ) -> Result<AccountSnapshot, ChainError> {
        let input = IStirEnclave::recoverAddressFromSignatureCall {
            signature: Bytes::copy_from_slice(signature),
            message: messages::LOGIN.to_string(),
            deadline: U256::from(deadline),
        }
        .abi_encode();

        let output = self
            .chain
            .call_raw(self.contracts.enclave, Some(self.contracts.relayer), input)
            .await?;

        let snapshot = decode_snapshot(&output).map_err(|e| ChainError::Decode(e.to_string()))?;
        tracing::debug!(
            account = %snapshot.recovered_address,
            txn_count = snapshot.txn_count,
            "Fetched account snapshot"
        );
        Ok(snapshot)
    }

    /// Fetch one history window for the signed-in account.
    pub async fn history_window(
        &self,
        signature: &[u8],
        deadline: u64,
        window: PageWindow,
    ) -> Result<Vec<IStirEnclave::TxnData>, ChainError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        self.instance()
            .recoverAddrTXNdata(
                Bytes::copy_from_slice(signature),
                messages::LOGIN.to_string(),
                U256::from(deadline),
                U256::from(window.start),
                U256::from(window.end),
            )
            .from(self.contracts.relayer)
            .call()
            .await
            .map_err(map_contract_error)
    }

    /// Origin (owning) address behind a login signature.
    pub async fn origin_address(&self, signature: &[u8]) -> Result<Address, ChainError> {
        self.instance()
            .recoverOriginFromSignature(
                Bytes::copy_from_slice(signature),
                messages::LOGIN.to_string(),
            )
            .from(self.contracts.relayer)
            .call()
            .await
            .map_err(map_contract_error)
    }

    /// Approved address at `index` for the signed-in account.
    pub async fn approved_address(
        &self,
        signature: &[u8],
        index: u64,
    ) -> Result<Address, ChainError> {
        self.instance()
            .getApprovedAddr(
                Bytes::copy_from_slice(signature),
                messages::LOGIN.to_string(),
                U256::from(index),
            )
            .from(self.contracts.relayer)
            .call()
            .await
            .map_err(map_contract_error)
    }

    /// Approval state of a wallet as reported by the enclave.
    pub async fn approval_check(&self, wallet: Address) -> Result<U256, ChainError> {
        self.instance()
            .approvalCheck(wallet)
            .call()
            .await
            .map_err(map_contract_error)
    }

    /// Have the enclave sign a transfer or withdrawal meta-transaction.
    pub async fn create_meta_txn(
        &self,
        meta: IStirEnclave::MetaTxn,
        from: Address,
    ) -> Result<Bytes, ChainError> {
        self.instance()
            .createmetaTXN(meta)
            .from(from)
            .call()
            .await
            .map_err(map_contract_error)
    }

    /// Have the enclave sign an address approval or revocation.
    pub async fn create_meta_txn_addr(
        &self,
        txn: IStirEnclave::AddrTxn,
        from: Address,
    ) -> Result<Bytes, ChainError> {
        self.instance()
            .createMetaTxnAddr(txn)
            .from(from)
            .call()
            .await
            .map_err(map_contract_error)
    }

    /// Number of transactions recorded for `wallet`, read with an admin challenge signature.
    pub async fn auth_txn_count(
        &self,
        signature: &[u8],
        wallet: Address,
        from: Address,
    ) -> Result<u64, ChainError> {
        let count = self
            .instance()
            .authGetTxnList(
                Bytes::copy_from_slice(signature),
                messages::ADMIN_CHALLENGE.to_string(),
                wallet,
            )
            .from(from)
            .call()
            .await
            .map_err(map_contract_error)?;
        u64::try_from(count).map_err(|_| ChainError::Decode(format!("txn count {count} exceeds u64")))
    }

    /// One admin history window for `wallet`.
    pub async fn auth_history_window(
        &self,
        signature: &[u8],
        wallet: Address,
        window: PageWindow,
        from: Address,
    ) -> Result<Vec<IStirEnclave::TxnData>, ChainError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        self.instance()
            .authGetTXNinfo(
                Bytes::copy_from_slice(signature),
                messages::ADMIN_CHALLENGE.to_string(),
                wallet,
                U256::from(window.start),
                U256::from(window.end),
            )
            .from(from)
            .call()
            .await
            .map_err(map_contract_error)
    }
}
