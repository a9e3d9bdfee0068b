// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed-in account state.
//!
//! A [`Session`] owns everything that used to be ambient page state: the
//! connected account, the login signature and its deadline, the latest
//! account snapshot and the history cursor. Operations that change it take
//! `&mut Session`.

use alloy::primitives::{Address, Bytes, U256};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::blockchain::{
    contracts::IStirEnclave::TxnData,
    eip712::MessageBuilder,
    enclave::EnclaveClient,
    wallet::{request_signature, WalletError, WalletProvider},
    AccountSnapshot, ChainError,
};
use crate::config::{messages, Settings};
use crate::pagination::Paginator;

#[derive(Debug, Clone)]
pub struct Session {
    account: Address,
    login_signature: Bytes,
    deadline: u64,
    snapshot: AccountSnapshot,
    paginator: Paginator,
    page_size: u64,
}

impl Session {
    /// Sign in: switch the wallet to the enclave chain, sign the login
    /// challenge with the current block as deadline and load the snapshot.
    pub async fn login<W: WalletProvider>(
        wallet: &mut W,
        enclave: &EnclaveClient,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> Result<Self, WalletError> {
        let account = wallet
            .request_accounts()
            .await?
            .first()
            .copied()
            .ok_or(WalletError::NoAccounts)?;

        let chain = settings.enclave_chain();
        wallet.switch_chain(&chain.network, &chain.rpc_url).await?;

        let deadline = wallet.block_number().await?;
        let builder = MessageBuilder::new(settings.enclave_network.chain_id, settings.contracts.enclave);
        let payload = builder.login(messages::LOGIN, deadline);

        let login_signature = request_signature(
            wallet.sign_typed_data(account, &payload),
            settings.signing_timeout,
            cancel,
        )
        .await?;

        let snapshot = enclave.account_snapshot(&login_signature, deadline).await?;
        if snapshot.recovered_address != account {
            warn!(
                account = %account,
                recovered = %snapshot.recovered_address,
                "Login signature recovered to a different address"
            );
        }
        info!(account = %account, txn_count = snapshot.txn_count, "Signed in");

        Ok(Self::from_parts(
            account,
            login_signature,
            deadline,
            snapshot,
            settings.page_size,
        ))
    }

    /// Assemble a session from an existing login.
    pub fn from_parts(
        account: Address,
        login_signature: Bytes,
        deadline: u64,
        snapshot: AccountSnapshot,
        page_size: u64,
    ) -> Self {
        let paginator = Paginator::new(snapshot.txn_count, page_size);
        Self {
            account,
            login_signature,
            deadline,
            snapshot,
            paginator,
            page_size,
        }
    }

    /// Re-read the snapshot and move the history cursor back to the newest page.
    pub async fn refresh(&mut self, enclave: &EnclaveClient) -> Result<(), ChainError> {
        let snapshot = enclave
            .account_snapshot(&self.login_signature, self.deadline)
            .await?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    pub fn apply_snapshot(&mut self, snapshot: AccountSnapshot) {
        self.paginator = Paginator::new(snapshot.txn_count, self.page_size);
        self.snapshot = snapshot;
    }

    /// Rows of the current history page, newest first.
    pub async fn current_page(&self, enclave: &EnclaveClient) -> Result<Vec<TxnData>, ChainError> {
        let mut rows = enclave
            .history_window(&self.login_signature, self.deadline, self.paginator.window())
            .await?;
        rows.reverse();
        Ok(rows)
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn login_signature(&self) -> &Bytes {
        &self.login_signature
    }

    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    pub fn snapshot(&self) -> &AccountSnapshot {
        &self.snapshot
    }

    /// Next meta-transaction nonce.
    pub fn nonce(&self) -> u64 {
        self.snapshot.txn_count
    }

    pub fn balance(&self) -> U256 {
        self.snapshot.balance
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator {
        &mut self.paginator
    }
}
