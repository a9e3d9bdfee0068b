// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrative contract calls and the authorised history lookup.
//!
//! Writes are sent from the wallet's account on the enclave chain; the
//! contract rejects callers without the admin role. History lookups for
//! other accounts require a `personal_sign` over `keccak256("Hello, world!")`
//! from an account the enclave has marked as authorised.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use utoipa::ToSchema;

use super::client::{map_contract_error, ChainError};
use super::contracts::IStirEnclave;
use super::enclave::EnclaveClient;
use super::signing::challenge_hash;
use super::types::TxReceipt;
use super::wallet::{request_signature, WalletError, WalletProvider};
use crate::config::{messages, Settings, RECEIPT_TIMEOUT};
use crate::pagination::Paginator;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Admin transaction {0} reverted")]
    Reverted(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Owner-side write on the enclave contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ClaimFee,
    ClaimGas,
    GrantAuth(Address),
    SetFeeWallet(Address),
    SetGasWallet(Address),
    FlipRelayer(Address),
    FlipAuth(Address),
    FlipAdmin(Address),
    BlockWallet(Address),
    /// Wei charged per approval relay.
    SetDepositGasPrice(U256),
}

impl AdminAction {
    pub fn name(&self) -> &'static str {
        match self {
            AdminAction::ClaimFee => "claimFee",
            AdminAction::ClaimGas => "claimGas",
            AdminAction::GrantAuth(_) => "grantAuth",
            AdminAction::SetFeeWallet(_) => "setFeeWallet",
            AdminAction::SetGasWallet(_) => "setGasWallet",
            AdminAction::FlipRelayer(_) => "flipRelayer",
            AdminAction::FlipAuth(_) => "flipAuth",
            AdminAction::FlipAdmin(_) => "flipAdmin",
            AdminAction::BlockWallet(_) => "blockWallet",
            AdminAction::SetDepositGasPrice(_) => "setDepositGasPrice",
        }
    }

    pub fn calldata(&self) -> Vec<u8> {
        use IStirEnclave::*;
        match *self {
            AdminAction::ClaimFee => claimFeeCall {}.abi_encode(),
            AdminAction::ClaimGas => claimGasCall {}.abi_encode(),
            AdminAction::GrantAuth(authority) => grantAuthCall { authority }.abi_encode(),
            AdminAction::SetFeeWallet(wallet) => setFeeWalletCall { wallet }.abi_encode(),
            AdminAction::SetGasWallet(wallet) => setGasWalletCall { wallet }.abi_encode(),
            AdminAction::FlipRelayer(relayer) => flipRelayerCall { relayer }.abi_encode(),
            AdminAction::FlipAuth(wallet) => flipAuthCall { wallet }.abi_encode(),
            AdminAction::FlipAdmin(wallet) => flipAdminCall { wallet }.abi_encode(),
            AdminAction::BlockWallet(wallet) => blockWalletCall { wallet }.abi_encode(),
            AdminAction::SetDepositGasPrice(price) => setDepositGasPriceCall { price }.abi_encode(),
        }
    }
}

async fn active_account<W: WalletProvider>(
    wallet: &mut W,
    settings: &Settings,
) -> Result<Address, WalletError> {
    let account = wallet
        .request_accounts()
        .await?
        .first()
        .copied()
        .ok_or(WalletError::NoAccounts)?;
    let chain = settings.enclave_chain();
    wallet.switch_chain(&chain.network, &chain.rpc_url).await?;
    Ok(account)
}

/// Send `action` from the wallet's account and wait for it to be mined.
pub async fn execute<W: WalletProvider>(
    wallet: &mut W,
    settings: &Settings,
    action: AdminAction,
    cancel: &CancellationToken,
) -> Result<TxReceipt, AdminError> {
    let account = active_account(wallet, settings).await?;
    let tx_hash = request_signature(
        wallet.send_transaction(
            account,
            settings.contracts.enclave,
            action.calldata().into(),
            U256::ZERO,
        ),
        settings.signing_timeout,
        cancel,
    )
    .await?;

    let receipt = wallet
        .active_chain()
        .wait_for_receipt(tx_hash, RECEIPT_TIMEOUT)
        .await?;
    if !receipt.success {
        return Err(AdminError::Reverted(receipt.tx_hash));
    }
    info!(action = action.name(), tx_hash = %receipt.tx_hash, "Admin action confirmed");
    Ok(receipt)
}

/// Contract-wide settings readable by anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContractStatus {
    #[schema(value_type = String)]
    pub fee_wallet: Address,
    #[schema(value_type = String)]
    pub gas_wallet: Address,
    #[schema(value_type = String)]
    pub deposit_gas_price: U256,
    /// Unclaimed service fees in wei
    #[schema(value_type = String)]
    pub fee_claim: U256,
}

/// Role flags the enclave holds for one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleStatus {
    pub relayer: bool,
    pub auth: bool,
    pub admin: bool,
    pub blocked: bool,
}

pub async fn contract_status(enclave: &EnclaveClient) -> Result<ContractStatus, ChainError> {
    let instance = enclave.instance();
    let fee_wallet = instance.feeWallet().call().await.map_err(map_contract_error)?;
    let gas_wallet = instance.gasWallet().call().await.map_err(map_contract_error)?;
    let deposit_gas_price = instance
        .depositGasPrice()
        .call()
        .await
        .map_err(map_contract_error)?;
    let fee_claim = instance.feeClaim().call().await.map_err(map_contract_error)?;
    Ok(ContractStatus {
        fee_wallet,
        gas_wallet,
        deposit_gas_price,
        fee_claim,
    })
}

pub async fn role_status(enclave: &EnclaveClient, wallet: Address) -> Result<RoleStatus, ChainError> {
    let instance = enclave.instance();
    Ok(RoleStatus {
        relayer: instance
            .relayerStatus(wallet)
            .call()
            .await
            .map_err(map_contract_error)?,
        auth: instance.authStatus(wallet).call().await.map_err(map_contract_error)?,
        admin: instance.adminStatus(wallet).call().await.map_err(map_contract_error)?,
        blocked: instance.blockedList(wallet).call().await.map_err(map_contract_error)?,
    })
}

/// Authorised view of another account's history.
#[derive(Debug, Clone)]
pub struct AdminLookup {
    admin: Address,
    target: Address,
    signature: Bytes,
    paginator: Paginator,
}

impl AdminLookup {
    /// Sign the admin challenge and read `target`'s transaction count.
    pub async fn open<W: WalletProvider>(
        wallet: &mut W,
        enclave: &EnclaveClient,
        settings: &Settings,
        target: Address,
        cancel: &CancellationToken,
    ) -> Result<Self, AdminError> {
        let admin = active_account(wallet, settings).await?;
        let challenge = challenge_hash(messages::ADMIN_CHALLENGE);
        let signature = request_signature(
            wallet.sign_message(admin, challenge.as_slice()),
            settings.signing_timeout,
            cancel,
        )
        .await?;

        let txn_count = enclave.auth_txn_count(&signature, target, admin).await?;
        info!(admin = %admin, target = %target, txn_count, "Opened admin history lookup");
        Ok(Self {
            admin,
            target,
            signature,
            paginator: Paginator::new(txn_count, settings.page_size),
        })
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator {
        &mut self.paginator
    }

    /// Rows of the current page, newest first.
    pub async fn current_page(
        &self,
        enclave: &EnclaveClient,
    ) -> Result<Vec<IStirEnclave::TxnData>, ChainError> {
        let mut rows = enclave
            .auth_history_window(&self.signature, self.target, self.paginator.window(), self.admin)
            .await?;
        rows.reverse();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calldata_uses_matching_selector() {
        let who = Address::repeat_byte(0x11);
        let data = AdminAction::FlipRelayer(who).calldata();
        assert_eq!(&data[..4], IStirEnclave::flipRelayerCall::SELECTOR.as_slice());
        let decoded = IStirEnclave::flipRelayerCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.relayer, who);

        assert_eq!(
            AdminAction::ClaimFee.calldata(),
            IStirEnclave::claimFeeCall::SELECTOR.to_vec()
        );
    }

    #[test]
    fn deposit_gas_price_is_encoded_as_uint() {
        let price = U256::from(690_000_000_000_000u64);
        let data = AdminAction::SetDepositGasPrice(price).calldata();
        let decoded = IStirEnclave::setDepositGasPriceCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.price, price);
    }

    #[test]
    fn names_match_contract_functions() {
        assert_eq!(AdminAction::ClaimGas.name(), "claimGas");
        assert_eq!(AdminAction::BlockWallet(Address::ZERO).name(), "blockWallet");
        assert_eq!(
            AdminAction::SetGasWallet(Address::ZERO).name(),
            IStirEnclave::setGasWalletCall::SIGNATURE.split('(').next().unwrap()
        );
    }

    #[test]
    fn challenge_is_keccak_of_greeting() {
        assert_eq!(
            challenge_hash(messages::ADMIN_CHALLENGE),
            alloy::primitives::keccak256(b"Hello, world!")
        );
    }
}
