// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deposits into the host-chain contract.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::ChainError;
use super::contracts::IStirHost;
use super::types::TxReceipt;
use super::wallet::{request_signature, WalletError, WalletProvider};
use crate::config::{messages, Settings, MIN_DEPOSIT_ETH};
use crate::format::{format_number_string, parse_ether, FormatError};

#[derive(Debug, thiserror::Error)]
pub enum DepositError {
    #[error("Deposit of {amount} is below the minimum")]
    TooSmall { amount: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] FormatError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl DepositError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DepositError::TooSmall { .. } => messages::DEPOSIT_TOO_SMALL,
            _ => messages::DEPOSIT_FAILED,
        }
    }
}

/// A mined deposit transaction; `receipt.success` tells whether it reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    pub receipt: TxReceipt,
    pub explorer_url: String,
}

impl DepositOutcome {
    pub fn user_message(&self) -> &'static str {
        if self.receipt.success {
            messages::DEPOSIT_SUCCESS
        } else {
            messages::DEPOSIT_REVERTED
        }
    }
}

/// Parse a deposit amount and enforce the minimum.
pub fn deposit_value(amount: &str) -> Result<U256, DepositError> {
    let num_string = format_number_string(amount.trim());
    let value = parse_ether(&num_string)?;
    if value < parse_ether(MIN_DEPOSIT_ETH)? {
        return Err(DepositError::TooSmall { amount: num_string });
    }
    Ok(value)
}

/// Deposit `amount` ether from the wallet's active account into the host contract.
pub async fn deposit<W: WalletProvider>(
    wallet: &mut W,
    settings: &Settings,
    amount: &str,
    receipt_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<DepositOutcome, DepositError> {
    let value = deposit_value(amount)?;

    let account = wallet
        .request_accounts()
        .await?
        .first()
        .copied()
        .ok_or(WalletError::NoAccounts)?;
    let chain = settings.host_chain();
    wallet.switch_chain(&chain.network, &chain.rpc_url).await?;

    let input = IStirHost::depositCall {}.abi_encode();
    let tx_hash = request_signature(
        wallet.send_transaction(account, settings.contracts.host, input.into(), value),
        settings.signing_timeout,
        cancel,
    )
    .await?;
    info!(tx_hash = %tx_hash, account = %account, value = %value, "Deposit submitted");

    let active = wallet.active_chain();
    let receipt = active.wait_for_receipt(tx_hash, receipt_timeout).await?;
    if receipt.success {
        info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "Deposit confirmed");
    } else {
        warn!(tx_hash = %receipt.tx_hash, "Deposit reverted");
    }
    Ok(DepositOutcome {
        explorer_url: active.explorer_tx_url(&receipt.tx_hash),
        receipt,
    })
}

/// Owner-only: change the host contract's minimum deposit (wei).
pub async fn set_min_amount<W: WalletProvider>(
    wallet: &mut W,
    settings: &Settings,
    account: Address,
    amount: U256,
    cancel: &CancellationToken,
) -> Result<TxReceipt, DepositError> {
    let chain = settings.host_chain();
    wallet.switch_chain(&chain.network, &chain.rpc_url).await?;

    let input = IStirHost::setMinAmountCall { amount }.abi_encode();
    let tx_hash = request_signature(
        wallet.send_transaction(account, settings.contracts.host, input.into(), U256::ZERO),
        settings.signing_timeout,
        cancel,
    )
    .await?;
    let receipt = wallet
        .active_chain()
        .wait_for_receipt(tx_hash, crate::config::RECEIPT_TIMEOUT)
        .await?;
    if !receipt.success {
        return Err(ChainError::Reverted(format!("setMinAmount {} reverted", receipt.tx_hash)).into());
    }
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_is_enforced() {
        let err = deposit_value(".0009").unwrap_err();
        assert!(matches!(err, DepositError::TooSmall { .. }));
        assert_eq!(err.user_message(), messages::DEPOSIT_TOO_SMALL);

        assert_eq!(
            deposit_value(".001").unwrap(),
            U256::from(1_000_000_000_000_000u64)
        );
        assert_eq!(
            deposit_value(" 2 ").unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn garbage_amount_is_invalid() {
        let err = deposit_value("lots").unwrap_err();
        assert!(matches!(err, DepositError::InvalidAmount(_)));
        assert_eq!(err.user_message(), messages::DEPOSIT_FAILED);
    }

    #[test]
    fn outcome_message_follows_receipt_status() {
        let mut outcome = DepositOutcome {
            receipt: TxReceipt {
                tx_hash: "0x01".to_string(),
                block_number: 1,
                gas_used: 21_000,
                success: true,
            },
            explorer_url: String::new(),
        };
        assert_eq!(outcome.user_message(), messages::DEPOSIT_SUCCESS);
        outcome.receipt.success = false;
        assert_eq!(outcome.user_message(), messages::DEPOSIT_REVERTED);
    }

    #[test]
    fn deposit_call_has_no_arguments() {
        let input = IStirHost::depositCall {}.abi_encode();
        assert_eq!(input.len(), 4);
        assert_eq!(input, IStirHost::depositCall::SELECTOR.to_vec());
    }
}
