// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain integration for the CoinStir enclave (Oasis Sapphire) and host
//! (BSC) contracts.
//!
//! This module provides:
//! - EIP-712 message construction for login, transfer and approval signatures
//! - Enclave reads: account snapshots and paginated history
//! - The relay pipeline that turns a signed transfer into a relayed transaction
//! - Relayer-role submission, deposits and administrative calls

pub mod admin;
pub mod approvals;
pub mod client;
pub mod contracts;
pub mod eip712;
pub mod enclave;
pub mod history;
pub mod host;
pub mod relay;
pub mod relayer;
#[cfg(test)]
pub(crate) mod rpc_stub;
pub mod signing;
pub mod snapshot;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, ChainError};
pub use enclave::EnclaveClient;
pub use relayer::RelayerAccount;
pub use types::*;
