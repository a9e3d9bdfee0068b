// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display (also used as `chainName` when adding it to a wallet)
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

impl NetworkConfig {
    /// Chain ID as the `0x`-prefixed hex string wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

/// Oasis Sapphire testnet, where the enclave contract lives.
pub const SAPPHIRE_TESTNET: NetworkConfig = NetworkConfig {
    name: "Sapphire_Testnet",
    chain_id: 23295,
    rpc_url: "https://testnet.sapphire.oasis.dev",
    explorer_url: "https://explorer.oasis.io/testnet/sapphire",
};

/// BSC testnet, where the host (deposit) contract lives.
pub const BSC_TESTNET: NetworkConfig = NetworkConfig {
    name: "bsc-testnet",
    chain_id: 97,
    rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545/",
    explorer_url: "https://testnet.bscscan.com",
};

/// Addresses of the deployed CoinStir contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// StirEnclave on the confidential chain
    pub enclave: Address,
    /// StirHost on the host chain
    pub host: Address,
    /// Gasless relayer contract on the confidential chain
    pub relayer: Address,
}

/// Current testnet deployment.
pub const TESTNET_CONTRACTS: ContractAddresses = ContractAddresses {
    enclave: address!("c0d72DD01AC4a5f8335DB2b302cbCbA4fA10683b"),
    host: address!("4d48c82CA673ae0816881113EF90ba46ccfD62cc"),
    relayer: address!("1e0b0E48fF3d725db680157b487E65B690d94503"),
};

/// Account state as reported by the enclave for a login signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountSnapshot {
    /// Address recovered from the login signature
    #[schema(value_type = String)]
    pub recovered_address: Address,
    /// Number of enclave transactions; doubles as the meta-transaction nonce
    pub txn_count: u64,
    /// Available enclave balance in wei
    #[schema(value_type = String)]
    pub balance: U256,
    /// Number of addresses approved to act for this account, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_address_count: Option<u64>,
    /// Origin (owning) address, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub origin_address: Option<Address>,
}

/// Transaction send result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    /// Transaction hash
    pub tx_hash: String,
    /// Explorer URL for the transaction
    pub explorer_url: String,
}

/// Receipt summary after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}
