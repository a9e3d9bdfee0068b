// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, application constants and
//! the fixed user-facing messages. Configuration is loaded from the
//! environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ENCLAVE_RPC_URL` | Confidential chain RPC endpoint | Sapphire testnet |
//! | `HOST_RPC_URL` | Host chain RPC endpoint | BSC testnet |
//! | `ENCLAVE_ADDRESS` | StirEnclave contract address | testnet deployment |
//! | `HOST_ADDRESS` | StirHost contract address | testnet deployment |
//! | `RELAYER_ADDRESS` | Relayer contract address | testnet deployment |
//! | `WALLET_PRIVATE_KEY` | Hex private key for the local wallet | Optional |
//! | `WALLET_RPC_URL` | Remote wallet JSON-RPC endpoint | Optional |
//! | `RELAYER_PRIVATE_KEY` | Hex key of the relay service account | Optional |
//! | `RELAYER_KEY_PEM` | PEM file holding the relay service key | Optional |
//! | `ETHERSCAN_API_KEY` | Key for the ETH price lookup | Optional |
//! | `WITHDRAW_ENDPOINT` | Off-chain relay endpoint | hosted endpoint |
//! | `RELAY_SERVICE_URL` | Base URL of a `coinstir serve` instance for approvals | Optional |
//! | `SIGNING_TIMEOUT_SECS` | Wallet signing timeout | `120` |
//! | `RELAY_SETTLE_DELAY_MS` | Delay before formatting a relay call | `2000` |
//! | `HOST` | Relay service bind address | `0.0.0.0` |
//! | `PORT` | Relay service bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, str::FromStr, time::Duration};

use alloy::primitives::{Address, U256};

use crate::blockchain::{
    ContractAddresses, NetworkConfig, BSC_TESTNET, SAPPHIRE_TESTNET, TESTNET_CONTRACTS,
};
use crate::format::parse_ether;

pub const ENCLAVE_RPC_URL_ENV: &str = "ENCLAVE_RPC_URL";
pub const HOST_RPC_URL_ENV: &str = "HOST_RPC_URL";
pub const ENCLAVE_ADDRESS_ENV: &str = "ENCLAVE_ADDRESS";
pub const HOST_ADDRESS_ENV: &str = "HOST_ADDRESS";
pub const RELAYER_ADDRESS_ENV: &str = "RELAYER_ADDRESS";
pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";
pub const WALLET_RPC_URL_ENV: &str = "WALLET_RPC_URL";
pub const RELAYER_PRIVATE_KEY_ENV: &str = "RELAYER_PRIVATE_KEY";
pub const RELAYER_KEY_PEM_ENV: &str = "RELAYER_KEY_PEM";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const WITHDRAW_ENDPOINT_ENV: &str = "WITHDRAW_ENDPOINT";
pub const RELAY_SERVICE_URL_ENV: &str = "RELAY_SERVICE_URL";
pub const SIGNING_TIMEOUT_ENV: &str = "SIGNING_TIMEOUT_SECS";
pub const RELAY_SETTLE_DELAY_ENV: &str = "RELAY_SETTLE_DELAY_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable selecting the log output format.
///
/// `json` produces one JSON object per event; anything else is pretty text.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Number of history rows per table page.
pub const PAGE_SIZE: u64 = 5;

/// Flat relay gas charge, in ether, deducted from the enclave balance.
pub const GAS_PRICE_ETH: &str = ".00003";

/// Service fee rate in tenths of a percent (10 = 1%).
pub const FEE_RATE: u64 = 10;

/// Smallest accepted host deposit, in ether.
pub const MIN_DEPOSIT_ETH: &str = ".001";

/// Approval relay gas price (0.002 ETH) used while the enclave's
/// `depositGasPrice` is unset.
pub const DEPOSIT_GAS_PRICE_WEI: u64 = 2_000_000_000_000_000;

pub const DEFAULT_WITHDRAW_ENDPOINT: &str =
    "https://rvbfj38mdh.execute-api.us-east-2.amazonaws.com/CoinStirTest";
pub const ETH_PRICE_API_URL: &str = "https://api.etherscan.io/api";

const DEFAULT_SIGNING_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// How long to poll for a transaction receipt before giving up.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// EIP-712 domain name and version shared by every CoinStir message.
pub const EIP712_NAME: &str = "CoinStir";
pub const EIP712_VERSION: &str = "1";

/// Fixed messages signed by users or shown to them.
pub mod messages {
    pub const LOGIN: &str = "This signature is used to prove ownership of this account, similar to using a password for a username in a more traditional login.";
    pub const APPROVE: &str = "Sign to grant access to your funds by the new wallet shown above";
    pub const REVOKE: &str = "Sign to remove access to your funds by the wallet shown above";
    pub const ADMIN_CHALLENGE: &str = "Hello, world!";

    pub const SUCCESS: &str = "Congratulations! The Transfer was successful. Please allow 5 to 10 minutes for the funds to be sent to the destination.";
    pub const INSUFFICIENT_FUNDS: &str = "The Transfer failed due to insufficient funds. Check your account balance is greater than the amount being transferred PLUS the 1% service fee and the .0003 ETH gas fee. (value + (value*.01) + .0003)";
    pub const TRANSFER_FAILED: &str = "Hmm.. The Transfer failed. Check your account balance is greater than the amount being transferred PLUS the 1% service fee and the .0003 ETH gas fee. (value + (value*.01) + .0003)";

    pub const DEPOSIT_TOO_SMALL: &str = "Deposits must be .001 ETH or greater.";
    pub const DEPOSIT_SUCCESS: &str = "Congratulations! The Deposit was successful. Please allow 5 to 10 minutes for the funds to settle before they become available for transfer or withdraw.";
    pub const DEPOSIT_REVERTED: &str = "The Deposit failed. Check your wallet balance is greater than the amount being deposited and that you have enough to cover gas.";
    pub const DEPOSIT_FAILED: &str = "The Deposit failed. Check your wallet balance and try again.";
}

/// Configuration errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Settings shared by the CLI and the relay service.
#[derive(Debug, Clone)]
pub struct Settings {
    pub enclave_network: NetworkConfig,
    pub enclave_rpc_url: String,
    pub host_network: NetworkConfig,
    pub host_rpc_url: String,
    pub contracts: ContractAddresses,
    pub wallet_private_key: Option<String>,
    pub wallet_rpc_url: Option<String>,
    pub relayer_private_key: Option<String>,
    pub relayer_key_pem: Option<String>,
    pub etherscan_api_key: Option<String>,
    pub withdraw_endpoint: String,
    pub relay_service_url: Option<String>,
    pub signing_timeout: Duration,
    pub settle_delay: Duration,
    pub bind_host: String,
    pub bind_port: u16,
    pub page_size: u64,
    pub fee_rate: u64,
    pub gas_price_wei: U256,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings from an arbitrary lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let contracts = ContractAddresses {
            enclave: parse_or(get(ENCLAVE_ADDRESS_ENV), ENCLAVE_ADDRESS_ENV, TESTNET_CONTRACTS.enclave)?,
            host: parse_or(get(HOST_ADDRESS_ENV), HOST_ADDRESS_ENV, TESTNET_CONTRACTS.host)?,
            relayer: parse_or(get(RELAYER_ADDRESS_ENV), RELAYER_ADDRESS_ENV, TESTNET_CONTRACTS.relayer)?,
        };

        let enclave_rpc_url = get(ENCLAVE_RPC_URL_ENV)
            .unwrap_or_else(|| SAPPHIRE_TESTNET.rpc_url.to_string());
        let host_rpc_url = get(HOST_RPC_URL_ENV).unwrap_or_else(|| BSC_TESTNET.rpc_url.to_string());
        let withdraw_endpoint =
            get(WITHDRAW_ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_WITHDRAW_ENDPOINT.to_string());
        for (name, value) in [
            (ENCLAVE_RPC_URL_ENV, &enclave_rpc_url),
            (HOST_RPC_URL_ENV, &host_rpc_url),
            (WITHDRAW_ENDPOINT_ENV, &withdraw_endpoint),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })?;
        }

        let relay_service_url = get(RELAY_SERVICE_URL_ENV);
        if let Some(url) = &relay_service_url {
            url::Url::parse(url).map_err(|e| ConfigError::Invalid {
                name: RELAY_SERVICE_URL_ENV,
                reason: e.to_string(),
            })?;
        }

        let signing_timeout = get(SIGNING_TIMEOUT_ENV)
            .map(|v| parse_value::<u64>(&v, SIGNING_TIMEOUT_ENV).map(Duration::from_secs))
            .transpose()?
            .unwrap_or(DEFAULT_SIGNING_TIMEOUT);
        let settle_delay = get(RELAY_SETTLE_DELAY_ENV)
            .map(|v| parse_value::<u64>(&v, RELAY_SETTLE_DELAY_ENV).map(Duration::from_millis))
            .transpose()?
            .unwrap_or(DEFAULT_SETTLE_DELAY);

        let bind_host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let bind_port = get(PORT_ENV)
            .map(|v| parse_value::<u16>(&v, PORT_ENV))
            .transpose()?
            .unwrap_or(8080);

        let gas_price_wei = parse_ether(GAS_PRICE_ETH).map_err(|e| ConfigError::Invalid {
            name: "GAS_PRICE_ETH",
            reason: e.to_string(),
        })?;

        Ok(Self {
            enclave_network: SAPPHIRE_TESTNET,
            enclave_rpc_url,
            host_network: BSC_TESTNET,
            host_rpc_url,
            contracts,
            wallet_private_key: get(WALLET_PRIVATE_KEY_ENV),
            wallet_rpc_url: get(WALLET_RPC_URL_ENV),
            relayer_private_key: get(RELAYER_PRIVATE_KEY_ENV),
            relayer_key_pem: get(RELAYER_KEY_PEM_ENV),
            etherscan_api_key: get(ETHERSCAN_API_KEY_ENV),
            withdraw_endpoint,
            relay_service_url,
            signing_timeout,
            settle_delay,
            bind_host,
            bind_port,
            page_size: PAGE_SIZE,
            fee_rate: FEE_RATE,
            gas_price_wei,
        })
    }

    /// Enclave network with the configured RPC endpoint.
    pub fn enclave_chain(&self) -> ChainTarget {
        ChainTarget {
            network: self.enclave_network.clone(),
            rpc_url: self.enclave_rpc_url.clone(),
        }
    }

    /// Host network with the configured RPC endpoint.
    pub fn host_chain(&self) -> ChainTarget {
        ChainTarget {
            network: self.host_network.clone(),
            rpc_url: self.host_rpc_url.clone(),
        }
    }
}

/// A network plus the RPC endpoint actually used to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTarget {
    pub network: NetworkConfig,
    pub rpc_url: String,
}

fn parse_or(raw: Option<String>, name: &'static str, default: Address) -> Result<Address, ConfigError> {
    match raw {
        Some(value) => Address::from_str(value.trim()).map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_value<T>(raw: &str, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
