// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CoinStir client - private relay payments on Oasis Sapphire
//!
//! Builds EIP-712 meta-transactions for the CoinStir enclave contract, reads
//! the signed-in account's encrypted snapshot and history, and submits
//! transfers, withdrawals and approvals through the on-chain relayer or the
//! off-chain relay service served by this crate.
//!
//! ## Modules
//!
//! - `api` - Relay service HTTP handlers (Axum)
//! - `blockchain` - Enclave/host contract bindings, signing, relay pipeline
//! - `cli` - `coinstir` command line
//! - `providers` - Outbound HTTP (price lookup, withdrawal endpoint, relay service)
//! - `session` - Signed-in account state and pagination

pub mod api;
pub mod blockchain;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod providers;
pub mod session;
pub mod state;
