// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line front end.
//!
//! Every command resolves a wallet from the environment (`WALLET_PRIVATE_KEY`
//! for a local key, `WALLET_RPC_URL` for a remote JSON-RPC signer), signs in
//! where the enclave needs a login signature, and prints the same outcome
//! messages the web client shows.

use alloy::primitives::{Address, Bytes, B256, U256};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::router;
use crate::blockchain::{
    admin::{self, AdminAction, AdminError, AdminLookup},
    approvals::{self, ApprovalError, ApprovalKind, ApprovalSubmitter},
    eip712::TypedPayload,
    history::{account_row, admin_row, render_table, ACCOUNT_HEADERS, ADMIN_HEADERS},
    host::{self, DepositError},
    relay::{RelayError, RelayKind, RelayPipeline, RelayRequest, RelayRoute},
    signing::{relayer_signer, signer_from_hex},
    wallet::{LocalWallet, RpcWallet, WalletError, WalletProvider},
    ChainClient, ChainError, EnclaveClient, NetworkConfig, RelayerAccount,
};
use crate::config::{messages, ConfigError, Settings, RECEIPT_TIMEOUT};
use crate::format::{format_amount, format_eth_amount, format_usd_value, parse_ether, FormatError, ETH_DECIMALS};
use crate::providers::{EthPriceClient, ProviderError, RelayServiceClient, WithdrawEndpoint};
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "coinstir", version, about = "CoinStir private payments client and relay service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the off-chain relay service
    Serve,
    /// Sign in and show balance and transaction count
    Account,
    /// Show one page of transaction history (page 1 is the newest)
    History {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Transfer funds from the enclave account
    Send(SendArgs),
    /// Withdraw funds to the signed-in wallet
    Withdraw(WithdrawArgs),
    /// Propose a wallet that may act for this account
    Approve(AddressArg),
    /// Accept a proposal made by the owning account
    Confirm(AddressArg),
    /// Remove an approved wallet
    Revoke(AddressArg),
    /// List wallets approved for this account
    Approved,
    /// Deposit ether into the host contract
    Deposit {
        #[arg(long)]
        amount: String,
    },
    /// Current ETH price in USD
    Price,
    /// Administrative operations
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[arg(long)]
    pub to: Address,
    /// Amount in ether, e.g. `.01`
    #[arg(long)]
    pub amount: String,
    /// Recipient is another CoinStir account
    #[arg(long)]
    pub internal: bool,
    /// Submit through the withdrawal endpoint instead of the relayer contract
    #[arg(long)]
    pub via_endpoint: bool,
}

#[derive(Debug, Args)]
pub struct WithdrawArgs {
    #[arg(long)]
    pub amount: String,
    #[arg(long)]
    pub via_endpoint: bool,
}

#[derive(Debug, Args)]
pub struct AddressArg {
    #[arg(long)]
    pub address: Address,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    ClaimFee,
    ClaimGas,
    GrantAuth(AddressArg),
    SetFeeWallet(AddressArg),
    SetGasWallet(AddressArg),
    FlipRelayer(AddressArg),
    FlipAuth(AddressArg),
    FlipAdmin(AddressArg),
    BlockWallet(AddressArg),
    /// Gas charged per approval relay, in ether
    SetDepositGasPrice {
        #[arg(long)]
        amount: String,
    },
    /// Minimum host-chain deposit, in ether
    SetMinDeposit {
        #[arg(long)]
        amount: String,
    },
    /// Contract settings, plus role flags for `--address`
    Status {
        #[arg(long)]
        address: Option<Address>,
    },
    /// History of any account, read with the admin challenge signature
    History {
        #[arg(long)]
        address: Address,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Deposit(#[from] DepositError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("{0}")]
    Usage(String),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl CliError {
    /// Outcome text for failures the web client reported with a fixed message.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            CliError::Relay(e) => Some(e.user_message()),
            CliError::Deposit(e) => Some(e.user_message()),
            _ => None,
        }
    }
}

/// Wallet chosen from the environment.
#[derive(Debug)]
pub enum CliWallet {
    Local(LocalWallet),
    Rpc(RpcWallet),
}

impl CliWallet {
    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        if let Some(key) = &settings.wallet_private_key {
            let signer = signer_from_hex(key)?;
            return Ok(CliWallet::Local(LocalWallet::new(
                signer,
                settings.enclave_network.clone(),
                &settings.enclave_rpc_url,
            )?));
        }
        if let Some(endpoint) = &settings.wallet_rpc_url {
            return Ok(CliWallet::Rpc(RpcWallet::new(
                endpoint,
                settings.enclave_network.clone(),
                &settings.enclave_rpc_url,
            )?));
        }
        Err(CliError::Usage(
            "Set WALLET_PRIVATE_KEY or WALLET_RPC_URL to choose a wallet".to_string(),
        ))
    }
}

impl WalletProvider for CliWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        match self {
            CliWallet::Local(w) => w.request_accounts().await,
            CliWallet::Rpc(w) => w.request_accounts().await,
        }
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        match self {
            CliWallet::Local(w) => w.chain_id().await,
            CliWallet::Rpc(w) => w.chain_id().await,
        }
    }

    async fn switch_chain(
        &mut self,
        network: &NetworkConfig,
        rpc_url: &str,
    ) -> Result<(), WalletError> {
        match self {
            CliWallet::Local(w) => w.switch_chain(network, rpc_url).await,
            CliWallet::Rpc(w) => w.switch_chain(network, rpc_url).await,
        }
    }

    async fn block_number(&self) -> Result<u64, WalletError> {
        match self {
            CliWallet::Local(w) => w.block_number().await,
            CliWallet::Rpc(w) => w.block_number().await,
        }
    }

    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &TypedPayload,
    ) -> Result<Bytes, WalletError> {
        match self {
            CliWallet::Local(w) => w.sign_typed_data(account, payload).await,
            CliWallet::Rpc(w) => w.sign_typed_data(account, payload).await,
        }
    }

    async fn sign_message(&self, account: Address, message: &[u8]) -> Result<Bytes, WalletError> {
        match self {
            CliWallet::Local(w) => w.sign_message(account, message).await,
            CliWallet::Rpc(w) => w.sign_message(account, message).await,
        }
    }

    async fn send_transaction(
        &self,
        account: Address,
        to: Address,
        input: Bytes,
        value: U256,
    ) -> Result<B256, WalletError> {
        match self {
            CliWallet::Local(w) => w.send_transaction(account, to, input, value).await,
            CliWallet::Rpc(w) => w.send_transaction(account, to, input, value).await,
        }
    }

    fn active_chain(&self) -> &ChainClient {
        match self {
            CliWallet::Local(w) => w.active_chain(),
            CliWallet::Rpc(w) => w.active_chain(),
        }
    }
}

fn enclave_client(settings: &Settings) -> Result<EnclaveClient, ChainError> {
    let chain = ChainClient::new(settings.enclave_network.clone(), &settings.enclave_rpc_url)?;
    Ok(EnclaveClient::new(chain, settings.contracts))
}

/// Relayer account when a relayer key is configured.
fn relayer_account(settings: &Settings) -> Result<Option<RelayerAccount>, ChainError> {
    if settings.relayer_private_key.is_none() && settings.relayer_key_pem.is_none() {
        return Ok(None);
    }
    let signer = relayer_signer(
        settings.relayer_private_key.as_deref(),
        settings.relayer_key_pem.as_deref(),
    )?;
    let chain = ChainClient::with_signer(
        settings.enclave_network.clone(),
        &settings.enclave_rpc_url,
        signer,
    )?;
    Ok(Some(RelayerAccount::new(chain, settings.contracts.enclave)?))
}

/// First wallet account, with the wallet switched to the enclave chain.
async fn connect(wallet: &mut CliWallet, settings: &Settings) -> Result<Address, WalletError> {
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

/// Ether amount of `wei` as a float, for USD display only.
fn wei_to_eth_f64(wei: U256) -> f64 {
    format_amount(wei, ETH_DECIMALS).parse().unwrap_or(0.0)
}

pub async fn run(cli: Cli, settings: &Settings, cancel: CancellationToken) -> Result<(), CliError> {
    match cli.command {
        Command::Serve => serve(settings, cancel).await,
        Command::Price => {
            let key = settings.etherscan_api_key.as_deref().ok_or_else(|| {
                CliError::Usage("Set ETHERSCAN_API_KEY to look up the ETH price".to_string())
            })?;
            let price = EthPriceClient::new(key)?.fetch().await?;
            println!("ETH/USD: {price:.2}");
            Ok(())
        }
        Command::Admin(command) => run_admin(command, settings, &cancel).await,
        Command::Deposit { amount } => {
            let mut wallet = CliWallet::from_settings(settings)?;
            let outcome =
                host::deposit(&mut wallet, settings, &amount, RECEIPT_TIMEOUT, &cancel).await?;
            println!("{}", outcome.user_message());
            println!("Transaction: {}", outcome.explorer_url);
            Ok(())
        }
        command => run_signed_in(command, settings, &cancel).await,
    }
}

async fn run_signed_in(
    command: Command,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let mut wallet = CliWallet::from_settings(settings)?;
    let enclave = enclave_client(settings)?;

    match command {
        Command::Confirm(AddressArg { address: owner }) => {
            let account = connect(&mut wallet, settings).await?;
            submit_approval(&wallet, &enclave, settings, account, owner, ApprovalKind::Confirm, cancel)
                .await
        }
        Command::Approve(AddressArg { address }) => {
            let account = connect(&mut wallet, settings).await?;
            submit_approval(&wallet, &enclave, settings, account, address, ApprovalKind::Propose, cancel)
                .await
        }
        Command::Revoke(AddressArg { address }) => {
            let account = connect(&mut wallet, settings).await?;
            submit_approval(&wallet, &enclave, settings, account, address, ApprovalKind::Revoke, cancel)
                .await
        }
        command => {
            let mut session = Session::login(&mut wallet, &enclave, settings, cancel).await?;
            match command {
                Command::Account => print_account(&session, settings).await,
                Command::History { page } => {
                    session.paginator_mut().go_to(page);
                    let rows: Vec<_> = session
                        .current_page(&enclave)
                        .await?
                        .iter()
                        .map(|txn| account_row(txn, session.account(), settings.contracts.host))
                        .collect();
                    println!("{}", render_table(&ACCOUNT_HEADERS, &rows, session.paginator()));
                    Ok(())
                }
                Command::Approved => {
                    let count = session.snapshot().approved_address_count.unwrap_or(0);
                    if count == 0 {
                        println!("No approved wallets");
                    }
                    for index in 0..count {
                        let approved = enclave
                            .approved_address(session.login_signature(), index)
                            .await?;
                        let status = enclave.approval_check(approved).await?;
                        println!("{approved} (approval status {status})");
                    }
                    Ok(())
                }
                Command::Send(args) => {
                    let request = RelayRequest {
                        kind: RelayKind::Transfer {
                            recipient: args.to,
                            internal: args.internal,
                        },
                        amount: args.amount,
                        route: route(args.via_endpoint),
                    };
                    relay(&mut session, &wallet, &enclave, settings, &request, cancel).await
                }
                Command::Withdraw(args) => {
                    let request = RelayRequest {
                        kind: RelayKind::Withdraw,
                        amount: args.amount,
                        route: route(args.via_endpoint),
                    };
                    relay(&mut session, &wallet, &enclave, settings, &request, cancel).await
                }
                _ => Err(CliError::Usage("Command does not need a session".to_string())),
            }
        }
    }
}

fn route(via_endpoint: bool) -> RelayRoute {
    if via_endpoint {
        RelayRoute::Endpoint
    } else {
        RelayRoute::OnChain
    }
}

async fn print_account(session: &Session, settings: &Settings) -> Result<(), CliError> {
    let snapshot = session.snapshot();
    println!("Account:      {}", session.account());
    let price = match &settings.etherscan_api_key {
        Some(key) => EthPriceClient::new(key.as_str())?.eth_usd().await,
        None => None,
    };
    match price {
        Some(price) => println!(
            "Balance:      {} ETH ({})",
            format_eth_amount(snapshot.balance),
            format_usd_value(wei_to_eth_f64(snapshot.balance), price)
        ),
        None => println!("Balance:      {} ETH", format_eth_amount(snapshot.balance)),
    }
    println!("Transactions: {}", snapshot.txn_count);
    if let Some(count) = snapshot.approved_address_count {
        println!("Approved:     {count}");
    }
    if let Some(origin) = snapshot.origin_address {
        if origin != session.account() && !origin.is_zero() {
            println!("Acting for:   {origin}");
        }
    }
    Ok(())
}

async fn relay(
    session: &mut Session,
    wallet: &CliWallet,
    enclave: &EnclaveClient,
    settings: &Settings,
    request: &RelayRequest,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let endpoint = match request.route {
        RelayRoute::Endpoint => Some(WithdrawEndpoint::new(settings.withdraw_endpoint.as_str())?),
        RelayRoute::OnChain => None,
    };
    let mut pipeline = RelayPipeline::new(enclave, endpoint.as_ref(), settings);
    let outcome = pipeline.submit(session, wallet, request, cancel).await?;

    println!("{}", messages::SUCCESS);
    if let Some(url) = outcome.explorer_url {
        println!("Transaction: {url}");
    }
    if let Some(status) = outcome.endpoint_status {
        println!("Relay status: {status}");
    }
    println!(
        "Available balance: {} ETH",
        format_eth_amount(session.balance())
    );
    Ok(())
}

async fn submit_approval(
    wallet: &CliWallet,
    enclave: &EnclaveClient,
    settings: &Settings,
    account: Address,
    counterparty: Address,
    kind: ApprovalKind,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let relayer = relayer_account(settings)?;
    let service = match (&relayer, &settings.relay_service_url) {
        (None, Some(url)) => Some(RelayServiceClient::new(url.as_str())?),
        _ => None,
    };
    let submitter = match (&relayer, &service) {
        (Some(relayer), _) => ApprovalSubmitter::Relayer(relayer),
        (None, Some(service)) => ApprovalSubmitter::Service(service),
        (None, None) => return Err(ApprovalError::NoRelayer.into()),
    };

    let ticket =
        approvals::prepare(wallet, enclave, settings, account, counterparty, kind, cancel).await?;
    let outcome = submitter.submit(&ticket).await?;
    info!(kind = kind.as_str(), status = %outcome.status, "Approval submitted");
    match outcome.tx_hash {
        Some(hash) => println!("{} {counterparty}: {} ({hash})", kind.as_str(), outcome.status),
        None => println!("{} {counterparty}: {}", kind.as_str(), outcome.status),
    }
    Ok(())
}

async fn run_admin(
    command: AdminCommand,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let action = match &command {
        AdminCommand::ClaimFee => Some(AdminAction::ClaimFee),
        AdminCommand::ClaimGas => Some(AdminAction::ClaimGas),
        AdminCommand::GrantAuth(a) => Some(AdminAction::GrantAuth(a.address)),
        AdminCommand::SetFeeWallet(a) => Some(AdminAction::SetFeeWallet(a.address)),
        AdminCommand::SetGasWallet(a) => Some(AdminAction::SetGasWallet(a.address)),
        AdminCommand::FlipRelayer(a) => Some(AdminAction::FlipRelayer(a.address)),
        AdminCommand::FlipAuth(a) => Some(AdminAction::FlipAuth(a.address)),
        AdminCommand::FlipAdmin(a) => Some(AdminAction::FlipAdmin(a.address)),
        AdminCommand::BlockWallet(a) => Some(AdminAction::BlockWallet(a.address)),
        AdminCommand::SetDepositGasPrice { amount } => {
            Some(AdminAction::SetDepositGasPrice(parse_ether(amount)?))
        }
        _ => None,
    };

    if let Some(action) = action {
        let mut wallet = CliWallet::from_settings(settings)?;
        let receipt = admin::execute(&mut wallet, settings, action, cancel).await?;
        println!("{} confirmed: {}", action.name(), receipt.tx_hash);
        return Ok(());
    }

    match command {
        AdminCommand::SetMinDeposit { amount } => {
            let mut wallet = CliWallet::from_settings(settings)?;
            let account = connect(&mut wallet, settings).await?;
            let receipt =
                host::set_min_amount(&mut wallet, settings, account, parse_ether(&amount)?, cancel)
                    .await?;
            println!("setMinAmount confirmed: {}", receipt.tx_hash);
            Ok(())
        }
        AdminCommand::Status { address } => {
            let enclave = enclave_client(settings)?;
            let status = admin::contract_status(&enclave).await?;
            println!("Fee wallet:        {}", status.fee_wallet);
            println!("Gas wallet:        {}", status.gas_wallet);
            println!(
                "Deposit gas price: {} ETH",
                format_amount(status.deposit_gas_price, ETH_DECIMALS)
            );
            println!(
                "Unclaimed fees:    {} ETH",
                format_amount(status.fee_claim, ETH_DECIMALS)
            );
            if let Some(address) = address {
                let roles = admin::role_status(&enclave, address).await?;
                println!(
                    "{address}: relayer={} auth={} admin={} blocked={}",
                    roles.relayer, roles.auth, roles.admin, roles.blocked
                );
            }
            Ok(())
        }
        AdminCommand::History { address, page } => {
            let mut wallet = CliWallet::from_settings(settings)?;
            let enclave = enclave_client(settings)?;
            let mut lookup = AdminLookup::open(&mut wallet, &enclave, settings, address, cancel).await?;
            lookup.paginator_mut().go_to(page);
            let rows: Vec<_> = lookup
                .current_page(&enclave)
                .await?
                .iter()
                .map(|txn| admin_row(txn, lookup.target(), settings.contracts.host))
                .collect();
            println!("{}", render_table(&ADMIN_HEADERS, &rows, lookup.paginator()));
            Ok(())
        }
        _ => Err(CliError::Usage("Unhandled admin command".to_string())),
    }
}

async fn serve(settings: &Settings, cancel: CancellationToken) -> Result<(), CliError> {
    let state = match relayer_account(settings)? {
        Some(relayer) => {
            info!(relayer = ?relayer.address(), "Relayer key loaded");
            AppState::new(relayer)
        }
        None => {
            warn!("No relayer key configured; relay routes will answer 503");
            AppState::default()
        }
    };

    let addr = format!("{}:{}", settings.bind_host, settings.bind_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "CoinStir relay service listening (docs at /docs)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    info!("Relay service stopped");
    Ok(())
}
