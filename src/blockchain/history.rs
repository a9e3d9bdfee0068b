// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction history rows and their text rendering.

use alloy::primitives::{Address, U256};
use serde::Serialize;

use super::contracts::IStirEnclave::TxnData;
use crate::config::GAS_PRICE_ETH;
use crate::format::{
    format_address, format_eth_amount, format_fee, format_fee_for_admin, format_gas_for_admin,
};
use crate::pagination::Paginator;

pub const ACCOUNT_HEADERS: [&str; 5] = ["Block Num", "Recipient", "Sender", "Amount", "Available Balance"];
pub const ADMIN_HEADERS: [&str; 5] = ["Date", "Recipient", "Sender", "Amount", "Available Balance"];

/// One displayed history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    /// Block number (account view) or date (admin view)
    pub when: String,
    pub recipient: String,
    pub sender: String,
    pub amount: String,
    pub incoming: bool,
    pub available_balance: String,
    /// Fee and gas breakdown shown alongside the amount
    pub detail: String,
    #[serde(skip)]
    pub recipient_address: Address,
    #[serde(skip)]
    pub sender_address: Address,
}

impl HistoryRow {
    fn cells(&self) -> [String; 5] {
        [
            self.when.clone(),
            self.recipient.clone(),
            self.sender.clone(),
            self.amount.clone(),
            self.available_balance.clone(),
        ]
    }
}

fn amount_label(amount: U256, incoming: bool) -> String {
    let amt = format_eth_amount(amount);
    if incoming {
        format!("+ {amt} ETH")
    } else {
        format!("({amt}) ETH")
    }
}

/// Row for the signed-in account's own history.
pub fn account_row(txn: &TxnData, account: Address, host: Address) -> HistoryRow {
    let recipient = if txn.recipient == host {
        "DEPOSIT".to_string()
    } else if txn.recipient == txn.sendingWallet {
        "WITHDRAW".to_string()
    } else {
        format_address(&txn.recipient.to_checksum(None))
    };

    let incoming = txn.recipient == host || (txn.recipient == account && txn.sendingWallet != account);

    HistoryRow {
        when: txn.blocknum.to_string(),
        recipient,
        sender: format_address(&txn.sendingWallet.to_checksum(None)),
        amount: amount_label(txn.amount, incoming),
        incoming,
        available_balance: format!("{} ETH", format_eth_amount(txn.availBal)),
        detail: format!("Fee: {} ETH & Gas: {} ETH", format_fee(txn.fee), GAS_PRICE_ETH),
        recipient_address: txn.recipient,
        sender_address: txn.sendingWallet,
    }
}

/// Row for the admin view of `target`'s history.
pub fn admin_row(txn: &TxnData, target: Address, host: Address) -> HistoryRow {
    let recipient = if txn.recipient == host {
        "DEPOSIT".to_string()
    } else if txn.recipient == target {
        "WITHDRAW".to_string()
    } else {
        format_address(&txn.recipient.to_checksum(None))
    };

    // Amounts that display as 0.0000 ETH are approval bookkeeping entries.
    let sender = if txn.sendingWallet == host {
        "WITHDRAW".to_string()
    } else if format_eth_amount(txn.amount) == "0.0000" {
        "WALLET APPROVAL".to_string()
    } else {
        format_address(&txn.sendingWallet.to_checksum(None))
    };

    let incoming = txn.recipient == host;

    HistoryRow {
        when: format_date(txn.date),
        recipient,
        sender,
        amount: amount_label(txn.amount, incoming),
        incoming,
        available_balance: format!("{} ETH", format_eth_amount(txn.availBal)),
        detail: format!(
            "Fee: {} ETH & Gas: {} ETH",
            format_fee_for_admin(txn.fee),
            format_gas_for_admin(txn.gas)
        ),
        recipient_address: txn.recipient,
        sender_address: txn.sendingWallet,
    }
}

/// Unix seconds as a UTC timestamp; values that do not fit are shown raw.
fn format_date(date: U256) -> String {
    i64::try_from(date)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Render rows as a fixed-width text table with the pagination footer.
pub fn render_table(headers: &[&str; 5], rows: &[HistoryRow], paginator: &Paginator) -> String {
    let cells: Vec<[String; 5]> = rows.iter().map(HistoryRow::cells).collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(widths.iter())
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(cells.len() + 3);
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    out.push(line(&header_cells));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        out.push(line(row));
    }
    if rows.is_empty() {
        out.push("No transactions yet".to_string());
    }
    out.push(paginator.footer());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: Address = Address::repeat_byte(0x44);
    const ME: Address = Address::repeat_byte(0xaa);
    const OTHER: Address = Address::repeat_byte(0xbb);

    fn txn(sender: Address, recipient: Address, amount: u64) -> TxnData {
        TxnData {
            blocknum: U256::from(1234u64),
            date: U256::from(1_700_000_000u64),
            sendingWallet: sender,
            recipient,
            amount: U256::from(amount),
            availBal: U256::from(2_000_000_000_000_000_000u64),
            fee: U256::from(100_000_000_000_000u64),
            gas: U256::ZERO,
        }
    }

    #[test]
    fn deposit_row_is_incoming() {
        let row = account_row(&txn(ME, HOST, 500_000_000_000_000_000), ME, HOST);
        assert_eq!(row.recipient, "DEPOSIT");
        assert_eq!(row.amount, "+ 0.5000 ETH");
        assert!(row.incoming);
        assert_eq!(row.available_balance, "2.0000 ETH");
        assert_eq!(row.when, "1234");
    }

    #[test]
    fn withdraw_row_is_outgoing() {
        let row = account_row(&txn(ME, ME, 10_000_000_000_000_000), ME, HOST);
        assert_eq!(row.recipient, "WITHDRAW");
        assert_eq!(row.amount, "(0.0100) ETH");
        assert!(!row.incoming);
        assert_eq!(row.detail, "Fee: 0.0001 ETH & Gas: .00003 ETH");
    }

    #[test]
    fn incoming_transfer_from_other_account() {
        let row = account_row(&txn(OTHER, ME, 10_000_000_000_000_000), ME, HOST);
        assert!(row.incoming);
        assert_eq!(row.recipient.len(), 12);
        assert_eq!(row.sender.to_lowercase(), "0xbbb...bbbb");
    }

    #[test]
    fn admin_labels() {
        let withdraw = admin_row(&txn(HOST, OTHER, 1), OTHER, HOST);
        assert_eq!(withdraw.recipient, "WITHDRAW");
        assert_eq!(withdraw.sender, "WITHDRAW");

        let approval = admin_row(&txn(OTHER, ME, 0), OTHER, HOST);
        assert_eq!(approval.sender, "WALLET APPROVAL");
        assert_eq!(approval.detail, "Fee: 0.000100 ETH & Gas: N/A ETH");
        assert_eq!(approval.when, "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn approval_label_follows_displayed_amount() {
        // 0.00004 ETH shows as 0.0000
        let dust = admin_row(&txn(OTHER, ME, 40_000_000_000_000), OTHER, HOST);
        assert_eq!(dust.sender, "WALLET APPROVAL");

        // 0.00005 ETH rounds up to 0.0001
        let small = admin_row(&txn(OTHER, ME, 50_000_000_000_000), OTHER, HOST);
        assert_eq!(small.sender.to_lowercase(), "0xbbb...bbbb");
    }

    #[test]
    fn oversized_date_is_shown_raw() {
        assert_eq!(format_date(U256::MAX), U256::MAX.to_string());
    }

    #[test]
    fn table_has_header_rows_and_footer() {
        let rows = vec![
            account_row(&txn(ME, HOST, 1_000_000_000_000_000_000), ME, HOST),
            account_row(&txn(ME, ME, 1_000_000_000_000_000), ME, HOST),
        ];
        let table = render_table(&ACCOUNT_HEADERS, &rows, &Paginator::new(7, 5));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Block Num"));
        assert!(lines[2].contains("DEPOSIT"));
        assert!(lines[3].contains("WITHDRAW"));
        assert_eq!(lines[4], "Viewing page 1 of 2");
    }

    #[test]
    fn empty_table_says_so() {
        let table = render_table(&ADMIN_HEADERS, &[], &Paginator::new(0, 5));
        assert!(table.contains("No transactions yet"));
        assert!(table.ends_with("Viewing page 1 of 1"));
    }
}
