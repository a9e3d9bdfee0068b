// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CoinStir contract interfaces.
//!
//! Only the ABI surface the client touches is declared here. The contracts
//! themselves are deployed separately; struct layouts below must track their
//! Solidity definitions field for field.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IStirEnclave {
        /// Transfer/withdraw meta-transaction signed by the account owner.
        struct MetaTxn {
            uint256 _payload;
            address _dest;
            bytes _signature;
            uint256 nonce;
        }

        /// Address approval/revocation meta-transaction.
        struct AddrTxn {
            address _walletB;
            bytes _signature;
        }

        /// One history entry as stored by the enclave.
        struct TxnData {
            uint256 blocknum;
            uint256 date;
            address sendingWallet;
            address recipient;
            uint256 amount;
            uint256 availBal;
            uint256 fee;
            uint256 gas;
        }

        function recoverAddressFromSignature(bytes signature, string message, uint256 deadline)
            external view returns (address recovered, uint256 txnCount, uint256 balance, uint256 approvedCount, address origin);
        function recoverOriginFromSignature(bytes signature, string message) external view returns (address);
        function recoverAddrTXNdata(bytes signature, string message, uint256 deadline, uint256 startPoint, uint256 endPoint)
            external view returns (TxnData[] memory);
        function getApprovedAddr(bytes signature, string message, uint256 index) external view returns (address);
        function approvalCheck(address wallet) external view returns (uint256);

        function createmetaTXN(MetaTxn data) external view returns (bytes memory);
        function createMetaTxnAddr(AddrTxn data) external view returns (bytes memory);

        function _trackTxn(bytes metaTxn, string val, uint256 gasPrice, uint256 feeRate) external;
        function proposeAddress(bytes metaTxn, string phrase, uint256 gasPrice) external;
        function confirmApproval(bytes metaTxn, string phrase, uint256 gasPrice) external;
        function revokeAddress(bytes metaTxn, string phrase, uint256 gasPrice) external;

        function authGetTXNinfo(bytes signature, string message, address wallet, uint256 startPoint, uint256 endPoint)
            external view returns (TxnData[] memory);
        function authGetTxnList(bytes signature, string message, address wallet) external view returns (uint256);

        function claimFee() external;
        function claimGas() external;
        function grantAuth(address authority) external;
        function setFeeWallet(address wallet) external;
        function setGasWallet(address wallet) external;
        function flipRelayer(address relayer) external;
        function flipAuth(address wallet) external;
        function flipAdmin(address wallet) external;
        function blockWallet(address wallet) external;
        function setDepositGasPrice(uint256 price) external;

        function feeWallet() external view returns (address);
        function gasWallet() external view returns (address);
        function depositGasPrice() external view returns (uint256);
        function feeClaim() external view returns (uint256);
        function relayerStatus(address wallet) external view returns (bool);
        function authStatus(address wallet) external view returns (bool);
        function adminStatus(address wallet) external view returns (bool);
        function blockedList(address wallet) external view returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    interface IRelayer {
        error TransactionWillFail(string reason);
        error SubcallError();
        error UnauthorizedKeypairUpdate();

        function TARGET_CONTRACT() external view returns (address);
        function owner() external view returns (address);
        function getKeypairCount() external view returns (uint256);
        function getKeypairAddress(uint256 keypairIndex) external view returns (address);

        function format(bytes signedMsg, string val, uint256 gasPrice, uint256 feeRate, bool isInternal)
            external pure returns (bytes memory);
        function preflightCheck(bytes innercall) external view returns (bool success, string memory reason);
        function makeProxyTx(bytes innercall) external view returns (bytes memory output);
    }
}

sol! {
    #[sol(rpc)]
    interface IStirHost {
        function deposit() external payable;
        function setMinAmount(uint256 amount) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, U256};
    use alloy::sol_types::{SolCall, SolError};

    #[test]
    fn meta_txn_call_round_trips() {
        let call = IStirEnclave::createmetaTXNCall {
            data: IStirEnclave::MetaTxn {
                _payload: U256::from(10u64),
                _dest: Address::repeat_byte(0x11),
                _signature: Bytes::from(vec![0u8; 65]),
                nonce: U256::from(3u64),
            },
        };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], IStirEnclave::createmetaTXNCall::SELECTOR.as_slice());

        let decoded = IStirEnclave::createmetaTXNCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.data.nonce, U256::from(3u64));
        assert_eq!(decoded.data._dest, Address::repeat_byte(0x11));
    }

    #[test]
    fn transaction_will_fail_selector_is_stable() {
        let err = IRelayer::TransactionWillFail {
            reason: "bad sig".to_string(),
        };
        let encoded = err.abi_encode();
        let decoded = IRelayer::TransactionWillFail::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.reason, "bad sig");
        assert_eq!(IRelayer::TransactionWillFail::SIGNATURE, "TransactionWillFail(string)");
    }
}
