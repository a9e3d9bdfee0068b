// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 payloads signed by CoinStir users.
//!
//! Every message uses `primaryType = "Message"` under the `CoinStir` domain,
//! so each shape lives in its own module to keep the Solidity type name
//! identical to what the enclave hashes. Field names (including the
//! `recipiant` spelling) are part of the type hash and must not change.

use std::borrow::Cow;

use alloy::{
    primitives::{Address, B256, U256},
    sol_types::{Eip712Domain, SolStruct},
};
use serde_json::{json, Value};

use crate::config::{EIP712_NAME, EIP712_VERSION};

/// Login challenge: a fixed note plus a block-number deadline.
pub mod login {
    alloy::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Message {
            string note;
            uint256 deadline;
        }
    }
}

/// Transfer out of the enclave balance to any address.
pub mod transfer {
    alloy::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Message {
            address recipiant;
            string value;
            uint256 nonce;
        }
    }
}

/// Withdrawal back to the signing account.
pub mod withdraw {
    alloy::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Message {
            address recipient;
            string value;
            uint256 nonce;
        }
    }
}

/// Approval or revocation of a second wallet; `value` carries the phrase.
pub mod approval {
    alloy::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Message {
            address recipiant;
            string value;
        }
    }
}

/// Which message shape a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Login,
    Transfer,
    Withdraw,
    Approval,
}

impl MessageKind {
    fn fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            MessageKind::Login => &[("note", "string"), ("deadline", "uint256")],
            MessageKind::Transfer => &[
                ("recipiant", "address"),
                ("value", "string"),
                ("nonce", "uint256"),
            ],
            MessageKind::Withdraw => &[
                ("recipient", "address"),
                ("value", "string"),
                ("nonce", "uint256"),
            ],
            MessageKind::Approval => &[("recipiant", "address"), ("value", "string")],
        }
    }
}

/// A message ready for signing: its digest and the `eth_signTypedData_v4` document.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedPayload {
    pub kind: MessageKind,
    /// EIP-712 signing hash (`keccak256(0x1901 || domainSeparator || structHash)`)
    pub digest: B256,
    /// JSON document a browser-style wallet expects
    pub typed_data: Value,
}

impl TypedPayload {
    /// Serialized typed data, as passed to `eth_signTypedData_v4`.
    pub fn to_json_string(&self) -> String {
        self.typed_data.to_string()
    }
}

/// Builds CoinStir typed payloads for one enclave deployment.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    chain_id: u64,
    verifying_contract: Address,
    domain: Eip712Domain,
}

impl MessageBuilder {
    /// The domain must name the chain and enclave contract that will verify
    /// the signature; anything else fails on-chain recovery.
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        let domain = Eip712Domain::new(
            Some(Cow::Borrowed(EIP712_NAME)),
            Some(Cow::Borrowed(EIP712_VERSION)),
            Some(U256::from(chain_id)),
            Some(verifying_contract),
            None,
        );
        Self {
            chain_id,
            verifying_contract,
            domain,
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn login(&self, note: &str, deadline: u64) -> TypedPayload {
        let msg = login::Message {
            note: note.to_string(),
            deadline: U256::from(deadline),
        };
        self.payload(
            MessageKind::Login,
            msg.eip712_signing_hash(&self.domain),
            json!({ "note": note, "deadline": deadline.to_string() }),
        )
    }

    pub fn transfer(&self, recipient: Address, value: &str, nonce: u64) -> TypedPayload {
        let msg = transfer::Message {
            recipiant: recipient,
            value: value.to_string(),
            nonce: U256::from(nonce),
        };
        self.payload(
            MessageKind::Transfer,
            msg.eip712_signing_hash(&self.domain),
            json!({ "recipiant": recipient.to_checksum(None), "value": value, "nonce": nonce }),
        )
    }

    pub fn withdraw(&self, recipient: Address, value: &str, nonce: u64) -> TypedPayload {
        let msg = withdraw::Message {
            recipient,
            value: value.to_string(),
            nonce: U256::from(nonce),
        };
        self.payload(
            MessageKind::Withdraw,
            msg.eip712_signing_hash(&self.domain),
            json!({ "recipient": recipient.to_checksum(None), "value": value, "nonce": nonce }),
        )
    }

    pub fn approval(&self, wallet: Address, phrase: &str) -> TypedPayload {
        let msg = approval::Message {
            recipiant: wallet,
            value: phrase.to_string(),
        };
        self.payload(
            MessageKind::Approval,
            msg.eip712_signing_hash(&self.domain),
            json!({ "recipiant": wallet.to_checksum(None), "value": phrase }),
        )
    }

    fn payload(&self, kind: MessageKind, digest: B256, message: Value) -> TypedPayload {
        let message_fields: Vec<Value> = kind
            .fields()
            .iter()
            .map(|(name, ty)| json!({ "name": name, "type": ty }))
            .collect();

        let typed_data = json!({
            "domain": {
                "name": EIP712_NAME,
                "version": EIP712_VERSION,
                "chainId": self.chain_id,
                "verifyingContract": self.verifying_contract.to_checksum(None),
            },
            "message": message,
            "primaryType": "Message",
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                "Message": message_fields,
            },
        });

        TypedPayload {
            kind,
            digest,
            typed_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, keccak256};

    const ENCLAVE: Address = address!("c0d72DD01AC4a5f8335DB2b302cbCbA4fA10683b");

    fn builder() -> MessageBuilder {
        MessageBuilder::new(23295, ENCLAVE)
    }

    #[test]
    fn type_strings_match_enclave_definitions() {
        assert_eq!(
            login::Message::eip712_encode_type(),
            "Message(string note,uint256 deadline)"
        );
        assert_eq!(
            transfer::Message::eip712_encode_type(),
            "Message(address recipiant,string value,uint256 nonce)"
        );
        assert_eq!(
            withdraw::Message::eip712_encode_type(),
            "Message(address recipient,string value,uint256 nonce)"
        );
        assert_eq!(
            approval::Message::eip712_encode_type(),
            "Message(address recipiant,string value)"
        );
    }

    #[test]
    fn digest_is_deterministic_and_input_sensitive() {
        let b = builder();
        let to = Address::repeat_byte(0x22);
        let first = b.transfer(to, "0.01", 4);
        let again = b.transfer(to, "0.01", 4);
        assert_eq!(first.digest, again.digest);

        assert_ne!(first.digest, b.transfer(to, "0.01", 5).digest);
        assert_ne!(first.digest, b.transfer(to, "0.02", 4).digest);
        assert_ne!(first.digest, b.withdraw(to, "0.01", 4).digest);
    }

    #[test]
    fn digest_depends_on_domain() {
        let to = Address::repeat_byte(0x22);
        let sapphire = builder().transfer(to, "1", 0);
        let other_chain = MessageBuilder::new(97, ENCLAVE).transfer(to, "1", 0);
        let other_contract = MessageBuilder::new(23295, Address::ZERO).transfer(to, "1", 0);
        assert_ne!(sapphire.digest, other_chain.digest);
        assert_ne!(sapphire.digest, other_contract.digest);
    }

    #[test]
    fn digest_follows_eip712_layout() {
        let b = builder();
        let msg = login::Message {
            note: "hi".to_string(),
            deadline: U256::from(7u64),
        };
        let mut preimage = vec![0x19, 0x01];
        preimage.extend_from_slice(b.domain().separator().as_slice());
        preimage.extend_from_slice(msg.eip712_hash_struct().as_slice());
        assert_eq!(b.login("hi", 7).digest, keccak256(&preimage));
    }

    #[test]
    fn typed_data_document_shape() {
        let payload = builder().transfer(Address::repeat_byte(0x22), "0.01", 2);
        let doc = &payload.typed_data;

        assert_eq!(doc["primaryType"], "Message");
        assert_eq!(doc["domain"]["name"], "CoinStir");
        assert_eq!(doc["domain"]["chainId"], 23295);
        assert_eq!(
            doc["domain"]["verifyingContract"],
            "0xc0d72DD01AC4a5f8335DB2b302cbCbA4fA10683b"
        );
        assert_eq!(doc["message"]["value"], "0.01");
        assert_eq!(doc["message"]["nonce"], 2);
        assert_eq!(doc["types"]["Message"][0]["name"], "recipiant");
        assert_eq!(doc["types"]["EIP712Domain"].as_array().unwrap().len(), 4);

        let parsed: Value = serde_json::from_str(&payload.to_json_string()).unwrap();
        assert_eq!(&parsed, doc);
    }

    #[test]
    fn login_deadline_is_a_decimal_string() {
        let payload = builder().login("note", 123456);
        assert_eq!(payload.kind, MessageKind::Login);
        assert_eq!(payload.typed_data["message"]["deadline"], "123456");
    }
}
