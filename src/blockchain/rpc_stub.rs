// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process JSON-RPC node for tests.
//!
//! Answers the handful of methods the clients issue. `eth_call` is routed to
//! a closure over the call input; returning `None` makes the call revert.

use std::sync::{Arc, Mutex};

use alloy::primitives::{hex, U256};
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

type CallHandler = dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync;

#[derive(Clone)]
pub(crate) struct RpcStub {
    chain_id: u64,
    balance: U256,
    on_call: Arc<CallHandler>,
    methods: Arc<Mutex<Vec<String>>>,
}

impl RpcStub {
    pub(crate) fn new(
        chain_id: u64,
        on_call: impl Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            chain_id,
            balance: U256::ZERO,
            on_call: Arc::new(on_call),
            methods: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    /// Methods received so far, in order.
    pub(crate) fn methods(&self) -> Vec<String> {
        self.methods.lock().unwrap().clone()
    }

    pub(crate) fn router(&self) -> Router {
        Router::new().route("/", post(handle)).with_state(self.clone())
    }
}

/// Serve `router` on an ephemeral port and return its base URL.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// 32-byte ABI word for a uint.
pub(crate) fn uint_word(value: u64) -> [u8; 32] {
    U256::from(value).to_be_bytes::<32>()
}

async fn handle(State(stub): State<RpcStub>, Json(req): Json<Value>) -> Json<Value> {
    let method = req["method"].as_str().unwrap_or_default().to_string();
    stub.methods.lock().unwrap().push(method.clone());

    let result = match method.as_str() {
        "eth_chainId" => Ok(json!(format!("{:#x}", stub.chain_id))),
        "eth_blockNumber" => Ok(json!("0x10")),
        "eth_getBalance" => Ok(json!(format!("{:#x}", stub.balance))),
        "eth_getTransactionCount" => Ok(json!("0x0")),
        "eth_gasPrice" | "eth_maxPriorityFeePerGas" => Ok(json!("0x1")),
        "eth_estimateGas" => Ok(json!("0x5208")),
        "wallet_switchEthereumChain" | "wallet_addEthereumChain" => Ok(Value::Null),
        "eth_call" => {
            let tx = &req["params"][0];
            let input = tx
                .get("input")
                .or_else(|| tx.get("data"))
                .and_then(Value::as_str)
                .unwrap_or("0x");
            let input = hex::decode(input).unwrap_or_default();
            (stub.on_call)(&input)
                .map(|out| json!(hex::encode_prefixed(out)))
                .ok_or_else(|| "execution reverted".to_string())
        }
        other => Err(format!("method {other} not supported")),
    };

    Json(match result {
        Ok(result) => json!({"jsonrpc": "2.0", "id": req["id"], "result": result}),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": req["id"],
            "error": {"code": -32000, "message": message}
        }),
    })
}
