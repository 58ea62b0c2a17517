use alloy_primitives::{Bytes, U256, hex};
use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Minimal Ethereum JSON-RPC 2.0 client over HTTP.
pub struct RpcClient {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Transaction fields for `eth_sendTransaction`; the node or wallet signs.
#[derive(Debug, Serialize)]
pub(crate) struct TransactionRequest {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReceiptJson {
    pub(crate) transaction_hash: String,
    #[serde(default)]
    pub(crate) block_number: Option<String>,
    #[serde(default)]
    pub(crate) gas_used: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "json-rpc request");

        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{method} transport"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{method} HTTP {status}: {text}");
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .with_context(|| format!("{method} parse"))?;

        if let Some(err) = envelope.error {
            return Err(anyhow!("{method} failed ({}): {}", err.code, err.message));
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .with_context(|| format!("{method} result shape"))
    }

    pub(crate) async fn accounts(&self) -> Result<Vec<String>> {
        self.request("eth_accounts", json!([])).await
    }

    pub(crate) async fn request_accounts(&self) -> Result<Vec<String>> {
        self.request("eth_requestAccounts", json!([])).await
    }

    pub(crate) async fn call(&self, to: &str, data: Vec<u8>) -> Result<Bytes> {
        let raw: String = self
            .request(
                "eth_call",
                json!([{ "to": to, "data": hex::encode_prefixed(data) }, "latest"]),
            )
            .await?;
        let bytes = hex::decode(&raw).context("eth_call returned non-hex data")?;
        Ok(Bytes::from(bytes))
    }

    pub(crate) async fn send_transaction(&self, tx: TransactionRequest) -> Result<String> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    pub(crate) async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<ReceiptJson>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash])).await
    }
}

pub(crate) fn quantity(value: U256) -> String {
    format!("0x{value:x}")
}

pub(crate) fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid quantity '{raw}'"))
}
