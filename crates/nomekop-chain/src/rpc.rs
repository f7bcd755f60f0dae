//! Read-only JSON-RPC handle over HTTP
//!
//! Used when no wallet provider is injected: balance, call and log queries go
//! to a public endpoint. It never holds accounts and cannot sign.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::error::ProviderError;
use crate::provider::ChainReader;
use crate::types::{LogEntry, LogFilter, Network};
use crate::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    block_number: Option<U64>,
}

impl From<RpcLog> for LogEntry {
    fn from(log: RpcLog) -> Self {
        Self {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number: log.block_number.map(|n| n.to::<u64>()),
        }
    }
}

pub struct HttpRpc {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl HttpRpc {
    pub fn new(url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(method, id, "JSON-RPC request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: RpcResponse<T> = response.json().await?;
        if let Some(err) = payload.error {
            return Err(ProviderError::from_rpc(err.code, err.message));
        }
        payload
            .result
            .ok_or_else(|| ProviderError::Decode(format!("{method}: missing result")))
    }
}

pub(crate) fn filter_params(filter: &LogFilter) -> Value {
    let mut topics: Vec<Value> = filter
        .topics
        .iter()
        .map(|t| t.map_or(Value::Null, |t| json!(t)))
        .collect();
    while topics.last() == Some(&Value::Null) {
        topics.pop();
    }

    let to_block = filter
        .to_block
        .map_or_else(|| json!("latest"), |n| json!(format!("{n:#x}")));

    let mut object = json!({
        "topics": topics,
        "fromBlock": format!("{:#x}", filter.from_block),
        "toBlock": to_block,
    });
    if let Some(address) = filter.address {
        object["address"] = json!(address);
    }
    json!([object])
}

#[async_trait]
impl ChainReader for HttpRpc {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    async fn network(&self) -> Result<Network> {
        let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(Network::from_chain_id(chain_id.to::<u64>()))
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let logs: Vec<RpcLog> = self.request("eth_getLogs", filter_params(filter)).await?;
        Ok(logs.into_iter().map(LogEntry::from).collect())
    }
}
