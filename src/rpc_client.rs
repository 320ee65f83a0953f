/// Node JSON-RPC client
///
/// `bitcoincore-rpc` is a blocking client, so every call is moved onto the
/// blocking thread pool. Responses stay as JSON so fields the node adds are
/// passed through untouched.

use anyhow::Context;
use async_trait::async_trait;
use bitcoincore_rpc::{Auth, Client, RpcApi};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::UpstreamError;
use crate::types::PeerInfo;

type Result<T> = std::result::Result<T, UpstreamError>;

#[async_trait]
pub trait NodeRpc: Send + Sync {
    async fn get_mining_info(&self) -> Result<Value>;

    async fn get_peer_info(&self) -> Result<Vec<PeerInfo>>;

    /// Verbose (decoded) transaction as the node reports it
    async fn get_raw_transaction(&self, txid: &str) -> Result<Value>;

    async fn get_block_count(&self) -> Result<u64>;
}

pub struct BitcoinRpcClient {
    client: Arc<Client>,
}

impl BitcoinRpcClient {
    /// Create a new RPC client from URL and authentication
    pub fn new(url: &str, username: String, password: String) -> anyhow::Result<Self> {
        let auth = Auth::UserPass(username, password);
        let client = Client::new(url, auth).context("Failed to create node RPC client")?;

        // Test connection
        let height: u64 = client
            .call("getblockcount", &[])
            .context("Failed to connect to the node - is it running?")?;

        log::info!("Connected to node at {} (height {})", url, height);

        Ok(Self {
            client: Arc::new(client),
        })
    }

    async fn call<T>(&self, method: &'static str, params: Vec<Value>) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || client.call::<T>(method, &params))
            .await
            .map_err(|e| UpstreamError::Rpc(format!("{} task failed: {}", method, e)))?
            .map_err(UpstreamError::from)
    }
}

#[async_trait]
impl NodeRpc for BitcoinRpcClient {
    async fn get_mining_info(&self) -> Result<Value> {
        self.call("getmininginfo", vec![]).await
    }

    async fn get_peer_info(&self) -> Result<Vec<PeerInfo>> {
        self.call("getpeerinfo", vec![]).await
    }

    async fn get_raw_transaction(&self, txid: &str) -> Result<Value> {
        self.call("getrawtransaction", vec![json!(txid), json!(true)])
            .await
    }

    async fn get_block_count(&self) -> Result<u64> {
        self.call("getblockcount", vec![]).await
    }
}
