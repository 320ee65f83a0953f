//! In-process stand-ins for the node, the indexer and the geolocation service
//!
//! Each fake records how often it was called so tests can assert on cache
//! hits and on which upstream a request reached.

#![allow(dead_code)]

use async_trait::async_trait;
use bitcoin::Network;
use explorer_gateway::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NETWORK: Network = Network::Bitcoin;

pub fn codec() -> ScriptCodec {
    ScriptCodec::new(NETWORK)
}

/// Hex P2PKH script for a 20-byte hash filled with `fill`
pub fn p2pkh_hex(fill: u8) -> String {
    format!("76a914{}88ac", hex::encode([fill; 20]))
}

pub fn p2pkh_address(fill: u8) -> String {
    let script = ScriptCodec::parse_hex(&p2pkh_hex(fill)).unwrap();
    codec().address_from_script(&script).unwrap()
}

fn not_found(service: &'static str, message: String) -> UpstreamError {
    UpstreamError::Status {
        service,
        status: 404,
        message,
    }
}

// ============================================================================
// Node RPC
// ============================================================================

pub struct FakeRpc {
    pub block_count: u64,
    pub peers: Vec<PeerInfo>,
    pub raw_txs: HashMap<String, Value>,
    pub block_count_fails: bool,
    pub calls: AtomicUsize,
}

impl FakeRpc {
    pub fn new(block_count: u64) -> Self {
        Self {
            block_count,
            peers: Vec::new(),
            raw_txs: HashMap::new(),
            block_count_fails: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_peers(mut self, addrs: &[&str]) -> Self {
        self.peers = addrs
            .iter()
            .map(|addr| serde_json::from_value(json!({ "addr": addr, "version": 70016 })).unwrap())
            .collect();
        self
    }

    pub fn with_raw_tx(mut self, txid: &str, tx: Value) -> Self {
        self.raw_txs.insert(txid.to_string(), tx);
        self
    }

    /// Node that answers everything except `getblockcount`
    pub fn failing_block_count(mut self) -> Self {
        self.block_count_fails = true;
        self
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeRpc for FakeRpc {
    async fn get_mining_info(&self) -> Result<Value, UpstreamError> {
        self.hit();
        Ok(json!({ "blocks": self.block_count, "difficulty": 1.5, "networkhashps": 12345 }))
    }

    async fn get_peer_info(&self) -> Result<Vec<PeerInfo>, UpstreamError> {
        self.hit();
        Ok(self.peers.clone())
    }

    async fn get_raw_transaction(&self, txid: &str) -> Result<Value, UpstreamError> {
        self.hit();
        self.raw_txs
            .get(txid)
            .cloned()
            .ok_or_else(|| UpstreamError::Rpc("No such mempool or blockchain transaction".into()))
    }

    async fn get_block_count(&self) -> Result<u64, UpstreamError> {
        self.hit();
        if self.block_count_fails {
            return Err(UpstreamError::Rpc("connection refused".into()));
        }
        Ok(self.block_count)
    }
}

// ============================================================================
// Indexer
// ============================================================================

#[derive(Default)]
pub struct FakeIndexer {
    pub tip_height: u64,
    pub blocks: HashMap<String, Value>,
    pub txs: HashMap<String, Value>,
    pub history: Option<Value>,
    pub utxos: Option<Value>,
    /// Ids passed to `block` and `tx`
    pub lookups: Mutex<Vec<String>>,
    pub history_requests: Mutex<Vec<(String, String, u64, u32)>>,
    pub range_requests: Mutex<Vec<(u64, u64)>>,
    pub utxo_calls: AtomicUsize,
}

impl FakeIndexer {
    pub fn new(tip_height: u64) -> Self {
        Self {
            tip_height,
            ..Default::default()
        }
    }

    /// Register a block under both its height and its hash
    pub fn with_block(mut self, block: Value) -> Self {
        let height = block["blockInfo"]["height"].as_u64().unwrap();
        let hash = block["blockInfo"]["hash"].as_str().unwrap().to_string();
        self.blocks.insert(height.to_string(), block.clone());
        self.blocks.insert(hash, block);
        self
    }

    pub fn with_tx(mut self, tx: Value) -> Self {
        let txid = tx["txid"].as_str().unwrap().to_string();
        self.txs.insert(txid, tx);
        self
    }

    pub fn with_history(mut self, history: Value) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_utxos(mut self, utxos: Value) -> Self {
        self.utxos = Some(utxos);
        self
    }
}

#[async_trait]
impl Indexer for FakeIndexer {
    async fn blockchain_info(&self) -> Result<Value, UpstreamError> {
        Ok(json!({ "tipHash": "00ff", "tipHeight": self.tip_height }))
    }

    async fn block(&self, hash_or_height: &str) -> Result<Value, UpstreamError> {
        self.lookups.lock().unwrap().push(hash_or_height.to_string());
        self.blocks
            .get(hash_or_height)
            .cloned()
            .ok_or_else(|| not_found("indexer", format!("Block not found: {}", hash_or_height)))
    }

    async fn blocks(&self, start: u64, end: u64) -> Result<Vec<BlockInfo>, UpstreamError> {
        self.range_requests.lock().unwrap().push((start, end));
        Ok((start..=end.min(self.tip_height))
            .map(|height| {
                serde_json::from_value(json!({
                    "height": height,
                    "hash": format!("{:064x}", height),
                    "numTxs": 1
                }))
                .unwrap()
            })
            .collect())
    }

    async fn tx(&self, txid: &str) -> Result<IndexedTx, UpstreamError> {
        self.lookups.lock().unwrap().push(txid.to_string());
        let tx = self
            .txs
            .get(txid)
            .cloned()
            .ok_or_else(|| not_found("indexer", format!("Transaction not found: {}", txid)))?;
        Ok(serde_json::from_value(tx)?)
    }

    async fn script_history(
        &self,
        script_type: ScriptType,
        payload: &str,
        page: u64,
        page_size: u32,
    ) -> Result<TxHistoryPage, UpstreamError> {
        self.history_requests.lock().unwrap().push((
            script_type.to_string(),
            payload.to_string(),
            page,
            page_size,
        ));
        let history = self.history.clone().unwrap_or(json!({ "txs": [], "numPages": 0 }));
        Ok(serde_json::from_value(history)?)
    }

    async fn script_utxos(
        &self,
        _script_type: ScriptType,
        _payload: &str,
    ) -> Result<Vec<ScriptUtxos>, UpstreamError> {
        self.utxo_calls.fetch_add(1, Ordering::SeqCst);
        let utxos = self.utxos.clone().unwrap_or(json!([]));
        Ok(serde_json::from_value(utxos)?)
    }
}

// ============================================================================
// Geolocation
// ============================================================================

#[derive(Default)]
pub struct CountingLocator {
    pub failing: HashSet<String>,
    pub lookups: Mutex<Vec<String>>,
}

impl CountingLocator {
    pub fn failing_for(ips: &[&str]) -> Self {
        Self {
            failing: ips.iter().map(|ip| ip.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl GeoLocator for CountingLocator {
    async fn locate(&self, ip: &str) -> Result<GeoRecord, UpstreamError> {
        self.lookups.lock().unwrap().push(ip.to_string());
        if self.failing.contains(ip) {
            return Err(UpstreamError::GeoUnavailable(ip.to_string()));
        }
        Ok(GeoRecord {
            ip: ip.to_string(),
            country: "Testland".to_string(),
            city: format!("City of {}", ip),
        })
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub struct Harness {
    pub rpc: Arc<FakeRpc>,
    pub indexer: Arc<FakeIndexer>,
    pub locator: Arc<CountingLocator>,
    pub cache: Arc<MemoryGeoCache>,
    pub explorer: Arc<Explorer>,
}

impl Harness {
    pub fn new(rpc: FakeRpc, indexer: FakeIndexer, locator: CountingLocator) -> Self {
        Self::with_policy(rpc, indexer, locator, PagePolicy::default())
    }

    pub fn with_policy(
        rpc: FakeRpc,
        indexer: FakeIndexer,
        locator: CountingLocator,
        pages: PagePolicy,
    ) -> Self {
        let rpc = Arc::new(rpc);
        let indexer = Arc::new(indexer);
        let locator = Arc::new(locator);
        let cache = Arc::new(MemoryGeoCache::new());

        let explorer = Explorer::new(
            rpc.clone(),
            indexer.clone(),
            PeerGeolocator::new(cache.clone(), locator.clone()),
            codec(),
            pages,
        );

        Self {
            rpc,
            indexer,
            locator,
            cache,
            explorer: Arc::new(explorer),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Coinbase paying the miner at output 1, as the chain lays it out
pub fn coinbase_tx(height: u64, miner_fill: u8) -> Value {
    json!({
        "txid": format!("cb{:062x}", height),
        "version": 2,
        "inputs": [{ "prevOut": { "txid": "00".repeat(32), "outIdx": 4294967295u64 }, "inputScript": "0101" }],
        "outputs": [
            { "value": "0", "outputScript": "6a0101" },
            { "value": "260000000", "outputScript": p2pkh_hex(miner_fill) }
        ],
        "block": { "height": height, "hash": format!("{:064x}", height), "timestamp": "1700000000" },
        "isCoinbase": true
    })
}

/// Spend with one burn output and one payment output
pub fn burn_tx(txid: &str, block_height: Option<u64>) -> Value {
    let mut tx = json!({
        "txid": txid,
        "version": 2,
        "inputs": [
            { "prevOut": { "txid": "aa".repeat(32), "outIdx": 0 }, "outputScript": p2pkh_hex(0x55), "value": "700" },
            { "prevOut": { "txid": "bb".repeat(32), "outIdx": 1 }, "value": "10" }
        ],
        "outputs": [
            { "value": "100", "outputScript": "6a04deadbeef" },
            { "value": "500", "outputScript": p2pkh_hex(0x66) }
        ],
        "timeFirstSeen": "1700000100",
        "size": 250
    });
    if let Some(height) = block_height {
        tx["block"] = json!({ "height": height, "hash": "12".repeat(32), "timestamp": "1700000200" });
    }
    tx
}

pub fn block(height: u64, txs: Vec<Value>) -> Value {
    json!({
        "blockInfo": {
            "hash": format!("{:064x}", height),
            "prevHash": format!("{:064x}", height.saturating_sub(1)),
            "height": height,
            "timestamp": "1700000000",
            "numTxs": txs.len()
        },
        "blockDetails": { "version": 1, "merkleRoot": "ab".repeat(32) },
        "rawHeader": "00",
        "txs": txs
    })
}
