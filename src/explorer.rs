/// Explorer service
///
/// Composes the node RPC, the indexer and the peer geolocator into the
/// seven read operations served under `/api/v1/explorer`. Holds no state of
/// its own beyond what the geolocation cache keeps.

use num::BigUint;
use serde_json::Value;
use std::sync::Arc;

use crate::enrich;
use crate::error::{ExplorerError, Result};
use crate::geo::PeerGeolocator;
use crate::indexer::Indexer;
use crate::pagination::{BlockRange, PagePolicy};
use crate::rpc_client::NodeRpc;
use crate::script::ScriptCodec;
use crate::types::*;

/// Raw `page` / `pageSize` query values
#[derive(Debug, Default, Clone)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

pub struct Explorer {
    rpc: Arc<dyn NodeRpc>,
    indexer: Arc<dyn Indexer>,
    peers: PeerGeolocator,
    codec: ScriptCodec,
    pages: PagePolicy,
}

impl Explorer {
    pub fn new(
        rpc: Arc<dyn NodeRpc>,
        indexer: Arc<dyn Indexer>,
        peers: PeerGeolocator,
        codec: ScriptCodec,
        pages: PagePolicy,
    ) -> Self {
        Self {
            rpc,
            indexer,
            peers,
            codec,
            pages,
        }
    }

    pub async fn mining_info(&self) -> Result<Value> {
        Ok(self.rpc.get_mining_info().await?)
    }

    pub async fn overview(&self) -> Result<NetworkOverview> {
        let (mining_info, peers) =
            tokio::try_join!(self.rpc.get_mining_info(), self.rpc.get_peer_info())?;

        let peer_count = peers.len();
        let peer_info = self.peers.locate_peers(peers).await;
        log::debug!("Located {} of {} peers", peer_info.len(), peer_count);

        Ok(NetworkOverview {
            mining_info,
            peer_info,
        })
    }

    pub async fn chain_info(&self) -> Result<Value> {
        Ok(self.indexer.blockchain_info().await?)
    }

    pub async fn address(
        &self,
        address: &str,
        params: &PageParams,
        include_balance: bool,
    ) -> Result<AddressHistoryPage> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ExplorerError::BadRequest("Address is required".to_string()));
        }
        let key = self
            .codec
            .script_key(address)
            .ok_or_else(|| ExplorerError::BadRequest(format!("Invalid address: {}", address)))?;

        let window = self
            .pages
            .window(params.page.as_deref(), params.page_size.as_deref());
        let not_found = |e| ExplorerError::not_found(e, "address", address);

        let history = self
            .indexer
            .script_history(key.script_type, &key.payload, window.indexer_page(), window.page_size)
            .await
            .map_err(not_found)?;

        let balance = if include_balance {
            let groups = self
                .indexer
                .script_utxos(key.script_type, &key.payload)
                .await
                .map_err(not_found)?;
            Some(first_group_balance(&groups).to_string())
        } else {
            None
        };

        let tip_height = self.rpc.get_block_count().await?;
        let last_seen = history.txs.first().and_then(last_seen);
        let txs = history
            .txs
            .into_iter()
            .map(|tx| enrich::enrich_tx(&self.codec, tx, tip_height))
            .collect();

        Ok(AddressHistoryPage {
            script_type: key.script_type.to_string(),
            script_payload: key.payload,
            balance,
            last_seen,
            history: AddressHistory {
                txs,
                num_pages: history.num_pages,
            },
        })
    }

    pub async fn block(&self, hash_or_height: &str) -> Result<BlockView> {
        let hash_or_height = hash_or_height.trim();
        if hash_or_height.is_empty() {
            return Err(ExplorerError::BadRequest(
                "Block hash or height is required".to_string(),
            ));
        }
        if !is_hash(hash_or_height) && !is_height(hash_or_height) {
            return Err(ExplorerError::BadRequest(format!(
                "Invalid block hash or height: {}",
                hash_or_height
            )));
        }

        let raw = self
            .indexer
            .block(hash_or_height)
            .await
            .map_err(|e| ExplorerError::not_found(e, "hashOrHeight", hash_or_height))?;

        if raw["blockInfo"]["height"].as_u64() == Some(0) {
            return Ok(BlockView::Genesis(raw));
        }

        let block: IndexedBlock = serde_json::from_value(raw).map_err(|e| {
            ExplorerError::DataIntegrity(format!("unexpected block shape: {}", e))
        })?;
        let tip_height = self.rpc.get_block_count().await?;

        Ok(BlockView::Mined(enrich::enrich_block(
            &self.codec,
            block,
            tip_height,
        )?))
    }

    pub async fn blocks(&self, params: &PageParams) -> Result<BlockListing> {
        let window = self
            .pages
            .window(params.page.as_deref(), params.page_size.as_deref());
        let tip_height = self.indexer.tip_height().await?;

        let mut blocks = match BlockRange::for_window(tip_height, window) {
            Some(range) => self.indexer.blocks(range.start, range.end).await?,
            None => Vec::new(),
        };
        blocks.sort_by(|a, b| b.height.cmp(&a.height));

        Ok(BlockListing { blocks, tip_height })
    }

    pub async fn tx(&self, txid: &str, raw: bool) -> Result<TxView> {
        if !is_hash(txid) {
            return Err(ExplorerError::BadRequest(format!("Invalid txid: {}", txid)));
        }
        let not_found = |e| ExplorerError::not_found(e, "txid", txid);

        if raw {
            let tx = self.rpc.get_raw_transaction(txid).await.map_err(not_found)?;
            return Ok(TxView::Raw(tx));
        }

        let tx = self.indexer.tx(txid).await.map_err(not_found)?;
        let tip_height = self.rpc.get_block_count().await?;

        Ok(TxView::Enriched(enrich::enrich_tx(&self.codec, tx, tip_height)))
    }
}

/// 32-byte hash as 64 hex characters
fn is_hash(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_height(id: &str) -> bool {
    id.bytes().all(|b| b.is_ascii_digit()) && id.parse::<u64>().is_ok()
}

// Only the first UTXO group counts towards the balance
fn first_group_balance(groups: &[ScriptUtxos]) -> BigUint {
    groups
        .first()
        .map(|group| group.utxos.iter().map(|u| BigUint::from(u.value)).sum())
        .unwrap_or_default()
}

fn last_seen(tx: &IndexedTx) -> Option<Value> {
    tx.block
        .as_ref()
        .and_then(|block| block.timestamp.clone())
        .or_else(|| tx.time_first_seen.clone())
        .filter(|ts| !ts.is_null())
}
