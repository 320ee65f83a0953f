//! Explorer Gateway: read-only explorer API over a node and an indexer
//!
//! Serves enriched, paginated views of blocks, transactions and addresses
//! built from two upstream sources: the node's JSON-RPC interface (live
//! chain and network state) and a transaction indexer (history).
//!
//! # Architecture
//!
//! - **Upstreams**: [`rpc_client::NodeRpc`], [`indexer::Indexer`] and
//!   [`geo::GeoLocator`] are traits so tests and alternative backends can
//!   stand in for the real services
//! - **Enrichment**: address derivation, RANK payload decoding, burn totals,
//!   confirmations and miner addresses ([`enrich`])
//! - **Service**: [`Explorer`] composes the above into the read operations
//! - **HTTP**: axum router under `/api/v1/explorer` ([`api`])
//!
//! # Example
//!
//! ```ignore
//! use explorer_gateway::*;
//! use std::sync::Arc;
//!
//! let config = GatewayConfig::from_env()?;
//! let explorer = build_explorer(&config)?;
//! api::run_server(Arc::new(explorer), api::cors_layer(None), "0.0.0.0", 3000).await?;
//! ```

pub mod api;
pub mod config;
pub mod enrich;
pub mod error;
pub mod explorer;
pub mod geo;
pub mod indexer;
pub mod pagination;
pub mod rank;
pub mod rpc_client;
pub mod script;
pub mod types;

use std::sync::Arc;

pub use config::GatewayConfig;
pub use error::{ExplorerError, UpstreamError};
pub use explorer::{Explorer, PageParams};
pub use geo::{GeoCache, GeoLocator, IpApiLocator, MemoryGeoCache, PeerGeolocator};
pub use indexer::{HttpIndexer, Indexer};
pub use pagination::{BlockRange, PagePolicy, PageWindow, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use rank::{RankPayload, Sentiment};
pub use rpc_client::{BitcoinRpcClient, NodeRpc};
pub use script::{ScriptCodec, ScriptKey, ScriptType};
pub use types::*;

/// Wire the production upstream clients into an [`Explorer`]
pub fn build_explorer(config: &GatewayConfig) -> anyhow::Result<Explorer> {
    let rpc = BitcoinRpcClient::new(
        &config.rpc_url,
        config.rpc_user.clone(),
        config.rpc_password.clone(),
    )?;
    let indexer = HttpIndexer::new(&config.indexer_url)?;
    let peers = PeerGeolocator::new(
        Arc::new(MemoryGeoCache::new()),
        Arc::new(IpApiLocator::new(config.geoip_url.clone())),
    );

    Ok(Explorer::new(
        Arc::new(rpc),
        Arc::new(indexer),
        peers,
        ScriptCodec::new(config.network),
        config.pages,
    ))
}
