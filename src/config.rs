/// Gateway configuration from environment variables
///
/// A `.env` file in the working directory is loaded first when present.

use anyhow::{Context, Result};
use bitcoin::Network;
use std::env;

use crate::pagination::{PagePolicy, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    // Node RPC
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,

    // Upstream HTTP services
    pub indexer_url: String,
    pub geoip_url: String,

    /// Network addresses are encoded for
    pub network: Network,

    // Server
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origins: Option<String>,

    pub pages: PagePolicy,
}

impl GatewayConfig {
    /// Load configuration from the environment
    ///
    /// - `BITCOIN_RPC_URL` (default `http://localhost:10604`)
    /// - `BITCOIN_RPC_USER`, `BITCOIN_RPC_PASSWORD` (required)
    /// - `INDEXER_URL` (default `http://localhost:7123`)
    /// - `GEOIP_URL` (default `http://ip-api.com/json`)
    /// - `BITCOIN_NETWORK`: bitcoin | testnet | signet | regtest
    /// - `SERVER_HOST`, `SERVER_PORT` (default `0.0.0.0:3000`)
    /// - `EXPLORER_DEFAULT_PAGE_SIZE`, `EXPLORER_MAX_PAGE_SIZE`
    /// - `ALLOWED_ORIGINS`: comma-separated CORS origins
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let rpc_user = env::var("BITCOIN_RPC_USER")
            .context("BITCOIN_RPC_USER environment variable not set")?;
        let rpc_password = env::var("BITCOIN_RPC_PASSWORD")
            .context("BITCOIN_RPC_PASSWORD environment variable not set")?;

        let network = parse_network(&env_or("BITCOIN_NETWORK", "bitcoin"))?;

        let server_port = env_or("SERVER_PORT", "3000")
            .parse()
            .context("Invalid SERVER_PORT")?;

        let default_page_size = env_or("EXPLORER_DEFAULT_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("Invalid EXPLORER_DEFAULT_PAGE_SIZE")?;
        let max_page_size = env_or("EXPLORER_MAX_PAGE_SIZE", &MAX_PAGE_SIZE.to_string())
            .parse()
            .context("Invalid EXPLORER_MAX_PAGE_SIZE")?;

        Ok(Self {
            rpc_url: env_or("BITCOIN_RPC_URL", "http://localhost:10604"),
            rpc_user,
            rpc_password,
            indexer_url: env_or("INDEXER_URL", "http://localhost:7123"),
            geoip_url: env_or("GEOIP_URL", "http://ip-api.com/json"),
            network,
            server_host: env_or("SERVER_HOST", "0.0.0.0"),
            server_port,
            allowed_origins: env::var("ALLOWED_ORIGINS").ok(),
            pages: PagePolicy::new(default_page_size, max_page_size),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn parse_network(name: &str) -> Result<Network> {
    match name.trim().to_lowercase().as_str() {
        "bitcoin" | "mainnet" | "main" => Ok(Network::Bitcoin),
        "testnet" | "test" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        other => anyhow::bail!("Unknown BITCOIN_NETWORK '{}'", other),
    }
}
