/// Peer geolocation
///
/// Peers reported by the node are reduced to public, de-duplicated IPs and
/// located through an external service. Results are cached for the life of
/// the process; a peer whose lookup fails is left out of the response.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, RwLock};

use crate::error::UpstreamError;
use crate::types::{EnrichedPeer, GeoRecord, PeerInfo};

// ============================================================================
// Cache
// ============================================================================

/// Bare IP → geolocation store shared by all requests
pub trait GeoCache: Send + Sync {
    fn get(&self, ip: &str) -> Option<GeoRecord>;

    /// Store a record; the first record stored for an IP is kept
    fn insert(&self, record: GeoRecord);
}

/// Unbounded in-memory cache, no eviction
#[derive(Default)]
pub struct MemoryGeoCache {
    entries: RwLock<HashMap<String, GeoRecord>>,
}

impl MemoryGeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GeoCache for MemoryGeoCache {
    fn get(&self, ip: &str) -> Option<GeoRecord> {
        // A poisoned lock only means a writer panicked; the map itself is intact
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(ip).cloned()
    }

    fn insert(&self, record: GeoRecord) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(record.ip.clone()).or_insert(record);
    }
}

// ============================================================================
// External lookup
// ============================================================================

#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<GeoRecord, UpstreamError>;
}

/// ip-api.com style JSON endpoint: `GET {base_url}/{ip}`
pub struct IpApiLocator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
}

impl IpApiLocator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn locate(&self, ip: &str) -> Result<GeoRecord, UpstreamError> {
        let url = format!("{}/{}", self.base_url, ip);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                service: "geolocation",
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: IpApiResponse = response.json().await?;
        if body.status != "success" {
            return Err(UpstreamError::GeoUnavailable(ip.to_string()));
        }

        Ok(GeoRecord {
            ip: ip.to_string(),
            country: body.country,
            city: body.city,
        })
    }
}

// ============================================================================
// Address filtering
// ============================================================================

/// Strip the port from a node-reported peer address
///
/// Handles `1.2.3.4:10605`, `[2001:db8::1]:10605` and bare IPv6 literals.
pub fn bare_ip(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match addr.matches(':').count() {
        1 => addr.split(':').next().unwrap_or(addr),
        _ => addr,
    }
}

fn is_non_public_v4(ip: &Ipv4Addr) -> bool {
    // 10/8, 172.16/12, 192.168/16, 127/8, 169.254/16
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}

fn is_non_public_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || (first & 0xfe00) == 0xfc00 // fc00::/7
        || (first & 0xffc0) == 0xfe80 // fe80::/10
        || ip.to_ipv4_mapped().map_or(false, |v4| is_non_public_v4(&v4))
}

/// Private, loopback or link-local
pub fn is_non_public(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_non_public_v4(&v4),
        Ok(IpAddr::V6(v6)) => is_non_public_v6(&v6),
        Err(_) => false,
    }
}

// ============================================================================
// Assembler
// ============================================================================

pub struct PeerGeolocator {
    cache: Arc<dyn GeoCache>,
    locator: Arc<dyn GeoLocator>,
}

impl PeerGeolocator {
    pub fn new(cache: Arc<dyn GeoCache>, locator: Arc<dyn GeoLocator>) -> Self {
        Self { cache, locator }
    }

    /// Public peers with geolocation attached, in node order
    pub async fn locate_peers(&self, peers: Vec<PeerInfo>) -> Vec<EnrichedPeer> {
        let mut seen = HashSet::new();
        let candidates: Vec<(String, PeerInfo)> = peers
            .into_iter()
            .filter_map(|peer| {
                let ip = bare_ip(&peer.addr).to_string();
                if is_non_public(&ip) {
                    log::debug!("Skipping non-public peer {}", peer.addr);
                    return None;
                }
                seen.insert(ip.clone()).then_some((ip, peer))
            })
            .collect();

        let lookups = candidates
            .into_iter()
            .map(|(ip, peer)| async move { self.lookup(&ip).await.map(|geoip| EnrichedPeer { peer, geoip }) });

        join_all(lookups).await.into_iter().flatten().collect()
    }

    async fn lookup(&self, ip: &str) -> Option<GeoRecord> {
        if let Some(record) = self.cache.get(ip) {
            return Some(record);
        }

        match self.locator.locate(ip).await {
            Ok(record) => {
                self.cache.insert(record.clone());
                Some(record)
            }
            Err(e) => {
                log::debug!("Geolocation failed for {}: {}", ip, e);
                None
            }
        }
    }
}
