/// Indexer, node and explorer response types
///
/// Indexer records keep every field we do not interpret in a flattened
/// `extra` map so explorer responses carry the upstream record intact.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::rank::RankPayload;

// ============================================================================
// Indexer records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    /// Script of the output being spent, when the indexer knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_script: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    #[serde(deserialize_with = "de_sats", serialize_with = "ser_sats")]
    pub value: u64,
    pub output_script: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Block a transaction was mined in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxBlock {
    pub height: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTx {
    pub txid: String,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<TxBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_first_seen: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    #[serde(default)]
    pub hash: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedBlock {
    pub block_info: BlockInfo,
    #[serde(default)]
    pub txs: Vec<IndexedTx>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub tip_height: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHistoryPage {
    #[serde(default)]
    pub txs: Vec<IndexedTx>,
    #[serde(default)]
    pub num_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(deserialize_with = "de_sats", serialize_with = "ser_sats")]
    pub value: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// UTXOs of one output script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptUtxos {
    #[serde(default)]
    pub output_script: String,
    #[serde(default)]
    pub utxos: Vec<Utxo>,
}

// ============================================================================
// Node records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub addr: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub ip: String,
    pub country: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedPeer {
    #[serde(flatten)]
    pub peer: PeerInfo,
    pub geoip: GeoRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOverview {
    pub mining_info: Value,
    pub peer_info: Vec<EnrichedPeer>,
}

// ============================================================================
// Explorer views
// ============================================================================

/// What an output script turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputClass {
    Plain,
    Address(String),
    SpecialPayload(RankPayload),
}

// Serialized as a map so it can be flattened into the output object
impl Serialize for OutputClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Plain => {}
            Self::Address(address) => map.serialize_entry("address", address)?,
            Self::SpecialPayload(payload) => map.serialize_entry("specialPayload", payload)?,
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedOutput {
    #[serde(flatten)]
    pub output: TxOutput,
    #[serde(flatten)]
    pub class: OutputClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedInput {
    #[serde(flatten)]
    pub input: TxInput,
    /// Omitted without a previous-output script, `null` for non-address scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerTx {
    pub txid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<TxBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_first_seen: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub inputs: Vec<EnrichedInput>,
    pub outputs: Vec<EnrichedOutput>,
    pub confirmations: u64,
    pub sum_burned_sats: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlock {
    pub block_info: BlockInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub txs: Vec<ExplorerTx>,
    pub mined_by: String,
}

/// Genesis is returned exactly as the indexer sent it
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BlockView {
    Genesis(Value),
    Mined(ExplorerBlock),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TxView {
    Raw(Value),
    Enriched(ExplorerTx),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockListing {
    pub blocks: Vec<BlockInfo>,
    pub tip_height: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressHistory {
    pub txs: Vec<ExplorerTx>,
    pub num_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressHistoryPage {
    pub script_type: String,
    pub script_payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    pub last_seen: Option<Value>,
    pub history: AddressHistory,
}

// ============================================================================
// Satoshi amounts arrive as JSON strings or numbers
// ============================================================================

fn de_sats<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(de::Error::custom),
    }
}

fn ser_sats<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
