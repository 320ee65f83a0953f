/// Transaction indexer client
///
/// The indexer serves historical blocks, transactions and per-script
/// history/UTXOs as JSON. Pages are 0-indexed on this side of the gateway.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::script::ScriptType;
use crate::types::{BlockInfo, ChainInfo, IndexedTx, ScriptUtxos, TxHistoryPage};

type Result<T> = std::result::Result<T, UpstreamError>;

#[async_trait]
pub trait Indexer: Send + Sync {
    async fn blockchain_info(&self) -> Result<Value>;

    /// Block by hash or height, as raw JSON
    async fn block(&self, hash_or_height: &str) -> Result<Value>;

    /// Blocks with heights in `start..=end`
    async fn blocks(&self, start: u64, end: u64) -> Result<Vec<BlockInfo>>;

    async fn tx(&self, txid: &str) -> Result<IndexedTx>;

    async fn script_history(
        &self,
        script_type: ScriptType,
        payload: &str,
        page: u64,
        page_size: u32,
    ) -> Result<TxHistoryPage>;

    async fn script_utxos(&self, script_type: ScriptType, payload: &str) -> Result<Vec<ScriptUtxos>>;

    async fn tip_height(&self) -> Result<u64> {
        let info: ChainInfo = serde_json::from_value(self.blockchain_info().await?)?;
        Ok(info.tip_height)
    }
}

pub struct HttpIndexer {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpIndexer {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid INDEXER_URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("INDEXER_URL must be an http(s) base URL: {}", base_url);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    /// Base URL with `segments` appended, each one percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Never fails: `new` rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        log::debug!("Indexer GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: "indexer",
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response.json().await?)
    }
}

// Indexer errors come back as `{"error": "..."}` or plain text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl Indexer for HttpIndexer {
    async fn blockchain_info(&self) -> Result<Value> {
        self.get_json(self.endpoint(&["blockchain-info"])).await
    }

    async fn block(&self, hash_or_height: &str) -> Result<Value> {
        self.get_json(self.endpoint(&["block", hash_or_height])).await
    }

    async fn blocks(&self, start: u64, end: u64) -> Result<Vec<BlockInfo>> {
        let (start, end) = (start.to_string(), end.to_string());
        self.get_json(self.endpoint(&["blocks", &start, &end])).await
    }

    async fn tx(&self, txid: &str) -> Result<IndexedTx> {
        self.get_json(self.endpoint(&["tx", txid])).await
    }

    async fn script_history(
        &self,
        script_type: ScriptType,
        payload: &str,
        page: u64,
        page_size: u32,
    ) -> Result<TxHistoryPage> {
        let mut url = self.endpoint(&["script", script_type.as_str(), payload, "history"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());
        self.get_json(url).await
    }

    async fn script_utxos(&self, script_type: ScriptType, payload: &str) -> Result<Vec<ScriptUtxos>> {
        self.get_json(self.endpoint(&["script", script_type.as_str(), payload, "utxos"]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"Block not found: 99"}"#), "Block not found: 99");
        assert_eq!(error_message("  Transaction not found\n"), "Transaction not found");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let indexer = HttpIndexer::new("http://localhost:7123/").unwrap();

        let url = indexer.endpoint(&["block", "../blockchain-info?x=1"]);
        assert_eq!(url.query(), None);
        assert_eq!(url.path_segments().unwrap().count(), 2);
        assert!(url.path().starts_with("/block/"));
        assert!(url.path().contains("%2F"));
        assert!(url.path().contains("%3F"));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let indexer = HttpIndexer::new("http://indexer.local/chronik").unwrap();

        let url = indexer.endpoint(&["script", "p2pkh", "abcd", "utxos"]);
        assert_eq!(url.as_str(), "http://indexer.local/chronik/script/p2pkh/abcd/utxos");
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(HttpIndexer::new("mailto:indexer@example.com").is_err());
        assert!(HttpIndexer::new("not a url").is_err());
    }
}
