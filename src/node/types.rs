//! Response models for the node RPC surface.
//!
//! Consensus-layer responses are deeply nested and vary between node
//! versions, so only the stable outer shells are typed; open-ended
//! interiors stay as raw [`Value`]s.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::ChainError;

/// `status` response.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    pub node_info: RpcNodeInfo,
    pub sync_info: SyncStatus,
    pub validator_info: ValidatorStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcNodeInfo {
    pub id: String,
    pub listen_addr: String,
    /// Chain id the node follows.
    pub network: String,
    pub version: String,
    pub moniker: String,
    #[serde(default)]
    pub channels: Option<String>,
    #[serde(default)]
    pub other: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncStatus {
    pub latest_block_hash: String,
    pub latest_app_hash: String,
    /// Stringified int64, like every height on this surface.
    pub latest_block_height: String,
    pub latest_block_time: DateTime<Utc>,
    pub catching_up: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorStatus {
    pub address: String,
    pub pub_key: Value,
    pub voting_power: String,
}

/// `abci_info` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AbciInfo {
    pub response: AbciInfoDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbciInfoDetail {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub last_block_height: Option<String>,
    #[serde(default)]
    pub last_block_app_hash: Option<String>,
}

/// `net_info` response.
#[derive(Debug, Clone, Deserialize)]
pub struct NetInfo {
    pub listening: bool,
    pub listeners: Vec<String>,
    pub n_peers: String,
    #[serde(default)]
    pub peers: Vec<Value>,
}

/// `num_unconfirmed_txs` and `unconfirmed_txs` responses.
#[derive(Debug, Clone, Deserialize)]
pub struct UnconfirmedTxs {
    pub n_txs: String,
    /// Raw transactions, base64 encoded. Absent on the counting variant.
    #[serde(default)]
    pub txs: Option<Vec<String>>,
}

/// `validators` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcValidatorSet {
    pub block_height: String,
    pub validators: Vec<RpcValidator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcValidator {
    pub address: String,
    pub pub_key: Value,
    pub voting_power: String,
    #[serde(default)]
    pub proposer_priority: Option<String>,
    /// Older node versions report priority under this name.
    #[serde(default)]
    pub accum: Option<String>,
}

/// `abci_query` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AbciQuery {
    pub response: AbciQueryDetail,
}

/// Key and value come back base64 encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct AbciQueryDetail {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub proof: Option<Value>,
    #[serde(default)]
    pub height: Option<String>,
}

impl AbciQueryDetail {
    /// Decoded query result, if the node returned one.
    pub fn value_bytes(&self) -> Result<Option<Vec<u8>>, ChainError> {
        self.value
            .as_deref()
            .map(|encoded| {
                BASE64.decode(encoded).map_err(|e| {
                    ChainError::DeserializationError(format!("abci query value: {e}"))
                })
            })
            .transpose()
    }
}

/// `blockchain` response.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainInfo {
    pub last_height: String,
    #[serde(default)]
    pub block_metas: Vec<Value>,
}

/// `consensus_params` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusParamsInfo {
    pub block_height: String,
    pub consensus_params: Value,
}

/// `tx` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcTx {
    pub hash: String,
    pub height: String,
    #[serde(default)]
    pub index: Option<i64>,
    pub tx_result: Value,
    /// Raw transaction, base64 encoded.
    pub tx: String,
    #[serde(default)]
    pub proof: Option<Value>,
}

/// `tx_search` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TxSearchResult {
    pub txs: Vec<RpcTx>,
    pub total_count: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_decodes_nested_sections() {
        let status: NodeStatus = serde_json::from_value(json!({
            "node_info": {
                "id": "dd2adba52ad9c830fe16a53fe81dac6880a91218",
                "listen_addr": "aa13359cd244f4.elb.us-east-1.amazonaws.com:27146",
                "network": "Binance-Chain-Ganges",
                "version": "0.31.5",
                "channels": "3640202122233038",
                "moniker": "data-seed-0",
                "other": {"tx_index": "on", "rpc_address": "tcp://0.0.0.0:27147"}
            },
            "sync_info": {
                "latest_block_hash": "9B64BB6E53FF8204642ADD4DB3D2B385849543B2",
                "latest_app_hash": "C425B506004F02B09754C0D5AB7BDE55BBF18AE4",
                "latest_block_height": "32845941",
                "latest_block_time": "2019-08-01T11:15:25.795Z",
                "catching_up": false
            },
            "validator_info": {
                "address": "EC9A4A075E96A34D0CA8F2BCDCB7AB0B22B5D3E3",
                "pub_key": {"type": "tendermint/PubKeyEd25519", "value": "RHSb..."},
                "voting_power": "0"
            }
        }))
        .unwrap();

        assert_eq!(status.node_info.network, "Binance-Chain-Ganges");
        assert_eq!(status.sync_info.latest_block_height, "32845941");
        assert_eq!(status.sync_info.latest_block_time.timestamp(), 1_564_658_125);
        assert!(!status.sync_info.catching_up);
        assert_eq!(status.validator_info.voting_power, "0");
    }

    #[test]
    fn abci_query_value_decodes_from_base64() {
        let query: AbciQuery = serde_json::from_value(json!({
            "response": {
                "key": null,
                "value": "aGVsbG8gd29ybGQ=",
                "height": "0"
            }
        }))
        .unwrap();

        assert_eq!(query.response.code, 0);
        let bytes = query.response.value_bytes().unwrap().unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn abci_query_rejects_malformed_base64() {
        let detail = AbciQueryDetail {
            code: 0,
            log: None,
            info: None,
            index: None,
            key: None,
            value: Some("not//valid!!".to_string()),
            proof: None,
            height: None,
        };
        assert!(matches!(
            detail.value_bytes(),
            Err(ChainError::DeserializationError(_))
        ));
    }

    #[test]
    fn tx_search_decodes_entries_and_count() {
        let result: TxSearchResult = serde_json::from_value(json!({
            "txs": [{
                "hash": "0434F94A4885C7C20C4A6488A987A1B5D09B0C45",
                "height": "1035096",
                "index": 0,
                "tx_result": {"data": "eyJ0eXBlIjoi...", "log": "Msg 0: ", "tags": []},
                "tx": "3QHwYl3uCmPObcBDChR/dWsb6Tqi4v3D18txOrwgb4d4Ag=="
            }],
            "total_count": "1"
        }))
        .unwrap();

        assert_eq!(result.total_count, "1");
        assert_eq!(result.txs.len(), 1);
        assert_eq!(result.txs[0].height, "1035096");
    }

    #[test]
    fn unconfirmed_txs_tolerates_missing_list() {
        let counted: UnconfirmedTxs =
            serde_json::from_value(json!({"n_txs": "0", "txs": null})).unwrap();
        assert_eq!(counted.n_txs, "0");
        assert!(counted.txs.is_none());
    }
}
