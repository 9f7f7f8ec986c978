//! Blocking JSON-RPC client for a Lotus-compatible full node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::chain::{ChainApi, DomainSeparationTag};
use crate::domain::{
    Address, ChainEpoch, DealId, MarketDeal, PreCommitOnChain, SectorNumber, SectorRecord, TipSet, TipSetKey,
};
use crate::error::AppError;

pub const DEFAULT_LOTUS_API: &str = "http://127.0.0.1:1234/rpc/v0";

const METHOD_PREFIX: &str = "Filecoin.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct LotusClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
    next_id: AtomicU64,
}

impl LotusClient {
    /// Build a client for `endpoint`. No request is sent until the first call.
    pub fn connect(endpoint: &str, token: Option<&str>) -> Result<Self, AppError> {
        let endpoint = normalize_endpoint(endpoint)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::connection(format!("connect to lotus api failed: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": format!("{METHOD_PREFIX}{method}"),
            "params": params,
            "id": id,
        });
        debug!(method, id, "rpc request");

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::connection(format!("rpc {method}: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| AppError::connection(format!("rpc {method}: read response: {e}")))?;

        serde_json::from_value(decode_envelope(method, status, &text)?)
            .map_err(|e| AppError::rpc(method, format!("decode result: {e}")))
    }

    fn call_bytes(&self, method: &str, params: Value) -> Result<Vec<u8>, AppError> {
        let text: String = self.call(method, params)?;
        BASE64
            .decode(text.as_bytes())
            .map_err(|e| AppError::rpc(method, format!("invalid base64 bytes: {e}")))
    }
}

impl ChainApi for LotusClient {
    fn chain_head(&self) -> Result<TipSet, AppError> {
        self.call("ChainHead", json!([]))
    }

    fn chain_get_tipset_by_height(&self, height: ChainEpoch, tsk: &TipSetKey) -> Result<TipSet, AppError> {
        self.call("ChainGetTipSetByHeight", json!([height, tsk]))
    }

    fn state_miner_active_sectors(&self, miner: &Address, tsk: &TipSetKey) -> Result<Vec<SectorRecord>, AppError> {
        let sectors: Option<Vec<SectorRecord>> = self.call("StateMinerActiveSectors", json!([miner, tsk]))?;
        Ok(sectors.unwrap_or_default())
    }

    fn state_market_storage_deal(&self, deal_id: DealId, tsk: &TipSetKey) -> Result<MarketDeal, AppError> {
        self.call("StateMarketStorageDeal", json!([deal_id, tsk]))
    }

    fn state_sector_get_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<SectorRecord>, AppError> {
        self.call("StateSectorGetInfo", json!([miner, sector, tsk]))
    }

    fn state_sector_precommit_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<PreCommitOnChain>, AppError> {
        self.call("StateSectorPreCommitInfo", json!([miner, sector, tsk]))
    }

    fn state_get_randomness_from_tickets(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError> {
        self.call_bytes(
            "StateGetRandomnessFromTickets",
            json!([tag, epoch, BASE64.encode(entropy), tsk]),
        )
    }

    fn state_get_randomness_from_beacon(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError> {
        self.call_bytes(
            "StateGetRandomnessFromBeacon",
            json!([tag, epoch, BASE64.encode(entropy), tsk]),
        )
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Pull the result out of a JSON-RPC response body.
///
/// Nodes answer some failures with a non-2xx status and a JSON-RPC error
/// body; the error message wins over the bare status when both are present.
fn decode_envelope(method: &str, status: StatusCode, body: &str) -> Result<Value, AppError> {
    let parsed = serde_json::from_str::<RpcResponse>(body);
    if let Ok(RpcResponse { error: Some(err), .. }) = &parsed {
        return Err(AppError::rpc(method, format!("{} (code {})", err.message, err.code)));
    }
    if !status.is_success() {
        return Err(AppError::rpc(method, format!("request failed with status {status}")));
    }
    let envelope = parsed.map_err(|e| AppError::rpc(method, format!("invalid response: {e}")))?;
    Ok(envelope.result.unwrap_or(Value::Null))
}

/// Websocket endpoints are served over plain HTTP POST as well.
fn normalize_endpoint(endpoint: &str) -> Result<String, AppError> {
    let trimmed = endpoint.trim();
    let normalized = if let Some(rest) = trimmed.strip_prefix("ws://") {
        format!("http://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        return Err(AppError::format(format!(
            "unsupported node endpoint '{endpoint}': expected http(s):// or ws(s)://"
        )));
    };
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorKind;

    #[test]
    fn websocket_endpoints_map_to_http() {
        assert_eq!(normalize_endpoint("ws://10.0.0.1:1234/rpc/v1").unwrap(), "http://10.0.0.1:1234/rpc/v1");
        assert_eq!(normalize_endpoint("wss://node/rpc/v1").unwrap(), "https://node/rpc/v1");
        assert_eq!(normalize_endpoint(DEFAULT_LOTUS_API).unwrap(), DEFAULT_LOTUS_API);
        assert!(normalize_endpoint("/ip4/127.0.0.1/tcp/1234").is_err());
    }

    #[test]
    fn empty_token_is_not_sent() {
        let client = LotusClient::connect(DEFAULT_LOTUS_API, Some("")).unwrap();
        assert!(client.token.is_none());
        assert_eq!(client.endpoint(), DEFAULT_LOTUS_API);
    }

    const ACTOR_NOT_FOUND: &str = r#"{"jsonrpc":"2.0","id":1,"error":{"code":1,"message":"actor not found"}}"#;

    #[test]
    fn error_body_wins_over_a_failing_status() {
        let err = decode_envelope("StateMinerInfo", StatusCode::INTERNAL_SERVER_ERROR, ACTOR_NOT_FOUND).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rpc);
        assert_eq!(err.message(), "rpc StateMinerInfo: actor not found (code 1)");

        let err = decode_envelope("StateMinerInfo", StatusCode::OK, ACTOR_NOT_FOUND).unwrap_err();
        assert_eq!(err.message(), "rpc StateMinerInfo: actor not found (code 1)");
    }

    #[test]
    fn failing_status_without_an_envelope_reports_the_status() {
        let err = decode_envelope("ChainHead", StatusCode::UNAUTHORIZED, "missing permission").unwrap_err();
        assert_eq!(err.message(), "rpc ChainHead: request failed with status 401 Unauthorized");

        let err = decode_envelope("ChainHead", StatusCode::BAD_GATEWAY, r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(err.message().ends_with("status 502 Bad Gateway"));
    }

    #[test]
    fn successful_envelopes_yield_the_result() {
        let body = r#"{"jsonrpc":"2.0","id":3,"result":{"Height":10}}"#;
        assert_eq!(decode_envelope("ChainHead", StatusCode::OK, body).unwrap(), json!({"Height": 10}));
        assert_eq!(decode_envelope("ChainHead", StatusCode::OK, r#"{"id":3}"#).unwrap(), Value::Null);

        let err = decode_envelope("ChainHead", StatusCode::OK, "<html>").unwrap_err();
        assert!(err.message().starts_with("rpc ChainHead: invalid response"));
    }

    #[test]
    fn tags_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&DomainSeparationTag::SealRandomness).unwrap(), "5");
        assert_eq!(
            serde_json::to_string(&DomainSeparationTag::InteractiveSealChallengeSeed).unwrap(),
            "6"
        );
    }
}
