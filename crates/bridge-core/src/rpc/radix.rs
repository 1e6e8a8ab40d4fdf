//! Radix Core API (LTS endpoints) over HTTP.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chain_radix::{
    Manifest, NotarizedTransaction, RadixNetwork, TransactionHeader, TransactionIntent,
};
use crypto_utils::random::random_u32;
use crypto_utils::{SecretSeed, SecureRandom};

use super::{with_cancel, ConstructionMetadata, IntentStatus, RadixCoreApi};
use crate::config::RadixConfig;
use crate::error::{BridgeError, Result};

/// Notarise `manifest` with `notary` for the current epoch and submit it.
pub async fn submit_manifest(
    api: &dyn RadixCoreApi,
    network: RadixNetwork,
    manifest: Manifest,
    notary: &SecretSeed,
    rng: &dyn SecureRandom,
    cancel: &CancellationToken,
) -> Result<NotarizedTransaction> {
    let metadata = api.construction_metadata(cancel).await?;
    let header = TransactionHeader::self_notarized(
        network,
        metadata.current_epoch,
        random_u32(rng),
        chain_radix::public_key_from_seed(notary.as_bytes()),
    );
    let intent = TransactionIntent { header, manifest };
    let notarized = chain_radix::notarize(&intent, notary.as_bytes())?;

    if api.submit(&notarized.payload_hex(), cancel).await? {
        debug!(transaction_id = %notarized.transaction_id, "node already knew the transaction");
    }
    Ok(notarized)
}

/// How long to wait for an intent to commit, and how often to ask.
#[derive(Debug, Clone)]
pub struct CommitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl CommitOptions {
    pub fn from_config(config: &RadixConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.commit_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Poll `/transaction/status` until `transaction_id` commits successfully.
///
/// A failed commit or a permanent rejection is an error, as is running
/// out of time.
pub async fn wait_for_commit(
    api: &dyn RadixCoreApi,
    transaction_id: &str,
    options: &CommitOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let deadline = Instant::now() + options.timeout;

    loop {
        let status = api.transaction_status(transaction_id, cancel).await?;
        match status {
            IntentStatus::CommittedSuccess => return Ok(()),
            IntentStatus::CommittedFailure | IntentStatus::PermanentRejection => {
                return Err(BridgeError::infrastructure(
                    "wait_for_commit",
                    format!("{transaction_id} ended as {status:?}"),
                ));
            }
            _ => {}
        }

        if Instant::now() >= deadline {
            warn!(transaction_id, ?status, "radix intent did not commit in time");
            return Err(BridgeError::infrastructure(
                "wait_for_commit",
                format!(
                    "{transaction_id} not committed within {}s",
                    options.timeout.as_secs()
                ),
            ));
        }

        with_cancel("wait_for_commit", cancel, async {
            tokio::time::sleep(options.poll_interval).await;
            Ok(())
        })
        .await?;
    }
}

pub struct HttpRadixCoreApi {
    client: reqwest::Client,
    base_url: String,
    network: RadixNetwork,
}

impl HttpRadixCoreApi {
    pub fn new(
        base_url: impl Into<String>,
        network: RadixNetwork,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("bridge-core")
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BridgeError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            network,
        })
    }

    pub fn from_config(config: &RadixConfig) -> Result<Self> {
        Self::new(
            config.core_api_url.clone(),
            config.network()?,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn network(&self) -> RadixNetwork {
        self.network
    }

    /// POST `body` to `path`.
    ///
    /// `Ok(None)` only when the node answers 404 with its own error body;
    /// a bare 404 means the URL is wrong and is an error.
    async fn post<T: DeserializeOwned>(
        &self,
        path: &'static str,
        body: Value,
        cancel: &CancellationToken,
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();

        let result = with_cancel(path, cancel, async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| BridgeError::infrastructure(path, e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return not_found_or_error(path, status, &body).map(|()| None);
            }
            response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| BridgeError::infrastructure(path, format!("malformed response: {e}")))
        })
        .await;

        debug!(path, elapsed_ms = started.elapsed().as_millis() as u64, "radix core api call");
        result
    }
}

/// The node's error body.
#[derive(Deserialize)]
struct CoreApiError {
    code: u16,
    #[serde(default)]
    message: String,
}

/// `Ok(())` when a failed response is the node reporting a missing entity.
fn not_found_or_error(path: &str, status: StatusCode, body: &str) -> Result<()> {
    let error = serde_json::from_str::<CoreApiError>(body).ok();
    if status == StatusCode::NOT_FOUND && error.as_ref().is_some_and(|e| e.code == 404) {
        return Ok(());
    }
    let detail = error.map_or_else(|| body.to_string(), |e| e.message);
    Err(BridgeError::infrastructure(path, format!("HTTP {status} {detail}")))
}

#[derive(Deserialize)]
struct ConstructionResponse {
    current_epoch: u64,
    ledger_clock: LedgerClock,
}

#[derive(Deserialize)]
struct LedgerClock {
    unix_timestamp_ms: i64,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    duplicate: bool,
}

#[derive(Deserialize)]
struct StatusResponse {
    intent_status: IntentStatus,
}

#[derive(Deserialize)]
struct BalanceResponse {
    fungible_resource_balance: FungibleBalance,
}

#[derive(Deserialize)]
struct FungibleBalance {
    amount: String,
}

#[async_trait]
impl RadixCoreApi for HttpRadixCoreApi {
    async fn construction_metadata(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConstructionMetadata> {
        const PATH: &str = "/lts/transaction/construction";
        let body = json!({ "network": self.network.logical_name() });
        let response: ConstructionResponse = self
            .post(PATH, body, cancel)
            .await?
            .ok_or_else(|| BridgeError::infrastructure(PATH, "endpoint not found"))?;

        Ok(ConstructionMetadata {
            current_epoch: response.current_epoch,
            ledger_unix_timestamp_ms: response.ledger_clock.unix_timestamp_ms,
        })
    }

    async fn submit(&self, notarized_hex: &str, cancel: &CancellationToken) -> Result<bool> {
        const PATH: &str = "/lts/transaction/submit";
        let body = json!({
            "network": self.network.logical_name(),
            "notarized_transaction_hex": notarized_hex,
        });
        let response: SubmitResponse = self
            .post(PATH, body, cancel)
            .await?
            .ok_or_else(|| BridgeError::infrastructure(PATH, "endpoint not found"))?;
        Ok(response.duplicate)
    }

    async fn transaction_status(
        &self,
        intent_hash: &str,
        cancel: &CancellationToken,
    ) -> Result<IntentStatus> {
        let body = json!({
            "network": self.network.logical_name(),
            "intent_hash": intent_hash,
        });
        let response: Option<StatusResponse> =
            self.post("/lts/transaction/status", body, cancel).await?;
        Ok(response.map_or(IntentStatus::NotSeen, |r| r.intent_status))
    }

    async fn resource_balance(
        &self,
        account: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        const PATH: &str = "/lts/state/account-fungible-resource-balance";
        let body = json!({
            "network": self.network.logical_name(),
            "account_address": account,
            "resource_address": resource,
        });
        let Some(response) = self.post::<BalanceResponse>(PATH, body, cancel).await? else {
            return Ok(Decimal::ZERO);
        };
        response
            .fungible_resource_balance
            .amount
            .parse::<Decimal>()
            .map_err(|e| BridgeError::infrastructure(PATH, format!("balance amount: {e}")))
    }

    async fn non_fungible_data(
        &self,
        resource: &str,
        local_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<BTreeMap<String, String>>> {
        let body = json!({
            "network": self.network.logical_name(),
            "resource_address": resource,
            "non_fungible_id": local_id,
        });
        let response: Option<Value> = self.post("/state/non-fungible", body, cancel).await?;
        Ok(response.as_ref().and_then(named_fields))
    }

    async fn non_fungible_amount(
        &self,
        account: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        const PATH: &str = "/state/account";
        let body = json!({
            "network": self.network.logical_name(),
            "account_address": account,
        });
        let Some(response) = self.post::<Value>(PATH, body, cancel).await? else {
            return Ok(Decimal::ZERO);
        };
        vault_amount(&response, resource)
            .map_err(|e| BridgeError::infrastructure(PATH, format!("vault amount: {e}")))
    }

    async fn committed_non_fungible_ids(
        &self,
        intent_hash: &str,
        resource: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        const PATH: &str = "/transaction/receipt";
        let body = json!({
            "network": self.network.logical_name(),
            "intent_hash": intent_hash,
        });
        let response: Value = self.post(PATH, body, cancel).await?.ok_or_else(|| {
            BridgeError::infrastructure(PATH, format!("{intent_hash} has no receipt"))
        })?;
        Ok(minted_local_ids(&response, resource))
    }
}

/// Sum the `amount` of every vault of `resource` in an account state.
fn vault_amount(state: &Value, resource: &str) -> std::result::Result<Decimal, String> {
    let mut total = Decimal::ZERO;
    let mut pending = vec![state];
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(map) => {
                let matches = map.get("resource_address").and_then(Value::as_str) == Some(resource);
                if let (true, Some(amount)) = (matches, map.get("amount").and_then(Value::as_str)) {
                    total += amount.parse::<Decimal>().map_err(|e| e.to_string())?;
                } else {
                    pending.extend(map.values());
                }
            }
            Value::Array(items) => pending.extend(items),
            _ => {}
        }
    }
    Ok(total)
}

/// Local ids from the `MintNonFungibleResourceEvent`s that `resource`
/// emitted in a committed receipt.
fn minted_local_ids(receipt: &Value, resource: &str) -> Vec<String> {
    let Some(events) = find_key(receipt, "events").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for event in events {
        let is_mint = event
            .get("type")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            == Some("MintNonFungibleResourceEvent");
        let emitter = event.get("type").and_then(|t| find_key(t, "entity_address"));
        if !is_mint || emitter.and_then(Value::as_str) != Some(resource) {
            continue;
        }
        if let Some(data) = event.get("data") {
            collect_local_ids(data, &mut ids);
        }
    }
    ids
}

fn collect_local_ids(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            let kind = map.get("kind").and_then(Value::as_str);
            match (kind, map.get("value").and_then(Value::as_str)) {
                (Some("NonFungibleLocalId"), Some(id)) => ids.push(id.to_string()),
                _ => map.values().for_each(|v| collect_local_ids(v, ids)),
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_local_ids(v, ids)),
        _ => {}
    }
}

/// Collect `field_name -> value` pairs from the first `programmatic_json`
/// tuple found in `value`. Non-string leaves are rendered as JSON.
fn named_fields(value: &Value) -> Option<BTreeMap<String, String>> {
    let programmatic = find_key(value, "programmatic_json")?;
    let fields = programmatic.get("fields")?.as_array()?;

    let map = fields
        .iter()
        .filter_map(|field| {
            let name = field.get("field_name")?.as_str()?;
            let rendered = match field.get("value")? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((name.to_string(), rendered))
        })
        .collect();
    Some(map)
}

fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}
