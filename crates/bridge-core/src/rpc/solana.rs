//! Solana JSON-RPC 2.0 over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chain_sol::Instruction;
use crypto_utils::SecretSeed;

use super::{with_cancel, AccountInfo, Commitment, SignatureStatus, SolanaRpc, TransactionOutcome};
use crate::config::SolanaConfig;
use crate::error::{BridgeError, Result};

/// Reported when a signature is rooted and the node stops counting.
pub const ROOTED_CONFIRMATIONS: u32 = 32;

#[derive(Debug, Clone)]
pub struct ConfirmOptions {
    pub commitment: Commitment,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ConfirmOptions {
    pub fn from_config(config: &SolanaConfig) -> Self {
        Self {
            commitment: config.commitment,
            timeout: Duration::from_secs(config.confirm_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Poll `getSignatureStatuses` until `signature` reaches the requested
/// commitment. Returns the confirmation count.
pub async fn wait_for_confirmation(
    rpc: &dyn SolanaRpc,
    signature: &str,
    options: &ConfirmOptions,
    cancel: &CancellationToken,
) -> Result<u32> {
    let deadline = Instant::now() + options.timeout;

    loop {
        if let Some(status) = rpc.get_signature_status(signature, cancel).await? {
            if let Some(err) = status.err {
                return Err(BridgeError::infrastructure(
                    "confirm_transaction",
                    format!("transaction {signature} failed on chain: {err}"),
                ));
            }
            if status
                .confirmation_status
                .is_some_and(|reached| reached >= options.commitment)
            {
                return Ok(status
                    .confirmations
                    .map(|c| u32::try_from(c).unwrap_or(u32::MAX))
                    .unwrap_or(ROOTED_CONFIRMATIONS));
            }
        }

        if Instant::now() >= deadline {
            return Err(BridgeError::infrastructure(
                "confirm_transaction",
                format!(
                    "{signature} not {} within {}s",
                    options.commitment.as_str(),
                    options.timeout.as_secs()
                ),
            ));
        }

        with_cancel("confirm_transaction", cancel, async {
            tokio::time::sleep(options.poll_interval).await;
            Ok(())
        })
        .await?;
    }
}

/// Sign `instructions` against the latest blockhash and submit them.
///
/// The first signer pays the fee. Returns the fee payer's signature.
pub async fn send_instructions(
    rpc: &dyn SolanaRpc,
    instructions: &[Instruction],
    signers: &[&SecretSeed],
    cancel: &CancellationToken,
) -> Result<String> {
    let fee_payer_seed = signers
        .first()
        .ok_or_else(|| BridgeError::infrastructure("sendTransaction", "no signers"))?;
    let fee_payer = chain_sol::public_key_from_seed(fee_payer_seed.as_bytes());

    let blockhash = rpc.get_latest_blockhash(cancel).await?;
    let seeds: Vec<&[u8; 32]> = signers.iter().map(|s| s.as_bytes()).collect();
    let signed = chain_sol::build_and_sign(instructions, &fee_payer, &blockhash, &seeds)?;

    let reported = rpc.send_transaction(&signed.wire, cancel).await?;
    if reported != signed.signature {
        warn!(
            expected = %signed.signature,
            reported = %reported,
            "node reported a different signature"
        );
    }
    Ok(signed.signature)
}

/// JSON-RPC client over `reqwest`.
pub struct HttpSolanaRpc {
    client: reqwest::Client,
    url: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl HttpSolanaRpc {
    pub fn new(url: impl Into<String>, commitment: Commitment, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("bridge-core")
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BridgeError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            commitment,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &SolanaConfig) -> Result<Self> {
        Self::new(
            config.rpc_url.clone(),
            config.commitment,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
        cancel: &CancellationToken,
    ) -> Result<RpcOutcome<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let started = Instant::now();

        let envelope: RpcEnvelope<T> = with_cancel(method, cancel, async {
            let response = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| BridgeError::infrastructure(method, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(BridgeError::infrastructure(method, format!("HTTP {status}")));
            }
            response
                .json()
                .await
                .map_err(|e| {
                    BridgeError::infrastructure(method, format!("malformed response: {e}"))
                })
        })
        .await?;

        debug!(method, elapsed_ms = started.elapsed().as_millis() as u64, "solana rpc call");

        match (envelope.error, envelope.result) {
            (Some(err), _) => Ok(RpcOutcome::Error(err)),
            (None, Some(result)) => Ok(RpcOutcome::Value(result)),
            (None, None) => Ok(RpcOutcome::Null),
        }
    }

    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.commitment.as_str() })
    }
}

enum RpcOutcome<T> {
    Value(T),
    Null,
    Error(RpcErrorObject),
}

impl<T> RpcOutcome<T> {
    /// Treat RPC errors as failures and `null` as absence.
    fn optional(self, method: &'static str) -> Result<Option<T>> {
        match self {
            RpcOutcome::Value(v) => Ok(Some(v)),
            RpcOutcome::Null => Ok(None),
            RpcOutcome::Error(e) if e.is_not_found() => Ok(None),
            RpcOutcome::Error(e) => Err(BridgeError::infrastructure(method, e.to_string())),
        }
    }

    fn required(self, method: &'static str) -> Result<T> {
        match self {
            RpcOutcome::Value(v) => Ok(v),
            RpcOutcome::Null => Err(BridgeError::infrastructure(method, "null result")),
            RpcOutcome::Error(e) => Err(BridgeError::infrastructure(method, e.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC "invalid params", which is how a node reports a missing account.
const INVALID_PARAMS: i64 = -32602;

impl RpcErrorObject {
    fn is_not_found(&self) -> bool {
        self.code == INVALID_PARAMS
            && self.message.to_ascii_lowercase().contains("could not find account")
    }
}

impl std::fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.message)
    }
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct BlockhashValue {
    blockhash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSignatureStatus {
    confirmations: Option<u64>,
    confirmation_status: Option<Commitment>,
    err: Option<Value>,
}

#[derive(Deserialize)]
struct RawAccount {
    lamports: u64,
    owner: String,
    data: (String, String),
    executable: bool,
}

#[derive(Deserialize)]
struct RawTransaction {
    slot: u64,
    meta: Option<RawMeta>,
}

#[derive(Deserialize)]
struct RawMeta {
    err: Option<Value>,
}

#[derive(Deserialize)]
struct RawTokenAmount {
    amount: String,
}

#[async_trait]
impl SolanaRpc for HttpSolanaRpc {
    async fn get_balance(&self, address: &str, cancel: &CancellationToken) -> Result<u64> {
        let outcome: RpcOutcome<WithContext<u64>> = self
            .call("getBalance", json!([address, self.commitment_config()]), cancel)
            .await?;
        Ok(outcome.optional("getBalance")?.map(|c| c.value).unwrap_or(0))
    }

    async fn get_latest_blockhash(&self, cancel: &CancellationToken) -> Result<[u8; 32]> {
        let outcome: RpcOutcome<WithContext<BlockhashValue>> = self
            .call("getLatestBlockhash", json!([self.commitment_config()]), cancel)
            .await?;
        let blockhash = outcome.required("getLatestBlockhash")?.value.blockhash;
        chain_sol::decode_address(&blockhash)
            .map_err(|e| BridgeError::infrastructure("getLatestBlockhash", e))
    }

    async fn send_transaction(&self, wire: &[u8], cancel: &CancellationToken) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);
        let params = json!([
            encoded,
            { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
        ]);
        let outcome: RpcOutcome<String> = self.call("sendTransaction", params, cancel).await?;
        outcome.required("sendTransaction")
    }

    async fn get_signature_status(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SignatureStatus>> {
        let params = json!([[signature], { "searchTransactionHistory": true }]);
        let outcome: RpcOutcome<WithContext<Vec<Option<RawSignatureStatus>>>> =
            self.call("getSignatureStatuses", params, cancel).await?;

        let statuses = outcome.required("getSignatureStatuses")?.value;
        Ok(statuses.into_iter().next().flatten().map(|raw| SignatureStatus {
            confirmations: raw.confirmations,
            confirmation_status: raw.confirmation_status,
            err: raw.err.map(|e| e.to_string()),
        }))
    }

    async fn get_account_info(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<AccountInfo>> {
        let params = json!([
            address,
            { "encoding": "base64", "commitment": self.commitment.as_str() }
        ]);
        let outcome: RpcOutcome<WithContext<Option<RawAccount>>> =
            self.call("getAccountInfo", params, cancel).await?;

        let Some(raw) = outcome.optional("getAccountInfo")?.and_then(|c| c.value) else {
            return Ok(None);
        };
        let data = base64::engine::general_purpose::STANDARD
            .decode(&raw.data.0)
            .map_err(|e| {
                BridgeError::infrastructure("getAccountInfo", format!("account data: {e}"))
            })?;

        Ok(Some(AccountInfo {
            lamports: raw.lamports,
            owner: raw.owner,
            data,
            executable: raw.executable,
        }))
    }

    async fn get_transaction(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TransactionOutcome>> {
        // getTransaction does not accept `processed`.
        let commitment = self.commitment.max(Commitment::Confirmed);
        let params = json!([
            signature,
            {
                "encoding": "json",
                "commitment": commitment.as_str(),
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let outcome: RpcOutcome<RawTransaction> =
            self.call("getTransaction", params, cancel).await?;

        Ok(outcome.optional("getTransaction")?.map(|raw| TransactionOutcome {
            slot: raw.slot,
            err: raw
                .meta
                .and_then(|m| m.err)
                .filter(|e| !e.is_null())
                .map(|e| e.to_string()),
        }))
    }

    async fn get_token_account_balance(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<u64>> {
        let outcome: RpcOutcome<WithContext<RawTokenAmount>> = self
            .call("getTokenAccountBalance", json!([address, self.commitment_config()]), cancel)
            .await?;

        outcome
            .optional("getTokenAccountBalance")?
            .map(|c| {
                c.value.amount.parse::<u64>().map_err(|e| {
                    BridgeError::infrastructure("getTokenAccountBalance", format!("amount: {e}"))
                })
            })
            .transpose()
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        space: u64,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let outcome: RpcOutcome<u64> = self
            .call("getMinimumBalanceForRentExemption", json!([space]), cancel)
            .await?;
        outcome.required("getMinimumBalanceForRentExemption")
    }
}
