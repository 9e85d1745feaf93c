//! JSON-RPC client for the ledger's RPC endpoints, behind the [`LedgerRpc`]
//! trait so the transaction lifecycle can run against a test double.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the RPC transport and response parsing.
#[derive(Debug, Clone)]
pub enum RpcError {
    /// Failed to reach the RPC endpoint
    Network(String),
    /// RPC returned a JSON-RPC error response
    Rpc { code: i64, message: String },
    /// Invalid or unexpected response format
    InvalidResponse(String),
    /// Source account not found on the network
    AccountNotFound(String),
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcError::Network(msg) => write!(f, "network error: {}", msg),
            RpcError::Rpc { code, message } => {
                write!(f, "RPC error (code {}): {}", code, message)
            }
            RpcError::InvalidResponse(msg) => write!(f, "invalid RPC response: {}", msg),
            RpcError::AccountNotFound(addr) => write!(f, "account not found: {}", addr),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        RpcError::Network(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Account information from the network.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    /// Account ID (G... address)
    pub account_id: String,
    /// Current sequence number
    pub sequence: i64,
}

/// Fee and transaction data needed to restore expired ledger entries before
/// the simulated call can proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePreamble {
    /// Soroban transaction data as base64 XDR
    pub transaction_data: String,
    /// Minimum fee for the restore transaction, in stroops
    pub min_resource_fee: u64,
}

/// Parsed `simulateTransaction` response.
#[derive(Debug, Clone, Default)]
pub struct SimulateResponse {
    /// Present when the simulated call itself would fail
    pub error: Option<String>,
    /// Soroban transaction data as base64 XDR
    pub transaction_data: String,
    /// Minimum resource fee in stroops
    pub min_resource_fee: u64,
    /// Authorization entries as base64 XDR
    pub auth: Vec<String>,
    /// Return value as base64 XDR, if any
    pub return_value: Option<String>,
    /// Present when required ledger state has expired and must be restored
    pub restore_preamble: Option<RestorePreamble>,
    /// Diagnostic/contract events as base64 XDR
    pub events: Vec<String>,
    /// Latest ledger sequence at simulation time
    pub latest_ledger: u32,
}

/// Response from `sendTransaction`.
#[derive(Debug, Clone)]
pub struct SendTransactionResponse {
    /// Transaction hash
    pub hash: String,
    /// Status: "PENDING", "DUPLICATE", "ERROR", "TRY_AGAIN_LATER"
    pub status: String,
    /// Error result XDR (present when status is "ERROR")
    pub error_result_xdr: Option<String>,
    /// Diagnostic events XDR (present when status is "ERROR")
    pub diagnostic_events_xdr: Vec<String>,
}

/// Response from `getTransaction`.
#[derive(Debug, Clone)]
pub struct GetTransactionResponse {
    /// Status: "SUCCESS", "FAILED", "NOT_FOUND"
    pub status: String,
    /// Ledger number where the transaction was included
    pub ledger: Option<u64>,
    /// Transaction result XDR
    pub result_xdr: Option<String>,
    /// Transaction result meta XDR
    pub result_meta_xdr: Option<String>,
    /// Invocation return value as base64 XDR, when the node surfaces it
    pub return_value: Option<String>,
}

/// One entry from `getLedgerEntries`.
#[derive(Debug, Clone)]
pub struct LedgerEntryResult {
    /// The queried key, base64 XDR
    pub key: String,
    /// The entry payload, base64 XDR
    pub xdr: String,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The network operations the transaction lifecycle depends on: each one a
/// single blocking request/response round trip.
pub trait LedgerRpc {
    fn get_account(&self, account_id: &str) -> Result<AccountInfo, RpcError>;
    fn simulate_transaction(&self, tx_xdr_base64: &str) -> Result<SimulateResponse, RpcError>;
    fn send_transaction(&self, tx_xdr_base64: &str)
        -> Result<SendTransactionResponse, RpcError>;
    fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, RpcError>;
    fn get_latest_ledger(&self) -> Result<u32, RpcError>;
    fn get_ledger_entries(&self, keys: &[String]) -> Result<Vec<LedgerEntryResult>, RpcError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking JSON-RPC client.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl RpcClient {
    /// Create a new RPC client pointing at the given URL.
    pub fn new(url: &str) -> Self {
        RpcClient {
            client: reqwest::blocking::Client::new(),
            url: url.to_string(),
        }
    }

    /// Send a JSON-RPC request and return the parsed JSON body.
    fn send_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        debug!(method, url = %self.url, "rpc request");
        let body = build_jsonrpc_request(method, params);
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| RpcError::Network(format!("reading response body: {}", e)))?;

        if !status.is_success() {
            return Err(RpcError::Network(format!("HTTP {}: {}", status, text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| RpcError::InvalidResponse(format!("invalid JSON: {}", e)))
    }
}

impl LedgerRpc for RpcClient {
    fn get_account(&self, account_id: &str) -> Result<AccountInfo, RpcError> {
        let response = self.send_request("getAccount", json!({ "address": account_id }))?;
        parse_account_response(&response, account_id)
    }

    fn simulate_transaction(&self, tx_xdr_base64: &str) -> Result<SimulateResponse, RpcError> {
        let response =
            self.send_request("simulateTransaction", json!({ "transaction": tx_xdr_base64 }))?;
        parse_simulate_response(&response)
    }

    fn send_transaction(
        &self,
        tx_xdr_base64: &str,
    ) -> Result<SendTransactionResponse, RpcError> {
        let response =
            self.send_request("sendTransaction", json!({ "transaction": tx_xdr_base64 }))?;
        parse_send_transaction_response(&response)
    }

    fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, RpcError> {
        let response = self.send_request("getTransaction", json!({ "hash": hash }))?;
        parse_get_transaction_response(&response)
    }

    fn get_latest_ledger(&self) -> Result<u32, RpcError> {
        let response = self.send_request("getLatestLedger", json!({}))?;
        parse_latest_ledger_response(&response)
    }

    fn get_ledger_entries(&self, keys: &[String]) -> Result<Vec<LedgerEntryResult>, RpcError> {
        let response = self.send_request("getLedgerEntries", json!({ "keys": keys }))?;
        parse_ledger_entries_response(&response)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Build a JSON-RPC 2.0 request body.
pub(crate) fn build_jsonrpc_request(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params
    })
}

/// Pull the `result` object out of a JSON-RPC response, surfacing any
/// JSON-RPC level error.
fn extract_result(response: &Value) -> Result<&Value, RpcError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(RpcError::Rpc { code, message });
    }
    response
        .get("result")
        .ok_or_else(|| RpcError::InvalidResponse("missing 'result' field".to_string()))
}

/// Numeric fields arrive as strings or numbers depending on node version.
fn flexible_u64(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Parse a `getAccount` response into `AccountInfo`.
pub(crate) fn parse_account_response(
    response: &Value,
    account_id: &str,
) -> Result<AccountInfo, RpcError> {
    // Account not found typically returns a specific error
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        if message.contains("not found") || code == -32600 {
            return Err(RpcError::AccountNotFound(account_id.to_string()));
        }
        return Err(RpcError::Rpc { code, message });
    }

    let result = response
        .get("result")
        .ok_or_else(|| RpcError::InvalidResponse("missing 'result' field".to_string()))?;

    let id = result
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or(account_id)
        .to_string();

    let sequence = result
        .get("sequence")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            RpcError::InvalidResponse("missing or invalid 'sequence' field".to_string())
        })?;

    Ok(AccountInfo {
        account_id: id,
        sequence,
    })
}

/// Parse a `simulateTransaction` response.
pub(crate) fn parse_simulate_response(response: &Value) -> Result<SimulateResponse, RpcError> {
    let result = extract_result(response)?;

    // A simulation-level error means the call itself would fail.
    if let Some(error) = result.get("error") {
        return Ok(SimulateResponse {
            error: Some(error.as_str().unwrap_or("unknown simulation error").to_string()),
            ..SimulateResponse::default()
        });
    }

    let restore_preamble = result.get("restorePreamble").map(|restore| RestorePreamble {
        transaction_data: restore
            .get("transactionData")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        min_resource_fee: flexible_u64(restore.get("minResourceFee")).unwrap_or(0),
    });

    let transaction_data = result
        .get("transactionData")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let min_resource_fee = flexible_u64(result.get("minResourceFee")).unwrap_or(0);

    let latest_ledger = flexible_u64(result.get("latestLedger")).unwrap_or(0) as u32;

    let events: Vec<String> = result
        .get("events")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|e| e.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    // First entry of the results array carries auth and the return value.
    let (return_value, auth) =
        if let Some(first) = result.get("results").and_then(|v| v.as_array()).and_then(|a| a.first())
        {
            let ret = first.get("xdr").and_then(|v| v.as_str()).map(String::from);
            let auth_entries: Vec<String> = first
                .get("auth")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|e| e.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            (ret, auth_entries)
        } else {
            (None, Vec::new())
        };

    Ok(SimulateResponse {
        error: None,
        transaction_data,
        min_resource_fee,
        auth,
        return_value,
        restore_preamble,
        events,
        latest_ledger,
    })
}

/// Parse a `sendTransaction` response.
pub(crate) fn parse_send_transaction_response(
    response: &Value,
) -> Result<SendTransactionResponse, RpcError> {
    let result = extract_result(response)?;

    let hash = result
        .get("hash")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let status = result
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let error_result_xdr = result
        .get("errorResultXdr")
        .and_then(|v| v.as_str())
        .map(String::from);

    let diagnostic_events_xdr: Vec<String> = result
        .get("diagnosticEventsXdr")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|e| e.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Ok(SendTransactionResponse {
        hash,
        status,
        error_result_xdr,
        diagnostic_events_xdr,
    })
}

/// Parse a `getTransaction` response.
pub(crate) fn parse_get_transaction_response(
    response: &Value,
) -> Result<GetTransactionResponse, RpcError> {
    let result = extract_result(response)?;

    let status = result
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let ledger = flexible_u64(result.get("ledger"));

    let result_xdr = result
        .get("resultXdr")
        .and_then(|v| v.as_str())
        .map(String::from);

    let result_meta_xdr = result
        .get("resultMetaXdr")
        .and_then(|v| v.as_str())
        .map(String::from);

    let return_value = result
        .get("returnValue")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(GetTransactionResponse {
        status,
        ledger,
        result_xdr,
        result_meta_xdr,
        return_value,
    })
}

/// Parse a `getLatestLedger` response into the ledger sequence.
pub(crate) fn parse_latest_ledger_response(response: &Value) -> Result<u32, RpcError> {
    let result = extract_result(response)?;
    flexible_u64(result.get("sequence"))
        .map(|v| v as u32)
        .ok_or_else(|| RpcError::InvalidResponse("missing 'sequence' field".to_string()))
}

/// Parse a `getLedgerEntries` response.
pub(crate) fn parse_ledger_entries_response(
    response: &Value,
) -> Result<Vec<LedgerEntryResult>, RpcError> {
    let result = extract_result(response)?;
    let entries = result
        .get("entries")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    let key = entry.get("key").and_then(|v| v.as_str())?;
                    let xdr = entry.get("xdr").and_then(|v| v.as_str())?;
                    Some(LedgerEntryResult {
                        key: key.to_string(),
                        xdr: xdr.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
