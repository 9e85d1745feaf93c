//! Test doubles: a scriptable in-memory `LedgerRpc` plus fixture builders.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use lumen_xdr::codec::WriteXdr;
use lumen_xdr::spec::{EnvMetaEntry, FunctionInput, SpecEntry, SpecFunction, SpecType};
use lumen_xdr::tx::{
    AddressCredentials, AuthorizationEntry, AuthorizedFunction, AuthorizedInvocation,
    Credentials, InvokeContractArgs, LedgerFootprint, LedgerKey, SorobanResources,
    SorobanTransactionData,
};
use lumen_xdr::{Address, WireValue};

use crate::parser::{ENV_META_SECTION, SPEC_SECTION};
use crate::rpc::{
    AccountInfo, GetTransactionResponse, LedgerEntryResult, LedgerRpc, RestorePreamble,
    RpcError, SendTransactionResponse, SimulateResponse,
};

// ---------------------------------------------------------------------------
// MockRpc
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MockState {
    sequence: Cell<i64>,
    latest_ledger: Cell<u32>,
    simulate: RefCell<VecDeque<SimulateResponse>>,
    send: RefCell<VecDeque<SendTransactionResponse>>,
    get_tx: RefCell<VecDeque<GetTransactionResponse>>,
    entries: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<String>>,
}

/// Scriptable RPC double. Clones share state, so a test can keep a handle
/// for inspection after handing one to the code under test.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockRpc {
    state: Rc<MockState>,
}

impl MockRpc {
    pub fn new() -> Self {
        let mock = MockRpc::default();
        mock.state.sequence.set(100);
        mock.state.latest_ledger.set(1000);
        mock
    }

    pub fn push_simulate(&self, resp: SimulateResponse) {
        self.state.simulate.borrow_mut().push_back(resp);
    }

    pub fn push_simulate_error(&self, message: &str) {
        self.push_simulate(SimulateResponse {
            error: Some(message.to_string()),
            ..SimulateResponse::default()
        });
    }

    pub fn push_send_pending(&self, hash: &str) {
        self.push_send_status(hash, "PENDING");
    }

    pub fn push_send_status(&self, hash: &str, status: &str) {
        self.state.send.borrow_mut().push_back(SendTransactionResponse {
            hash: hash.to_string(),
            status: status.to_string(),
            error_result_xdr: None,
            diagnostic_events_xdr: Vec::new(),
        });
    }

    pub fn push_get_success(&self, return_value: Option<WireValue>) {
        self.state
            .get_tx
            .borrow_mut()
            .push_back(GetTransactionResponse {
                status: "SUCCESS".to_string(),
                ledger: Some(12345),
                result_xdr: Some("AAAA".to_string()),
                result_meta_xdr: None,
                return_value: return_value.map(|v| v.to_xdr_base64()),
            });
    }

    pub fn push_get_failed(&self) {
        self.state
            .get_tx
            .borrow_mut()
            .push_back(GetTransactionResponse {
                status: "FAILED".to_string(),
                ledger: Some(12345),
                result_xdr: Some("AAAB".to_string()),
                result_meta_xdr: None,
                return_value: None,
            });
    }

    pub fn push_get_not_found(&self) {
        self.state
            .get_tx
            .borrow_mut()
            .push_back(GetTransactionResponse {
                status: "NOT_FOUND".to_string(),
                ledger: None,
                result_xdr: None,
                result_meta_xdr: None,
                return_value: None,
            });
    }

    pub fn set_latest_ledger(&self, sequence: u32) {
        self.state.latest_ledger.set(sequence);
    }

    pub fn insert_ledger_entry(&self, key_b64: String, xdr_b64: String) {
        self.state.entries.borrow_mut().insert(key_b64, xdr_b64);
    }

    pub fn calls_of(&self, method: &str) -> usize {
        self.state
            .calls
            .borrow()
            .iter()
            .filter(|m| *m == method)
            .count()
    }

    fn log(&self, method: &str) {
        self.state.calls.borrow_mut().push(method.to_string());
    }
}

impl LedgerRpc for MockRpc {
    fn get_account(&self, account_id: &str) -> Result<AccountInfo, RpcError> {
        self.log("getAccount");
        let sequence = self.state.sequence.get();
        self.state.sequence.set(sequence + 1);
        Ok(AccountInfo {
            account_id: account_id.to_string(),
            sequence,
        })
    }

    fn simulate_transaction(&self, _tx_xdr_base64: &str) -> Result<SimulateResponse, RpcError> {
        self.log("simulateTransaction");
        self.state
            .simulate
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| RpcError::InvalidResponse("mock: no simulate response queued".into()))
    }

    fn send_transaction(
        &self,
        _tx_xdr_base64: &str,
    ) -> Result<SendTransactionResponse, RpcError> {
        self.log("sendTransaction");
        self.state
            .send
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| RpcError::InvalidResponse("mock: no send response queued".into()))
    }

    fn get_transaction(&self, _hash: &str) -> Result<GetTransactionResponse, RpcError> {
        self.log("getTransaction");
        Ok(self
            .state
            .get_tx
            .borrow_mut()
            .pop_front()
            .unwrap_or(GetTransactionResponse {
                status: "NOT_FOUND".to_string(),
                ledger: None,
                result_xdr: None,
                result_meta_xdr: None,
                return_value: None,
            }))
    }

    fn get_latest_ledger(&self) -> Result<u32, RpcError> {
        self.log("getLatestLedger");
        Ok(self.state.latest_ledger.get())
    }

    fn get_ledger_entries(&self, keys: &[String]) -> Result<Vec<LedgerEntryResult>, RpcError> {
        self.log("getLedgerEntries");
        let entries = self.state.entries.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| {
                entries.get(key).map(|xdr| LedgerEntryResult {
                    key: key.clone(),
                    xdr: xdr.clone(),
                })
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Simulation fixtures
// ---------------------------------------------------------------------------

fn transaction_data(writes: bool) -> SorobanTransactionData {
    SorobanTransactionData {
        archived_entries: None,
        resources: SorobanResources {
            footprint: LedgerFootprint {
                read_only: vec![LedgerKey::contract_instance([1u8; 32])],
                read_write: if writes {
                    vec![LedgerKey::contract_code([9u8; 32])]
                } else {
                    Vec::new()
                },
            },
            instructions: 100_000,
            disk_read_bytes: 1024,
            write_bytes: 512,
        },
        resource_fee: 5_000,
    }
}

/// A successful simulation response; `writes` controls whether the
/// read-write footprint is empty (read call) or not.
pub(crate) fn sim_success(
    return_value: Option<WireValue>,
    auth: Vec<AuthorizationEntry>,
    writes: bool,
) -> SimulateResponse {
    SimulateResponse {
        error: None,
        transaction_data: transaction_data(writes).to_xdr_base64(),
        min_resource_fee: 5_000,
        auth: auth.iter().map(|entry| entry.to_xdr_base64()).collect(),
        return_value: return_value.map(|v| v.to_xdr_base64()),
        restore_preamble: None,
        events: Vec::new(),
        latest_ledger: 1000,
    }
}

/// A simulation response demanding state restoration first.
pub(crate) fn sim_needs_restore() -> SimulateResponse {
    SimulateResponse {
        restore_preamble: Some(RestorePreamble {
            transaction_data: transaction_data(true).to_xdr_base64(),
            min_resource_fee: 700,
        }),
        latest_ledger: 1000,
        ..SimulateResponse::default()
    }
}

fn invocation() -> AuthorizedInvocation {
    AuthorizedInvocation {
        function: AuthorizedFunction::ContractFn(InvokeContractArgs {
            contract_address: Address::Contract([1u8; 32]),
            function_name: "transfer".into(),
            args: Vec::new(),
        }),
        sub_invocations: Vec::new(),
    }
}

/// An address-credential entry with no signatures yet.
pub(crate) fn unsigned_address_entry(address: Address) -> AuthorizationEntry {
    AuthorizationEntry {
        credentials: Credentials::Address(AddressCredentials {
            address,
            nonce: 42,
            signature_expiration_ledger: 0,
            signature: WireValue::Void,
        }),
        root_invocation: invocation(),
    }
}

/// A source-account entry; satisfied by the envelope signature.
pub(crate) fn source_auth_entry() -> AuthorizationEntry {
    AuthorizationEntry {
        credentials: Credentials::SourceAccount,
        root_invocation: invocation(),
    }
}

// ---------------------------------------------------------------------------
// Bytecode fixtures
// ---------------------------------------------------------------------------

/// Minimal token-like contract bytecode: env meta plus two functions
/// (`balance` and `transfer`).
pub(crate) fn token_bytecode() -> Vec<u8> {
    let mut out = b"\x00asm\x01\x00\x00\x00".to_vec();
    out.extend_from_slice(ENV_META_SECTION.as_bytes());
    out.extend(EnvMetaEntry::InterfaceVersion(90194313216).to_xdr());
    out.extend_from_slice(SPEC_SECTION.as_bytes());
    out.extend(
        SpecEntry::Function(SpecFunction {
            doc: String::new(),
            name: "balance".into(),
            inputs: vec![FunctionInput {
                doc: String::new(),
                name: "id".into(),
                ty: SpecType::Address,
            }],
            outputs: vec![SpecType::I128],
        })
        .to_xdr(),
    );
    out.extend(
        SpecEntry::Function(SpecFunction {
            doc: String::new(),
            name: "transfer".into(),
            inputs: vec![
                FunctionInput {
                    doc: String::new(),
                    name: "to".into(),
                    ty: SpecType::Address,
                },
                FunctionInput {
                    doc: String::new(),
                    name: "amount".into(),
                    ty: SpecType::I128,
                },
            ],
            outputs: vec![SpecType::Void],
        })
        .to_xdr(),
    );
    out
}
