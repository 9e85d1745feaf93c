//! Contract client facade: a parsed interface bound to a deployed contract
//! address, with named-method invocation, install, and deploy built on the
//! transaction lifecycle.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::info;

use lumen_xdr::codec::{CodecError, ReadXdr, WriteXdr};
use lumen_xdr::tx::{
    ContractIdPreimage, CreateContractArgsV2, HashIdPreimage, HostFunction, InvokeContractArgs,
    LedgerEntryData, LedgerKey,
};
use lumen_xdr::{Address, ContractExecutable, WireValue};

use crate::assembled::{AssembledTransaction, TxError, TxOptions};
use crate::auth::network_id;
use crate::keys::Keypair;
use crate::native::Native;
use crate::parser::{parse_contract_bytecode, ContractInfo, ParseError};
use crate::rpc::{LedgerRpc, RpcError};
use crate::spec::{ContractSpec, MarshalError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors surfaced by the facade: each wraps the failing layer's own error,
/// plus the few conditions only the facade can detect.
#[derive(Debug, Clone)]
pub enum ClientError {
    Marshal(MarshalError),
    Parse(ParseError),
    Tx(TxError),
    Rpc(RpcError),
    Codec(CodecError),
    InvalidAddress(String),
    /// No instance entry on the network for that contract id
    ContractNotFound(String),
    /// The contract runs the built-in asset executable, which embeds no
    /// interface spec
    NotWasmContract(String),
    /// The network returned something other than what the operation implies
    UnexpectedResult(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Marshal(e) => write!(f, "{}", e),
            ClientError::Parse(e) => write!(f, "{}", e),
            ClientError::Tx(e) => write!(f, "{}", e),
            ClientError::Rpc(e) => write!(f, "{}", e),
            ClientError::Codec(e) => write!(f, "{}", e),
            ClientError::InvalidAddress(msg) => write!(f, "invalid address: {}", msg),
            ClientError::ContractNotFound(id) => write!(f, "contract not found: {}", id),
            ClientError::NotWasmContract(id) => {
                write!(f, "contract {} is not a WASM contract", id)
            }
            ClientError::UnexpectedResult(msg) => write!(f, "unexpected result: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<MarshalError> for ClientError {
    fn from(e: MarshalError) -> Self {
        ClientError::Marshal(e)
    }
}

impl From<ParseError> for ClientError {
    fn from(e: ParseError) -> Self {
        ClientError::Parse(e)
    }
}

impl From<TxError> for ClientError {
    fn from(e: TxError) -> Self {
        ClientError::Tx(e)
    }
}

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self {
        ClientError::Rpc(e)
    }
}

impl From<CodecError> for ClientError {
    fn from(e: CodecError) -> Self {
        ClientError::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Contract id derivation
// ---------------------------------------------------------------------------

/// Derive the contract id a deploy from `deployer` with `salt` produces:
/// `sha256(contract-id preimage)`, domain-separated by the network.
pub fn derive_contract_id(
    network_passphrase: &str,
    deployer: Address,
    salt: [u8; 32],
) -> [u8; 32] {
    let preimage = HashIdPreimage::ContractId {
        network_id: network_id(network_passphrase),
        preimage: ContractIdPreimage::Address {
            address: deployer,
            salt,
        },
    };
    Sha256::digest(preimage.to_xdr()).into()
}

// ---------------------------------------------------------------------------
// ContractClient
// ---------------------------------------------------------------------------

/// A parsed contract interface bound to a deployed address.
#[derive(Debug)]
pub struct ContractClient<R: LedgerRpc> {
    info: ContractInfo,
    spec: ContractSpec,
    contract_id: [u8; 32],
    rpc: R,
    keypair: Option<Keypair>,
    options: TxOptions,
}

impl<R: LedgerRpc> ContractClient<R> {
    /// Bind an already-parsed interface to a deployed contract address.
    pub fn new(
        info: ContractInfo,
        contract_id: &str,
        rpc: R,
        keypair: Option<Keypair>,
        options: TxOptions,
    ) -> Result<Self, ClientError> {
        let address =
            Address::from_strkey(contract_id).map_err(ClientError::InvalidAddress)?;
        let Address::Contract(id) = address else {
            return Err(ClientError::InvalidAddress(format!(
                "{} is not a C... contract address",
                contract_id
            )));
        };
        let spec = ContractSpec::new(info.entries.clone());
        Ok(ContractClient {
            info,
            spec,
            contract_id: id,
            rpc,
            keypair,
            options,
        })
    }

    /// Resolve a deployed contract's interface from the live network:
    /// instance entry, then code entry, then bytecode parse.
    pub fn from_network(
        contract_id: &str,
        rpc: R,
        keypair: Option<Keypair>,
        options: TxOptions,
    ) -> Result<Self, ClientError> {
        let address =
            Address::from_strkey(contract_id).map_err(ClientError::InvalidAddress)?;
        let Address::Contract(id) = address else {
            return Err(ClientError::InvalidAddress(format!(
                "{} is not a C... contract address",
                contract_id
            )));
        };
        let wasm_hash = fetch_wasm_hash(&rpc, id, contract_id)?;
        let code = fetch_wasm_code(&rpc, wasm_hash)?;
        let info = parse_contract_bytecode(&code)?;
        info!(contract = contract_id, entries = info.entries.len(), "resolved contract interface");
        Self::new(info, contract_id, rpc, keypair, options)
    }

    pub fn info(&self) -> &ContractInfo {
        &self.info
    }

    pub fn spec(&self) -> &ContractSpec {
        &self.spec
    }

    pub fn contract_address(&self) -> Address {
        Address::Contract(self.contract_id)
    }

    /// Marshal `args` and build a simulated transaction for `function`
    /// without signing or sending. The entry point for callers that drive
    /// multi-party authorization themselves.
    pub fn invoke_tx(
        &self,
        function: &str,
        args: &[(String, Native)],
    ) -> Result<AssembledTransaction<'_, R>, ClientError> {
        let wire_args = self.spec.args_to_wire_values(function, args)?;
        let host_function = HostFunction::InvokeContract(InvokeContractArgs {
            contract_address: self.contract_address(),
            function_name: function.to_string(),
            args: wire_args,
        });
        Ok(AssembledTransaction::build(
            &self.rpc,
            self.keypair.as_ref(),
            self.options.clone(),
            host_function,
        )?)
    }

    /// Invoke a named contract function. Read calls return the simulated
    /// value without submission; state-changing calls sign, send and poll,
    /// returning the terminal return value. `force` submits even a read
    /// call.
    pub fn invoke(
        &self,
        function: &str,
        args: &[(String, Native)],
        force: bool,
    ) -> Result<Option<WireValue>, ClientError> {
        let mut at = self.invoke_tx(function, args)?;
        if !force && at.is_read_call().map_err(ClientError::Tx)? {
            return Ok(at.result().cloned());
        }
        at.sign(force)?;
        let outcome = at.send()?;
        if !outcome.success {
            return Err(ClientError::Tx(TxError::TransactionFailed {
                hash: outcome.hash,
                result_xdr: outcome.result_xdr,
            }));
        }
        Ok(outcome.return_value)
    }

    /// Upload contract bytecode, returning its content hash. If simulation
    /// shows the upload is side-effect-free (code already on-ledger), the
    /// hash comes from the simulation result without a submission.
    pub fn install(
        rpc: &R,
        wasm: &[u8],
        keypair: Option<&Keypair>,
        options: &TxOptions,
    ) -> Result<[u8; 32], ClientError> {
        let local_hash: [u8; 32] = Sha256::digest(wasm).into();
        let mut at = AssembledTransaction::build(
            rpc,
            keypair,
            options.clone(),
            HostFunction::UploadWasm(wasm.to_vec()),
        )?;

        if at.is_read_call().map_err(ClientError::Tx)? {
            return Ok(extract_hash(at.result()).unwrap_or(local_hash));
        }

        at.sign(false)?;
        let outcome = at.send()?;
        if !outcome.success {
            return Err(ClientError::Tx(TxError::TransactionFailed {
                hash: outcome.hash,
                result_xdr: outcome.result_xdr,
            }));
        }
        Ok(extract_hash(outcome.return_value.as_ref()).unwrap_or(local_hash))
    }

    /// Deploy a new contract instance from installed code, invoking its
    /// constructor. Construction is never a read call, so this always signs
    /// and submits, then re-resolves the new contract's interface from the
    /// network.
    pub fn deploy(
        rpc: R,
        keypair: Option<Keypair>,
        options: TxOptions,
        wasm_hash: [u8; 32],
        salt: [u8; 32],
        constructor_args: Vec<WireValue>,
    ) -> Result<Self, ClientError> {
        let deployer = Address::from_strkey(&options.source_account)
            .map_err(ClientError::InvalidAddress)?;
        let contract_id = derive_contract_id(&options.network_passphrase, deployer, salt);

        {
            let host_function = HostFunction::CreateContractV2(CreateContractArgsV2 {
                preimage: ContractIdPreimage::Address {
                    address: deployer,
                    salt,
                },
                executable: ContractExecutable::Wasm(wasm_hash),
                constructor_args,
            });
            let mut at = AssembledTransaction::build(
                &rpc,
                keypair.as_ref(),
                options.clone(),
                host_function,
            )?;
            at.sign(true)?;
            let outcome = at.send()?;
            if !outcome.success {
                return Err(ClientError::Tx(TxError::TransactionFailed {
                    hash: outcome.hash,
                    result_xdr: outcome.result_xdr,
                }));
            }
        }

        let contract_strkey = Address::Contract(contract_id).to_strkey();
        info!(contract = %contract_strkey, "contract deployed");
        Self::from_network(&contract_strkey, rpc, keypair, options)
    }
}

fn extract_hash(value: Option<&WireValue>) -> Option<[u8; 32]> {
    match value {
        Some(WireValue::Bytes(bytes)) if bytes.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(bytes);
            Some(out)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Network resolution helpers
// ---------------------------------------------------------------------------

/// Fetch the WASM hash from a deployed contract's instance entry.
fn fetch_wasm_hash<R: LedgerRpc>(
    rpc: &R,
    contract_id: [u8; 32],
    display: &str,
) -> Result<[u8; 32], ClientError> {
    let key = LedgerKey::contract_instance(contract_id).to_xdr_base64();
    let entries = rpc.get_ledger_entries(&[key])?;
    let first = entries
        .first()
        .ok_or_else(|| ClientError::ContractNotFound(display.to_string()))?;

    match LedgerEntryData::from_xdr_base64(&first.xdr)? {
        LedgerEntryData::ContractData(entry) => match entry.val {
            WireValue::ContractInstance {
                executable: ContractExecutable::Wasm(hash),
                ..
            } => Ok(hash),
            WireValue::ContractInstance {
                executable: ContractExecutable::StellarAsset,
                ..
            } => Err(ClientError::NotWasmContract(display.to_string())),
            _ => Err(ClientError::UnexpectedResult(
                "contract data is not an instance entry".to_string(),
            )),
        },
        _ => Err(ClientError::UnexpectedResult(
            "ledger entry is not contract data".to_string(),
        )),
    }
}

/// Fetch the raw bytecode for a given code hash.
fn fetch_wasm_code<R: LedgerRpc>(rpc: &R, hash: [u8; 32]) -> Result<Vec<u8>, ClientError> {
    let key = LedgerKey::contract_code(hash).to_xdr_base64();
    let entries = rpc.get_ledger_entries(&[key])?;
    let first = entries.first().ok_or_else(|| {
        ClientError::UnexpectedResult("no code entry found for hash".to_string())
    })?;

    match LedgerEntryData::from_xdr_base64(&first.xdr)? {
        LedgerEntryData::ContractCode(entry) => Ok(entry.code),
        _ => Err(ClientError::UnexpectedResult(
            "ledger entry is not contract code".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
