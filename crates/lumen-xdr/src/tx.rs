//! Transaction-layer wire types: envelopes, the contract-invoking and
//! restore operations, Soroban resource data, ledger keys, and the
//! authorization entry structures with their signable preimages.
//!
//! Only the layouts this client produces or consumes are modeled; decoding a
//! discriminant outside that subset fails rather than guessing.

use crate::codec::{CodecError, ReadXdr, Reader, WriteXdr, Writer};
use crate::value::{Address, ContractExecutable, WireValue};

// Envelope discriminants fixed by the wire format.
pub const ENVELOPE_TYPE_TX: u32 = 2;
const ENVELOPE_TYPE_CONTRACT_ID: u32 = 8;
const ENVELOPE_TYPE_SOROBAN_AUTHORIZATION: u32 = 9;

const OP_INVOKE_HOST_FUNCTION: u32 = 24;
const OP_RESTORE_FOOTPRINT: u32 = 26;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Ed25519 account identifier (the public-key union's only arm).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountId(pub [u8; 32]);

impl ReadXdr for AccountId {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("public key type")? {
            0 => Ok(AccountId(r.read_fixed::<32>("account key")?)),
            tag => Err(CodecError::UnknownTag {
                context: "public key type",
                tag,
            }),
        }
    }
}

impl WriteXdr for AccountId {
    fn write_xdr(&self, w: &mut Writer) {
        w.write_u32(0);
        w.write_fixed(&self.0);
    }
}

/// Transaction source account. Only the plain ed25519 form is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxedAccount {
    Ed25519([u8; 32]),
}

impl ReadXdr for MuxedAccount {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("muxed account type")? {
            0 => Ok(MuxedAccount::Ed25519(r.read_fixed::<32>("account key")?)),
            tag => Err(CodecError::UnknownTag {
                context: "muxed account type",
                tag,
            }),
        }
    }
}

impl WriteXdr for MuxedAccount {
    fn write_xdr(&self, w: &mut Writer) {
        let MuxedAccount::Ed25519(bytes) = self;
        w.write_u32(0);
        w.write_fixed(bytes);
    }
}

// ---------------------------------------------------------------------------
// Invocation arguments
// ---------------------------------------------------------------------------

/// The target of a contract invocation: which contract, which function,
/// which wire-value arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeContractArgs {
    pub contract_address: Address,
    pub function_name: String,
    pub args: Vec<WireValue>,
}

impl ReadXdr for InvokeContractArgs {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let contract_address = Address::read_xdr(r)?;
        let function_name = r.read_string(crate::value::SYMBOL_LIMIT, "function name")?;
        let len = r.read_seq_len("invoke args")?;
        let mut args = Vec::with_capacity(len);
        for _ in 0..len {
            args.push(WireValue::read_xdr(r)?);
        }
        Ok(InvokeContractArgs {
            contract_address,
            function_name,
            args,
        })
    }
}

impl WriteXdr for InvokeContractArgs {
    fn write_xdr(&self, w: &mut Writer) {
        self.contract_address.write_xdr(w);
        w.write_string(&self.function_name);
        w.write_u32(self.args.len() as u32);
        for arg in &self.args {
            arg.write_xdr(w);
        }
    }
}

/// Seed material a new contract's identifier is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractIdPreimage {
    Address { address: Address, salt: [u8; 32] },
}

impl ReadXdr for ContractIdPreimage {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("contract id preimage type")? {
            0 => Ok(ContractIdPreimage::Address {
                address: Address::read_xdr(r)?,
                salt: r.read_fixed::<32>("salt")?,
            }),
            tag => Err(CodecError::UnknownTag {
                context: "contract id preimage type",
                tag,
            }),
        }
    }
}

impl WriteXdr for ContractIdPreimage {
    fn write_xdr(&self, w: &mut Writer) {
        let ContractIdPreimage::Address { address, salt } = self;
        w.write_u32(0);
        address.write_xdr(w);
        w.write_fixed(salt);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContractArgs {
    pub preimage: ContractIdPreimage,
    pub executable: ContractExecutable,
}

impl ReadXdr for CreateContractArgs {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(CreateContractArgs {
            preimage: ContractIdPreimage::read_xdr(r)?,
            executable: ContractExecutable::read_xdr(r)?,
        })
    }
}

impl WriteXdr for CreateContractArgs {
    fn write_xdr(&self, w: &mut Writer) {
        self.preimage.write_xdr(w);
        self.executable.write_xdr(w);
    }
}

/// Create-contract with constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContractArgsV2 {
    pub preimage: ContractIdPreimage,
    pub executable: ContractExecutable,
    pub constructor_args: Vec<WireValue>,
}

impl ReadXdr for CreateContractArgsV2 {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let preimage = ContractIdPreimage::read_xdr(r)?;
        let executable = ContractExecutable::read_xdr(r)?;
        let len = r.read_seq_len("constructor args")?;
        let mut constructor_args = Vec::with_capacity(len);
        for _ in 0..len {
            constructor_args.push(WireValue::read_xdr(r)?);
        }
        Ok(CreateContractArgsV2 {
            preimage,
            executable,
            constructor_args,
        })
    }
}

impl WriteXdr for CreateContractArgsV2 {
    fn write_xdr(&self, w: &mut Writer) {
        self.preimage.write_xdr(w);
        self.executable.write_xdr(w);
        w.write_u32(self.constructor_args.len() as u32);
        for arg in &self.constructor_args {
            arg.write_xdr(w);
        }
    }
}

/// What the invoke operation asks the host to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFunction {
    InvokeContract(InvokeContractArgs),
    CreateContract(CreateContractArgs),
    UploadWasm(Vec<u8>),
    CreateContractV2(CreateContractArgsV2),
}

impl ReadXdr for HostFunction {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("host function type")? {
            0 => Ok(HostFunction::InvokeContract(InvokeContractArgs::read_xdr(
                r,
            )?)),
            1 => Ok(HostFunction::CreateContract(CreateContractArgs::read_xdr(
                r,
            )?)),
            2 => Ok(HostFunction::UploadWasm(
                r.read_var_bytes(u32::MAX, "wasm bytes")?,
            )),
            3 => Ok(HostFunction::CreateContractV2(
                CreateContractArgsV2::read_xdr(r)?,
            )),
            tag => Err(CodecError::UnknownTag {
                context: "host function type",
                tag,
            }),
        }
    }
}

impl WriteXdr for HostFunction {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            HostFunction::InvokeContract(args) => {
                w.write_u32(0);
                args.write_xdr(w);
            }
            HostFunction::CreateContract(args) => {
                w.write_u32(1);
                args.write_xdr(w);
            }
            HostFunction::UploadWasm(bytes) => {
                w.write_u32(2);
                w.write_var_bytes(bytes);
            }
            HostFunction::CreateContractV2(args) => {
                w.write_u32(3);
                args.write_xdr(w);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Authorization entries
// ---------------------------------------------------------------------------

/// The function an authorization entry covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizedFunction {
    ContractFn(InvokeContractArgs),
    CreateContract(CreateContractArgs),
    CreateContractV2(CreateContractArgsV2),
}

impl ReadXdr for AuthorizedFunction {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("authorized function type")? {
            0 => Ok(AuthorizedFunction::ContractFn(InvokeContractArgs::read_xdr(
                r,
            )?)),
            1 => Ok(AuthorizedFunction::CreateContract(
                CreateContractArgs::read_xdr(r)?,
            )),
            2 => Ok(AuthorizedFunction::CreateContractV2(
                CreateContractArgsV2::read_xdr(r)?,
            )),
            tag => Err(CodecError::UnknownTag {
                context: "authorized function type",
                tag,
            }),
        }
    }
}

impl WriteXdr for AuthorizedFunction {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            AuthorizedFunction::ContractFn(args) => {
                w.write_u32(0);
                args.write_xdr(w);
            }
            AuthorizedFunction::CreateContract(args) => {
                w.write_u32(1);
                args.write_xdr(w);
            }
            AuthorizedFunction::CreateContractV2(args) => {
                w.write_u32(2);
                args.write_xdr(w);
            }
        }
    }
}

/// One authorized call plus the sub-calls it is permitted to make.
/// Strictly tree-shaped; children are owned by their parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedInvocation {
    pub function: AuthorizedFunction,
    pub sub_invocations: Vec<AuthorizedInvocation>,
}

impl ReadXdr for AuthorizedInvocation {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.with_depth(|r| {
            let function = AuthorizedFunction::read_xdr(r)?;
            let len = r.read_seq_len("sub invocations")?;
            let mut sub_invocations = Vec::with_capacity(len);
            for _ in 0..len {
                sub_invocations.push(AuthorizedInvocation::read_xdr(r)?);
            }
            Ok(AuthorizedInvocation {
                function,
                sub_invocations,
            })
        })
    }
}

impl WriteXdr for AuthorizedInvocation {
    fn write_xdr(&self, w: &mut Writer) {
        self.function.write_xdr(w);
        w.write_u32(self.sub_invocations.len() as u32);
        for sub in &self.sub_invocations {
            sub.write_xdr(w);
        }
    }
}

/// Address-scoped credentials: who authorizes, a replay nonce, when the
/// signature expires, and the signatures gathered so far (Void until the
/// first one lands).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCredentials {
    pub address: Address,
    pub nonce: i64,
    pub signature_expiration_ledger: u32,
    pub signature: WireValue,
}

/// Who vouches for an authorized invocation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// The transaction's own source account; implicit in the envelope
    /// signature, nothing further to sign.
    SourceAccount,
    Address(AddressCredentials),
}

impl ReadXdr for Credentials {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("credentials type")? {
            0 => Ok(Credentials::SourceAccount),
            1 => Ok(Credentials::Address(AddressCredentials {
                address: Address::read_xdr(r)?,
                nonce: r.read_i64("credential nonce")?,
                signature_expiration_ledger: r.read_u32("signature expiration")?,
                signature: WireValue::read_xdr(r)?,
            })),
            tag => Err(CodecError::UnknownTag {
                context: "credentials type",
                tag,
            }),
        }
    }
}

impl WriteXdr for Credentials {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            Credentials::SourceAccount => w.write_u32(0),
            Credentials::Address(creds) => {
                w.write_u32(1);
                creds.address.write_xdr(w);
                w.write_i64(creds.nonce);
                w.write_u32(creds.signature_expiration_ledger);
                creds.signature.write_xdr(w);
            }
        }
    }
}

/// A signable unit: one credential plus the invocation tree it authorizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationEntry {
    pub credentials: Credentials,
    pub root_invocation: AuthorizedInvocation,
}

impl ReadXdr for AuthorizationEntry {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(AuthorizationEntry {
            credentials: Credentials::read_xdr(r)?,
            root_invocation: AuthorizedInvocation::read_xdr(r)?,
        })
    }
}

impl WriteXdr for AuthorizationEntry {
    fn write_xdr(&self, w: &mut Writer) {
        self.credentials.write_xdr(w);
        self.root_invocation.write_xdr(w);
    }
}

// ---------------------------------------------------------------------------
// Ledger keys and footprints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractDataDurability {
    Temporary,
    Persistent,
}

impl ReadXdr for ContractDataDurability {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("durability")? {
            0 => Ok(ContractDataDurability::Temporary),
            1 => Ok(ContractDataDurability::Persistent),
            tag => Err(CodecError::UnknownTag {
                context: "durability",
                tag,
            }),
        }
    }
}

impl WriteXdr for ContractDataDurability {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            ContractDataDurability::Temporary => w.write_u32(0),
            ContractDataDurability::Persistent => w.write_u32(1),
        }
    }
}

/// Trustline asset reference, needed when a footprint touches built-in asset
/// balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustLineAsset {
    Native,
    CreditAlphanum4 { code: [u8; 4], issuer: AccountId },
    CreditAlphanum12 { code: [u8; 12], issuer: AccountId },
}

impl ReadXdr for TrustLineAsset {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("asset type")? {
            0 => Ok(TrustLineAsset::Native),
            1 => Ok(TrustLineAsset::CreditAlphanum4 {
                code: r.read_fixed::<4>("asset code")?,
                issuer: AccountId::read_xdr(r)?,
            }),
            2 => Ok(TrustLineAsset::CreditAlphanum12 {
                code: r.read_fixed::<12>("asset code")?,
                issuer: AccountId::read_xdr(r)?,
            }),
            tag => Err(CodecError::UnknownTag {
                context: "asset type",
                tag,
            }),
        }
    }
}

impl WriteXdr for TrustLineAsset {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            TrustLineAsset::Native => w.write_u32(0),
            TrustLineAsset::CreditAlphanum4 { code, issuer } => {
                w.write_u32(1);
                w.write_fixed(code);
                issuer.write_xdr(w);
            }
            TrustLineAsset::CreditAlphanum12 { code, issuer } => {
                w.write_u32(2);
                w.write_fixed(code);
                issuer.write_xdr(w);
            }
        }
    }
}

/// Ledger entry key, restricted to the entry kinds a contract call's
/// footprint can reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerKey {
    Account {
        account_id: AccountId,
    },
    Trustline {
        account_id: AccountId,
        asset: TrustLineAsset,
    },
    ContractData {
        contract: Address,
        key: WireValue,
        durability: ContractDataDurability,
    },
    ContractCode {
        hash: [u8; 32],
    },
    Ttl {
        key_hash: [u8; 32],
    },
}

const ENTRY_TYPE_ACCOUNT: u32 = 0;
const ENTRY_TYPE_TRUSTLINE: u32 = 1;
const ENTRY_TYPE_CONTRACT_DATA: u32 = 6;
const ENTRY_TYPE_CONTRACT_CODE: u32 = 7;
const ENTRY_TYPE_TTL: u32 = 9;

impl LedgerKey {
    /// Key for a contract's instance entry.
    pub fn contract_instance(contract_id: [u8; 32]) -> LedgerKey {
        LedgerKey::ContractData {
            contract: Address::Contract(contract_id),
            key: WireValue::LedgerKeyContractInstance,
            durability: ContractDataDurability::Persistent,
        }
    }

    /// Key for an uploaded code entry.
    pub fn contract_code(hash: [u8; 32]) -> LedgerKey {
        LedgerKey::ContractCode { hash }
    }
}

impl ReadXdr for LedgerKey {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("ledger key type")? {
            ENTRY_TYPE_ACCOUNT => Ok(LedgerKey::Account {
                account_id: AccountId::read_xdr(r)?,
            }),
            ENTRY_TYPE_TRUSTLINE => Ok(LedgerKey::Trustline {
                account_id: AccountId::read_xdr(r)?,
                asset: TrustLineAsset::read_xdr(r)?,
            }),
            ENTRY_TYPE_CONTRACT_DATA => Ok(LedgerKey::ContractData {
                contract: Address::read_xdr(r)?,
                key: WireValue::read_xdr(r)?,
                durability: ContractDataDurability::read_xdr(r)?,
            }),
            ENTRY_TYPE_CONTRACT_CODE => Ok(LedgerKey::ContractCode {
                hash: r.read_fixed::<32>("code hash")?,
            }),
            ENTRY_TYPE_TTL => Ok(LedgerKey::Ttl {
                key_hash: r.read_fixed::<32>("ttl key hash")?,
            }),
            tag => Err(CodecError::UnknownTag {
                context: "ledger key type",
                tag,
            }),
        }
    }
}

impl WriteXdr for LedgerKey {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            LedgerKey::Account { account_id } => {
                w.write_u32(ENTRY_TYPE_ACCOUNT);
                account_id.write_xdr(w);
            }
            LedgerKey::Trustline { account_id, asset } => {
                w.write_u32(ENTRY_TYPE_TRUSTLINE);
                account_id.write_xdr(w);
                asset.write_xdr(w);
            }
            LedgerKey::ContractData {
                contract,
                key,
                durability,
            } => {
                w.write_u32(ENTRY_TYPE_CONTRACT_DATA);
                contract.write_xdr(w);
                key.write_xdr(w);
                durability.write_xdr(w);
            }
            LedgerKey::ContractCode { hash } => {
                w.write_u32(ENTRY_TYPE_CONTRACT_CODE);
                w.write_fixed(hash);
            }
            LedgerKey::Ttl { key_hash } => {
                w.write_u32(ENTRY_TYPE_TTL);
                w.write_fixed(key_hash);
            }
        }
    }
}

/// The ledger entries a transaction may read and/or write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerFootprint {
    pub read_only: Vec<LedgerKey>,
    pub read_write: Vec<LedgerKey>,
}

fn read_key_vec(r: &mut Reader<'_>, context: &'static str) -> Result<Vec<LedgerKey>, CodecError> {
    let len = r.read_seq_len(context)?;
    let mut keys = Vec::with_capacity(len);
    for _ in 0..len {
        keys.push(LedgerKey::read_xdr(r)?);
    }
    Ok(keys)
}

fn write_key_vec(keys: &[LedgerKey], w: &mut Writer) {
    w.write_u32(keys.len() as u32);
    for key in keys {
        key.write_xdr(w);
    }
}

impl ReadXdr for LedgerFootprint {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(LedgerFootprint {
            read_only: read_key_vec(r, "read-only footprint")?,
            read_write: read_key_vec(r, "read-write footprint")?,
        })
    }
}

impl WriteXdr for LedgerFootprint {
    fn write_xdr(&self, w: &mut Writer) {
        write_key_vec(&self.read_only, w);
        write_key_vec(&self.read_write, w);
    }
}

// ---------------------------------------------------------------------------
// Soroban transaction data
// ---------------------------------------------------------------------------

/// Resource declaration produced by simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SorobanResources {
    pub footprint: LedgerFootprint,
    pub instructions: u32,
    pub disk_read_bytes: u32,
    pub write_bytes: u32,
}

impl ReadXdr for SorobanResources {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(SorobanResources {
            footprint: LedgerFootprint::read_xdr(r)?,
            instructions: r.read_u32("instructions")?,
            disk_read_bytes: r.read_u32("disk read bytes")?,
            write_bytes: r.read_u32("write bytes")?,
        })
    }
}

impl WriteXdr for SorobanResources {
    fn write_xdr(&self, w: &mut Writer) {
        self.footprint.write_xdr(w);
        w.write_u32(self.instructions);
        w.write_u32(self.disk_read_bytes);
        w.write_u32(self.write_bytes);
    }
}

/// Resource/footprint/fee data attached to a Soroban transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SorobanTransactionData {
    /// Extension arm 1 carries the archived-entry indexes used by automatic
    /// restoration.
    pub archived_entries: Option<Vec<u32>>,
    pub resources: SorobanResources,
    pub resource_fee: i64,
}

impl ReadXdr for SorobanTransactionData {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let archived_entries = match r.read_u32("soroban data ext")? {
            0 => None,
            1 => {
                let len = r.read_seq_len("archived entries")?;
                let mut indexes = Vec::with_capacity(len);
                for _ in 0..len {
                    indexes.push(r.read_u32("archived entry index")?);
                }
                Some(indexes)
            }
            tag => {
                return Err(CodecError::UnknownTag {
                    context: "soroban data ext",
                    tag,
                })
            }
        };
        Ok(SorobanTransactionData {
            archived_entries,
            resources: SorobanResources::read_xdr(r)?,
            resource_fee: r.read_i64("resource fee")?,
        })
    }
}

impl WriteXdr for SorobanTransactionData {
    fn write_xdr(&self, w: &mut Writer) {
        match &self.archived_entries {
            None => w.write_u32(0),
            Some(indexes) => {
                w.write_u32(1);
                w.write_u32(indexes.len() as u32);
                for index in indexes {
                    w.write_u32(*index);
                }
            }
        }
        self.resources.write_xdr(w);
        w.write_i64(self.resource_fee);
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The contract-invoking operation: a host function plus the authorization
/// entries vouching for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeHostFunctionOp {
    pub host_function: HostFunction,
    pub auth: Vec<AuthorizationEntry>,
}

impl ReadXdr for InvokeHostFunctionOp {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let host_function = HostFunction::read_xdr(r)?;
        let len = r.read_seq_len("auth entries")?;
        let mut auth = Vec::with_capacity(len);
        for _ in 0..len {
            auth.push(AuthorizationEntry::read_xdr(r)?);
        }
        Ok(InvokeHostFunctionOp {
            host_function,
            auth,
        })
    }
}

impl WriteXdr for InvokeHostFunctionOp {
    fn write_xdr(&self, w: &mut Writer) {
        self.host_function.write_xdr(w);
        w.write_u32(self.auth.len() as u32);
        for entry in &self.auth {
            entry.write_xdr(w);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    InvokeHostFunction(InvokeHostFunctionOp),
    /// Re-admits expired ledger entries named by the footprint. Carries only
    /// an empty extension point.
    RestoreFootprint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub source_account: Option<MuxedAccount>,
    pub body: OperationBody,
}

impl ReadXdr for Operation {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let source_account = if r.read_option_flag("operation source")? {
            Some(MuxedAccount::read_xdr(r)?)
        } else {
            None
        };
        let body = match r.read_u32("operation type")? {
            OP_INVOKE_HOST_FUNCTION => {
                OperationBody::InvokeHostFunction(InvokeHostFunctionOp::read_xdr(r)?)
            }
            OP_RESTORE_FOOTPRINT => {
                match r.read_u32("restore footprint ext")? {
                    0 => OperationBody::RestoreFootprint,
                    tag => {
                        return Err(CodecError::UnknownTag {
                            context: "restore footprint ext",
                            tag,
                        })
                    }
                }
            }
            tag => {
                return Err(CodecError::UnknownTag {
                    context: "operation type",
                    tag,
                })
            }
        };
        Ok(Operation {
            source_account,
            body,
        })
    }
}

impl WriteXdr for Operation {
    fn write_xdr(&self, w: &mut Writer) {
        match &self.source_account {
            Some(account) => {
                w.write_option_flag(true);
                account.write_xdr(w);
            }
            None => w.write_option_flag(false),
        }
        match &self.body {
            OperationBody::InvokeHostFunction(op) => {
                w.write_u32(OP_INVOKE_HOST_FUNCTION);
                op.write_xdr(w);
            }
            OperationBody::RestoreFootprint => {
                w.write_u32(OP_RESTORE_FOOTPRINT);
                w.write_u32(0); // extension point
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction and envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preconditions {
    None,
    Time(TimeBounds),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Memo {
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionExt {
    V0,
    V1(SorobanTransactionData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source_account: MuxedAccount,
    pub fee: u32,
    pub seq_num: i64,
    pub cond: Preconditions,
    pub memo: Memo,
    pub operations: Vec<Operation>,
    pub ext: TransactionExt,
}

impl ReadXdr for Transaction {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let source_account = MuxedAccount::read_xdr(r)?;
        let fee = r.read_u32("fee")?;
        let seq_num = r.read_i64("sequence number")?;
        let cond = match r.read_u32("precondition type")? {
            0 => Preconditions::None,
            1 => Preconditions::Time(TimeBounds {
                min_time: r.read_u64("min time")?,
                max_time: r.read_u64("max time")?,
            }),
            tag => {
                return Err(CodecError::UnknownTag {
                    context: "precondition type",
                    tag,
                })
            }
        };
        let memo = match r.read_u32("memo type")? {
            0 => Memo::None,
            tag => {
                return Err(CodecError::UnknownTag {
                    context: "memo type",
                    tag,
                })
            }
        };
        let op_count = r.read_seq_len("operations")?;
        let mut operations = Vec::with_capacity(op_count);
        for _ in 0..op_count {
            operations.push(Operation::read_xdr(r)?);
        }
        let ext = match r.read_u32("transaction ext")? {
            0 => TransactionExt::V0,
            1 => TransactionExt::V1(SorobanTransactionData::read_xdr(r)?),
            tag => {
                return Err(CodecError::UnknownTag {
                    context: "transaction ext",
                    tag,
                })
            }
        };
        Ok(Transaction {
            source_account,
            fee,
            seq_num,
            cond,
            memo,
            operations,
            ext,
        })
    }
}

impl WriteXdr for Transaction {
    fn write_xdr(&self, w: &mut Writer) {
        self.source_account.write_xdr(w);
        w.write_u32(self.fee);
        w.write_i64(self.seq_num);
        match self.cond {
            Preconditions::None => w.write_u32(0),
            Preconditions::Time(tb) => {
                w.write_u32(1);
                w.write_u64(tb.min_time);
                w.write_u64(tb.max_time);
            }
        }
        let Memo::None = self.memo;
        w.write_u32(0);
        w.write_u32(self.operations.len() as u32);
        for op in &self.operations {
            op.write_xdr(w);
        }
        match &self.ext {
            TransactionExt::V0 => w.write_u32(0),
            TransactionExt::V1(data) => {
                w.write_u32(1);
                data.write_xdr(w);
            }
        }
    }
}

/// Signature over a transaction hash plus the key hint (last four bytes of
/// the signing public key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

impl ReadXdr for DecoratedSignature {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(DecoratedSignature {
            hint: r.read_fixed::<4>("signature hint")?,
            signature: r.read_var_bytes(64, "signature")?,
        })
    }
}

impl WriteXdr for DecoratedSignature {
    fn write_xdr(&self, w: &mut Writer) {
        w.write_fixed(&self.hint);
        w.write_var_bytes(&self.signature);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionV1Envelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

/// The envelope submitted to the network. Only the v1 form is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEnvelope {
    Tx(TransactionV1Envelope),
}

impl TransactionEnvelope {
    /// Wrap an unsigned transaction.
    pub fn unsigned(tx: Transaction) -> TransactionEnvelope {
        TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: Vec::new(),
        })
    }
}

impl ReadXdr for TransactionEnvelope {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("envelope type")? {
            ENVELOPE_TYPE_TX => {
                let tx = Transaction::read_xdr(r)?;
                let len = r.read_seq_len("signatures")?;
                let mut signatures = Vec::with_capacity(len);
                for _ in 0..len {
                    signatures.push(DecoratedSignature::read_xdr(r)?);
                }
                Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
                    tx,
                    signatures,
                }))
            }
            tag => Err(CodecError::UnknownTag {
                context: "envelope type",
                tag,
            }),
        }
    }
}

impl WriteXdr for TransactionEnvelope {
    fn write_xdr(&self, w: &mut Writer) {
        let TransactionEnvelope::Tx(v1) = self;
        w.write_u32(ENVELOPE_TYPE_TX);
        v1.tx.write_xdr(w);
        w.write_u32(v1.signatures.len() as u32);
        for sig in &v1.signatures {
            sig.write_xdr(w);
        }
    }
}

// ---------------------------------------------------------------------------
// Hash preimages
// ---------------------------------------------------------------------------

/// Domain-separated preimages whose sha256 is signed or used as an
/// identifier. The network id binds every hash to one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashIdPreimage {
    /// Derives a deployed contract's identifier.
    ContractId {
        network_id: [u8; 32],
        preimage: ContractIdPreimage,
    },
    /// The payload an address credential signs.
    SorobanAuthorization {
        network_id: [u8; 32],
        nonce: i64,
        signature_expiration_ledger: u32,
        invocation: AuthorizedInvocation,
    },
}

impl ReadXdr for HashIdPreimage {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("preimage type")? {
            ENVELOPE_TYPE_CONTRACT_ID => Ok(HashIdPreimage::ContractId {
                network_id: r.read_fixed::<32>("network id")?,
                preimage: ContractIdPreimage::read_xdr(r)?,
            }),
            ENVELOPE_TYPE_SOROBAN_AUTHORIZATION => Ok(HashIdPreimage::SorobanAuthorization {
                network_id: r.read_fixed::<32>("network id")?,
                nonce: r.read_i64("nonce")?,
                signature_expiration_ledger: r.read_u32("signature expiration")?,
                invocation: AuthorizedInvocation::read_xdr(r)?,
            }),
            tag => Err(CodecError::UnknownTag {
                context: "preimage type",
                tag,
            }),
        }
    }
}

impl WriteXdr for HashIdPreimage {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            HashIdPreimage::ContractId {
                network_id,
                preimage,
            } => {
                w.write_u32(ENVELOPE_TYPE_CONTRACT_ID);
                w.write_fixed(network_id);
                preimage.write_xdr(w);
            }
            HashIdPreimage::SorobanAuthorization {
                network_id,
                nonce,
                signature_expiration_ledger,
                invocation,
            } => {
                w.write_u32(ENVELOPE_TYPE_SOROBAN_AUTHORIZATION);
                w.write_fixed(network_id);
                w.write_i64(*nonce);
                w.write_u32(*signature_expiration_ledger);
                invocation.write_xdr(w);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger entry payloads
// ---------------------------------------------------------------------------

/// Contract-data ledger entry (the instance entry among others).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDataEntry {
    pub contract: Address,
    pub key: WireValue,
    pub durability: ContractDataDurability,
    pub val: WireValue,
}

/// Uploaded contract code. The v1 extension's cost inputs are decoded and
/// discarded; this client only needs the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCodeEntry {
    pub hash: [u8; 32],
    pub code: Vec<u8>,
}

/// The ledger entry payloads this client reads back from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntryData {
    ContractData(ContractDataEntry),
    ContractCode(ContractCodeEntry),
}

fn read_extension_point(r: &mut Reader<'_>, context: &'static str) -> Result<(), CodecError> {
    match r.read_u32(context)? {
        0 => Ok(()),
        tag => Err(CodecError::UnknownTag { context, tag }),
    }
}

impl ReadXdr for LedgerEntryData {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("ledger entry type")? {
            ENTRY_TYPE_CONTRACT_DATA => {
                read_extension_point(r, "contract data ext")?;
                Ok(LedgerEntryData::ContractData(ContractDataEntry {
                    contract: Address::read_xdr(r)?,
                    key: WireValue::read_xdr(r)?,
                    durability: ContractDataDurability::read_xdr(r)?,
                    val: WireValue::read_xdr(r)?,
                }))
            }
            ENTRY_TYPE_CONTRACT_CODE => {
                match r.read_u32("contract code ext")? {
                    0 => {}
                    1 => {
                        // v1: extension point + ten cost-input counters
                        read_extension_point(r, "cost inputs ext")?;
                        for _ in 0..10 {
                            r.read_u32("cost input")?;
                        }
                    }
                    tag => {
                        return Err(CodecError::UnknownTag {
                            context: "contract code ext",
                            tag,
                        })
                    }
                }
                Ok(LedgerEntryData::ContractCode(ContractCodeEntry {
                    hash: r.read_fixed::<32>("code hash")?,
                    code: r.read_var_bytes(u32::MAX, "code bytes")?,
                }))
            }
            tag => Err(CodecError::UnknownTag {
                context: "ledger entry type",
                tag,
            }),
        }
    }
}

impl WriteXdr for LedgerEntryData {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            LedgerEntryData::ContractData(entry) => {
                w.write_u32(ENTRY_TYPE_CONTRACT_DATA);
                w.write_u32(0); // extension point
                entry.contract.write_xdr(w);
                entry.key.write_xdr(w);
                entry.durability.write_xdr(w);
                entry.val.write_xdr(w);
            }
            LedgerEntryData::ContractCode(entry) => {
                w.write_u32(ENTRY_TYPE_CONTRACT_CODE);
                w.write_u32(0); // v0 ext
                w.write_fixed(&entry.hash);
                w.write_var_bytes(&entry.code);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
