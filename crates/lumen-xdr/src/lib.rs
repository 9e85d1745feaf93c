//! Wire-format layer for the Lumen contract client.
//!
//! Implements the ledger's XDR encoding by hand for exactly the structures a
//! contract-invoking client touches: tagged-union values, interface-spec
//! entries embedded in contract bytecode, and the transaction envelope with
//! its Soroban operation, resource data, and authorization entries.
//!
//! Byte-exact compatibility with the published format is the contract here:
//! a divergence makes transactions unparsable by the network.

pub mod codec;
pub mod spec;
pub mod tx;
pub mod value;

pub use codec::{CodecError, ReadXdr, Reader, WriteXdr, Writer};
pub use spec::{
    EnumCase, EnvMetaEntry, FunctionInput, MetaEntry, SpecEntry, SpecEnum, SpecErrorEnum,
    SpecFunction, SpecStruct, SpecType, SpecUnion, StructField, UnionCase,
};
pub use tx::{
    AccountId, AddressCredentials, AuthorizationEntry, AuthorizedFunction, AuthorizedInvocation,
    ContractCodeEntry, ContractDataDurability, ContractDataEntry, ContractIdPreimage,
    CreateContractArgs, CreateContractArgsV2, Credentials, DecoratedSignature, HashIdPreimage,
    HostFunction, InvokeContractArgs, InvokeHostFunctionOp, LedgerEntryData, LedgerFootprint,
    LedgerKey, Memo, MuxedAccount, Operation, OperationBody, Preconditions, SorobanResources,
    SorobanTransactionData, TimeBounds, Transaction, TransactionEnvelope, TransactionExt,
    TransactionV1Envelope, ENVELOPE_TYPE_TX,
};
pub use value::{
    Address, ContractExecutable, Int128Parts, Int256Parts, UInt128Parts, UInt256Parts, WireMap,
    WireValue,
};
