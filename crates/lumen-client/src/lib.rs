//! Client library for invoking smart contracts on a Soroban-style ledger.
//!
//! The pipeline: parse a contract's interface out of its bytecode
//! ([`parser`]), convert native arguments into wire values against that
//! interface ([`spec`]), then build, simulate, authorize, sign, submit and
//! poll the invoking transaction ([`assembled`]), with the [`client`] facade
//! tying the pieces together per deployed contract.
//!
//! All network access goes through the [`rpc::LedgerRpc`] trait: one
//! blocking JSON-RPC round trip per operation, no shared mutable state
//! between transactions. Callers wanting parallel calls run independent
//! facade invocations and serialize only on the submitting account's
//! sequence number.

pub mod assembled;
pub mod auth;
pub mod client;
pub mod keys;
pub mod native;
pub mod parser;
pub mod rpc;
pub mod spec;

#[cfg(test)]
mod testutil;

pub use assembled::{
    AssembledTransaction, Simulation, TxError, TxOptions, TxOutcome, TxState,
};
pub use auth::{
    needs_non_invoker_signing_by, network_id, sign_authorization_entry, AuthError,
    AuthorizationSigner, DEFAULT_EXPIRATION_LOOKAHEAD,
};
pub use client::{derive_contract_id, ClientError, ContractClient};
pub use keys::{KeyError, Keypair};
pub use native::Native;
pub use parser::{parse_contract_bytecode, ContractInfo, ParseError};
pub use rpc::{LedgerRpc, RpcClient, RpcError};
pub use spec::{ContractSpec, MarshalError};

pub use lumen_xdr as xdr;
