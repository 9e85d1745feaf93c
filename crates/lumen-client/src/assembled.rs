//! Transaction assembly and lifecycle: build, simulate, recover from expired
//! state, sign, submit, poll.
//!
//! One `AssembledTransaction` drives one contract-invoking transaction
//! through `Built -> Simulated -> (NeedsRestore -> Restored ->) Signed ->
//! Sent -> Complete`. Every network operation is a blocking round trip;
//! nothing here runs concurrently against the same instance.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use lumen_xdr::codec::{CodecError, ReadXdr, WriteXdr};
use lumen_xdr::tx::{
    AuthorizationEntry, Credentials, DecoratedSignature, HostFunction, InvokeHostFunctionOp,
    MuxedAccount, Memo, Operation, OperationBody, Preconditions, SorobanTransactionData,
    TimeBounds, Transaction, TransactionEnvelope, TransactionExt, TransactionV1Envelope,
    ENVELOPE_TYPE_TX,
};
use lumen_xdr::{Address, WireValue};

use crate::auth::{self, AuthError, AuthorizationSigner, DEFAULT_EXPIRATION_LOOKAHEAD};
use crate::keys::{KeyError, Keypair};
use crate::rpc::{GetTransactionResponse, LedgerRpc, RestorePreamble, RpcError};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for building and driving a transaction.
#[derive(Debug, Clone)]
pub struct TxOptions {
    /// Network passphrase; domain-separates every hash
    pub network_passphrase: String,
    /// Submitting account (G... address)
    pub source_account: String,
    /// Base (inclusion) fee in stroops
    pub base_fee: u32,
    /// Transaction validity window in seconds
    pub transaction_timeout_secs: u64,
    /// Fixed delay between status polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum total wait for a terminal status, in seconds
    pub poll_timeout_secs: u64,
    /// Automatically restore expired ledger state when simulation asks for it
    pub restore: bool,
}

impl Default for TxOptions {
    fn default() -> Self {
        TxOptions {
            network_passphrase: String::new(),
            source_account: String::new(),
            base_fee: 100,
            transaction_timeout_secs: 300,
            poll_interval_ms: 1000,
            poll_timeout_secs: 30,
            restore: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the transaction lifecycle. Only the expired-state restore
/// path is ever retried automatically; everything else propagates.
#[derive(Debug, Clone)]
pub enum TxError {
    Rpc(RpcError),
    Codec(CodecError),
    Key(KeyError),
    Auth(AuthError),
    /// Source or signer address did not parse
    InvalidAddress(String),
    /// The network reports the simulated call itself would fail
    SimulationFailed { message: String, events: Vec<String> },
    /// Operation requires a prior successful simulation
    NotYetSimulated,
    /// `send` requires a prior `sign`
    NotYetSigned,
    /// Simulation flagged expired state and automatic restore was not requested
    RestoreRequired,
    /// Automatic restore needs a signing key
    RestoreRequiresPrivateKey,
    /// The nested restore transaction did not succeed
    RestoreFailed {
        status: String,
        result_xdr: Option<String>,
    },
    /// Refusing to sign and submit a read call without `force`
    ReadCallRefusal,
    /// Non-submitter addresses still need to sign authorization entries
    IncompleteAuthorization { addresses: Vec<String> },
    /// Signing requires the keypair's private half
    MissingPrivateKey,
    /// The node rejected the submission outright
    SubmissionRejected {
        status: String,
        error_result_xdr: Option<String>,
    },
    /// No terminal status before the deadline; the transaction may still
    /// complete later out-of-band
    PollTimeout { hash: String, waited_secs: u64 },
    /// The transaction reached the ledger and failed there
    TransactionFailed {
        hash: String,
        result_xdr: Option<String>,
    },
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxError::Rpc(e) => write!(f, "{}", e),
            TxError::Codec(e) => write!(f, "{}", e),
            TxError::Key(e) => write!(f, "{}", e),
            TxError::Auth(e) => write!(f, "{}", e),
            TxError::InvalidAddress(msg) => write!(f, "invalid address: {}", msg),
            TxError::SimulationFailed { message, .. } => {
                write!(f, "simulation failed: {}", message)
            }
            TxError::NotYetSimulated => {
                write!(f, "transaction has not been simulated yet")
            }
            TxError::NotYetSigned => write!(f, "transaction has not been signed yet"),
            TxError::RestoreRequired => {
                write!(
                    f,
                    "required ledger state has expired; simulate with restore or restore manually"
                )
            }
            TxError::RestoreRequiresPrivateKey => {
                write!(f, "automatic restore requires a signing key")
            }
            TxError::RestoreFailed { status, .. } => {
                write!(f, "restore transaction finished with status {}", status)
            }
            TxError::ReadCallRefusal => {
                write!(
                    f,
                    "refusing to sign a read call; it needs no submission (pass force to override)"
                )
            }
            TxError::IncompleteAuthorization { addresses } => {
                write!(
                    f,
                    "authorization entries still need signatures from: {}",
                    addresses.join(", ")
                )
            }
            TxError::MissingPrivateKey => {
                write!(f, "signing requires a keypair with its private half")
            }
            TxError::SubmissionRejected {
                status,
                error_result_xdr,
            } => {
                write!(f, "submission rejected with status {}", status)?;
                if let Some(xdr) = error_result_xdr {
                    write!(f, " ({})", xdr)?;
                }
                Ok(())
            }
            TxError::PollTimeout { hash, waited_secs } => {
                write!(
                    f,
                    "timed out after {}s waiting for transaction {}",
                    waited_secs, hash
                )
            }
            TxError::TransactionFailed { hash, .. } => {
                write!(f, "transaction {} failed on-chain", hash)
            }
        }
    }
}

impl std::error::Error for TxError {}

impl From<RpcError> for TxError {
    fn from(e: RpcError) -> Self {
        TxError::Rpc(e)
    }
}

impl From<CodecError> for TxError {
    fn from(e: CodecError) -> Self {
        TxError::Codec(e)
    }
}

impl From<KeyError> for TxError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::MissingPrivateKey => TxError::MissingPrivateKey,
            other => TxError::Key(other),
        }
    }
}

impl From<AuthError> for TxError {
    fn from(e: AuthError) -> Self {
        TxError::Auth(e)
    }
}

// ---------------------------------------------------------------------------
// Hashing and signing helpers
// ---------------------------------------------------------------------------

/// Transaction hash: `sha256(network_id || envelope-type-tx || tx_xdr)`.
/// This is the transaction's network-wide identifier and the payload the
/// envelope signature covers.
pub fn transaction_hash(tx: &Transaction, network_passphrase: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(auth::network_id(network_passphrase));
    hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
    hasher.update(tx.to_xdr());
    hasher.finalize().into()
}

/// Sign a transaction and wrap it in an envelope carrying the decorated
/// signature.
pub fn sign_transaction(
    tx: Transaction,
    keypair: &Keypair,
    network_passphrase: &str,
) -> Result<TransactionEnvelope, TxError> {
    let hash = transaction_hash(&tx, network_passphrase);
    let signature = keypair.sign(&hash)?;
    let decorated = DecoratedSignature {
        hint: keypair.signature_hint(),
        signature: signature.to_vec(),
    };
    Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: vec![decorated],
    }))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn validity_window(timeout_secs: u64) -> Preconditions {
    Preconditions::Time(TimeBounds {
        min_time: 0,
        max_time: unix_now() + timeout_secs,
    })
}

// ---------------------------------------------------------------------------
// Simulation snapshot
// ---------------------------------------------------------------------------

/// One simulation's decoded output. Produced fresh by every simulation;
/// re-simulating replaces the whole snapshot.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub transaction_data: SorobanTransactionData,
    pub min_resource_fee: u64,
    pub auth: Vec<AuthorizationEntry>,
    pub return_value: Option<WireValue>,
    pub latest_ledger: u32,
    pub restore_preamble: Option<RestorePreamble>,
}

/// Terminal outcome of a submitted transaction.
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub hash: String,
    pub success: bool,
    pub ledger: Option<u64>,
    pub return_value: Option<WireValue>,
    pub result_xdr: Option<String>,
}

/// Lifecycle state. Transitions are one-directional; re-simulating discards
/// the previous simulation and any prior signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Built,
    Simulated,
    NeedsRestore,
    Restored,
    Signed,
    Sent,
    Complete,
}

// ---------------------------------------------------------------------------
// AssembledTransaction
// ---------------------------------------------------------------------------

/// A single contract-invoking transaction being driven to completion.
#[derive(Debug)]
pub struct AssembledTransaction<'a, R: LedgerRpc> {
    rpc: &'a R,
    keypair: Option<&'a Keypair>,
    options: TxOptions,
    tx: Transaction,
    state: TxState,
    simulation: Option<Simulation>,
    signed: Option<TransactionEnvelope>,
}

impl<'a, R: LedgerRpc> AssembledTransaction<'a, R> {
    /// Fetch the source account, build the unsigned transaction, and
    /// simulate it immediately.
    pub fn build(
        rpc: &'a R,
        keypair: Option<&'a Keypair>,
        options: TxOptions,
        host_function: HostFunction,
    ) -> Result<Self, TxError> {
        let mut assembled = Self::build_deferred(rpc, keypair, options, host_function)?;
        let restore = assembled.options.restore;
        assembled.simulate(restore)?;
        Ok(assembled)
    }

    /// Like [`AssembledTransaction::build`] but with simulation explicitly
    /// deferred to the caller.
    pub fn build_deferred(
        rpc: &'a R,
        keypair: Option<&'a Keypair>,
        options: TxOptions,
        host_function: HostFunction,
    ) -> Result<Self, TxError> {
        let source = Address::from_strkey(&options.source_account)
            .map_err(TxError::InvalidAddress)?;
        let Address::Account(source_key) = source else {
            return Err(TxError::InvalidAddress(
                "source must be a G... account address".into(),
            ));
        };

        let account = rpc.get_account(&options.source_account)?;
        debug!(
            source = %options.source_account,
            sequence = account.sequence,
            "building transaction"
        );

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(source_key),
            fee: options.base_fee,
            seq_num: account.sequence + 1,
            cond: validity_window(options.transaction_timeout_secs),
            memo: Memo::None,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                    host_function,
                    auth: Vec::new(),
                }),
            }],
            ext: TransactionExt::V0,
        };

        Ok(AssembledTransaction {
            rpc,
            keypair,
            options,
            tx,
            state: TxState::Built,
            simulation: None,
            signed: None,
        })
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// The unsigned transaction. Stays valid for re-simulation even after
    /// signing; the signed form is a separate copy.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn signed_envelope(&self) -> Option<&TransactionEnvelope> {
        self.signed.as_ref()
    }

    /// The simulated return value, if simulation produced one.
    pub fn result(&self) -> Option<&WireValue> {
        self.simulation.as_ref()?.return_value.as_ref()
    }

    // -- Simulation ---------------------------------------------------------

    /// Simulate the unsigned transaction, discarding any previous simulation
    /// and signature. With `restore` set, a reported expired footprint is
    /// restored via a nested transaction lifecycle and the original is
    /// rebuilt and re-simulated.
    pub fn simulate(&mut self, restore: bool) -> Result<(), TxError> {
        self.simulation = None;
        self.signed = None;

        let envelope = TransactionEnvelope::unsigned(self.tx.clone());
        debug!("simulating transaction");
        let resp = self.rpc.simulate_transaction(&envelope.to_xdr_base64())?;

        if let Some(message) = resp.error {
            return Err(TxError::SimulationFailed {
                message,
                events: resp.events,
            });
        }

        if let Some(preamble) = &resp.restore_preamble {
            if restore {
                info!("simulation reports expired state; restoring");
                self.restore_footprint(preamble)?;
                self.state = TxState::Restored;
                // The original goes back out fresh: new sequence number, new
                // validity window.
                let account = self.rpc.get_account(&self.options.source_account)?;
                self.tx.seq_num = account.sequence + 1;
                self.tx.cond = validity_window(self.options.transaction_timeout_secs);
                return self.simulate(restore);
            }
            warn!("simulation reports expired state; restore not requested");
            self.simulation = Some(Simulation {
                transaction_data: SorobanTransactionData::default(),
                min_resource_fee: resp.min_resource_fee,
                auth: Vec::new(),
                return_value: None,
                latest_ledger: resp.latest_ledger,
                restore_preamble: resp.restore_preamble.clone(),
            });
            self.state = TxState::NeedsRestore;
            return Ok(());
        }

        let transaction_data = if resp.transaction_data.is_empty() {
            SorobanTransactionData::default()
        } else {
            SorobanTransactionData::from_xdr_base64(&resp.transaction_data)?
        };

        let mut auth = Vec::with_capacity(resp.auth.len());
        for entry_b64 in &resp.auth {
            auth.push(AuthorizationEntry::from_xdr_base64(entry_b64)?);
        }

        let return_value = match &resp.return_value {
            Some(b64) => Some(WireValue::from_xdr_base64(b64)?),
            None => None,
        };

        self.simulation = Some(Simulation {
            transaction_data,
            min_resource_fee: resp.min_resource_fee,
            auth,
            return_value,
            latest_ledger: resp.latest_ledger,
            restore_preamble: None,
        });
        self.state = TxState::Simulated;
        Ok(())
    }

    /// A read call needs no authorization and writes nothing; its result is
    /// fully determined by simulation.
    pub fn is_read_call(&self) -> Result<bool, TxError> {
        let sim = self.simulation.as_ref().ok_or(TxError::NotYetSimulated)?;
        Ok(sim.auth.is_empty()
            && sim
                .transaction_data
                .resources
                .footprint
                .read_write
                .is_empty())
    }

    /// Addresses (excluding the submitter, whose authorization rides the
    /// envelope signature) that still need to sign authorization entries.
    pub fn needs_non_invoker_signing_by(
        &self,
        include_already_signed: bool,
    ) -> Result<Vec<Address>, TxError> {
        let sim = self.simulation.as_ref().ok_or(TxError::NotYetSimulated)?;
        Ok(auth::needs_non_invoker_signing_by(
            &sim.auth,
            include_already_signed,
        ))
    }

    // -- Restore ------------------------------------------------------------

    /// Build, sign, send and poll a dedicated restore-only transaction from
    /// the preamble's resource data and fee. Runs to completion before the
    /// original transaction is touched again.
    fn restore_footprint(&mut self, preamble: &RestorePreamble) -> Result<(), TxError> {
        let keypair = self
            .keypair
            .filter(|k| k.can_sign())
            .ok_or(TxError::RestoreRequiresPrivateKey)?;

        let data = SorobanTransactionData::from_xdr_base64(&preamble.transaction_data)?;
        let account = self.rpc.get_account(&self.options.source_account)?;
        let fee_total = self.options.base_fee as u64 + preamble.min_resource_fee;

        let MuxedAccount::Ed25519(source_key) = self.tx.source_account;
        let restore_tx = Transaction {
            source_account: MuxedAccount::Ed25519(source_key),
            fee: clamp_fee(fee_total),
            seq_num: account.sequence + 1,
            cond: validity_window(self.options.transaction_timeout_secs),
            memo: Memo::None,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::RestoreFootprint,
            }],
            ext: TransactionExt::V1(data),
        };

        let envelope = sign_transaction(restore_tx, keypair, &self.options.network_passphrase)?;
        let resp = self.rpc.send_transaction(&envelope.to_xdr_base64())?;
        info!(hash = %resp.hash, status = %resp.status, "restore transaction submitted");
        if matches!(resp.status.as_str(), "ERROR" | "DUPLICATE") {
            return Err(TxError::RestoreFailed {
                status: resp.status,
                result_xdr: resp.error_result_xdr,
            });
        }

        let result = self.poll_status(&resp.hash)?;
        if result.status != "SUCCESS" {
            return Err(TxError::RestoreFailed {
                status: result.status,
                result_xdr: result.result_xdr,
            });
        }
        info!("restore transaction succeeded");
        Ok(())
    }

    // -- Authorization ------------------------------------------------------

    /// Sign every authorization entry whose address credential matches the
    /// signer. The expiration ledger is fetched from the network (latest +
    /// a fixed look-ahead) when not supplied. Returns how many entries were
    /// signed.
    pub fn sign_auth_entries(
        &mut self,
        signer: &dyn AuthorizationSigner,
        expiration_ledger: Option<u32>,
    ) -> Result<usize, TxError> {
        if self.simulation.is_none() {
            return Err(TxError::NotYetSimulated);
        }
        let expiration = match expiration_ledger {
            Some(ledger) => ledger,
            None => self.rpc.get_latest_ledger()? + DEFAULT_EXPIRATION_LOOKAHEAD,
        };
        let address = signer.address();
        let passphrase = self.options.network_passphrase.clone();

        // Changing auth invalidates any existing envelope signature.
        self.signed = None;
        if self.state == TxState::Signed {
            self.state = TxState::Simulated;
        }

        let sim = self.simulation.as_mut().ok_or(TxError::NotYetSimulated)?;
        let mut signed = 0;
        for entry in &mut sim.auth {
            let matches_signer = matches!(
                &entry.credentials,
                Credentials::Address(creds) if creds.address == address
            );
            if matches_signer && auth::entry_is_unsigned(entry) {
                *entry = signer.authorize(entry.clone(), &passphrase, expiration)?;
                signed += 1;
            }
        }
        debug!(signed, address = %address, "signed authorization entries");
        Ok(signed)
    }

    // -- Signing ------------------------------------------------------------

    /// Assemble the simulated transaction (resources, fee, auth) and sign
    /// it. The unsigned transaction is left untouched and remains reusable
    /// for re-simulation.
    pub fn sign(&mut self, force: bool) -> Result<(), TxError> {
        if self.state == TxState::NeedsRestore {
            return Err(TxError::RestoreRequired);
        }
        let sim = self.simulation.as_ref().ok_or(TxError::NotYetSimulated)?;

        if self.is_read_call()? && !force {
            return Err(TxError::ReadCallRefusal);
        }

        let pending = auth::needs_non_invoker_signing_by(&sim.auth, false);
        if !pending.is_empty() {
            return Err(TxError::IncompleteAuthorization {
                addresses: pending.iter().map(|a| a.to_strkey()).collect(),
            });
        }

        let keypair = self
            .keypair
            .filter(|k| k.can_sign())
            .ok_or(TxError::MissingPrivateKey)?;

        let mut tx = self.tx.clone();
        tx.ext = TransactionExt::V1(sim.transaction_data.clone());
        tx.fee = clamp_fee(self.options.base_fee as u64 + sim.min_resource_fee);
        if let OperationBody::InvokeHostFunction(op) = &mut tx.operations[0].body {
            // Simulation auth only applies when the operation carries none.
            if op.auth.is_empty() {
                op.auth = sim.auth.clone();
            }
        }

        let envelope = sign_transaction(tx, keypair, &self.options.network_passphrase)?;
        self.signed = Some(envelope);
        self.state = TxState::Signed;
        info!("transaction signed");
        Ok(())
    }

    // -- Submission ---------------------------------------------------------

    /// Submit the signed envelope and poll to a terminal status.
    pub fn send(&mut self) -> Result<TxOutcome, TxError> {
        let envelope = self.signed.as_ref().ok_or(TxError::NotYetSigned)?;
        let resp = self.rpc.send_transaction(&envelope.to_xdr_base64())?;
        info!(hash = %resp.hash, status = %resp.status, "transaction submitted");

        if matches!(resp.status.as_str(), "ERROR" | "DUPLICATE") {
            return Err(TxError::SubmissionRejected {
                status: resp.status,
                error_result_xdr: resp.error_result_xdr,
            });
        }
        self.state = TxState::Sent;

        let result = self.poll_status(&resp.hash)?;
        self.state = TxState::Complete;

        let return_value = match &result.return_value {
            Some(b64) => Some(WireValue::from_xdr_base64(b64)?),
            None => self
                .simulation
                .as_ref()
                .and_then(|sim| sim.return_value.clone()),
        };

        Ok(TxOutcome {
            hash: resp.hash,
            success: result.status == "SUCCESS",
            ledger: result.ledger,
            return_value,
            result_xdr: result.result_xdr,
        })
    }

    /// Poll `getTransaction` until a terminal status, bounded by an explicit
    /// deadline with a fixed inter-poll sleep.
    pub fn poll_status(&self, hash: &str) -> Result<GetTransactionResponse, TxError> {
        let deadline = Instant::now() + Duration::from_secs(self.options.poll_timeout_secs);
        loop {
            let resp = self.rpc.get_transaction(hash)?;
            if resp.status != "NOT_FOUND" {
                return Ok(resp);
            }
            if Instant::now() >= deadline {
                return Err(TxError::PollTimeout {
                    hash: hash.to_string(),
                    waited_secs: self.options.poll_timeout_secs,
                });
            }
            thread::sleep(Duration::from_millis(self.options.poll_interval_ms));
        }
    }
}

fn clamp_fee(fee: u64) -> u32 {
    u32::try_from(fee.min(u32::MAX as u64)).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        sim_needs_restore, sim_success, source_auth_entry, unsigned_address_entry, MockRpc,
    };
    use lumen_xdr::tx::InvokeContractArgs;
    use lumen_xdr::value::UInt128Parts;

    const PASSPHRASE: &str = "Test SDF Network ; September 2015";

    fn options(source: &str) -> TxOptions {
        TxOptions {
            network_passphrase: PASSPHRASE.to_string(),
            source_account: source.to_string(),
            poll_interval_ms: 1,
            poll_timeout_secs: 5,
            ..TxOptions::default()
        }
    }

    fn invoke_hf() -> HostFunction {
        HostFunction::InvokeContract(InvokeContractArgs {
            contract_address: Address::Contract([1u8; 32]),
            function_name: "balance".into(),
            args: vec![],
        })
    }

    #[test]
    fn read_call_resolves_from_simulation_alone() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(Some(WireValue::U32(7)), vec![], false));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();

        assert_eq!(at.state(), TxState::Simulated);
        assert!(at.is_read_call().unwrap());
        assert_eq!(at.result(), Some(&WireValue::U32(7)));
        // No send or poll round trips happened.
        assert_eq!(rpc.calls_of("sendTransaction"), 0);
        assert_eq!(rpc.calls_of("getTransaction"), 0);
    }

    #[test]
    fn simulation_error_is_fatal() {
        let rpc = MockRpc::new();
        rpc.push_simulate_error("host function failed");
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let err =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap_err();
        match err {
            TxError::SimulationFailed { message, .. } => {
                assert_eq!(message, "host function failed")
            }
            other => panic!("expected SimulationFailed, got {:?}", other),
        }
    }

    #[test]
    fn sign_before_simulate_fails() {
        let rpc = MockRpc::new();
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at = AssembledTransaction::build_deferred(
            &rpc,
            Some(&kp),
            options(&kp.account_id()),
            invoke_hf(),
        )
        .unwrap();
        assert_eq!(at.state(), TxState::Built);
        match at.sign(false).unwrap_err() {
            TxError::NotYetSimulated => {}
            other => panic!("expected NotYetSimulated, got {:?}", other),
        }
    }

    #[test]
    fn sign_refuses_read_call_without_force() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(Some(WireValue::Bool(true)), vec![], false));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        match at.sign(false).unwrap_err() {
            TxError::ReadCallRefusal => {}
            other => panic!("expected ReadCallRefusal, got {:?}", other),
        }
        // Forcing works.
        at.sign(true).unwrap();
        assert_eq!(at.state(), TxState::Signed);
    }

    #[test]
    fn sign_with_incomplete_authorization_fails_and_preserves_state() {
        let rpc = MockRpc::new();
        let other_signer = Address::Account([9u8; 32]);
        rpc.push_simulate(sim_success(
            None,
            vec![unsigned_address_entry(other_signer)],
            true,
        ));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();

        match at.sign(false).unwrap_err() {
            TxError::IncompleteAuthorization { addresses } => {
                assert_eq!(addresses, vec![other_signer.to_strkey()]);
            }
            other => panic!("expected IncompleteAuthorization, got {:?}", other),
        }
        // Failed sign mutates nothing.
        assert_eq!(at.state(), TxState::Simulated);
        assert!(at.signed_envelope().is_none());
    }

    #[test]
    fn sign_auth_entries_then_sign_succeeds() {
        let rpc = MockRpc::new();
        let co_signer = Keypair::from_raw_seed([7u8; 32]);
        rpc.push_simulate(sim_success(
            None,
            vec![
                source_auth_entry(),
                unsigned_address_entry(co_signer.address()),
            ],
            true,
        ));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();

        assert_eq!(
            at.needs_non_invoker_signing_by(false).unwrap(),
            vec![co_signer.address()]
        );
        let signed = at.sign_auth_entries(&co_signer, Some(9000)).unwrap();
        assert_eq!(signed, 1);
        assert!(at.needs_non_invoker_signing_by(false).unwrap().is_empty());

        at.sign(false).unwrap();
        let TransactionEnvelope::Tx(v1) = at.signed_envelope().unwrap();
        // Assembly applied simulation data: fee includes the resource fee and
        // the auth entries are installed on the operation.
        assert!(v1.tx.fee > 100);
        match &v1.tx.operations[0].body {
            OperationBody::InvokeHostFunction(op) => assert_eq!(op.auth.len(), 2),
            other => panic!("expected InvokeHostFunction, got {:?}", other),
        }
        // The unsigned form is untouched.
        assert_eq!(at.transaction().ext, TransactionExt::V0);
        assert_eq!(at.transaction().fee, 100);
    }

    #[test]
    fn sign_auth_entries_fetches_expiration_from_network() {
        let rpc = MockRpc::new();
        rpc.set_latest_ledger(2000);
        let co_signer = Keypair::from_raw_seed([7u8; 32]);
        rpc.push_simulate(sim_success(
            None,
            vec![unsigned_address_entry(co_signer.address())],
            true,
        ));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        at.sign_auth_entries(&co_signer, None).unwrap();
        let sim = at.simulation().unwrap();
        match &sim.auth[0].credentials {
            Credentials::Address(creds) => {
                assert_eq!(
                    creds.signature_expiration_ledger,
                    2000 + DEFAULT_EXPIRATION_LOOKAHEAD
                );
            }
            other => panic!("expected Address credentials, got {:?}", other),
        }
    }

    #[test]
    fn send_happy_path_polls_to_success() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(
            Some(WireValue::U128(UInt128Parts::from_u128(10))),
            vec![],
            true,
        ));
        rpc.push_send_pending("deadbeef");
        rpc.push_get_not_found();
        rpc.push_get_success(Some(WireValue::U128(UInt128Parts::from_u128(10))));

        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        assert!(!at.is_read_call().unwrap());
        at.sign(false).unwrap();
        let outcome = at.send().unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.hash, "deadbeef");
        assert_eq!(
            outcome.return_value,
            Some(WireValue::U128(UInt128Parts::from_u128(10)))
        );
        assert_eq!(at.state(), TxState::Complete);
        assert_eq!(rpc.calls_of("getTransaction"), 2);
    }

    #[test]
    fn send_without_sign_fails() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        match at.send().unwrap_err() {
            TxError::NotYetSigned => {}
            other => panic!("expected NotYetSigned, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        rpc.push_send_status("deadbeef", "DUPLICATE");
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        at.sign(false).unwrap();
        match at.send().unwrap_err() {
            TxError::SubmissionRejected { status, .. } => assert_eq!(status, "DUPLICATE"),
            other => panic!("expected SubmissionRejected, got {:?}", other),
        }
    }

    #[test]
    fn poll_timeout_is_fatal() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        rpc.push_send_pending("deadbeef");
        // No getTransaction responses queued: the mock keeps answering
        // NOT_FOUND.
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut opts = options(&kp.account_id());
        opts.poll_timeout_secs = 0;
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), opts, invoke_hf()).unwrap();
        at.sign(false).unwrap();
        match at.send().unwrap_err() {
            TxError::PollTimeout { hash, .. } => assert_eq!(hash, "deadbeef"),
            other => panic!("expected PollTimeout, got {:?}", other),
        }
    }

    #[test]
    fn restore_path_runs_one_nested_lifecycle_then_resimulates() {
        let rpc = MockRpc::new();
        // First simulation asks for a restore; the one after it succeeds.
        rpc.push_simulate(sim_needs_restore());
        rpc.push_simulate(sim_success(Some(WireValue::U32(1)), vec![], false));
        // Restore transaction: submitted and polled to success.
        rpc.push_send_pending("restorehash");
        rpc.push_get_success(None);

        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut opts = options(&kp.account_id());
        opts.restore = true;
        let at = AssembledTransaction::build(&rpc, Some(&kp), opts, invoke_hf()).unwrap();

        assert_eq!(at.state(), TxState::Simulated);
        let sim = at.simulation().unwrap();
        assert!(sim.restore_preamble.is_none());
        assert_eq!(sim.return_value, Some(WireValue::U32(1)));
        // Exactly one restore transaction went out, and two simulations ran.
        assert_eq!(rpc.calls_of("sendTransaction"), 1);
        assert_eq!(rpc.calls_of("simulateTransaction"), 2);
    }

    #[test]
    fn restore_without_private_key_fails() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_needs_restore());
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let public = Keypair::from_public_key(&kp.account_id()).unwrap();
        let mut opts = options(&kp.account_id());
        opts.restore = true;
        let err =
            AssembledTransaction::build(&rpc, Some(&public), opts, invoke_hf()).unwrap_err();
        match err {
            TxError::RestoreRequiresPrivateKey => {}
            other => panic!("expected RestoreRequiresPrivateKey, got {:?}", other),
        }
    }

    #[test]
    fn restore_failure_escalates() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_needs_restore());
        rpc.push_send_pending("restorehash");
        rpc.push_get_failed();
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut opts = options(&kp.account_id());
        opts.restore = true;
        let err = AssembledTransaction::build(&rpc, Some(&kp), opts, invoke_hf()).unwrap_err();
        match err {
            TxError::RestoreFailed { status, .. } => assert_eq!(status, "FAILED"),
            other => panic!("expected RestoreFailed, got {:?}", other),
        }
    }

    #[test]
    fn restore_not_requested_parks_in_needs_restore() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_needs_restore());
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        assert_eq!(at.state(), TxState::NeedsRestore);
        assert!(at.simulation().unwrap().restore_preamble.is_some());
        match at.sign(true).unwrap_err() {
            TxError::RestoreRequired => {}
            other => panic!("expected RestoreRequired, got {:?}", other),
        }
        // No restore transaction was attempted.
        assert_eq!(rpc.calls_of("sendTransaction"), 0);
    }

    #[test]
    fn resimulating_discards_previous_signature() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        rpc.push_simulate(sim_success(None, vec![], true));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        at.sign(false).unwrap();
        assert!(at.signed_envelope().is_some());
        at.simulate(false).unwrap();
        assert!(at.signed_envelope().is_none());
        assert_eq!(at.state(), TxState::Simulated);
    }

    #[test]
    fn sign_without_keypair_fails() {
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let mut at =
            AssembledTransaction::build(&rpc, None, options(&kp.account_id()), invoke_hf())
                .unwrap();
        match at.sign(false).unwrap_err() {
            TxError::MissingPrivateKey => {}
            other => panic!("expected MissingPrivateKey, got {:?}", other),
        }
    }

    #[test]
    fn transaction_hash_matches_manual_construction() {
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        let at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        let tx = at.transaction();

        let mut hasher = Sha256::new();
        hasher.update(Sha256::digest(PASSPHRASE.as_bytes()));
        hasher.update(2u32.to_be_bytes());
        hasher.update(tx.to_xdr());
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(transaction_hash(tx, PASSPHRASE), expected);
    }

    #[test]
    fn signed_envelope_signature_verifies() {
        let kp = Keypair::from_raw_seed([1u8; 32]);
        let rpc = MockRpc::new();
        rpc.push_simulate(sim_success(None, vec![], true));
        let mut at =
            AssembledTransaction::build(&rpc, Some(&kp), options(&kp.account_id()), invoke_hf())
                .unwrap();
        at.sign(false).unwrap();
        let TransactionEnvelope::Tx(v1) = at.signed_envelope().unwrap();
        assert_eq!(v1.signatures.len(), 1);
        assert_eq!(v1.signatures[0].hint, kp.signature_hint());
        let hash = transaction_hash(&v1.tx, PASSPHRASE);
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&v1.signatures[0].signature);
        assert!(kp.verify(&hash, &sig));
    }
}
