//! The ledger's tagged-union value encoding (`SCVal` on the wire).
//!
//! Every value carried into or out of a contract invocation is one of these
//! variants. The tag determines the payload layout exactly; integers wider
//! than 64 bits travel as big-endian part tuples, high part first.

use std::fmt;

use crate::codec::{CodecError, ReadXdr, Reader, WriteXdr, Writer};

/// Symbols are capped by the wire format.
pub const SYMBOL_LIMIT: u32 = 32;

// Value tags as fixed by the wire format.
const TAG_BOOL: u32 = 0;
const TAG_VOID: u32 = 1;
const TAG_U32: u32 = 3;
const TAG_I32: u32 = 4;
const TAG_U64: u32 = 5;
const TAG_I64: u32 = 6;
const TAG_TIMEPOINT: u32 = 7;
const TAG_DURATION: u32 = 8;
const TAG_U128: u32 = 9;
const TAG_I128: u32 = 10;
const TAG_U256: u32 = 11;
const TAG_I256: u32 = 12;
const TAG_BYTES: u32 = 13;
const TAG_STRING: u32 = 14;
const TAG_SYMBOL: u32 = 15;
const TAG_VEC: u32 = 16;
const TAG_MAP: u32 = 17;
const TAG_ADDRESS: u32 = 18;
const TAG_CONTRACT_INSTANCE: u32 = 19;
const TAG_LEDGER_KEY_CONTRACT_INSTANCE: u32 = 20;
const TAG_LEDGER_KEY_NONCE: u32 = 21;

// ---------------------------------------------------------------------------
// Wide integer parts
// ---------------------------------------------------------------------------

/// 128-bit unsigned value as two 64-bit parts, high first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UInt128Parts {
    pub hi: u64,
    pub lo: u64,
}

impl UInt128Parts {
    pub fn from_u128(v: u128) -> Self {
        UInt128Parts {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }

    pub fn to_u128(self) -> u128 {
        ((self.hi as u128) << 64) | self.lo as u128
    }
}

/// 128-bit signed value as two parts, high first; the high part carries the
/// sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int128Parts {
    pub hi: i64,
    pub lo: u64,
}

impl Int128Parts {
    pub fn from_i128(v: i128) -> Self {
        Int128Parts {
            hi: (v >> 64) as i64,
            lo: v as u64,
        }
    }

    pub fn to_i128(self) -> i128 {
        ((self.hi as i128) << 64) | self.lo as i128
    }
}

/// 256-bit unsigned value as four 64-bit parts, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UInt256Parts {
    pub hi_hi: u64,
    pub hi_lo: u64,
    pub lo_hi: u64,
    pub lo_lo: u64,
}

fn be_part(bytes: &[u8; 32], index: usize) -> u64 {
    let mut part = [0u8; 8];
    part.copy_from_slice(&bytes[index * 8..(index + 1) * 8]);
    u64::from_be_bytes(part)
}

impl UInt256Parts {
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let part = |i: usize| be_part(&bytes, i);
        UInt256Parts {
            hi_hi: part(0),
            hi_lo: part(1),
            lo_hi: part(2),
            lo_lo: part(3),
        }
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[0..8].copy_from_slice(&self.hi_hi.to_be_bytes());
        out[8..16].copy_from_slice(&self.hi_lo.to_be_bytes());
        out[16..24].copy_from_slice(&self.lo_hi.to_be_bytes());
        out[24..32].copy_from_slice(&self.lo_lo.to_be_bytes());
        out
    }

    pub fn from_u128(v: u128) -> Self {
        UInt256Parts {
            hi_hi: 0,
            hi_lo: 0,
            lo_hi: (v >> 64) as u64,
            lo_lo: v as u64,
        }
    }
}

/// 256-bit signed value as four parts, highest first; the top part carries
/// the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int256Parts {
    pub hi_hi: i64,
    pub hi_lo: u64,
    pub lo_hi: u64,
    pub lo_lo: u64,
}

impl Int256Parts {
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let part = |i: usize| be_part(&bytes, i);
        Int256Parts {
            hi_hi: part(0) as i64,
            hi_lo: part(1),
            lo_hi: part(2),
            lo_lo: part(3),
        }
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[0..8].copy_from_slice(&self.hi_hi.to_be_bytes());
        out[8..16].copy_from_slice(&self.hi_lo.to_be_bytes());
        out[16..24].copy_from_slice(&self.lo_hi.to_be_bytes());
        out[24..32].copy_from_slice(&self.lo_lo.to_be_bytes());
        out
    }

    pub fn from_i128(v: i128) -> Self {
        // Sign-extend into the upper 128 bits.
        let ext = if v < 0 { u64::MAX } else { 0 };
        Int256Parts {
            hi_hi: ext as i64,
            hi_lo: ext,
            lo_hi: ((v as u128) >> 64) as u64,
            lo_lo: v as u64,
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An on-ledger identity: either an account or a deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Address {
    Account([u8; 32]),
    Contract([u8; 32]),
}

const ADDRESS_TYPE_ACCOUNT: u32 = 0;
const ADDRESS_TYPE_CONTRACT: u32 = 1;

impl Address {
    /// Parse a strkey text address (`G...` account or `C...` contract).
    pub fn from_strkey(s: &str) -> Result<Self, String> {
        match stellar_strkey::Strkey::from_string(s) {
            Ok(stellar_strkey::Strkey::PublicKeyEd25519(pk)) => Ok(Address::Account(pk.0)),
            Ok(stellar_strkey::Strkey::Contract(c)) => Ok(Address::Contract(c.0)),
            Ok(_) => Err(format!(
                "{} is not an account (G...) or contract (C...) address",
                s
            )),
            Err(e) => Err(format!("invalid strkey {}: {:?}", s, e)),
        }
    }

    pub fn to_strkey(&self) -> String {
        match self {
            Address::Account(bytes) => stellar_strkey::Strkey::PublicKeyEd25519(
                stellar_strkey::ed25519::PublicKey(*bytes),
            )
            .to_string(),
            Address::Contract(bytes) => {
                stellar_strkey::Strkey::Contract(stellar_strkey::Contract(*bytes)).to_string()
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strkey())
    }
}

impl ReadXdr for Address {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("address type")? {
            ADDRESS_TYPE_ACCOUNT => {
                // AccountId wraps a public-key union with a single ed25519 arm.
                match r.read_u32("public key type")? {
                    0 => Ok(Address::Account(r.read_fixed::<32>("account key")?)),
                    tag => Err(CodecError::UnknownTag {
                        context: "public key type",
                        tag,
                    }),
                }
            }
            ADDRESS_TYPE_CONTRACT => Ok(Address::Contract(r.read_fixed::<32>("contract id")?)),
            tag => Err(CodecError::UnknownTag {
                context: "address type",
                tag,
            }),
        }
    }
}

impl WriteXdr for Address {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            Address::Account(bytes) => {
                w.write_u32(ADDRESS_TYPE_ACCOUNT);
                w.write_u32(0); // ed25519 public key arm
                w.write_fixed(bytes);
            }
            Address::Contract(bytes) => {
                w.write_u32(ADDRESS_TYPE_CONTRACT);
                w.write_fixed(bytes);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Contract executable
// ---------------------------------------------------------------------------

/// What a contract instance runs: uploaded WASM (by code hash) or the
/// built-in asset contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractExecutable {
    Wasm([u8; 32]),
    StellarAsset,
}

impl ReadXdr for ContractExecutable {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("contract executable")? {
            0 => Ok(ContractExecutable::Wasm(r.read_fixed::<32>("wasm hash")?)),
            1 => Ok(ContractExecutable::StellarAsset),
            tag => Err(CodecError::UnknownTag {
                context: "contract executable",
                tag,
            }),
        }
    }
}

impl WriteXdr for ContractExecutable {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            ContractExecutable::Wasm(hash) => {
                w.write_u32(0);
                w.write_fixed(hash);
            }
            ContractExecutable::StellarAsset => w.write_u32(1),
        }
    }
}

// ---------------------------------------------------------------------------
// WireValue
// ---------------------------------------------------------------------------

/// Map payload: insertion-ordered key/value pairs. Order is preserved through
/// encode/decode and carries no semantic meaning beyond round-trip fidelity.
pub type WireMap = Vec<(WireValue, WireValue)>;

/// The closed set of values the wire format can carry. Exactly one payload
/// per tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Void,
    Bool(bool),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    Timepoint(u64),
    Duration(u64),
    U128(UInt128Parts),
    I128(Int128Parts),
    U256(UInt256Parts),
    I256(Int256Parts),
    Bytes(Vec<u8>),
    String(String),
    Symbol(String),
    Vec(Vec<WireValue>),
    Map(WireMap),
    Address(Address),
    ContractInstance {
        executable: ContractExecutable,
        storage: Option<WireMap>,
    },
    /// Marker keying a contract's instance ledger entry.
    LedgerKeyContractInstance,
    /// Replay-nonce ledger-entry key; shows up in simulation footprints for
    /// address-credential calls.
    LedgerKeyNonce(i64),
}

impl WireValue {
    pub fn symbol(s: &str) -> WireValue {
        WireValue::Symbol(s.to_string())
    }

    fn read_map(r: &mut Reader<'_>) -> Result<WireMap, CodecError> {
        let len = r.read_seq_len("map length")?;
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let key = WireValue::read_xdr(r)?;
            let val = WireValue::read_xdr(r)?;
            entries.push((key, val));
        }
        Ok(entries)
    }

    fn write_map(entries: &WireMap, w: &mut Writer) {
        w.write_u32(entries.len() as u32);
        for (key, val) in entries {
            key.write_xdr(w);
            val.write_xdr(w);
        }
    }
}

impl ReadXdr for WireValue {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let tag = r.read_u32("value tag")?;
        r.with_depth(|r| match tag {
            TAG_BOOL => Ok(WireValue::Bool(r.read_bool("bool value")?)),
            TAG_VOID => Ok(WireValue::Void),
            TAG_U32 => Ok(WireValue::U32(r.read_u32("u32 value")?)),
            TAG_I32 => Ok(WireValue::I32(r.read_i32("i32 value")?)),
            TAG_U64 => Ok(WireValue::U64(r.read_u64("u64 value")?)),
            TAG_I64 => Ok(WireValue::I64(r.read_i64("i64 value")?)),
            TAG_TIMEPOINT => Ok(WireValue::Timepoint(r.read_u64("timepoint")?)),
            TAG_DURATION => Ok(WireValue::Duration(r.read_u64("duration")?)),
            TAG_U128 => Ok(WireValue::U128(UInt128Parts {
                hi: r.read_u64("u128 hi")?,
                lo: r.read_u64("u128 lo")?,
            })),
            TAG_I128 => Ok(WireValue::I128(Int128Parts {
                hi: r.read_i64("i128 hi")?,
                lo: r.read_u64("i128 lo")?,
            })),
            TAG_U256 => Ok(WireValue::U256(UInt256Parts {
                hi_hi: r.read_u64("u256 hi_hi")?,
                hi_lo: r.read_u64("u256 hi_lo")?,
                lo_hi: r.read_u64("u256 lo_hi")?,
                lo_lo: r.read_u64("u256 lo_lo")?,
            })),
            TAG_I256 => Ok(WireValue::I256(Int256Parts {
                hi_hi: r.read_i64("i256 hi_hi")?,
                hi_lo: r.read_u64("i256 hi_lo")?,
                lo_hi: r.read_u64("i256 lo_hi")?,
                lo_lo: r.read_u64("i256 lo_lo")?,
            })),
            TAG_BYTES => Ok(WireValue::Bytes(r.read_var_bytes(u32::MAX, "bytes value")?)),
            TAG_STRING => Ok(WireValue::String(r.read_string(u32::MAX, "string value")?)),
            TAG_SYMBOL => Ok(WireValue::Symbol(r.read_string(SYMBOL_LIMIT, "symbol value")?)),
            TAG_VEC => {
                // Optional pointer; an absent vec decodes as empty.
                if !r.read_option_flag("vec presence")? {
                    return Ok(WireValue::Vec(Vec::new()));
                }
                let len = r.read_seq_len("vec length")?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(WireValue::read_xdr(r)?);
                }
                Ok(WireValue::Vec(items))
            }
            TAG_MAP => {
                if !r.read_option_flag("map presence")? {
                    return Ok(WireValue::Map(Vec::new()));
                }
                Ok(WireValue::Map(WireValue::read_map(r)?))
            }
            TAG_ADDRESS => Ok(WireValue::Address(Address::read_xdr(r)?)),
            TAG_CONTRACT_INSTANCE => {
                let executable = ContractExecutable::read_xdr(r)?;
                let storage = if r.read_option_flag("instance storage presence")? {
                    Some(WireValue::read_map(r)?)
                } else {
                    None
                };
                Ok(WireValue::ContractInstance {
                    executable,
                    storage,
                })
            }
            TAG_LEDGER_KEY_CONTRACT_INSTANCE => Ok(WireValue::LedgerKeyContractInstance),
            TAG_LEDGER_KEY_NONCE => Ok(WireValue::LedgerKeyNonce(r.read_i64("nonce key")?)),
            tag => Err(CodecError::UnknownTag {
                context: "value tag",
                tag,
            }),
        })
    }
}

impl WriteXdr for WireValue {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            WireValue::Bool(v) => {
                w.write_u32(TAG_BOOL);
                w.write_bool(*v);
            }
            WireValue::Void => w.write_u32(TAG_VOID),
            WireValue::U32(v) => {
                w.write_u32(TAG_U32);
                w.write_u32(*v);
            }
            WireValue::I32(v) => {
                w.write_u32(TAG_I32);
                w.write_i32(*v);
            }
            WireValue::U64(v) => {
                w.write_u32(TAG_U64);
                w.write_u64(*v);
            }
            WireValue::I64(v) => {
                w.write_u32(TAG_I64);
                w.write_i64(*v);
            }
            WireValue::Timepoint(v) => {
                w.write_u32(TAG_TIMEPOINT);
                w.write_u64(*v);
            }
            WireValue::Duration(v) => {
                w.write_u32(TAG_DURATION);
                w.write_u64(*v);
            }
            WireValue::U128(parts) => {
                w.write_u32(TAG_U128);
                w.write_u64(parts.hi);
                w.write_u64(parts.lo);
            }
            WireValue::I128(parts) => {
                w.write_u32(TAG_I128);
                w.write_i64(parts.hi);
                w.write_u64(parts.lo);
            }
            WireValue::U256(parts) => {
                w.write_u32(TAG_U256);
                w.write_u64(parts.hi_hi);
                w.write_u64(parts.hi_lo);
                w.write_u64(parts.lo_hi);
                w.write_u64(parts.lo_lo);
            }
            WireValue::I256(parts) => {
                w.write_u32(TAG_I256);
                w.write_i64(parts.hi_hi);
                w.write_u64(parts.hi_lo);
                w.write_u64(parts.lo_hi);
                w.write_u64(parts.lo_lo);
            }
            WireValue::Bytes(bytes) => {
                w.write_u32(TAG_BYTES);
                w.write_var_bytes(bytes);
            }
            WireValue::String(s) => {
                w.write_u32(TAG_STRING);
                w.write_string(s);
            }
            WireValue::Symbol(s) => {
                w.write_u32(TAG_SYMBOL);
                w.write_string(s);
            }
            WireValue::Vec(items) => {
                w.write_u32(TAG_VEC);
                w.write_option_flag(true);
                w.write_u32(items.len() as u32);
                for item in items {
                    item.write_xdr(w);
                }
            }
            WireValue::Map(entries) => {
                w.write_u32(TAG_MAP);
                w.write_option_flag(true);
                WireValue::write_map(entries, w);
            }
            WireValue::Address(addr) => {
                w.write_u32(TAG_ADDRESS);
                addr.write_xdr(w);
            }
            WireValue::ContractInstance {
                executable,
                storage,
            } => {
                w.write_u32(TAG_CONTRACT_INSTANCE);
                executable.write_xdr(w);
                match storage {
                    Some(entries) => {
                        w.write_option_flag(true);
                        WireValue::write_map(entries, w);
                    }
                    None => w.write_option_flag(false),
                }
            }
            WireValue::LedgerKeyContractInstance => {
                w.write_u32(TAG_LEDGER_KEY_CONTRACT_INSTANCE);
            }
            WireValue::LedgerKeyNonce(nonce) => {
                w.write_u32(TAG_LEDGER_KEY_NONCE);
                w.write_i64(*nonce);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(v: WireValue) {
        let bytes = v.to_xdr();
        let back = WireValue::from_xdr(&bytes).unwrap();
        assert_eq!(back, v, "round trip failed for {:?}", v);
    }

    #[test]
    fn round_trip_scalars() {
        round_trip(WireValue::Void);
        round_trip(WireValue::Bool(true));
        round_trip(WireValue::Bool(false));
        round_trip(WireValue::U32(u32::MAX));
        round_trip(WireValue::I32(i32::MIN));
        round_trip(WireValue::U64(u64::MAX));
        round_trip(WireValue::I64(i64::MIN));
        round_trip(WireValue::Timepoint(1_700_000_000));
        round_trip(WireValue::Duration(86_400));
    }

    #[test]
    fn round_trip_wide_integers() {
        round_trip(WireValue::U128(UInt128Parts::from_u128(u128::MAX)));
        round_trip(WireValue::I128(Int128Parts::from_i128(i128::MIN)));
        round_trip(WireValue::U256(UInt256Parts::from_be_bytes([0xAB; 32])));
        round_trip(WireValue::I256(Int256Parts::from_i128(-1)));
    }

    #[test]
    fn round_trip_byte_like() {
        round_trip(WireValue::Bytes(vec![1, 2, 3, 4, 5]));
        round_trip(WireValue::Bytes(vec![]));
        round_trip(WireValue::String("hello world".into()));
        round_trip(WireValue::Symbol("transfer".into()));
    }

    #[test]
    fn round_trip_composites() {
        round_trip(WireValue::Vec(vec![
            WireValue::U32(1),
            WireValue::Symbol("a".into()),
            WireValue::Vec(vec![WireValue::Bool(true)]),
        ]));
        round_trip(WireValue::Map(vec![
            (WireValue::symbol("b"), WireValue::U32(2)),
            (WireValue::symbol("a"), WireValue::U32(1)),
        ]));
        round_trip(WireValue::Address(Address::Contract([7u8; 32])));
        round_trip(WireValue::Address(Address::Account([9u8; 32])));
        round_trip(WireValue::ContractInstance {
            executable: ContractExecutable::Wasm([3u8; 32]),
            storage: Some(vec![(WireValue::symbol("k"), WireValue::U32(1))]),
        });
        round_trip(WireValue::ContractInstance {
            executable: ContractExecutable::StellarAsset,
            storage: None,
        });
        round_trip(WireValue::LedgerKeyContractInstance);
        round_trip(WireValue::LedgerKeyNonce(-42));
    }

    #[test]
    fn map_preserves_insertion_order() {
        let v = WireValue::Map(vec![
            (WireValue::symbol("z"), WireValue::U32(1)),
            (WireValue::symbol("a"), WireValue::U32(2)),
        ]);
        let back = WireValue::from_xdr(&v.to_xdr()).unwrap();
        match back {
            WireValue::Map(entries) => {
                assert_eq!(entries[0].0, WireValue::symbol("z"));
                assert_eq!(entries[1].0, WireValue::symbol("a"));
            }
            other => panic!("expected Map, got {:?}", other),
        }
    }

    #[test]
    fn u32_exact_bytes() {
        // tag 3 then the value, both big-endian.
        assert_eq!(WireValue::U32(1).to_xdr(), vec![0, 0, 0, 3, 0, 0, 0, 1]);
    }

    #[test]
    fn i128_part_order() {
        let v = WireValue::I128(Int128Parts::from_i128(-1));
        // tag 10, hi = -1 (all ones), lo = all ones
        let bytes = v.to_xdr();
        assert_eq!(&bytes[..4], &[0, 0, 0, 10]);
        assert!(bytes[4..20].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn u256_parts_round_trip_bytes() {
        let mut raw = [0u8; 32];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        let parts = UInt256Parts::from_be_bytes(raw);
        assert_eq!(parts.to_be_bytes(), raw);
        // High part first: byte 0 lands in hi_hi's top byte.
        assert_eq!(parts.hi_hi >> 56, 0);
        assert_eq!(parts.lo_lo & 0xFF, 31);
    }

    #[test]
    fn int256_sign_extension() {
        let parts = Int256Parts::from_i128(-2);
        assert_eq!(parts.hi_hi, -1);
        assert_eq!(parts.hi_lo, u64::MAX);
        let bytes = parts.to_be_bytes();
        assert!(bytes[..16].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn unknown_tag_fails() {
        let mut bytes = 2u32.to_be_bytes().to_vec(); // tag 2 is not constructible here
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let err = WireValue::from_xdr(&bytes).unwrap_err();
        match err {
            CodecError::UnknownTag { tag: 2, .. } => {}
            other => panic!("expected UnknownTag, got {:?}", other),
        }
    }

    #[test]
    fn truncated_value_fails() {
        let full = WireValue::U64(77).to_xdr();
        let err = WireValue::from_xdr(&full[..6]).unwrap_err();
        match err {
            CodecError::UnexpectedEnd { .. } => {}
            other => panic!("expected UnexpectedEnd, got {:?}", other),
        }
    }

    #[test]
    fn trailing_bytes_fail() {
        let mut bytes = WireValue::Void.to_xdr();
        bytes.push(0);
        let err = WireValue::from_xdr(&bytes).unwrap_err();
        match err {
            CodecError::TrailingBytes { remaining: 1 } => {}
            other => panic!("expected TrailingBytes, got {:?}", other),
        }
    }

    #[test]
    fn symbol_over_limit_fails() {
        let long = "x".repeat(33);
        let v = WireValue::Symbol(long);
        let err = WireValue::from_xdr(&v.to_xdr()).unwrap_err();
        match err {
            CodecError::LengthLimit { limit: 32, .. } => {}
            other => panic!("expected LengthLimit, got {:?}", other),
        }
    }

    #[test]
    fn deeply_nested_vec_hits_depth_limit() {
        let mut v = WireValue::U32(0);
        for _ in 0..300 {
            v = WireValue::Vec(vec![v]);
        }
        let err = WireValue::from_xdr(&v.to_xdr()).unwrap_err();
        assert_eq!(err, CodecError::DepthLimit);
    }

    #[test]
    fn absent_vec_decodes_as_empty() {
        // tag 16, presence flag 0
        let bytes = vec![0, 0, 0, 16, 0, 0, 0, 0];
        assert_eq!(
            WireValue::from_xdr(&bytes).unwrap(),
            WireValue::Vec(Vec::new())
        );
    }

    #[test]
    fn strkey_round_trip() {
        let addr = Address::Account([0u8; 32]);
        let s = addr.to_strkey();
        assert!(s.starts_with('G'));
        assert_eq!(Address::from_strkey(&s).unwrap(), addr);

        let contract = Address::Contract([0u8; 32]);
        let s = contract.to_strkey();
        assert!(s.starts_with('C'));
        assert_eq!(Address::from_strkey(&s).unwrap(), contract);
    }

    #[test]
    fn strkey_rejects_garbage() {
        assert!(Address::from_strkey("not-an-address").is_err());
        // Secret seeds are not addresses.
        assert!(Address::from_strkey(
            "SAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
        )
        .is_err());
    }
}
