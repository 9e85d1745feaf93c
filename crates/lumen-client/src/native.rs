//! Native argument values supplied by callers.
//!
//! A small closed set: the marshaller in [`crate::spec`] is a total function
//! from `(Native, SpecType)` to a wire value or a typed error. Integers up to
//! 128 bits ride the machine types; 256-bit values are big-endian byte
//! arrays so nothing is silently truncated.

use lumen_xdr::Address;

/// A caller-supplied argument value, prior to type-directed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Native {
    /// Absent value; marshals to void against option types.
    Void,
    Bool(bool),
    /// Any signed integer up to 128 bits.
    Int(i128),
    /// Any unsigned integer up to 128 bits.
    UInt(u128),
    /// Unsigned 256-bit value, big-endian.
    U256([u8; 32]),
    /// Signed 256-bit value, big-endian two's complement.
    I256([u8; 32]),
    Bytes(Vec<u8>),
    Str(String),
    Symbol(String),
    Address(Address),
    List(Vec<Native>),
    /// Ordered key/value pairs; keys are whatever the declared map type
    /// demands, or strings when the target is a named struct.
    Map(Vec<(Native, Native)>),
    /// A tagged-union value: case name plus the case's payload values.
    Variant {
        case: String,
        values: Vec<Native>,
    },
}

impl Native {
    /// Shorthand for a string-keyed map entry, the common shape for struct
    /// arguments.
    pub fn field(name: &str, value: Native) -> (Native, Native) {
        (Native::Str(name.to_string()), value)
    }

    /// A union case with no payload.
    pub fn unit_variant(case: &str) -> Native {
        Native::Variant {
            case: case.to_string(),
            values: Vec::new(),
        }
    }

    /// Human-readable kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Native::Void => "void",
            Native::Bool(_) => "bool",
            Native::Int(_) => "int",
            Native::UInt(_) => "uint",
            Native::U256(_) => "u256",
            Native::I256(_) => "i256",
            Native::Bytes(_) => "bytes",
            Native::Str(_) => "string",
            Native::Symbol(_) => "symbol",
            Native::Address(_) => "address",
            Native::List(_) => "list",
            Native::Map(_) => "map",
            Native::Variant { .. } => "variant",
        }
    }
}

impl From<bool> for Native {
    fn from(v: bool) -> Self {
        Native::Bool(v)
    }
}

impl From<u32> for Native {
    fn from(v: u32) -> Self {
        Native::UInt(v as u128)
    }
}

impl From<i32> for Native {
    fn from(v: i32) -> Self {
        Native::Int(v as i128)
    }
}

impl From<u64> for Native {
    fn from(v: u64) -> Self {
        Native::UInt(v as u128)
    }
}

impl From<i64> for Native {
    fn from(v: i64) -> Self {
        Native::Int(v as i128)
    }
}

impl From<u128> for Native {
    fn from(v: u128) -> Self {
        Native::UInt(v)
    }
}

impl From<i128> for Native {
    fn from(v: i128) -> Self {
        Native::Int(v)
    }
}

impl From<&str> for Native {
    fn from(v: &str) -> Self {
        Native::Str(v.to_string())
    }
}

impl From<String> for Native {
    fn from(v: String) -> Self {
        Native::Str(v)
    }
}

impl From<Vec<u8>> for Native {
    fn from(v: Vec<u8>) -> Self {
        Native::Bytes(v)
    }
}

impl From<Address> for Native {
    fn from(v: Address) -> Self {
        Native::Address(v)
    }
}

impl From<Vec<Native>> for Native {
    fn from(v: Vec<Native>) -> Self {
        Native::List(v)
    }
}
