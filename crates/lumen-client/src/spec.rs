//! Type-directed conversion of native argument values into wire values,
//! driven by a contract's decoded interface spec.

use std::fmt;

use lumen_xdr::spec::{SpecEntry, SpecEnum, SpecFunction, SpecStruct, SpecType, SpecUnion, UnionCase};
use lumen_xdr::value::{Int128Parts, Int256Parts, UInt128Parts, UInt256Parts};
use lumen_xdr::{Address, WireValue};

use crate::native::Native;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from argument marshalling. Always fatal to the single conversion
/// call, with enough context to diagnose which argument was at fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// No function with that name is declared in the spec.
    UnknownFunction(String),
    /// A declared input (or struct field) had no matching native entry.
    MissingArgument { context: String, name: String },
    /// A user-defined type reference did not resolve.
    UnknownType(String),
    /// An enum value or union case name matched no declared case.
    InvalidEnumCase { type_name: String, case: String },
    /// A union case or tuple was given the wrong number of values.
    ArityMismatch {
        context: String,
        expected: usize,
        got: usize,
    },
    /// The native value cannot satisfy the declared wire type.
    TypeMismatch { declared: String, got: String },
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalError::UnknownFunction(name) => {
                write!(f, "contract declares no function named {}", name)
            }
            MarshalError::MissingArgument { context, name } => {
                write!(f, "missing argument {} for {}", name, context)
            }
            MarshalError::UnknownType(name) => {
                write!(f, "unknown user-defined type {}", name)
            }
            MarshalError::InvalidEnumCase { type_name, case } => {
                write!(f, "{} has no case {}", type_name, case)
            }
            MarshalError::ArityMismatch {
                context,
                expected,
                got,
            } => {
                write!(
                    f,
                    "{} expects {} value(s), got {}",
                    context, expected, got
                )
            }
            MarshalError::TypeMismatch { declared, got } => {
                write!(f, "cannot convert {} into declared type {}", got, declared)
            }
        }
    }
}

impl std::error::Error for MarshalError {}

fn mismatch(declared: &SpecType, got: &Native) -> MarshalError {
    MarshalError::TypeMismatch {
        declared: declared.to_string(),
        got: got.kind().to_string(),
    }
}

// ---------------------------------------------------------------------------
// ContractSpec
// ---------------------------------------------------------------------------

/// A contract's decoded interface entries with name-based lookup and the
/// native-to-wire conversion entry points.
#[derive(Debug, Clone)]
pub struct ContractSpec {
    entries: Vec<SpecEntry>,
}

impl ContractSpec {
    pub fn new(entries: Vec<SpecEntry>) -> Self {
        ContractSpec { entries }
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    pub fn find_function(&self, name: &str) -> Option<&SpecFunction> {
        self.entries.iter().find_map(|entry| match entry {
            SpecEntry::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    fn find_struct(&self, name: &str) -> Option<&SpecStruct> {
        self.entries.iter().find_map(|entry| match entry {
            SpecEntry::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    fn find_union(&self, name: &str) -> Option<&SpecUnion> {
        self.entries.iter().find_map(|entry| match entry {
            SpecEntry::Union(u) if u.name == name => Some(u),
            _ => None,
        })
    }

    fn find_enum(&self, name: &str) -> Option<&SpecEnum> {
        self.entries.iter().find_map(|entry| match entry {
            SpecEntry::Enum(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Convert named arguments for `function` into the ordered wire-value
    /// list the invocation carries: one value per declared input, in
    /// declaration order regardless of caller key order.
    pub fn args_to_wire_values(
        &self,
        function: &str,
        args: &[(String, Native)],
    ) -> Result<Vec<WireValue>, MarshalError> {
        let func = self
            .find_function(function)
            .ok_or_else(|| MarshalError::UnknownFunction(function.to_string()))?;

        let mut out = Vec::with_capacity(func.inputs.len());
        for input in &func.inputs {
            let value = args
                .iter()
                .find(|(name, _)| *name == input.name)
                .map(|(_, value)| value)
                .ok_or_else(|| MarshalError::MissingArgument {
                    context: format!("function {}", function),
                    name: input.name.clone(),
                })?;
            out.push(self.native_to_wire(value, &input.ty)?);
        }
        Ok(out)
    }

    /// Recursive conversion core: a total function over the closed native
    /// value set and the declared type tree.
    pub fn native_to_wire(
        &self,
        value: &Native,
        ty: &SpecType,
    ) -> Result<WireValue, MarshalError> {
        match ty {
            SpecType::Option(inner) => match value {
                Native::Void => Ok(WireValue::Void),
                other => self.native_to_wire(other, inner),
            },
            SpecType::Udt(name) => self.udt_to_wire(value, name),
            SpecType::Void => match value {
                Native::Void => Ok(WireValue::Void),
                other => Err(mismatch(ty, other)),
            },
            SpecType::Bool => match value {
                Native::Bool(v) => Ok(WireValue::Bool(*v)),
                other => Err(mismatch(ty, other)),
            },
            SpecType::U32 => Ok(WireValue::U32(self.expect_unsigned(value, ty)?.try_into()
                .map_err(|_| mismatch(ty, value))?)),
            SpecType::I32 => Ok(WireValue::I32(
                self.expect_signed(value, ty)?
                    .try_into()
                    .map_err(|_| mismatch(ty, value))?,
            )),
            SpecType::U64 => Ok(WireValue::U64(self.expect_unsigned(value, ty)?.try_into()
                .map_err(|_| mismatch(ty, value))?)),
            SpecType::I64 => Ok(WireValue::I64(
                self.expect_signed(value, ty)?
                    .try_into()
                    .map_err(|_| mismatch(ty, value))?,
            )),
            SpecType::Timepoint => Ok(WireValue::Timepoint(
                self.expect_unsigned(value, ty)?
                    .try_into()
                    .map_err(|_| mismatch(ty, value))?,
            )),
            SpecType::Duration => Ok(WireValue::Duration(
                self.expect_unsigned(value, ty)?
                    .try_into()
                    .map_err(|_| mismatch(ty, value))?,
            )),
            SpecType::U128 => Ok(WireValue::U128(UInt128Parts::from_u128(
                self.expect_unsigned(value, ty)?,
            ))),
            SpecType::I128 => Ok(WireValue::I128(Int128Parts::from_i128(
                self.expect_signed(value, ty)?,
            ))),
            SpecType::U256 => match value {
                Native::U256(bytes) => Ok(WireValue::U256(UInt256Parts::from_be_bytes(*bytes))),
                other => Ok(WireValue::U256(UInt256Parts::from_u128(
                    self.expect_unsigned(other, ty)?,
                ))),
            },
            SpecType::I256 => match value {
                Native::I256(bytes) => Ok(WireValue::I256(Int256Parts::from_be_bytes(*bytes))),
                other => Ok(WireValue::I256(Int256Parts::from_i128(
                    self.expect_signed(other, ty)?,
                ))),
            },
            SpecType::Bytes => match value {
                Native::Bytes(bytes) => Ok(WireValue::Bytes(bytes.clone())),
                other => Err(mismatch(ty, other)),
            },
            SpecType::BytesN(n) => match value {
                Native::Bytes(bytes) if bytes.len() == *n as usize => {
                    Ok(WireValue::Bytes(bytes.clone()))
                }
                other => Err(mismatch(ty, other)),
            },
            SpecType::String => match value {
                Native::Str(s) | Native::Symbol(s) => Ok(WireValue::String(s.clone())),
                other => Err(mismatch(ty, other)),
            },
            SpecType::Symbol => match value {
                Native::Str(s) | Native::Symbol(s) => Ok(WireValue::Symbol(s.clone())),
                other => Err(mismatch(ty, other)),
            },
            SpecType::Address => match value {
                Native::Address(addr) => Ok(WireValue::Address(*addr)),
                Native::Str(s) => Address::from_strkey(s)
                    .map(WireValue::Address)
                    .map_err(|_| mismatch(ty, value)),
                other => Err(mismatch(ty, other)),
            },
            SpecType::Vec(elem) => match value {
                Native::List(items) => items
                    .iter()
                    .map(|item| self.native_to_wire(item, elem))
                    .collect::<Result<Vec<_>, _>>()
                    .map(WireValue::Vec),
                other => Err(mismatch(ty, other)),
            },
            SpecType::Tuple(parts) => match value {
                Native::List(items) => {
                    if items.len() != parts.len() {
                        return Err(MarshalError::ArityMismatch {
                            context: ty.to_string(),
                            expected: parts.len(),
                            got: items.len(),
                        });
                    }
                    items
                        .iter()
                        .zip(parts)
                        .map(|(item, part)| self.native_to_wire(item, part))
                        .collect::<Result<Vec<_>, _>>()
                        .map(WireValue::Vec)
                }
                other => Err(mismatch(ty, other)),
            },
            SpecType::Map { key, value: val_ty } => match value {
                Native::Map(entries) => entries
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            self.native_to_wire(k, key)?,
                            self.native_to_wire(v, val_ty)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, MarshalError>>()
                    .map(WireValue::Map),
                other => Err(mismatch(ty, other)),
            },
            // Results marshal against their ok type; errors travel back from
            // the network, not into it.
            SpecType::Result { ok, .. } => self.native_to_wire(value, ok),
            SpecType::Val => self.untyped_to_wire(value),
            SpecType::Error => Err(mismatch(ty, value)),
        }
    }

    // -- User-defined types -------------------------------------------------

    fn udt_to_wire(&self, value: &Native, name: &str) -> Result<WireValue, MarshalError> {
        if let Some(spec_enum) = self.find_enum(name) {
            return self.enum_to_wire(value, spec_enum);
        }
        if let Some(spec_struct) = self.find_struct(name) {
            return self.struct_to_wire(value, spec_struct);
        }
        if let Some(spec_union) = self.find_union(name) {
            return self.union_to_wire(value, spec_union);
        }
        Err(MarshalError::UnknownType(name.to_string()))
    }

    /// Enum values ride the wire as plain u32 case values. Duplicate case
    /// values resolve to the first declared match.
    fn enum_to_wire(&self, value: &Native, spec: &SpecEnum) -> Result<WireValue, MarshalError> {
        let candidate: u128 = match value {
            Native::UInt(v) => *v,
            Native::Int(v) if *v >= 0 => *v as u128,
            _ => {
                return Err(MarshalError::InvalidEnumCase {
                    type_name: spec.name.clone(),
                    case: format!("{:?}", value),
                })
            }
        };
        for case in &spec.cases {
            if candidate == case.value as u128 {
                return Ok(WireValue::U32(case.value));
            }
        }
        Err(MarshalError::InvalidEnumCase {
            type_name: spec.name.clone(),
            case: candidate.to_string(),
        })
    }

    /// Structs with purely numeric field names are positional and encode as
    /// a vector; named structs encode as a symbol-keyed map in
    /// field-declaration order.
    fn struct_to_wire(&self, value: &Native, spec: &SpecStruct) -> Result<WireValue, MarshalError> {
        let positional = !spec.fields.is_empty()
            && spec
                .fields
                .iter()
                .all(|field| field.name.chars().all(|c| c.is_ascii_digit()));

        if positional {
            let items = match value {
                Native::List(items) => items,
                other => {
                    return Err(MarshalError::TypeMismatch {
                        declared: format!("struct {} (positional)", spec.name),
                        got: other.kind().to_string(),
                    })
                }
            };
            if items.len() != spec.fields.len() {
                return Err(MarshalError::ArityMismatch {
                    context: format!("struct {}", spec.name),
                    expected: spec.fields.len(),
                    got: items.len(),
                });
            }
            return items
                .iter()
                .zip(&spec.fields)
                .map(|(item, field)| self.native_to_wire(item, &field.ty))
                .collect::<Result<Vec<_>, _>>()
                .map(WireValue::Vec);
        }

        let entries = match value {
            Native::Map(entries) => entries,
            other => {
                return Err(MarshalError::TypeMismatch {
                    declared: format!("struct {}", spec.name),
                    got: other.kind().to_string(),
                })
            }
        };
        let mut out = Vec::with_capacity(spec.fields.len());
        for field in &spec.fields {
            let supplied = entries
                .iter()
                .find(|(key, _)| match key {
                    Native::Str(s) | Native::Symbol(s) => *s == field.name,
                    _ => false,
                })
                .map(|(_, v)| v)
                .ok_or_else(|| MarshalError::MissingArgument {
                    context: format!("struct {}", spec.name),
                    name: field.name.clone(),
                })?;
            out.push((
                WireValue::symbol(&field.name),
                self.native_to_wire(supplied, &field.ty)?,
            ));
        }
        Ok(WireValue::Map(out))
    }

    /// Union values encode as a vector led by the case-name symbol: a void
    /// case is just `[tag]`, a tuple case `[tag, v1, ...]` with exact arity.
    fn union_to_wire(&self, value: &Native, spec: &SpecUnion) -> Result<WireValue, MarshalError> {
        let (case_name, values) = match value {
            Native::Variant { case, values } => (case, values.as_slice()),
            other => {
                return Err(MarshalError::TypeMismatch {
                    declared: format!("union {}", spec.name),
                    got: other.kind().to_string(),
                })
            }
        };
        let case = spec
            .cases
            .iter()
            .find(|c| c.name() == case_name)
            .ok_or_else(|| MarshalError::InvalidEnumCase {
                type_name: spec.name.clone(),
                case: case_name.clone(),
            })?;

        match case {
            UnionCase::Void { name, .. } => {
                if !values.is_empty() {
                    return Err(MarshalError::ArityMismatch {
                        context: format!("union {} case {}", spec.name, name),
                        expected: 0,
                        got: values.len(),
                    });
                }
                Ok(WireValue::Vec(vec![WireValue::symbol(name)]))
            }
            UnionCase::Tuple { name, types, .. } => {
                if values.len() != types.len() {
                    return Err(MarshalError::ArityMismatch {
                        context: format!("union {} case {}", spec.name, name),
                        expected: types.len(),
                        got: values.len(),
                    });
                }
                let mut out = Vec::with_capacity(1 + values.len());
                out.push(WireValue::symbol(name));
                for (item, ty) in values.iter().zip(types) {
                    out.push(self.native_to_wire(item, ty)?);
                }
                Ok(WireValue::Vec(out))
            }
        }
    }

    // -- Numeric extraction -------------------------------------------------

    fn expect_unsigned(&self, value: &Native, ty: &SpecType) -> Result<u128, MarshalError> {
        match value {
            Native::UInt(v) => Ok(*v),
            Native::Int(v) if *v >= 0 => Ok(*v as u128),
            other => Err(mismatch(ty, other)),
        }
    }

    fn expect_signed(&self, value: &Native, ty: &SpecType) -> Result<i128, MarshalError> {
        match value {
            Native::Int(v) => Ok(*v),
            Native::UInt(v) => i128::try_from(*v).map_err(|_| mismatch(ty, value)),
            other => Err(mismatch(ty, other)),
        }
    }

    /// For `val`-typed (any) parameters: map each native onto its natural
    /// wire form.
    fn untyped_to_wire(&self, value: &Native) -> Result<WireValue, MarshalError> {
        match value {
            Native::Void => Ok(WireValue::Void),
            Native::Bool(v) => Ok(WireValue::Bool(*v)),
            Native::Int(v) => Ok(match i64::try_from(*v) {
                Ok(small) => WireValue::I64(small),
                Err(_) => WireValue::I128(Int128Parts::from_i128(*v)),
            }),
            Native::UInt(v) => Ok(match u64::try_from(*v) {
                Ok(small) => WireValue::U64(small),
                Err(_) => WireValue::U128(UInt128Parts::from_u128(*v)),
            }),
            Native::U256(bytes) => Ok(WireValue::U256(UInt256Parts::from_be_bytes(*bytes))),
            Native::I256(bytes) => Ok(WireValue::I256(Int256Parts::from_be_bytes(*bytes))),
            Native::Bytes(bytes) => Ok(WireValue::Bytes(bytes.clone())),
            Native::Str(s) => Ok(WireValue::String(s.clone())),
            Native::Symbol(s) => Ok(WireValue::Symbol(s.clone())),
            Native::Address(addr) => Ok(WireValue::Address(*addr)),
            Native::List(items) => items
                .iter()
                .map(|item| self.untyped_to_wire(item))
                .collect::<Result<Vec<_>, _>>()
                .map(WireValue::Vec),
            Native::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((self.untyped_to_wire(k)?, self.untyped_to_wire(v)?)))
                .collect::<Result<Vec<_>, MarshalError>>()
                .map(WireValue::Map),
            Native::Variant { .. } => Err(MarshalError::TypeMismatch {
                declared: "val".to_string(),
                got: "variant".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
