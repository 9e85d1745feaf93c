//! Contract interface-spec entries: the typed description of a contract's
//! exported functions and user-defined types, as embedded in its bytecode.

use std::fmt;

use crate::codec::{CodecError, ReadXdr, Reader, WriteXdr, Writer};
use crate::value::SYMBOL_LIMIT;

/// Doc strings attached to entries are capped by the wire format.
pub const DOC_LIMIT: u32 = 1024;
/// User-defined type and case names.
pub const NAME_LIMIT: u32 = 60;
/// Function input and struct field names.
pub const FIELD_NAME_LIMIT: u32 = 30;
/// The optional library attribution on user-defined types.
pub const LIB_LIMIT: u32 = 80;

// Type-definition tags as fixed by the wire format. Parameterized types live
// in a separate number range from the primitives.
const TYPE_VAL: u32 = 0;
const TYPE_BOOL: u32 = 1;
const TYPE_VOID: u32 = 2;
const TYPE_ERROR: u32 = 3;
const TYPE_U32: u32 = 4;
const TYPE_I32: u32 = 5;
const TYPE_U64: u32 = 6;
const TYPE_I64: u32 = 7;
const TYPE_TIMEPOINT: u32 = 8;
const TYPE_DURATION: u32 = 9;
const TYPE_U128: u32 = 10;
const TYPE_I128: u32 = 11;
const TYPE_U256: u32 = 12;
const TYPE_I256: u32 = 13;
const TYPE_BYTES: u32 = 14;
const TYPE_STRING: u32 = 16;
const TYPE_SYMBOL: u32 = 17;
const TYPE_ADDRESS: u32 = 19;
const TYPE_OPTION: u32 = 1000;
const TYPE_RESULT: u32 = 1001;
const TYPE_VEC: u32 = 1002;
const TYPE_MAP: u32 = 1004;
const TYPE_TUPLE: u32 = 1005;
const TYPE_BYTES_N: u32 = 1006;
const TYPE_UDT: u32 = 2000;

// Entry kinds.
const ENTRY_FUNCTION: u32 = 0;
const ENTRY_STRUCT: u32 = 1;
const ENTRY_UNION: u32 = 2;
const ENTRY_ENUM: u32 = 3;
const ENTRY_ERROR_ENUM: u32 = 4;

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

/// A declared type in a contract interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecType {
    Val,
    Bool,
    Void,
    Error,
    U32,
    I32,
    U64,
    I64,
    Timepoint,
    Duration,
    U128,
    I128,
    U256,
    I256,
    Bytes,
    String,
    Symbol,
    Address,
    Option(Box<SpecType>),
    Result {
        ok: Box<SpecType>,
        err: Box<SpecType>,
    },
    Vec(Box<SpecType>),
    Map {
        key: Box<SpecType>,
        value: Box<SpecType>,
    },
    Tuple(Vec<SpecType>),
    BytesN(u32),
    /// Reference to a user-defined type, resolved by name against the
    /// contract's struct/union/enum entries.
    Udt(String),
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecType::Val => write!(f, "val"),
            SpecType::Bool => write!(f, "bool"),
            SpecType::Void => write!(f, "void"),
            SpecType::Error => write!(f, "error"),
            SpecType::U32 => write!(f, "u32"),
            SpecType::I32 => write!(f, "i32"),
            SpecType::U64 => write!(f, "u64"),
            SpecType::I64 => write!(f, "i64"),
            SpecType::Timepoint => write!(f, "timepoint"),
            SpecType::Duration => write!(f, "duration"),
            SpecType::U128 => write!(f, "u128"),
            SpecType::I128 => write!(f, "i128"),
            SpecType::U256 => write!(f, "u256"),
            SpecType::I256 => write!(f, "i256"),
            SpecType::Bytes => write!(f, "bytes"),
            SpecType::String => write!(f, "string"),
            SpecType::Symbol => write!(f, "symbol"),
            SpecType::Address => write!(f, "address"),
            SpecType::Option(inner) => write!(f, "option<{}>", inner),
            SpecType::Result { ok, err } => write!(f, "result<{}, {}>", ok, err),
            SpecType::Vec(inner) => write!(f, "vec<{}>", inner),
            SpecType::Map { key, value } => write!(f, "map<{}, {}>", key, value),
            SpecType::Tuple(parts) => {
                write!(f, "tuple<")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ">")
            }
            SpecType::BytesN(n) => write!(f, "bytes<{}>", n),
            SpecType::Udt(name) => write!(f, "{}", name),
        }
    }
}

impl ReadXdr for SpecType {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let tag = r.read_u32("type tag")?;
        r.with_depth(|r| match tag {
            TYPE_VAL => Ok(SpecType::Val),
            TYPE_BOOL => Ok(SpecType::Bool),
            TYPE_VOID => Ok(SpecType::Void),
            TYPE_ERROR => Ok(SpecType::Error),
            TYPE_U32 => Ok(SpecType::U32),
            TYPE_I32 => Ok(SpecType::I32),
            TYPE_U64 => Ok(SpecType::U64),
            TYPE_I64 => Ok(SpecType::I64),
            TYPE_TIMEPOINT => Ok(SpecType::Timepoint),
            TYPE_DURATION => Ok(SpecType::Duration),
            TYPE_U128 => Ok(SpecType::U128),
            TYPE_I128 => Ok(SpecType::I128),
            TYPE_U256 => Ok(SpecType::U256),
            TYPE_I256 => Ok(SpecType::I256),
            TYPE_BYTES => Ok(SpecType::Bytes),
            TYPE_STRING => Ok(SpecType::String),
            TYPE_SYMBOL => Ok(SpecType::Symbol),
            TYPE_ADDRESS => Ok(SpecType::Address),
            TYPE_OPTION => Ok(SpecType::Option(Box::new(SpecType::read_xdr(r)?))),
            TYPE_RESULT => Ok(SpecType::Result {
                ok: Box::new(SpecType::read_xdr(r)?),
                err: Box::new(SpecType::read_xdr(r)?),
            }),
            TYPE_VEC => Ok(SpecType::Vec(Box::new(SpecType::read_xdr(r)?))),
            TYPE_MAP => Ok(SpecType::Map {
                key: Box::new(SpecType::read_xdr(r)?),
                value: Box::new(SpecType::read_xdr(r)?),
            }),
            TYPE_TUPLE => {
                let len = r.read_seq_len("tuple arity")?;
                let mut parts = Vec::with_capacity(len);
                for _ in 0..len {
                    parts.push(SpecType::read_xdr(r)?);
                }
                Ok(SpecType::Tuple(parts))
            }
            TYPE_BYTES_N => Ok(SpecType::BytesN(r.read_u32("bytesN size")?)),
            TYPE_UDT => Ok(SpecType::Udt(r.read_string(NAME_LIMIT, "udt name")?)),
            tag => Err(CodecError::UnknownTag {
                context: "type tag",
                tag,
            }),
        })
    }
}

impl WriteXdr for SpecType {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            SpecType::Val => w.write_u32(TYPE_VAL),
            SpecType::Bool => w.write_u32(TYPE_BOOL),
            SpecType::Void => w.write_u32(TYPE_VOID),
            SpecType::Error => w.write_u32(TYPE_ERROR),
            SpecType::U32 => w.write_u32(TYPE_U32),
            SpecType::I32 => w.write_u32(TYPE_I32),
            SpecType::U64 => w.write_u32(TYPE_U64),
            SpecType::I64 => w.write_u32(TYPE_I64),
            SpecType::Timepoint => w.write_u32(TYPE_TIMEPOINT),
            SpecType::Duration => w.write_u32(TYPE_DURATION),
            SpecType::U128 => w.write_u32(TYPE_U128),
            SpecType::I128 => w.write_u32(TYPE_I128),
            SpecType::U256 => w.write_u32(TYPE_U256),
            SpecType::I256 => w.write_u32(TYPE_I256),
            SpecType::Bytes => w.write_u32(TYPE_BYTES),
            SpecType::String => w.write_u32(TYPE_STRING),
            SpecType::Symbol => w.write_u32(TYPE_SYMBOL),
            SpecType::Address => w.write_u32(TYPE_ADDRESS),
            SpecType::Option(inner) => {
                w.write_u32(TYPE_OPTION);
                inner.write_xdr(w);
            }
            SpecType::Result { ok, err } => {
                w.write_u32(TYPE_RESULT);
                ok.write_xdr(w);
                err.write_xdr(w);
            }
            SpecType::Vec(inner) => {
                w.write_u32(TYPE_VEC);
                inner.write_xdr(w);
            }
            SpecType::Map { key, value } => {
                w.write_u32(TYPE_MAP);
                key.write_xdr(w);
                value.write_xdr(w);
            }
            SpecType::Tuple(parts) => {
                w.write_u32(TYPE_TUPLE);
                w.write_u32(parts.len() as u32);
                for part in parts {
                    part.write_xdr(w);
                }
            }
            SpecType::BytesN(n) => {
                w.write_u32(TYPE_BYTES_N);
                w.write_u32(*n);
            }
            SpecType::Udt(name) => {
                w.write_u32(TYPE_UDT);
                w.write_string(name);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One declared function input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInput {
    pub doc: String,
    pub name: String,
    pub ty: SpecType,
}

/// An exported contract function: ordered named inputs, at most one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFunction {
    pub doc: String,
    pub name: String,
    pub inputs: Vec<FunctionInput>,
    pub outputs: Vec<SpecType>,
}

/// One field of a user-defined struct. Field names that are purely numeric
/// mark a positional (tuple-like) struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub doc: String,
    pub name: String,
    pub ty: SpecType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStruct {
    pub doc: String,
    pub lib: String,
    pub name: String,
    pub fields: Vec<StructField>,
}

/// A tagged-union case: bare (void) or carrying a typed tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionCase {
    Void {
        doc: String,
        name: String,
    },
    Tuple {
        doc: String,
        name: String,
        types: Vec<SpecType>,
    },
}

impl UnionCase {
    pub fn name(&self) -> &str {
        match self {
            UnionCase::Void { name, .. } => name,
            UnionCase::Tuple { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecUnion {
    pub doc: String,
    pub lib: String,
    pub name: String,
    pub cases: Vec<UnionCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    pub doc: String,
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEnum {
    pub doc: String,
    pub lib: String,
    pub name: String,
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecErrorEnum {
    pub doc: String,
    pub lib: String,
    pub name: String,
    pub cases: Vec<EnumCase>,
}

/// One exported interface item. Names are unique within each category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecEntry {
    Function(SpecFunction),
    Struct(SpecStruct),
    Union(SpecUnion),
    Enum(SpecEnum),
    ErrorEnum(SpecErrorEnum),
}

impl SpecEntry {
    pub fn name(&self) -> &str {
        match self {
            SpecEntry::Function(f) => &f.name,
            SpecEntry::Struct(s) => &s.name,
            SpecEntry::Union(u) => &u.name,
            SpecEntry::Enum(e) => &e.name,
            SpecEntry::ErrorEnum(e) => &e.name,
        }
    }
}

fn read_enum_cases(r: &mut Reader<'_>) -> Result<Vec<EnumCase>, CodecError> {
    let len = r.read_seq_len("enum cases")?;
    let mut cases = Vec::with_capacity(len);
    for _ in 0..len {
        cases.push(EnumCase {
            doc: r.read_string(DOC_LIMIT, "case doc")?,
            name: r.read_string(NAME_LIMIT, "case name")?,
            value: r.read_u32("case value")?,
        });
    }
    Ok(cases)
}

fn write_enum_cases(cases: &[EnumCase], w: &mut Writer) {
    w.write_u32(cases.len() as u32);
    for case in cases {
        w.write_string(&case.doc);
        w.write_string(&case.name);
        w.write_u32(case.value);
    }
}

impl ReadXdr for SpecEntry {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("entry kind")? {
            ENTRY_FUNCTION => {
                let doc = r.read_string(DOC_LIMIT, "function doc")?;
                let name = r.read_string(SYMBOL_LIMIT, "function name")?;
                let input_count = r.read_seq_len("function inputs")?;
                let mut inputs = Vec::with_capacity(input_count);
                for _ in 0..input_count {
                    inputs.push(FunctionInput {
                        doc: r.read_string(DOC_LIMIT, "input doc")?,
                        name: r.read_string(FIELD_NAME_LIMIT, "input name")?,
                        ty: SpecType::read_xdr(r)?,
                    });
                }
                let output_count = r.read_seq_len("function outputs")?;
                let mut outputs = Vec::with_capacity(output_count);
                for _ in 0..output_count {
                    outputs.push(SpecType::read_xdr(r)?);
                }
                Ok(SpecEntry::Function(SpecFunction {
                    doc,
                    name,
                    inputs,
                    outputs,
                }))
            }
            ENTRY_STRUCT => {
                let doc = r.read_string(DOC_LIMIT, "struct doc")?;
                let lib = r.read_string(LIB_LIMIT, "struct lib")?;
                let name = r.read_string(NAME_LIMIT, "struct name")?;
                let field_count = r.read_seq_len("struct fields")?;
                let mut fields = Vec::with_capacity(field_count);
                for _ in 0..field_count {
                    fields.push(StructField {
                        doc: r.read_string(DOC_LIMIT, "field doc")?,
                        name: r.read_string(FIELD_NAME_LIMIT, "field name")?,
                        ty: SpecType::read_xdr(r)?,
                    });
                }
                Ok(SpecEntry::Struct(SpecStruct {
                    doc,
                    lib,
                    name,
                    fields,
                }))
            }
            ENTRY_UNION => {
                let doc = r.read_string(DOC_LIMIT, "union doc")?;
                let lib = r.read_string(LIB_LIMIT, "union lib")?;
                let name = r.read_string(NAME_LIMIT, "union name")?;
                let case_count = r.read_seq_len("union cases")?;
                let mut cases = Vec::with_capacity(case_count);
                for _ in 0..case_count {
                    let case = match r.read_u32("union case kind")? {
                        0 => UnionCase::Void {
                            doc: r.read_string(DOC_LIMIT, "case doc")?,
                            name: r.read_string(NAME_LIMIT, "case name")?,
                        },
                        1 => {
                            let doc = r.read_string(DOC_LIMIT, "case doc")?;
                            let name = r.read_string(NAME_LIMIT, "case name")?;
                            let arity = r.read_seq_len("case types")?;
                            let mut types = Vec::with_capacity(arity);
                            for _ in 0..arity {
                                types.push(SpecType::read_xdr(r)?);
                            }
                            UnionCase::Tuple { doc, name, types }
                        }
                        tag => {
                            return Err(CodecError::UnknownTag {
                                context: "union case kind",
                                tag,
                            })
                        }
                    };
                    cases.push(case);
                }
                Ok(SpecEntry::Union(SpecUnion {
                    doc,
                    lib,
                    name,
                    cases,
                }))
            }
            ENTRY_ENUM => Ok(SpecEntry::Enum(SpecEnum {
                doc: r.read_string(DOC_LIMIT, "enum doc")?,
                lib: r.read_string(LIB_LIMIT, "enum lib")?,
                name: r.read_string(NAME_LIMIT, "enum name")?,
                cases: read_enum_cases(r)?,
            })),
            ENTRY_ERROR_ENUM => Ok(SpecEntry::ErrorEnum(SpecErrorEnum {
                doc: r.read_string(DOC_LIMIT, "error enum doc")?,
                lib: r.read_string(LIB_LIMIT, "error enum lib")?,
                name: r.read_string(NAME_LIMIT, "error enum name")?,
                cases: read_enum_cases(r)?,
            })),
            tag => Err(CodecError::UnknownTag {
                context: "entry kind",
                tag,
            }),
        }
    }
}

impl WriteXdr for SpecEntry {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            SpecEntry::Function(func) => {
                w.write_u32(ENTRY_FUNCTION);
                w.write_string(&func.doc);
                w.write_string(&func.name);
                w.write_u32(func.inputs.len() as u32);
                for input in &func.inputs {
                    w.write_string(&input.doc);
                    w.write_string(&input.name);
                    input.ty.write_xdr(w);
                }
                w.write_u32(func.outputs.len() as u32);
                for output in &func.outputs {
                    output.write_xdr(w);
                }
            }
            SpecEntry::Struct(s) => {
                w.write_u32(ENTRY_STRUCT);
                w.write_string(&s.doc);
                w.write_string(&s.lib);
                w.write_string(&s.name);
                w.write_u32(s.fields.len() as u32);
                for field in &s.fields {
                    w.write_string(&field.doc);
                    w.write_string(&field.name);
                    field.ty.write_xdr(w);
                }
            }
            SpecEntry::Union(u) => {
                w.write_u32(ENTRY_UNION);
                w.write_string(&u.doc);
                w.write_string(&u.lib);
                w.write_string(&u.name);
                w.write_u32(u.cases.len() as u32);
                for case in &u.cases {
                    match case {
                        UnionCase::Void { doc, name } => {
                            w.write_u32(0);
                            w.write_string(doc);
                            w.write_string(name);
                        }
                        UnionCase::Tuple { doc, name, types } => {
                            w.write_u32(1);
                            w.write_string(doc);
                            w.write_string(name);
                            w.write_u32(types.len() as u32);
                            for ty in types {
                                ty.write_xdr(w);
                            }
                        }
                    }
                }
            }
            SpecEntry::Enum(e) => {
                w.write_u32(ENTRY_ENUM);
                w.write_string(&e.doc);
                w.write_string(&e.lib);
                w.write_string(&e.name);
                write_enum_cases(&e.cases, w);
            }
            SpecEntry::ErrorEnum(e) => {
                w.write_u32(ENTRY_ERROR_ENUM);
                w.write_string(&e.doc);
                w.write_string(&e.lib);
                w.write_string(&e.name);
                write_enum_cases(&e.cases, w);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bytecode meta entries
// ---------------------------------------------------------------------------

/// Entry in the environment-meta bytecode section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMetaEntry {
    /// The interface version the contract was built against.
    InterfaceVersion(u64),
}

impl ReadXdr for EnvMetaEntry {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("env meta kind")? {
            0 => Ok(EnvMetaEntry::InterfaceVersion(
                r.read_u64("interface version")?,
            )),
            tag => Err(CodecError::UnknownTag {
                context: "env meta kind",
                tag,
            }),
        }
    }
}

impl WriteXdr for EnvMetaEntry {
    fn write_xdr(&self, w: &mut Writer) {
        match self {
            EnvMetaEntry::InterfaceVersion(v) => {
                w.write_u32(0);
                w.write_u64(*v);
            }
        }
    }
}

/// Free-form key/value entry in the meta bytecode section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub key: String,
    pub val: String,
}

impl ReadXdr for MetaEntry {
    fn read_xdr(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_u32("meta kind")? {
            0 => Ok(MetaEntry {
                key: r.read_string(u32::MAX, "meta key")?,
                val: r.read_string(u32::MAX, "meta value")?,
            }),
            tag => Err(CodecError::UnknownTag {
                context: "meta kind",
                tag,
            }),
        }
    }
}

impl WriteXdr for MetaEntry {
    fn write_xdr(&self, w: &mut Writer) {
        w.write_u32(0);
        w.write_string(&self.key);
        w.write_string(&self.val);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
