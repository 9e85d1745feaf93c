//! Contract bytecode parsing: locate the embedded meta sections and decode
//! the interface description out of them.
//!
//! Contract WASM carries three custom sections, found here by scanning the
//! raw bytes for their ASCII names rather than walking the WASM section
//! table: `contractenvmetav0` (environment meta), `contractspecv0` (the
//! interface spec) and `contractmetav0` (free-form key/value meta).

use std::fmt;

use lumen_xdr::codec::{CodecError, ReadXdr, Reader};
use lumen_xdr::spec::{EnvMetaEntry, MetaEntry, SpecEntry};

/// Environment-meta section marker.
pub const ENV_META_SECTION: &str = "contractenvmetav0";
/// Interface-spec section marker.
pub const SPEC_SECTION: &str = "contractspecv0";
/// Free-form meta section marker.
pub const META_SECTION: &str = "contractmetav0";

/// Meta key whose value lists the protocol extensions a contract supports,
/// comma-separated.
pub const SUPPORTED_EXTENSIONS_KEY: &str = "supported_seps";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from bytecode parsing. Always fatal to the parse call; the meta
/// section is the one place truncation is tolerated instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required section marker was absent from the bytecode.
    MissingSection(&'static str),
    /// A section's bytes did not decode.
    MalformedEncoding(CodecError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingSection(name) => {
                write!(f, "bytecode has no {} section", name)
            }
            ParseError::MalformedEncoding(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<CodecError> for ParseError {
    fn from(e: CodecError) -> Self {
        ParseError::MalformedEncoding(e)
    }
}

// ---------------------------------------------------------------------------
// ContractInfo
// ---------------------------------------------------------------------------

/// Everything parsed out of a contract's bytecode. Immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    /// Interface version from the environment-meta section.
    pub interface_version: u64,
    /// Exported interface entries, in bytecode order.
    pub entries: Vec<SpecEntry>,
    /// Free-form meta key/value pairs, in bytecode order.
    pub meta: Vec<(String, String)>,
    /// Protocol-extension identifiers from [`SUPPORTED_EXTENSIONS_KEY`]
    /// entries: comma-split, trimmed, de-duplicated, first-seen order.
    pub supported_extensions: Vec<String>,
}

impl ContractInfo {
    /// First meta value for a key, if any.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Section location
// ---------------------------------------------------------------------------

fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Slice out a named section: content runs from the end of the marker to the
/// nearest following occurrence of any known marker (narrowest bounded
/// match), else to the end of the buffer.
fn find_section<'a>(bytecode: &'a [u8], marker: &str) -> Option<&'a [u8]> {
    let start = find_subslice(bytecode, marker.as_bytes(), 0)? + marker.len();
    let mut end = bytecode.len();
    for other in [ENV_META_SECTION, SPEC_SECTION, META_SECTION] {
        if other == marker {
            continue;
        }
        if let Some(pos) = find_subslice(bytecode, other.as_bytes(), start) {
            end = end.min(pos);
        }
    }
    Some(&bytecode[start..end])
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a contract's raw bytecode into its [`ContractInfo`].
///
/// The environment-meta and spec sections are required; the meta section is
/// optional and tolerates truncation (whatever decoded before the failure is
/// kept).
pub fn parse_contract_bytecode(bytecode: &[u8]) -> Result<ContractInfo, ParseError> {
    let env_section =
        find_section(bytecode, ENV_META_SECTION).ok_or(ParseError::MissingSection(ENV_META_SECTION))?;
    let interface_version = parse_interface_version(env_section)?;

    let spec_section =
        find_section(bytecode, SPEC_SECTION).ok_or(ParseError::MissingSection(SPEC_SECTION))?;
    let entries = parse_spec_entries(spec_section);

    let meta = match find_section(bytecode, META_SECTION) {
        Some(section) => parse_meta_entries(section),
        None => Vec::new(),
    };

    let supported_extensions = collect_supported_extensions(&meta);

    Ok(ContractInfo {
        interface_version,
        entries,
        meta,
        supported_extensions,
    })
}

/// The interface version is required; an undecodable env-meta section is
/// fatal.
fn parse_interface_version(section: &[u8]) -> Result<u64, ParseError> {
    let mut r = Reader::new(section);
    let EnvMetaEntry::InterfaceVersion(version) = EnvMetaEntry::read_xdr(&mut r)?;
    Ok(version)
}

/// Decode back-to-back spec entries, stopping silently at the first record
/// that fails to decode or is not one of the supported entry kinds. Entries
/// decoded so far are kept; the section merely being present is enough.
fn parse_spec_entries(section: &[u8]) -> Vec<SpecEntry> {
    let mut r = Reader::new(section);
    let mut entries = Vec::new();
    while !r.is_empty() {
        match SpecEntry::read_xdr(&mut r) {
            Ok(entry) => entries.push(entry),
            Err(_) => break,
        }
    }
    entries
}

/// Decode back-to-back meta entries, tolerating decode failure by stopping
/// early. A partially-parsed meta section is not an error.
fn parse_meta_entries(section: &[u8]) -> Vec<(String, String)> {
    let mut r = Reader::new(section);
    let mut meta = Vec::new();
    while !r.is_empty() {
        match MetaEntry::read_xdr(&mut r) {
            Ok(entry) => meta.push((entry.key, entry.val)),
            Err(_) => break,
        }
    }
    meta
}

fn collect_supported_extensions(meta: &[(String, String)]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (key, val) in meta {
        if key != SUPPORTED_EXTENSIONS_KEY {
            continue;
        }
        for part in val.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !out.iter().any(|existing| existing == trimmed) {
                out.push(trimmed.to_string());
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_xdr::codec::WriteXdr;
    use lumen_xdr::spec::{
        EnumCase, FunctionInput, MetaEntry, SpecEnum, SpecFunction, SpecType,
    };

    fn sample_function() -> SpecEntry {
        SpecEntry::Function(SpecFunction {
            doc: String::new(),
            name: "transfer".into(),
            inputs: vec![FunctionInput {
                doc: String::new(),
                name: "to".into(),
                ty: SpecType::Address,
            }],
            outputs: vec![SpecType::Void],
        })
    }

    fn sample_enum() -> SpecEntry {
        SpecEntry::Enum(SpecEnum {
            doc: String::new(),
            lib: String::new(),
            name: "Color".into(),
            cases: vec![EnumCase {
                doc: String::new(),
                name: "Red".into(),
                value: 0,
            }],
        })
    }

    /// Assemble fake bytecode: markers followed by encoded section bytes.
    fn build_bytecode(
        env_meta: Option<&[u8]>,
        spec: Option<&[u8]>,
        meta: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut out = b"\x00asm\x01\x00\x00\x00".to_vec();
        if let Some(bytes) = env_meta {
            out.extend_from_slice(ENV_META_SECTION.as_bytes());
            out.extend_from_slice(bytes);
        }
        if let Some(bytes) = spec {
            out.extend_from_slice(SPEC_SECTION.as_bytes());
            out.extend_from_slice(bytes);
        }
        if let Some(bytes) = meta {
            out.extend_from_slice(META_SECTION.as_bytes());
            out.extend_from_slice(bytes);
        }
        out
    }

    fn env_meta_bytes() -> Vec<u8> {
        EnvMetaEntry::InterfaceVersion(90194313216).to_xdr()
    }

    fn meta_bytes(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, val) in pairs {
            out.extend(
                MetaEntry {
                    key: key.to_string(),
                    val: val.to_string(),
                }
                .to_xdr(),
            );
        }
        out
    }

    #[test]
    fn parses_all_three_sections() {
        let mut spec = sample_function().to_xdr();
        spec.extend(sample_enum().to_xdr());
        let meta = meta_bytes(&[("rsver", "1.74.0"), ("name", "token")]);
        let bytecode = build_bytecode(Some(&env_meta_bytes()), Some(&spec), Some(&meta));

        let info = parse_contract_bytecode(&bytecode).unwrap();
        assert_eq!(info.interface_version, 90194313216);
        assert_eq!(info.entries.len(), 2);
        assert_eq!(info.entries[0].name(), "transfer");
        assert_eq!(info.entries[1].name(), "Color");
        assert_eq!(info.meta_value("rsver"), Some("1.74.0"));
        assert_eq!(info.meta_value("name"), Some("token"));
        assert!(info.supported_extensions.is_empty());
    }

    #[test]
    fn missing_spec_section_is_fatal() {
        let bytecode = build_bytecode(Some(&env_meta_bytes()), None, None);
        let err = parse_contract_bytecode(&bytecode).unwrap_err();
        assert_eq!(err, ParseError::MissingSection(SPEC_SECTION));
    }

    #[test]
    fn missing_env_meta_section_is_fatal() {
        let spec = sample_function().to_xdr();
        let bytecode = build_bytecode(None, Some(&spec), None);
        let err = parse_contract_bytecode(&bytecode).unwrap_err();
        assert_eq!(err, ParseError::MissingSection(ENV_META_SECTION));
    }

    #[test]
    fn malformed_env_meta_is_fatal() {
        let spec = sample_function().to_xdr();
        let bytecode = build_bytecode(Some(&[0, 0]), Some(&spec), None);
        let err = parse_contract_bytecode(&bytecode).unwrap_err();
        match err {
            ParseError::MalformedEncoding(_) => {}
            other => panic!("expected MalformedEncoding, got {:?}", other),
        }
    }

    #[test]
    fn truncated_meta_section_keeps_decoded_entries() {
        let spec = sample_function().to_xdr();
        let mut meta = meta_bytes(&[("a", "1"), ("b", "2")]);
        // Chop into the middle of a third entry.
        let partial = MetaEntry {
            key: "c".into(),
            val: "3".into(),
        }
        .to_xdr();
        meta.extend_from_slice(&partial[..partial.len() - 3]);

        let bytecode = build_bytecode(Some(&env_meta_bytes()), Some(&spec), Some(&meta));
        let info = parse_contract_bytecode(&bytecode).unwrap();
        assert_eq!(
            info.meta,
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn missing_meta_section_yields_empty_meta() {
        let spec = sample_function().to_xdr();
        let bytecode = build_bytecode(Some(&env_meta_bytes()), Some(&spec), None);
        let info = parse_contract_bytecode(&bytecode).unwrap();
        assert!(info.meta.is_empty());
        assert!(info.supported_extensions.is_empty());
    }

    #[test]
    fn spec_decoding_stops_at_undecodable_record() {
        let mut spec = sample_function().to_xdr();
        // Entry kind 5 (events) is not supported; decoding stops there.
        spec.extend_from_slice(&5u32.to_be_bytes());
        spec.extend_from_slice(&[0u8; 16]);
        let bytecode = build_bytecode(Some(&env_meta_bytes()), Some(&spec), None);
        let info = parse_contract_bytecode(&bytecode).unwrap();
        assert_eq!(info.entries.len(), 1);
        assert_eq!(info.entries[0].name(), "transfer");
    }

    #[test]
    fn supported_extensions_split_trim_dedup() {
        let spec = sample_function().to_xdr();
        let meta = meta_bytes(&[
            (SUPPORTED_EXTENSIONS_KEY, "sep-41, sep-40 ,sep-41"),
            (SUPPORTED_EXTENSIONS_KEY, "sep-10,,sep-40"),
        ]);
        let bytecode = build_bytecode(Some(&env_meta_bytes()), Some(&spec), Some(&meta));
        let info = parse_contract_bytecode(&bytecode).unwrap();
        assert_eq!(info.supported_extensions, vec!["sep-41", "sep-40", "sep-10"]);
    }

    #[test]
    fn section_bounded_by_next_marker() {
        // Surround the spec bytes with trailing garbage that belongs to the
        // meta section; the spec slice must stop at the meta marker.
        let spec = sample_function().to_xdr();
        let meta = meta_bytes(&[("k", "v")]);
        let bytecode = build_bytecode(Some(&env_meta_bytes()), Some(&spec), Some(&meta));
        let info = parse_contract_bytecode(&bytecode).unwrap();
        assert_eq!(info.entries.len(), 1);
        assert_eq!(info.meta.len(), 1);
    }

    #[test]
    fn empty_bytecode_fails() {
        let err = parse_contract_bytecode(b"").unwrap_err();
        assert_eq!(err, ParseError::MissingSection(ENV_META_SECTION));
    }
}
