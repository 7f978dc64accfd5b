//! EIP-712 v4 structured data hashing and signing (spec §4.F
//! `signTypedData`). Supports the primitive field types plus nested struct
//! references, which covers the permit/order-style payloads dApps actually
//! send; array-typed fields are rejected explicitly rather than silently
//! mishandled, since no endpoint in this spec needs them.

use cordon_crypto::evm_sign::{self, EvmSignature};
use cordon_crypto::keccak;
use num_bigint::BigInt;
use secp256k1::SecretKey;
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Eip712Error {
    #[error("typed data is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("type `{0}` is not defined in `types`")]
    UnknownType(String),
    #[error("field `{0}` of type `{1}` has no matching value")]
    MissingValue(String, String),
    #[error("array field types are not supported: `{0}`")]
    UnsupportedArrayType(String),
    #[error("field `{0}` could not be decoded as a {1}")]
    BadValue(String, &'static str),
}

struct TypeField {
    name: String,
    type_name: String,
}

fn fields_of<'a>(types: &'a Value, type_name: &str) -> Result<Vec<TypeField>, Eip712Error> {
    let array = types
        .get(type_name)
        .and_then(Value::as_array)
        .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))?;
    array
        .iter()
        .map(|f| {
            let name = f
                .get("name")
                .and_then(Value::as_str)
                .ok_or(Eip712Error::MissingField("name"))?
                .to_string();
            let type_name = f
                .get("type")
                .and_then(Value::as_str)
                .ok_or(Eip712Error::MissingField("type"))?
                .to_string();
            Ok(TypeField { name, type_name })
        })
        .collect()
}

fn is_struct_type(types: &Value, type_name: &str) -> bool {
    types.get(type_name).and_then(Value::as_array).is_some()
}

/// Collects the struct types `type_name` transitively depends on (excluding
/// itself), per EIP-712's `encodeType` dependency-ordering rule.
fn collect_dependencies(
    types: &Value,
    type_name: &str,
    seen: &mut BTreeSet<String>,
) -> Result<(), Eip712Error> {
    for field in fields_of(types, type_name)? {
        let base = field.type_name.trim_end_matches("[]");
        if base.ends_with(']') {
            return Err(Eip712Error::UnsupportedArrayType(field.type_name));
        }
        if is_struct_type(types, base) && !seen.contains(base) {
            seen.insert(base.to_string());
            collect_dependencies(types, base, seen)?;
        }
    }
    Ok(())
}

fn encode_type(types: &Value, type_name: &str) -> Result<String, Eip712Error> {
    let mut dependencies = BTreeSet::new();
    collect_dependencies(types, type_name, &mut dependencies)?;
    dependencies.remove(type_name);

    let mut ordered = vec![type_name.to_string()];
    ordered.extend(dependencies);

    let mut out = String::new();
    for name in ordered {
        let fields = fields_of(types, &name)?;
        out.push_str(&name);
        out.push('(');
        out.push_str(
            &fields
                .iter()
                .map(|f| format!("{} {}", f.type_name, f.name))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push(')');
    }
    Ok(out)
}

fn type_hash(types: &Value, type_name: &str) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak::digest(encode_type(types, type_name)?.as_bytes()))
}

fn pad_left(bytes: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    let take = bytes.len().min(32);
    word[start..].copy_from_slice(&bytes[bytes.len() - take..]);
    word
}

fn pad_right(bytes: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    let take = bytes.len().min(32);
    word[..take].copy_from_slice(&bytes[..take]);
    word
}

fn encode_uint_like(field_name: &str, value: &Value) -> Result<[u8; 32], Eip712Error> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(Eip712Error::BadValue(field_name.to_string(), "number")),
    };
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        BigInt::parse_bytes(hex.as_bytes(), 16)
    } else {
        BigInt::parse_bytes(text.as_bytes(), 10)
    }
    .ok_or_else(|| Eip712Error::BadValue(field_name.to_string(), "integer"))?;
    let (_, bytes) = parsed.to_bytes_be();
    Ok(pad_left(&bytes))
}

fn encode_address(field_name: &str, value: &Value) -> Result<[u8; 32], Eip712Error> {
    let text = value
        .as_str()
        .ok_or_else(|| Eip712Error::BadValue(field_name.to_string(), "address"))?;
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(stripped).map_err(|_| Eip712Error::BadValue(field_name.to_string(), "address"))?;
    Ok(pad_left(&bytes))
}

fn encode_bytes_field(field_name: &str, value: &Value) -> Result<Vec<u8>, Eip712Error> {
    let text = value
        .as_str()
        .ok_or_else(|| Eip712Error::BadValue(field_name.to_string(), "bytes"))?;
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(stripped).map_err(|_| Eip712Error::BadValue(field_name.to_string(), "bytes"))
}

fn encode_value(types: &Value, field: &TypeField, value: &Value) -> Result<[u8; 32], Eip712Error> {
    match field.type_name.as_str() {
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| Eip712Error::BadValue(field.name.clone(), "string"))?;
            Ok(keccak::digest(s.as_bytes()))
        }
        "bytes" => Ok(keccak::digest(&encode_bytes_field(&field.name, value)?)),
        "bool" => {
            let b = value
                .as_bool()
                .ok_or_else(|| Eip712Error::BadValue(field.name.clone(), "bool"))?;
            Ok(pad_left(&[b as u8]))
        }
        "address" => encode_address(&field.name, value),
        t if t.starts_with("uint") || t.starts_with("int") => encode_uint_like(&field.name, value),
        t if t.starts_with("bytes") => Ok(pad_right(&encode_bytes_field(&field.name, value)?)),
        t if t.ends_with(']') => Err(Eip712Error::UnsupportedArrayType(t.to_string())),
        t if is_struct_type(types, t) => hash_struct(types, t, value),
        other => Err(Eip712Error::UnknownType(other.to_string())),
    }
}

fn hash_struct(types: &Value, type_name: &str, data: &Value) -> Result<[u8; 32], Eip712Error> {
    let hash = type_hash(types, type_name)?;
    let mut encoded = hash.to_vec();
    for field in fields_of(types, type_name)? {
        let value = data
            .get(&field.name)
            .ok_or_else(|| Eip712Error::MissingValue(field.name.clone(), type_name.to_string()))?;
        encoded.extend_from_slice(&encode_value(types, &field, value)?);
    }
    Ok(keccak::digest(&encoded))
}

/// A domain-aware one-line summary for the UI confirmation prompt (spec
/// §4.F: "domain-aware display summary").
pub fn display_summary(document: &Value) -> String {
    let name = document
        .get("domain")
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("an app");
    let primary_type = document
        .get("primaryType")
        .and_then(Value::as_str)
        .unwrap_or("a message");
    format!("Sign {primary_type} for {name}")
}

/// Computes the EIP-712 v4 digest for `document` (the standard
/// `{types, domain, primaryType, message}` shape) and signs it. Signing
/// uses the chain-id-less path, matching how MetaMask et al. sign typed
/// data: `v` is plain `{27,28}`, not EIP-155-folded.
pub fn sign_typed_data(secret_key: &SecretKey, document: &Value) -> Result<EvmSignature, Eip712Error> {
    let digest = typed_data_digest(document)?;
    Ok(evm_sign::sign_digest(secret_key, &digest, None))
}

pub fn typed_data_digest(document: &Value) -> Result<[u8; 32], Eip712Error> {
    let types = document.get("types").ok_or(Eip712Error::MissingField("types"))?;
    let domain = document.get("domain").ok_or(Eip712Error::MissingField("domain"))?;
    let primary_type = document
        .get("primaryType")
        .and_then(Value::as_str)
        .ok_or(Eip712Error::MissingField("primaryType"))?;
    let message = document.get("message").ok_or(Eip712Error::MissingField("message"))?;

    let domain_separator = hash_struct(types, "EIP712Domain", domain)?;
    let struct_hash = hash_struct(types, primary_type, message)?;

    let mut payload = vec![0x19u8, 0x01u8];
    payload.extend_from_slice(&domain_separator);
    payload.extend_from_slice(&struct_hash);
    Ok(keccak::digest(&payload))
}
