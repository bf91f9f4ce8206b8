//! Dynamic ABI plumbing: type parsing, calldata construction, return
//! decoding, and JSON shaping of decoded values.
//!
//! Types arrive as strings from URLs and configuration, so everything here
//! runs on [`DynSolType`]/[`DynSolValue`] rather than compile-time `sol!`
//! bindings. Selectors follow the standard Solidity convention:
//! `keccak256(name "(" join(",", canonical types) ")")[..4]`.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{hex, keccak256, Bytes};

use crate::error::Web3Error;
use crate::types::ContractCall;

/// Parse a single ABI type from its canonical string form.
pub fn parse_type(s: &str) -> Result<DynSolType, Web3Error> {
    DynSolType::parse(s)
        .map_err(|_| Web3Error::bad_request(format!("unsupported ABI type: {s}")))
}

/// Parse a parenthesized return-type annotation, e.g. `(uint256,address)`.
///
/// The annotation is parsed as a tuple type so nested tuples and arrays keep
/// their comma structure.
pub fn parse_type_list(annotation: &str) -> Result<Vec<DynSolType>, Web3Error> {
    match parse_type(annotation)? {
        DynSolType::Tuple(types) => Ok(types),
        single => Ok(vec![single]),
    }
}

/// Parse a textual value as the given ABI type.
pub fn coerce_value(ty: &DynSolType, raw: &str) -> Result<DynSolValue, Web3Error> {
    ty.coerce_str(raw).map_err(|_| {
        Web3Error::bad_request(format!("invalid value for type {ty}: {raw}"))
    })
}

/// The Solidity signature string of a method.
pub fn method_signature(name: &str, arg_types: &[DynSolType]) -> String {
    let mut signature = String::from(name);
    signature.push('(');
    for (i, ty) in arg_types.iter().enumerate() {
        if i > 0 {
            signature.push(',');
        }
        signature.push_str(&ty.to_string());
    }
    signature.push(')');
    signature
}

/// The 4-byte selector of a Solidity signature string.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build calldata for a method call whose argument types are derived from
/// the values themselves. Used for the fixed registry/resolver method set.
pub fn encode_call(name: &str, args: &[DynSolValue]) -> Result<Bytes, Web3Error> {
    let arg_types = args
        .iter()
        .map(|v| {
            v.as_type()
                .ok_or_else(|| Web3Error::internal(format!("untyped argument for {name}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pack_call(name, &arg_types, args))
}

/// Derive calldata from a call plan.
pub fn build_calldata(call: &ContractCall) -> Result<Bytes, Web3Error> {
    match call {
        ContractCall::Calldata(data) => Ok(data.clone()),
        ContractCall::Method {
            name,
            arg_types,
            arg_values,
        } => {
            if arg_types.len() != arg_values.len() {
                return Err(Web3Error::internal("argument type/value length mismatch"));
            }
            Ok(pack_call(name, arg_types, arg_values))
        }
    }
}

fn pack_call(name: &str, arg_types: &[DynSolType], arg_values: &[DynSolValue]) -> Bytes {
    let signature = method_signature(name, arg_types);
    let packed = DynSolValue::Tuple(arg_values.to_vec()).abi_encode_params();

    let mut calldata = Vec::with_capacity(4 + packed.len());
    calldata.extend_from_slice(&selector(&signature));
    calldata.extend_from_slice(&packed);
    calldata.into()
}

/// ABI-decode a contract return as the declared tuple of types.
pub fn decode_return_values(
    types: &[DynSolType],
    data: &[u8],
) -> Result<Vec<DynSolValue>, Web3Error> {
    let tuple = DynSolType::Tuple(types.to_vec());
    match tuple.abi_decode_params(data) {
        Ok(DynSolValue::Tuple(values)) => Ok(values),
        Ok(_) => Err(Web3Error::internal("tuple decode yielded a non-tuple")),
        Err(_) => Err(Web3Error::bad_request("Unable to parse contract output")),
    }
}

/// ABI-decode a contract return as a single `bytes` value.
pub fn decode_abi_bytes(data: &[u8]) -> Result<Vec<u8>, Web3Error> {
    let mut values = decode_return_values(&[DynSolType::Bytes], data)?;
    match values.pop() {
        Some(DynSolValue::Bytes(bytes)) => Ok(bytes),
        _ => Err(Web3Error::internal("bytes decode yielded a non-bytes value")),
    }
}

/// Convert a decoded value to its JSON-friendly form.
///
/// Addresses become 0x-prefixed lowercase hex, integers of width >= 64 bits
/// become decimal strings (they can overflow JSON numbers), narrower
/// integers stay native numbers, bytes become 0x-hex, and compounds recurse.
pub fn to_json(value: &DynSolValue) -> serde_json::Value {
    use serde_json::Value;

    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Uint(u, bits) => {
            if *bits >= 64 {
                Value::String(u.to_string())
            } else {
                u.to_string()
                    .parse::<u64>()
                    .map(|n| Value::Number(n.into()))
                    .unwrap_or_else(|_| Value::String(u.to_string()))
            }
        }
        DynSolValue::Int(i, bits) => {
            if *bits >= 64 {
                Value::String(i.to_string())
            } else {
                i.to_string()
                    .parse::<i64>()
                    .map(|n| Value::Number(n.into()))
                    .unwrap_or_else(|_| Value::String(i.to_string()))
            }
        }
        DynSolValue::Address(addr) => {
            Value::String(format!("0x{}", hex::encode(addr.as_slice())))
        }
        DynSolValue::Function(f) => Value::String(format!("0x{}", hex::encode(f))),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word.as_slice()[..*size])))
        }
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            Value::Array(values.iter().map(to_json).collect())
        }
        DynSolValue::Tuple(values) => Value::Array(values.iter().map(to_json).collect()),
    }
}
