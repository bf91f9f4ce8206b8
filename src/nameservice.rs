//! Name→address resolution against on-chain registries.
//!
//! Two protocols share this module:
//! - Hierarchical services (ENS, Web3Q): `namehash` the name, ask the
//!   registry for a resolver, then read the address record. The
//!   webHandler-preferring variant first probes the service's cross-chain
//!   pointer record (`webHandler(node)` on Web3Q, `text(node,
//!   "contentcontract")` on ENS) and only falls back to `addr(node)` when
//!   that record is empty or unreadable. This fallback is the single
//!   designed recovery in the whole pipeline.
//! - The simple service: one flat `pointers(bytes32)` lookup on the
//!   registry, keyed by the right-padded name label.
//!
//! Pointer records may carry EIP-3770 chain-prefixed addresses
//! (`<short-name>:<0x-address>`); the returned target chain id is `0` when
//! no override was given.
//!
//! The resolver is stateless: configuration, transport and normalizer are
//! passed into each call.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{hex, Address, B256};
use once_cell::sync::Lazy;
use url::Url;

use crate::abi;
use crate::caller::EthCaller;
use crate::config::{ChainConfig, Config, NameServiceInfo, NameServiceKind};
use crate::error::Web3Error;
use crate::namehash::Normalizer;

/// Hex form of an ABI-encoded empty dynamic value: offset 0x20, length 0.
static EMPTY_STRING_RETURN: Lazy<String> =
    Lazy::new(|| format!("{}20{}", "0".repeat(62), "0".repeat(64)));

/// Whether `s` is a 20-byte hex address, with or without the `0x` prefix.
/// Checksum casing is not enforced.
pub fn is_hex_address(s: &str) -> bool {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse a hex address, accepting both prefixed and bare forms.
pub fn parse_hex_address(s: &str) -> Result<Address, Web3Error> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits)
        .map_err(|_| Web3Error::bad_request(format!("invalid contract address: {s}")))?;
    if bytes.len() != 20 {
        return Err(Web3Error::bad_request(format!("invalid contract address: {s}")));
    }
    Ok(Address::from_slice(&bytes))
}

/// Parse an EIP-3770 chain-specific address as returned by a name service.
///
/// A bare hex address means "no chain override" (target chain 0). Otherwise
/// the form is `<chain-short-name>:<0x-address>` with the short name looked
/// up in the configuration.
pub fn parse_chain_specific_address(
    config: &Config,
    addr: &str,
) -> Result<(Address, u64), Web3Error> {
    if is_hex_address(addr) {
        return Ok((parse_hex_address(addr)?, 0));
    }
    let mut parts = addr.split(':');
    let (short_name, address_part) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(address), None) => (name, address),
        _ => {
            return Err(Web3Error::bad_request(format!(
                "invalid contract address from name service: {addr}"
            )))
        }
    };
    let chain_id = config.chain_by_short_name(short_name).ok_or_else(|| {
        Web3Error::bad_request(format!(
            "unsupported chain short name from name service: {addr}"
        ))
    })?;
    if !is_hex_address(address_part) {
        return Err(Web3Error::bad_request(format!(
            "invalid contract address from name service: {addr}"
        )));
    }
    Ok((parse_hex_address(address_part)?, chain_id))
}

/// Resolve a dotted name, preferring the service's webHandler/text pointer
/// record over the plain address record.
pub async fn resolve_with_web_handler(
    config: &Config,
    caller: &dyn EthCaller,
    normalizer: &Normalizer,
    chain_id: u64,
    name: &str,
) -> Result<(Address, u64), Web3Error> {
    resolve_inner(config, caller, normalizer, chain_id, name, true).await
}

/// Resolve a dotted name via the plain address record only.
pub async fn resolve(
    config: &Config,
    caller: &dyn EthCaller,
    normalizer: &Normalizer,
    chain_id: u64,
    name: &str,
) -> Result<(Address, u64), Web3Error> {
    resolve_inner(config, caller, normalizer, chain_id, name, false).await
}

async fn resolve_inner(
    config: &Config,
    caller: &dyn EthCaller,
    normalizer: &Normalizer,
    chain_id: u64,
    name: &str,
    prefer_web_handler: bool,
) -> Result<(Address, u64), Web3Error> {
    if is_hex_address(name) {
        return Ok((parse_hex_address(name)?, 0));
    }
    let (ns_info, chain) = ns_config_for(config, chain_id, name)?;
    let rpc = &chain.rpc;

    if ns_info.kind == NameServiceKind::Simple {
        return resolve_simple(caller, rpc, ns_info, name).await;
    }

    let node = normalizer.namehash(name)?;
    let resolver = registry_resolver(caller, rpc, ns_info.registry, node, name).await?;
    tracing::debug!(name, resolver = %resolver, "resolver found");

    if prefer_web_handler {
        if let Some(resolved) =
            probe_pointer_record(config, caller, rpc, ns_info.kind, resolver, node).await?
        {
            return Ok(resolved);
        }
    }

    resolve_addr_record(caller, rpc, resolver, node, name).await
}

/// Look up the flat registry: `pointers(bytes32)` keyed by the right-padded
/// name label (suffix stripped).
async fn resolve_simple(
    caller: &dyn EthCaller,
    rpc: &Url,
    ns_info: &NameServiceInfo,
    name: &str,
) -> Result<(Address, u64), Web3Error> {
    // The 4-character suffix includes the dot, e.g. ".w3q".
    let label = name
        .get(..name.len().saturating_sub(4))
        .unwrap_or_default();
    if label.is_empty() || label.len() > 32 {
        return Err(Web3Error::bad_request(format!("invalid domain name: {name}")));
    }
    let mut key = [0u8; 32];
    key[..label.len()].copy_from_slice(label.as_bytes());

    let data = abi::encode_call("pointers", &[DynSolValue::FixedBytes(B256::from(key), 32)])?;
    let ret = caller
        .call(rpc, ns_info.registry, data)
        .await
        .map_err(|e| Web3Error::not_found(e.to_string()))?;
    let address = decode_address(&ret)?;
    if address == Address::ZERO {
        return Err(Web3Error::not_found(format!("no address record for {name}")));
    }
    Ok((address, 0))
}

/// `resolver(bytes32)` on the registry. A zero resolver is a 400: the name
/// exists in no resolver's zone.
async fn registry_resolver(
    caller: &dyn EthCaller,
    rpc: &Url,
    registry: Address,
    node: B256,
    name: &str,
) -> Result<Address, Web3Error> {
    let data = abi::encode_call("resolver", &[DynSolValue::FixedBytes(node, 32)])?;
    let ret = caller.call(rpc, registry, data).await?;
    let resolver = decode_address(&ret)?;
    if resolver == Address::ZERO {
        return Err(Web3Error::bad_request(format!("Cannot get resolver for {name}")));
    }
    Ok(resolver)
}

/// Probe the service's cross-chain pointer record. Returns `Ok(None)` when
/// the record is empty or unreadable, which sends the caller to the `addr`
/// fallback.
async fn probe_pointer_record(
    config: &Config,
    caller: &dyn EthCaller,
    rpc: &Url,
    kind: NameServiceKind,
    resolver: Address,
    node: B256,
) -> Result<Option<(Address, u64)>, Web3Error> {
    match kind {
        NameServiceKind::W3ns => {
            let data = abi::encode_call("webHandler", &[DynSolValue::FixedBytes(node, 32)])?;
            let Ok(ret) = caller.call(rpc, resolver, data).await else {
                return Ok(None);
            };
            // Empty address record: a single all-zero word.
            if ret.len() == 32 && ret.iter().all(|&b| b == 0) {
                return Ok(None);
            }
            match decode_address(&ret) {
                Ok(handler) => Ok(Some((handler, 0))),
                Err(_) => Ok(None),
            }
        }
        NameServiceKind::Ens => {
            let data = abi::encode_call(
                "text",
                &[
                    DynSolValue::FixedBytes(node, 32),
                    DynSolValue::String("contentcontract".to_string()),
                ],
            )?;
            let Ok(ret) = caller.call(rpc, resolver, data).await else {
                return Ok(None);
            };
            if hex::encode(&ret) == *EMPTY_STRING_RETURN {
                return Ok(None);
            }
            let decoded = match abi::decode_return_values(&[DynSolType::String], &ret) {
                Ok(mut values) => match values.pop() {
                    Some(DynSolValue::String(s)) => s,
                    _ => return Ok(None),
                },
                Err(_) => return Ok(None),
            };
            // A readable record that fails EIP-3770 parsing is a hard error,
            // not a fallback case.
            parse_chain_specific_address(config, &decoded).map(Some)
        }
        NameServiceKind::Simple => Ok(None),
    }
}

/// `addr(bytes32)` on the resolver. An RPC failure or zero address is a 404.
async fn resolve_addr_record(
    caller: &dyn EthCaller,
    rpc: &Url,
    resolver: Address,
    node: B256,
    name: &str,
) -> Result<(Address, u64), Web3Error> {
    let data = abi::encode_call("addr", &[DynSolValue::FixedBytes(node, 32)])?;
    let ret = caller
        .call(rpc, resolver, data)
        .await
        .map_err(|e| Web3Error::not_found(e.to_string()))?;
    let address = decode_address(&ret)?;
    if address == Address::ZERO {
        return Err(Web3Error::not_found(format!("no address record for {name}")));
    }
    Ok((address, 0))
}

fn ns_config_for<'a>(
    config: &'a Config,
    chain_id: u64,
    name: &str,
) -> Result<(&'a NameServiceInfo, &'a ChainConfig), Web3Error> {
    let suffix = name
        .rsplit('.')
        .next()
        .filter(|s| s.len() < name.len())
        .ok_or_else(|| Web3Error::bad_request(format!("invalid domain name: {name}")))?;
    let chain = config
        .chain(chain_id)
        .ok_or_else(|| Web3Error::bad_request(format!("unsupported chain: {chain_id}")))?;
    let ns_info = chain.ns.get(suffix).ok_or_else(|| {
        Web3Error::bad_request(format!("Unsupported domain name service suffix: {suffix}"))
    })?;
    Ok((ns_info, chain))
}

fn decode_address(data: &[u8]) -> Result<Address, Web3Error> {
    let mut values = abi::decode_return_values(&[DynSolType::Address], data)?;
    match values.pop() {
        Some(DynSolValue::Address(address)) => Ok(address),
        _ => Err(Web3Error::internal("address decode yielded a non-address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use std::collections::HashMap;

    fn config_with_short_names() -> Config {
        let mut config = Config::default();
        config.name_to_chain.insert("eth".to_string(), 1);
        config.name_to_chain.insert("gno".to_string(), 100);
        config.chains.insert(
            1,
            ChainConfig {
                rpc: "https://ethereum.example/rpc".parse().unwrap(),
                ns: HashMap::new(),
            },
        );
        config
    }

    #[test]
    fn hex_address_detection() {
        assert!(is_hex_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"));
        assert!(is_hex_address("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045"));
        assert!(!is_hex_address("vitalik.eth"));
        assert!(!is_hex_address("0x1234"));
        assert!(!is_hex_address("0xzz8dA6BF26964aF9D7eEd9e03E53415D37aA9604"));
    }

    #[test]
    fn chain_specific_address_plain_hex() {
        let config = config_with_short_names();
        let (addr, chain) = parse_chain_specific_address(
            &config,
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
        )
        .unwrap();
        assert_eq!(
            hex::encode(addr),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045"
        );
        assert_eq!(chain, 0);
    }

    #[test]
    fn chain_specific_address_with_short_name() {
        let config = config_with_short_names();
        let (addr, chain) = parse_chain_specific_address(
            &config,
            "gno:0x0000000000000000000000000000000000000002",
        )
        .unwrap();
        assert_eq!(chain, 100);
        assert_eq!(addr, parse_hex_address("0x0000000000000000000000000000000000000002").unwrap());

        // Short names are matched case-insensitively.
        let (_, chain) = parse_chain_specific_address(
            &config,
            "GNO:0x0000000000000000000000000000000000000002",
        )
        .unwrap();
        assert_eq!(chain, 100);
    }

    #[test]
    fn chain_specific_address_rejections() {
        let config = config_with_short_names();
        // Unknown short name.
        assert!(parse_chain_specific_address(
            &config,
            "osmo:0x0000000000000000000000000000000000000002"
        )
        .is_err());
        // Too many parts.
        assert!(parse_chain_specific_address(
            &config,
            "gno:extra:0x0000000000000000000000000000000000000002"
        )
        .is_err());
        // Right side is not an address.
        assert!(parse_chain_specific_address(&config, "gno:notanaddress").is_err());
        // Not an address and not chain-prefixed.
        assert!(parse_chain_specific_address(&config, "garbage").is_err());
    }

    #[test]
    fn empty_string_sentinel_shape() {
        assert_eq!(EMPTY_STRING_RETURN.len(), 128);
        assert_eq!(&EMPTY_STRING_RETURN[62..64], "20");
        assert!(EMPTY_STRING_RETURN[..62].bytes().all(|b| b == b'0'));
        assert!(EMPTY_STRING_RETURN[64..].bytes().all(|b| b == b'0'));
    }
}
