//! `web3://` URL parsing and resolve-mode selection.
//!
//! Parsing runs the whole front half of the pipeline: grammar match, chain
//! validation, host resolution (literal address or name service, through
//! the cache), the `resolveMode()` probe, and dispatch to the mode-specific
//! argument parser. The result is a [`Web3Url`] call plan ready to fetch.
//!
//! The probe swallows RPC errors: a contract that doesn't answer
//! `resolveMode()` is an auto-mode contract.

use alloy::primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::cache::NameAddrCache;
use crate::error::Web3Error;
use crate::mode;
use crate::nameservice;
use crate::types::{ResolveMode, Web3Url};
use crate::Client;

/// `web3://` HOST [":" CHAIN_ID] [PATH] ["?" QUERY]
static WEB3_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<scheme>[^:]+)://(?P<hostname>[^:/?]+)(:(?P<chain>[1-9][0-9]*))?(?P<path>(?P<pathname>/[^?]*)?(\?(?P<query>.*))?)?$",
    )
    .expect("valid regex")
});

/// The raw pieces of a `web3://` URL, before resolution.
#[derive(Debug, Clone)]
pub(crate) struct UrlParts {
    pub hostname: String,
    /// Chain ID digits, unparsed; absent means the default chain.
    pub chain: Option<String>,
    /// Pathname and query together, exactly as written.
    pub path: String,
    pub pathname: String,
    pub query: String,
}

/// Split a URL along the grammar. The scheme must be exactly `web3`.
pub(crate) fn split_url(url: &str) -> Result<UrlParts, Web3Error> {
    let captures = WEB3_URL_RE
        .captures(url)
        .ok_or_else(|| Web3Error::bad_request("Invalid URL format"))?;

    if &captures["scheme"] != "web3" {
        return Err(Web3Error::bad_request("Protocol name is invalid"));
    }

    let get = |name: &str| {
        captures
            .name(name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };
    Ok(UrlParts {
        hostname: captures["hostname"].to_string(),
        chain: captures.name("chain").map(|m| m.as_str().to_string()),
        path: get("path"),
        pathname: get("pathname"),
        query: get("query"),
    })
}

/// Match the 32-byte `resolveMode()` return against the known modes.
/// Anything unexpected means auto.
pub(crate) fn resolve_mode_from_bytes(ret: &[u8]) -> ResolveMode {
    if ret.len() == 32 {
        if ret.starts_with(b"manual") && ret[6..].iter().all(|&b| b == 0) {
            return ResolveMode::Manual;
        }
        if ret.starts_with(b"5219") && ret[4..].iter().all(|&b| b == 0) {
            return ResolveMode::ResourceRequest;
        }
    }
    ResolveMode::Auto
}

impl Client {
    /// Parse a `web3://` URL into a fully-resolved call plan.
    ///
    /// This performs name resolution and the resolve-mode probe, so it may
    /// issue up to four RPC calls.
    pub async fn parse_url(&self, url: &str) -> Result<Web3Url, Web3Error> {
        let parts = split_url(url)?;

        // Default chain is ethereum mainnet.
        let mut chain_id = 1u64;
        if let Some(digits) = &parts.chain {
            chain_id = digits
                .parse()
                .map_err(|_| Web3Error::bad_request(format!("Unsupported chain {digits}")))?;
        }
        if self.config.chain(chain_id).is_none() {
            return Err(Web3Error::bad_request(format!("Unsupported chain {chain_id}")));
        }

        let mut host_resolver = None;
        let mut host_resolver_chain_id = 0;
        let contract_address = if nameservice::is_hex_address(&parts.hostname) {
            nameservice::parse_hex_address(&parts.hostname)?
        } else {
            host_resolver_chain_id = chain_id;
            let (address, target_chain_id, kind) = self
                .resolve_host(host_resolver_chain_id, &parts.hostname)
                .await?;
            host_resolver = Some(kind);
            if target_chain_id > 0 {
                chain_id = target_chain_id;
            }
            if self.config.chain(chain_id).is_none() {
                return Err(Web3Error::bad_request(format!(
                    "unsupported chain id: {chain_id}"
                )));
            }
            address
        };

        let resolve_mode = self.check_resolve_mode(chain_id, contract_address).await;
        tracing::debug!(url, mode = %resolve_mode, contract = %contract_address, chain_id, "mode selected");

        let (call, return_processing) = match resolve_mode {
            ResolveMode::Auto => mode::parse_auto_mode(&parts)?,
            ResolveMode::Manual => mode::parse_manual_mode(&parts)?,
            ResolveMode::ResourceRequest => mode::parse_resource_request_mode(&parts)?,
        };

        Ok(Web3Url {
            url: url.to_string(),
            host_resolver,
            host_resolver_chain_id,
            contract_address,
            chain_id,
            resolve_mode,
            call,
            return_processing,
        })
    }

    /// Resolve a domain-name host through the cache, falling back to the
    /// webHandler-preferring resolver on a miss.
    async fn resolve_host(
        &self,
        resolver_chain_id: u64,
        hostname: &str,
    ) -> Result<(Address, u64, crate::config::NameServiceKind), Web3Error> {
        // The suffix must name a service configured for this chain; this
        // also yields the kind recorded in the call plan.
        let kind = {
            let chain = self
                .config
                .chain(resolver_chain_id)
                .ok_or_else(|| {
                    Web3Error::bad_request(format!("unsupported chain: {resolver_chain_id}"))
                })?;
            let suffix = hostname.rsplit('.').next().unwrap_or_default();
            if suffix.len() >= hostname.len() {
                return Err(Web3Error::bad_request("Invalid contract address"));
            }
            chain
                .ns
                .get(suffix)
                .ok_or_else(|| {
                    Web3Error::bad_request(format!(
                        "Unsupported domain name service suffix: {suffix}"
                    ))
                })?
                .kind
        };

        let cache_key = NameAddrCache::key(resolver_chain_id, hostname);
        if let Some(cache) = &self.name_cache {
            if let Some((address, target_chain_id)) = cache.get(&cache_key) {
                tracing::debug!(key = %cache_key, address = %address, "name cache hit");
                return Ok((address, target_chain_id, kind));
            }
        }

        let (address, target_chain_id) = nameservice::resolve_with_web_handler(
            &self.config,
            &*self.caller,
            &self.normalizer,
            resolver_chain_id,
            hostname,
        )
        .await?;

        if let Some(cache) = &self.name_cache {
            cache.put(cache_key, address, target_chain_id);
        }
        Ok((address, target_chain_id, kind))
    }

    /// Probe `resolveMode()` on the target contract. Errors mean auto.
    async fn check_resolve_mode(&self, chain_id: u64, contract: Address) -> ResolveMode {
        let Some(chain) = self.config.chain(chain_id) else {
            return ResolveMode::Auto;
        };
        let Ok(data) = crate::abi::encode_call("resolveMode", &[]) else {
            return ResolveMode::Auto;
        };
        match self.caller.call(&chain.rpc, contract, data).await {
            Ok(ret) => resolve_mode_from_bytes(&ret),
            Err(_) => ResolveMode::Auto,
        }
    }
}
